use aimex_core::Point;

/// Progressive visuomotor rotation applied to cursor displacement.
///
/// Inactive until the configured trial index is reached; once active, each
/// raw displacement is rotated by the configured angle and appended to the
/// previous *effective* position, so the discrepancy between the player's
/// hand and the drawn cursor compounds over time instead of being a
/// one-shot offset from a fixed anchor.
#[derive(Debug, Clone)]
pub struct DeviationTransform {
    start_trial: usize,
    angle_rad: f64,
}

impl DeviationTransform {
    pub fn new(start_trial: usize, angle_deg: f64) -> Self {
        Self {
            start_trial,
            angle_rad: angle_deg.to_radians(),
        }
    }

    pub fn active(&self, trial_index: usize) -> bool {
        trial_index >= self.start_trial
    }

    /// Maps this frame's raw cursor position to the effective position.
    pub fn apply(
        &self,
        trial_index: usize,
        raw: Point,
        prev_raw: Point,
        prev_effective: Point,
    ) -> Point {
        if !self.active(trial_index) {
            return raw;
        }

        let dx = raw.x - prev_raw.x;
        let dy = raw.y - prev_raw.y;
        if dx == 0.0 && dy == 0.0 {
            // No movement, no deviation drift.
            return prev_effective;
        }

        // Y points down on screen, so adding the angle turns clockwise.
        let angle = dy.atan2(dx) + self.angle_rad;
        let magnitude = dx.hypot(dy);
        Point::new(
            prev_effective.x + magnitude * angle.cos(),
            prev_effective.y + magnitude * angle.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimex_core::geometry;

    #[test]
    fn passes_through_before_the_start_trial() {
        let deviation = DeviationTransform::new(5, 30.0);
        let raw = Point::new(123.0, 456.0);
        let out = deviation.apply(4, raw, Point::new(0.0, 0.0), Point::new(9.0, 9.0));
        assert_eq!(out, raw);
    }

    #[test]
    fn stationary_cursor_keeps_the_effective_position() {
        let deviation = DeviationTransform::new(0, 30.0);
        let prev_eff = Point::new(50.0, 60.0);
        let out = deviation.apply(0, Point::new(10.0, 10.0), Point::new(10.0, 10.0), prev_eff);
        assert_eq!(out, prev_eff);
    }

    #[test]
    fn rotation_preserves_displacement_magnitude() {
        let deviation = DeviationTransform::new(0, 30.0);
        let prev_eff = Point::new(0.0, 0.0);
        let out = deviation.apply(0, Point::new(1.0, 0.0), Point::new(0.0, 0.0), prev_eff);
        assert!((out.distance_to(prev_eff) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn deviation_compounds_instead_of_offsetting_once() {
        let deviation = DeviationTransform::new(0, 30.0);
        let origin = Point::new(0.0, 0.0);

        let mut prev_raw = origin;
        let mut prev_eff = origin;
        let mut last_discrepancy = 0.0;

        // Equal raw displacements of (1, 0): the effective path holds the
        // configured 30° away from the raw path while the hand/cursor
        // discrepancy keeps growing frame after frame. A one-shot offset
        // from a fixed anchor would keep the discrepancy constant.
        for frame in 1..=8 {
            let raw = Point::new(frame as f64, 0.0);
            let eff = deviation.apply(0, raw, prev_raw, prev_eff);

            let discrepancy = eff.distance_to(raw);
            assert!(
                discrepancy > last_discrepancy,
                "frame {frame}: {discrepancy} <= {last_discrepancy}"
            );
            last_discrepancy = discrepancy;

            let angle = geometry::angle_between_deg(origin, raw, eff).unwrap();
            assert!((angle - 30.0).abs() < 1e-6);

            prev_raw = raw;
            prev_eff = eff;
        }
    }

    #[test]
    fn single_step_rotates_clockwise_in_screen_coordinates() {
        let deviation = DeviationTransform::new(0, 90.0);
        let out = deviation.apply(
            0,
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        // +x displacement rotated 90° with Y down lands on +y (screen down).
        assert!(out.x.abs() < 1e-9);
        assert!((out.y - 1.0).abs() < 1e-9);
    }
}
