use std::f64::consts::TAU;

use aimex_core::{geometry, Point};
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of fixed angular positions on the orbit circle, one every 45°.
pub const FIXED_POSITIONS: usize = 8;

/// Aiming target placed on one of the fixed orbit positions.
///
/// Position assignment draws from a shuffled block of the 8 indices, so
/// every run of 8 consecutive trials visits each position exactly once.
#[derive(Debug, Clone)]
pub struct Target {
    center: Point,
    radius: f64,
    // Indices of the current block, consumed back-to-front.
    pending: Vec<usize>,
}

impl Target {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            pending: Vec::new(),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Moves the target to the next position of the block, refilling the
    /// queue with a freshly shuffled permutation when it runs empty.
    /// Returns the angular index that was drawn.
    pub fn advance<R: Rng>(&mut self, circle_center: Point, orbit_radius: f64, rng: &mut R) -> usize {
        if self.pending.is_empty() {
            self.pending = (0..FIXED_POSITIONS).collect();
            self.pending.shuffle(rng);
        }
        let index = self.pending.pop().expect("queue refilled above");

        let angle = index as f64 * (TAU / FIXED_POSITIONS as f64);
        self.center = Point::new(
            circle_center.x + orbit_radius * angle.cos(),
            circle_center.y + orbit_radius * angle.sin(),
        );
        index
    }

    /// Drops the remainder of the current block so the next `advance`
    /// starts a fresh shuffled block of 8.
    pub fn reset_sequence(&mut self) {
        self.pending.clear();
    }

    /// Hit test against the target's own radius.
    pub fn contains(&self, point: Point) -> bool {
        geometry::point_in_circle(point, self.center, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const CENTER: Point = Point::new(400.0, 400.0);

    #[test]
    fn each_block_of_eight_visits_every_position_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut target = Target::new(CENTER, 50.0);

        for _ in 0..4 {
            let block: HashSet<usize> = (0..FIXED_POSITIONS)
                .map(|_| target.advance(CENTER, 300.0, &mut rng))
                .collect();
            assert_eq!(block.len(), FIXED_POSITIONS);
        }
    }

    #[test]
    fn advance_places_center_on_the_orbit_circle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut target = Target::new(CENTER, 50.0);

        for _ in 0..FIXED_POSITIONS {
            target.advance(CENTER, 300.0, &mut rng);
            let distance = target.center().distance_to(CENTER);
            assert!((distance - 300.0).abs() < 1e-9);
        }
    }

    #[test]
    fn index_zero_maps_to_positive_x_axis() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut target = Target::new(CENTER, 50.0);

        loop {
            if target.advance(CENTER, 300.0, &mut rng) == 0 {
                break;
            }
        }
        assert!((target.center().x - 700.0).abs() < 1e-9);
        assert!((target.center().y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn reset_sequence_starts_a_fresh_block() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut target = Target::new(CENTER, 50.0);

        for _ in 0..3 {
            target.advance(CENTER, 300.0, &mut rng);
        }
        target.reset_sequence();

        let block: HashSet<usize> = (0..FIXED_POSITIONS)
            .map(|_| target.advance(CENTER, 300.0, &mut rng))
            .collect();
        assert_eq!(block.len(), FIXED_POSITIONS);
    }

    #[test]
    fn contains_uses_the_hit_radius() {
        let mut target = Target::new(CENTER, 50.0);
        let mut rng = StdRng::seed_from_u64(5);
        target.advance(CENTER, 300.0, &mut rng);

        let center = target.center();
        assert!(target.contains(center));
        assert!(target.contains(Point::new(center.x + 49.0, center.y)));
        assert!(!target.contains(Point::new(center.x + 51.0, center.y)));
    }
}
