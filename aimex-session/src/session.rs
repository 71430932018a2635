use aimex_core::{geometry, PathSample, Point, SessionPhase, TrialRecord};
use aimex_timing::Clock;
use log::{debug, info};
use rand::Rng;

use crate::config::SessionConfig;
use crate::deviation::DeviationTransform;
use crate::store::TrialStore;
use crate::target::Target;

/// Notifications surfaced to the embedding frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The effective cursor path crossed the orbit circle.
    Crossed { trial_index: usize, point: Point },
    /// A new trial began; the embedder should warp the pointer to `cursor`.
    TrialStarted { trial_index: usize, cursor: Point },
    SessionEnded,
}

/// Per-session trial state machine.
///
/// Driven by one `update` call per rendered frame with the raw pointer
/// position; owns the deviation transform, the target sequence, the path
/// buffer of the running trial and the store of completed trials. Single
/// threaded by construction: the frame loop owns it exclusively.
pub struct Session<C: Clock, R: Rng> {
    config: SessionConfig,
    clock: C,
    rng: R,
    phase: SessionPhase,
    trial_index: usize,
    target: Target,
    deviation: DeviationTransform,
    prev_raw: Point,
    prev_effective: Point,
    path: Vec<PathSample>,
    trial_start: C::Timestamp,
    result_display_start: Option<C::Timestamp>,
    ghost_target: Option<Point>,
    crossing_point: Option<Point>,
    store: TrialStore,
}

impl<C, R> Session<C, R>
where
    C: Clock,
    R: Rng,
{
    /// Builds a session from a validated configuration snapshot and places
    /// the first target.
    pub fn new(config: SessionConfig, clock: C, mut rng: R) -> Self {
        let mut target = Target::new(config.circle_center, config.target_radius);
        target.advance(config.circle_center, config.orbit_radius, &mut rng);

        let deviation =
            DeviationTransform::new(config.deviation_start_trial, config.deviation_angle_deg);
        let center = config.circle_center;
        let trial_start = clock.now();

        Self {
            config,
            clock,
            rng,
            phase: SessionPhase::Aiming,
            trial_index: 0,
            target,
            deviation,
            prev_raw: center,
            prev_effective: center,
            path: vec![PathSample {
                pos: center,
                elapsed_ms: 0,
            }],
            trial_start,
            result_display_start: None,
            ghost_target: None,
            crossing_point: None,
            store: TrialStore::new(),
        }
    }

    /// Per-frame update with the raw pointer position.
    pub fn update(&mut self, raw: Point) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase.is_ended() {
            return events;
        }

        let effective =
            self.deviation
                .apply(self.trial_index, raw, self.prev_raw, self.prev_effective);

        let mut recentered = false;
        match self.phase {
            SessionPhase::Aiming => {
                self.record_sample(effective);
                if let Some(point) = geometry::segment_circle_intersection(
                    self.prev_effective,
                    effective,
                    self.config.circle_center,
                    self.config.orbit_radius,
                ) {
                    self.handle_crossing(point, &mut events);
                }
            }
            SessionPhase::ResultDisplay => {
                if let Some(start) = self.result_display_start {
                    if self.clock.elapsed_ms(start) >= self.config.result_display_ms {
                        recentered = self.finish_result_display(&mut events);
                    }
                }
            }
            SessionPhase::Ended => {}
        }

        // Trackers follow the frame unless a trial advance just recentered
        // them; overwriting here would undo the recenter.
        if !recentered {
            self.prev_raw = raw;
            self.prev_effective = effective;
        }

        events
    }

    fn record_sample(&mut self, effective: Point) {
        // Stationary frames are not recorded twice.
        if self.path.last().is_some_and(|s| s.pos == effective) {
            return;
        }
        let elapsed_ms = self.clock.elapsed_ms(self.trial_start);
        self.path.push(PathSample {
            pos: effective,
            elapsed_ms,
        });
    }

    fn handle_crossing(&mut self, point: Point, events: &mut Vec<SessionEvent>) {
        let elapsed_ms = self.clock.elapsed_ms(self.trial_start);
        self.path.push(PathSample {
            pos: point,
            elapsed_ms,
        });

        let record = TrialRecord {
            path: std::mem::take(&mut self.path),
            target: self.target.center(),
            crossing: point,
        };
        self.store.push(record);

        self.ghost_target = Some(self.target.center());
        self.crossing_point = Some(point);
        self.result_display_start = Some(self.clock.now());
        self.phase = SessionPhase::ResultDisplay;

        info!(
            "trial {} crossed at ({:.0}, {:.0}) after {} ms",
            self.trial_index, point.x, point.y, elapsed_ms
        );
        events.push(SessionEvent::Crossed {
            trial_index: self.trial_index,
            point,
        });
    }

    /// Leaves `ResultDisplay`, either into the next trial or the end of the
    /// session. Returns true when the cursor trackers were recentered.
    fn finish_result_display(&mut self, events: &mut Vec<SessionEvent>) -> bool {
        self.ghost_target = None;
        self.crossing_point = None;
        self.result_display_start = None;

        if self.trial_index + 1 >= self.config.max_trials {
            self.phase = SessionPhase::Ended;
            info!("session ended after {} trials", self.store.len());
            events.push(SessionEvent::SessionEnded);
            return false;
        }

        self.trial_index += 1;
        let slot = self
            .target
            .advance(self.config.circle_center, self.config.orbit_radius, &mut self.rng);
        self.recenter_cursor();
        self.phase = SessionPhase::Aiming;

        debug!("trial {} target at slot {}", self.trial_index, slot);
        events.push(SessionEvent::TrialStarted {
            trial_index: self.trial_index,
            cursor: self.config.circle_center,
        });
        true
    }

    fn recenter_cursor(&mut self) {
        let center = self.config.circle_center;
        self.prev_raw = center;
        self.prev_effective = center;
        self.trial_start = self.clock.now();
        self.path = vec![PathSample {
            pos: center,
            elapsed_ms: 0,
        }];
    }

    /// Restarts the session in place: trial 0, empty store, fresh shuffled
    /// target block, cursor recentered. The deviation threshold applies
    /// again from the start.
    pub fn reset(&mut self) {
        self.store.clear();
        self.trial_index = 0;
        self.phase = SessionPhase::Aiming;
        self.ghost_target = None;
        self.crossing_point = None;
        self.result_display_start = None;
        self.target.reset_sequence();
        self.target
            .advance(self.config.circle_center, self.config.orbit_radius, &mut self.rng);
        self.recenter_cursor();
        info!("session reset");
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    /// `(current trial, max trials)`, 1-based for display.
    pub fn progress(&self) -> (usize, usize) {
        (
            (self.trial_index + 1).min(self.config.max_trials),
            self.config.max_trials,
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Target position of the just-finished trial, shown during `ResultDisplay`.
    pub fn ghost_target(&self) -> Option<Point> {
        self.ghost_target
    }

    pub fn crossing_point(&self) -> Option<Point> {
        self.crossing_point
    }

    /// Cursor position after deviation, used for all rendering.
    pub fn effective_cursor(&self) -> Point {
        self.prev_effective
    }

    pub fn deviation_active(&self) -> bool {
        self.deviation.active(self.trial_index)
    }

    pub fn store(&self) -> &TrialStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimex_timing::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FRAME_MS: u64 = 16;

    fn test_config() -> SessionConfig {
        SessionConfig {
            screen_width: 800,
            screen_height: 800,
            circle_center: Point::new(400.0, 400.0),
            orbit_radius: 300.0,
            target_radius: 50.0,
            result_display_ms: 500,
            max_trials: 2,
            deviation_start_trial: 10,
            deviation_angle_deg: 30.0,
        }
    }

    fn new_session(config: SessionConfig) -> (Session<ManualClock, StdRng>, ManualClock) {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let session = Session::new(config, clock, StdRng::seed_from_u64(42));
        (session, handle)
    }

    /// Unit direction from the circle center towards the current target.
    fn target_direction(session: &Session<ManualClock, StdRng>) -> (f64, f64) {
        let center = session.config().circle_center;
        let target = session.target().center();
        let len = target.distance_to(center);
        ((target.x - center.x) / len, (target.y - center.y) / len)
    }

    /// Drives the cursor from the center past the orbit circle in 10 frames.
    fn drive_to_crossing(
        session: &mut Session<ManualClock, StdRng>,
        clock: &ManualClock,
    ) -> Vec<SessionEvent> {
        let center = session.config().circle_center;
        let (dx, dy) = target_direction(session);
        let mut events = Vec::new();
        for frame in 1..=10 {
            clock.advance_ms(FRAME_MS);
            let distance = 31.0 * frame as f64;
            let raw = Point::new(center.x + dx * distance, center.y + dy * distance);
            events.extend(session.update(raw));
        }
        events
    }

    #[test]
    fn stationary_cursor_never_records_or_crosses() {
        let (mut session, clock) = new_session(test_config());
        let center = session.config().circle_center;

        for _ in 0..100 {
            clock.advance_ms(FRAME_MS);
            let events = session.update(center);
            assert!(events.is_empty());
        }

        assert_eq!(session.phase(), SessionPhase::Aiming);
        assert!(session.store().is_empty());
        assert_eq!(session.path.len(), 1, "only the seed sample is kept");
    }

    #[test]
    fn crossing_records_a_trial_and_enters_result_display() {
        let (mut session, clock) = new_session(test_config());
        let events = drive_to_crossing(&mut session, &clock);

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.phase(), SessionPhase::ResultDisplay);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Crossed { trial_index: 0, .. }]
        ));

        let record = &session.store().records()[0];
        let crossing = record.crossing;
        let center = session.config().circle_center;
        assert!((crossing.distance_to(center) - 300.0).abs() < 1e-6);
        assert_eq!(record.path.last().unwrap().pos, crossing);
        assert_eq!(record.path.first().unwrap().elapsed_ms, 0);
        assert!(session.ghost_target().is_some());
        assert!(session.crossing_point().is_some());
    }

    #[test]
    fn no_detection_or_recording_during_result_display() {
        let (mut session, clock) = new_session(test_config());
        drive_to_crossing(&mut session, &clock);

        // Wild movement during the pause must not produce another record.
        for frame in 0..10 {
            clock.advance_ms(FRAME_MS);
            let raw = Point::new(100.0 + 50.0 * frame as f64, 100.0);
            session.update(raw);
        }
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.phase(), SessionPhase::ResultDisplay);
    }

    #[test]
    fn result_display_times_out_into_the_next_trial() {
        let (mut session, clock) = new_session(test_config());
        drive_to_crossing(&mut session, &clock);

        clock.advance_ms(500);
        let center = session.config().circle_center;
        let events = session.update(Point::new(center.x + 310.0, center.y));

        assert_eq!(session.phase(), SessionPhase::Aiming);
        assert_eq!(session.trial_index(), 1);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::TrialStarted { trial_index: 1, .. }]
        ));
        assert!(session.ghost_target().is_none());
        assert!(session.crossing_point().is_none());
        // Trackers were recentered: the stale pointer position must not be
        // seen as a huge displacement segment on the next aiming frame.
        assert_eq!(session.effective_cursor(), center);

        clock.advance_ms(FRAME_MS);
        session.update(center);
        assert_eq!(
            session.store().len(),
            1,
            "re-entry must not cross with a spurious segment"
        );
    }

    #[test]
    fn session_ends_after_max_trials() {
        let (mut session, clock) = new_session(test_config());

        // Trial 0.
        drive_to_crossing(&mut session, &clock);
        clock.advance_ms(500);
        let center = session.config().circle_center;
        session.update(center);
        assert_eq!(session.trial_index(), 1);

        // Trial 1.
        drive_to_crossing(&mut session, &clock);
        clock.advance_ms(500);
        let events = session.update(center);

        assert_eq!(session.phase(), SessionPhase::Ended);
        assert_eq!(session.store().len(), 2);
        assert!(events.contains(&SessionEvent::SessionEnded));

        // Terminal: further frames are ignored.
        clock.advance_ms(FRAME_MS);
        assert!(session.update(Point::new(0.0, 0.0)).is_empty());
        assert_eq!(session.store().len(), 2);
    }

    #[test]
    fn path_samples_are_deduped_and_time_ordered() {
        let (mut session, clock) = new_session(test_config());
        let center = session.config().circle_center;

        let raw = Point::new(center.x + 40.0, center.y);
        for _ in 0..5 {
            clock.advance_ms(FRAME_MS);
            session.update(raw);
        }
        // Seed sample plus one moved sample, despite five frames.
        assert_eq!(session.path.len(), 2);

        clock.advance_ms(FRAME_MS);
        session.update(Point::new(center.x + 80.0, center.y));
        let times: Vec<u64> = session.path.iter().map(|s| s.elapsed_ms).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);
    }

    #[test]
    fn deviation_stays_inactive_below_the_threshold() {
        let (mut session, clock) = new_session(test_config());
        let center = session.config().circle_center;

        clock.advance_ms(FRAME_MS);
        let raw = Point::new(center.x + 17.0, center.y - 23.0);
        session.update(raw);
        assert!(!session.deviation_active());
        assert_eq!(session.effective_cursor(), raw);
    }

    #[test]
    fn deviation_activates_at_the_threshold_trial() {
        let config = SessionConfig {
            deviation_start_trial: 1,
            max_trials: 4,
            ..test_config()
        };
        let (mut session, clock) = new_session(config);
        let center = session.config().circle_center;

        drive_to_crossing(&mut session, &clock);
        clock.advance_ms(500);
        session.update(center);
        assert_eq!(session.trial_index(), 1);
        assert!(session.deviation_active());

        // A pure +x movement now renders rotated clockwise (downward on
        // screen with the +30° configured angle).
        clock.advance_ms(FRAME_MS);
        session.update(Point::new(center.x + 10.0, center.y));
        let eff = session.effective_cursor();
        assert!(eff.y > center.y);
        assert!((eff.distance_to(center) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_a_fresh_session() {
        let (mut session, clock) = new_session(test_config());
        drive_to_crossing(&mut session, &clock);
        assert_eq!(session.store().len(), 1);

        session.reset();
        assert_eq!(session.phase(), SessionPhase::Aiming);
        assert_eq!(session.trial_index(), 0);
        assert!(session.store().is_empty());
        assert!(session.ghost_target().is_none());
        assert_eq!(session.effective_cursor(), session.config().circle_center);
        assert!(!session.deviation_active());

        // The machine runs a full session again after the reset.
        let events = drive_to_crossing(&mut session, &clock);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Crossed { trial_index: 0, .. }]
        ));
    }

    #[test]
    fn end_to_end_two_trial_scenario() {
        let (mut session, clock) = new_session(test_config());
        let center = session.config().circle_center;

        let events = drive_to_crossing(&mut session, &clock);
        assert_eq!(events.len(), 1);
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.phase(), SessionPhase::ResultDisplay);

        // Not yet: 499 ms into the pause.
        clock.advance_ms(499);
        session.update(center);
        assert_eq!(session.phase(), SessionPhase::ResultDisplay);

        clock.advance_ms(1);
        session.update(center);
        assert_eq!(session.phase(), SessionPhase::Aiming);
        assert_eq!(session.trial_index(), 1);

        drive_to_crossing(&mut session, &clock);
        assert_eq!(session.store().len(), 2);

        clock.advance_ms(500);
        let events = session.update(center);
        assert_eq!(session.phase(), SessionPhase::Ended);
        assert!(events.contains(&SessionEvent::SessionEnded));
        assert_eq!(session.store().len(), 2);
    }
}
