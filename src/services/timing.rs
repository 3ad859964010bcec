use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::models::assessment::Proficiency;
use crate::models::question::QuestionType;

/// Whole-session ceiling, fixed from session start.
pub const SESSION_TIME_LIMIT_SECS: u32 = 3600;

/// Injected time source. Sessions never read the wall clock directly, so
/// deadline behavior is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock advanced by hand. Used by tests and deterministic drivers.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Per-question limits in seconds, one row per question type, columns by
/// difficulty (beginner, intermediate, advanced, expert). A lookup table,
/// not a formula: longer-form types get more seconds.
const QUESTION_TIME_LIMITS: [(QuestionType, [u32; 4]); 8] = [
    (QuestionType::TechnicalCoding, [420, 480, 600, 720]),
    (QuestionType::TechnicalConcepts, [180, 210, 240, 300]),
    (QuestionType::SystemDesign, [360, 420, 540, 660]),
    (QuestionType::Behavioral, [150, 180, 210, 240]),
    (QuestionType::ProblemSolving, [240, 300, 360, 420]),
    (QuestionType::CaseStudy, [300, 360, 480, 600]),
    (QuestionType::Architecture, [300, 360, 480, 600]),
    (QuestionType::Debugging, [240, 300, 390, 480]),
];

pub fn question_time_limit(question_type: QuestionType, difficulty: Proficiency) -> u32 {
    let column = match difficulty {
        Proficiency::Beginner => 0,
        Proficiency::Intermediate => 1,
        Proficiency::Advanced => 2,
        Proficiency::Expert => 3,
    };
    QUESTION_TIME_LIMITS
        .iter()
        .find(|(qt, _)| *qt == question_type)
        .map(|(_, row)| row[column])
        .unwrap_or(300)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    QuestionDeadline,
    SessionDeadline,
}

/// Owned per-session timer state. Both countdowns are monotonic; each
/// deadline fires at most once per question instance / per session, and
/// nothing fires after [`TimingController::stop`].
#[derive(Debug, Default)]
pub struct TimingController {
    session_started_at: Option<DateTime<Utc>>,
    session_limit_secs: Option<u32>,
    question_started_at: Option<DateTime<Utc>>,
    question_limit_secs: Option<u32>,
    question_fired: bool,
    session_fired: bool,
    stopped: bool,
}

impl TimingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the session clock. `limit_secs` of `None` means the session
    /// has no ceiling (learning mode); elapsed time is still tracked.
    pub fn start_session(&mut self, limit_secs: Option<u32>, now: DateTime<Utc>) {
        self.session_started_at = Some(now);
        self.session_limit_secs = limit_secs;
    }

    /// Arms the per-question countdown. `limit_secs` of `None` means the
    /// question is untimed (learning mode); elapsed time is still tracked.
    pub fn start_question(&mut self, limit_secs: Option<u32>, now: DateTime<Utc>) {
        self.question_started_at = Some(now);
        self.question_limit_secs = limit_secs;
        self.question_fired = false;
    }

    /// Disarms the question countdown without rearming, e.g. after the last
    /// question was auto-skipped and there is nowhere left to advance.
    pub fn clear_question(&mut self) {
        self.question_started_at = None;
        self.question_limit_secs = None;
    }

    pub fn question_limit_secs(&self) -> Option<u32> {
        self.question_limit_secs
    }

    pub fn question_elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        elapsed_secs(self.question_started_at, now)
    }

    pub fn session_elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        elapsed_secs(self.session_started_at, now)
    }

    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if self.stopped {
            return events;
        }

        if !self.question_fired {
            if let (Some(_), Some(limit)) = (self.question_started_at, self.question_limit_secs) {
                if self.question_elapsed_secs(now) >= limit {
                    self.question_fired = true;
                    events.push(TimerEvent::QuestionDeadline);
                }
            }
        }

        if !self.session_fired {
            if let (Some(_), Some(limit)) = (self.session_started_at, self.session_limit_secs) {
                if self.session_elapsed_secs(now) >= limit {
                    self.session_fired = true;
                    events.push(TimerEvent::SessionDeadline);
                }
            }
        }

        events
    }

    /// Teardown on completion or abandonment. No event fires afterwards.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.clear_question();
    }
}

fn elapsed_secs(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    match started_at {
        Some(start) => (now - start).num_seconds().max(0) as u32,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2026-01-01T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn limits_grow_with_difficulty() {
        for qt in QuestionType::ALL {
            let row: Vec<u32> = [
                Proficiency::Beginner,
                Proficiency::Intermediate,
                Proficiency::Advanced,
                Proficiency::Expert,
            ]
            .iter()
            .map(|p| question_time_limit(qt, *p))
            .collect();
            assert!(row.windows(2).all(|w| w[0] <= w[1]), "{:?}: {:?}", qt, row);
        }
    }

    #[test]
    fn coding_gets_more_time_than_behavioral() {
        assert!(
            question_time_limit(QuestionType::TechnicalCoding, Proficiency::Intermediate)
                > question_time_limit(QuestionType::Behavioral, Proficiency::Intermediate)
        );
    }

    #[test]
    fn question_deadline_fires_once() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());
        timing.start_question(Some(300), clock.now());

        clock.advance_secs(299);
        assert!(timing.poll(clock.now()).is_empty());

        clock.advance_secs(1);
        assert_eq!(timing.poll(clock.now()), vec![TimerEvent::QuestionDeadline]);

        clock.advance_secs(100);
        assert!(timing.poll(clock.now()).is_empty());
    }

    #[test]
    fn question_deadline_rearms_per_instance() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());
        timing.start_question(Some(60), clock.now());

        clock.advance_secs(61);
        assert_eq!(timing.poll(clock.now()).len(), 1);

        timing.start_question(Some(60), clock.now());
        assert!(timing.poll(clock.now()).is_empty());
        clock.advance_secs(60);
        assert_eq!(timing.poll(clock.now()), vec![TimerEvent::QuestionDeadline]);
    }

    #[test]
    fn session_deadline_fires_once_at_ceiling() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());

        clock.advance_secs(3599);
        assert!(timing.poll(clock.now()).is_empty());
        clock.advance_secs(1);
        assert_eq!(timing.poll(clock.now()), vec![TimerEvent::SessionDeadline]);
        clock.advance_secs(500);
        assert!(timing.poll(clock.now()).is_empty());
    }

    #[test]
    fn unlimited_session_never_reaches_a_ceiling() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(None, clock.now());
        timing.start_question(None, clock.now());

        clock.advance_secs(10_000);
        assert!(timing.poll(clock.now()).is_empty());
        assert_eq!(timing.session_elapsed_secs(clock.now()), 10_000);
    }

    #[test]
    fn both_deadlines_can_fire_in_one_poll() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());
        timing.start_question(Some(120), clock.now());

        clock.advance_secs(3600);
        let events = timing.poll(clock.now());
        assert!(events.contains(&TimerEvent::QuestionDeadline));
        assert!(events.contains(&TimerEvent::SessionDeadline));
    }

    #[test]
    fn untimed_question_never_fires() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());
        timing.start_question(None, clock.now());

        clock.advance_secs(3000);
        assert!(timing.poll(clock.now()).is_empty());
        assert_eq!(timing.question_elapsed_secs(clock.now()), 3000);
    }

    #[test]
    fn nothing_fires_after_stop() {
        let clock = ManualClock::new(t0());
        let mut timing = TimingController::new();
        timing.start_session(Some(SESSION_TIME_LIMIT_SECS), clock.now());
        timing.start_question(Some(10), clock.now());
        timing.stop();

        clock.advance_secs(4000);
        assert!(timing.poll(clock.now()).is_empty());
    }
}
