use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::AnswerRecord;
use crate::models::assessment::AssessmentConfig;
use crate::models::question::Question;
use crate::services::timing::{
    question_time_limit, TimerEvent, TimingController, SESSION_TIME_LIMIT_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Transition events for UI synchronization and collaborators such as the
/// invitation-status tracker. Accumulated on the session, drained with
/// [`AssessmentSession::take_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    QuestionAdvanced { index: usize },
    AnswerRecorded { question_id: u32 },
    QuestionDeadline { question_id: u32 },
    SessionDeadline,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved(usize),
    ReadyToFinish,
}

#[derive(Debug, Default)]
struct AnswerSlot {
    record: Option<AnswerRecord>,
    submitted: bool,
    revealed: bool,
    accumulated_secs: u32,
}

/// One complete assessment attempt. Owns its questions, answer records and
/// timers exclusively; nothing here is shared between sessions.
pub struct AssessmentSession {
    id: Uuid,
    config: AssessmentConfig,
    questions: Vec<Question>,
    slots: Vec<AnswerSlot>,
    state: SessionState,
    current: usize,
    timing: TimingController,
    events: Vec<SessionEvent>,
}

impl AssessmentSession {
    pub fn new(config: AssessmentConfig, questions: Vec<Question>) -> Self {
        let slots = questions.iter().map(|_| AnswerSlot::default()).collect();
        Self {
            id: Uuid::new_v4(),
            config,
            questions,
            slots,
            state: SessionState::NotStarted,
            current: 0,
            timing: TimingController::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.slots.get(index).map(|s| s.revealed).unwrap_or(false)
    }

    pub fn record_for(&self, question_id: u32) -> Option<&AnswerRecord> {
        self.slots
            .iter()
            .find_map(|s| s.record.as_ref().filter(|r| r.question_id == question_id))
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(Error::IllegalTransition(
                "session has already started".to_string(),
            ));
        }
        if self.questions.is_empty() {
            return Err(Error::IllegalTransition(
                "session has no questions".to_string(),
            ));
        }
        self.state = SessionState::InProgress;
        let session_limit = self
            .config
            .mode
            .is_timed()
            .then_some(SESSION_TIME_LIMIT_SECS);
        self.timing.start_session(session_limit, now);
        self.arm_current_question(now);
        self.events.push(SessionEvent::Started);
        self.events.push(SessionEvent::QuestionAdvanced { index: 0 });
        tracing::info!(session_id = %self.id, questions = self.questions.len(), "Session started");
        Ok(())
    }

    /// Records the current question's answer with its accumulated time.
    /// Illegal once the question already has a submission in this pass; a
    /// submit may overwrite an earlier skip record.
    pub fn submit(&mut self, answer_text: &str, now: DateTime<Utc>) -> Result<()> {
        self.ensure_in_progress("submit")?;
        if self.slots[self.current].submitted {
            return Err(Error::IllegalTransition(format!(
                "question {} already has a submission",
                self.current_question().id
            )));
        }

        let question_id = self.current_question().id;
        let time_spent = self.current_time_spent(now);
        let reveals = self.config.mode.reveals_answers();

        let slot = &mut self.slots[self.current];
        slot.record = Some(AnswerRecord {
            question_id,
            answer_text: answer_text.to_string(),
            time_spent_seconds: time_spent,
        });
        slot.submitted = true;
        slot.revealed = reveals;
        self.events.push(SessionEvent::AnswerRecorded { question_id });
        Ok(())
    }

    /// Explicit skip. Always legal while in progress; leaves an earlier
    /// submission untouched so a recorded answer is never discarded.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_in_progress("skip")?;
        let question_id = self.current_question().id;
        let time_spent = self.current_time_spent(now);

        let slot = &mut self.slots[self.current];
        if !slot.submitted {
            slot.record = Some(AnswerRecord::skipped(question_id, time_spent));
            self.events.push(SessionEvent::AnswerRecorded { question_id });
        }
        Ok(())
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> Result<NavOutcome> {
        self.ensure_in_progress("next")?;
        if self.current + 1 >= self.questions.len() {
            return Ok(NavOutcome::ReadyToFinish);
        }
        self.move_to(self.current + 1, now);
        Ok(NavOutcome::Moved(self.current))
    }

    pub fn previous(&mut self, now: DateTime<Utc>) -> Result<NavOutcome> {
        self.ensure_in_progress("previous")?;
        if self.current == 0 {
            return Err(Error::IllegalTransition(
                "already at the first question".to_string(),
            ));
        }
        self.move_to(self.current - 1, now);
        Ok(NavOutcome::Moved(self.current))
    }

    /// Voluntary finish: legal once every question has a record.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_in_progress("finish")?;
        if let Some(missing) = self.slots.iter().position(|s| s.record.is_none()) {
            return Err(Error::IllegalTransition(format!(
                "question {} has no answer record yet",
                self.questions[missing].id
            )));
        }
        self.complete(now);
        Ok(())
    }

    /// Drives the timers. A question deadline auto-skips and advances; the
    /// session deadline auto-skips everything still missing a record and
    /// forces completion. No-op outside `InProgress`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != SessionState::InProgress {
            return Ok(());
        }
        for event in self.timing.poll(now) {
            match event {
                TimerEvent::QuestionDeadline => self.on_question_deadline(now),
                TimerEvent::SessionDeadline => {
                    self.events.push(SessionEvent::SessionDeadline);
                    self.force_finish(now);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// All answer records in question order. Only available once completed;
    /// by then every question has exactly one record.
    pub fn answer_records(&self) -> Result<Vec<AnswerRecord>> {
        if self.state != SessionState::Completed {
            return Err(Error::IllegalTransition(
                "answer records are only final once the session completes".to_string(),
            ));
        }
        Ok(self
            .slots
            .iter()
            .zip(&self.questions)
            .map(|(slot, q)| {
                slot.record
                    .clone()
                    .unwrap_or_else(|| AnswerRecord::skipped(q.id, 0))
            })
            .collect())
    }

    fn on_question_deadline(&mut self, now: DateTime<Utc>) {
        let question_id = self.current_question().id;
        tracing::warn!(session_id = %self.id, question_id, "Question deadline reached, auto-skipping");
        self.events.push(SessionEvent::QuestionDeadline { question_id });

        let time_spent = self.current_time_spent(now);
        let slot = &mut self.slots[self.current];
        if slot.record.is_none() {
            slot.record = Some(AnswerRecord::skipped(question_id, time_spent));
            self.events.push(SessionEvent::AnswerRecorded { question_id });
        }

        if self.current + 1 < self.questions.len() {
            self.move_to(self.current + 1, now);
        } else {
            // Nowhere to advance; disarm so the deadline cannot refire.
            self.bank_current_time(now);
            self.timing.clear_question();
        }
    }

    fn force_finish(&mut self, now: DateTime<Utc>) {
        // The question in view keeps its live time, capped like any skip.
        let current_spent = self.current_time_spent(now);
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.record.is_none() {
                let question_id = self.questions[idx].id;
                slot.record = Some(AnswerRecord::skipped(
                    question_id,
                    if idx == self.current { current_spent } else { 0 },
                ));
                self.events.push(SessionEvent::AnswerRecorded { question_id });
            }
        }
        tracing::warn!(session_id = %self.id, "Session deadline reached, forcing finish");
        self.complete(now);
    }

    fn complete(&mut self, _now: DateTime<Utc>) {
        self.timing.stop();
        self.state = SessionState::Completed;
        self.events.push(SessionEvent::Completed);
        tracing::info!(session_id = %self.id, "Session completed");
    }

    fn move_to(&mut self, index: usize, now: DateTime<Utc>) {
        self.bank_current_time(now);
        self.current = index;
        self.arm_current_question(now);
        self.events.push(SessionEvent::QuestionAdvanced { index });
    }

    /// Arms the per-question countdown for the question in view. Questions
    /// that already hold a submission are not rearmed: their record is
    /// final, so a revisit must not trigger another deadline.
    fn arm_current_question(&mut self, now: DateTime<Utc>) {
        let limit = if self.config.mode.is_timed() && !self.slots[self.current].submitted {
            let q = &self.questions[self.current];
            Some(question_time_limit(q.question_type, q.difficulty))
        } else {
            None
        };
        self.timing.start_question(limit, now);
    }

    /// Folds the running per-question counter into the slot before the
    /// counter is reset by navigation.
    fn bank_current_time(&mut self, now: DateTime<Utc>) {
        let elapsed = self.timing.question_elapsed_secs(now);
        self.slots[self.current].accumulated_secs =
            self.slots[self.current].accumulated_secs.saturating_add(elapsed);
    }

    /// Accumulated time for the current question, capped at its limit.
    fn current_time_spent(&self, now: DateTime<Utc>) -> u32 {
        let total = self.slots[self.current]
            .accumulated_secs
            .saturating_add(self.timing.question_elapsed_secs(now));
        match self.timing.question_limit_secs() {
            Some(limit) => total.min(limit),
            None => total,
        }
    }

    fn ensure_in_progress(&self, action: &str) -> Result<()> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::NotStarted => Err(Error::IllegalTransition(format!(
                "cannot {} before the session starts",
                action
            ))),
            SessionState::Completed => Err(Error::IllegalTransition(format!(
                "cannot {} after the session completed",
                action
            ))),
        }
    }
}
