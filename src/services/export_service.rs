use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::AnswerRecord;
use crate::models::assessment::AssessmentConfig;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::Question;
use crate::services::session_service::{AssessmentSession, SessionState};

/// The flat, self-contained results document handed to the download /
/// persistence collaborator: configuration, questions, answers and the
/// evaluation in one JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub session_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub config: AssessmentConfig,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
    pub evaluation: EvaluationResult,
}

impl ResultsDocument {
    pub fn from_session(
        session: &AssessmentSession,
        evaluation: EvaluationResult,
        completed_at: DateTime<Utc>,
    ) -> Result<Self> {
        if session.state() != SessionState::Completed {
            return Err(Error::IllegalTransition(
                "cannot export results before the session completes".to_string(),
            ));
        }
        Ok(Self {
            session_id: session.id(),
            completed_at,
            config: session.config().clone(),
            questions: session.questions().to_vec(),
            answers: session.answer_records()?,
            evaluation,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
