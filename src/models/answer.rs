use serde::{Deserialize, Serialize};

/// One record per question per session. Empty `answer_text` means the
/// question was skipped or timed out, never that the record is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: u32,
    pub answer_text: String,
    pub time_spent_seconds: u32,
}

impl AnswerRecord {
    pub fn skipped(question_id: u32, time_spent_seconds: u32) -> Self {
        Self {
            question_id,
            answer_text: String::new(),
            time_spent_seconds,
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.answer_text.trim().is_empty()
    }
}
