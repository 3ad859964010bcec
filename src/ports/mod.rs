pub mod openai;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::assessment::Proficiency;
use crate::models::question::QuestionType;

/// Request handed to the generative service for a question set.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub role: String,
    pub company: String,
    pub skills: Vec<String>,
    pub proficiency: Proficiency,
    pub type_quotas: BTreeMap<QuestionType, u32>,
    pub target_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRequestItem {
    pub question_id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    pub candidate_answer: String,
    pub time_spent_seconds: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRequest {
    pub role: String,
    pub proficiency: Proficiency,
    pub items: Vec<EvaluationRequestItem>,
}

/// Outbound port for AI question generation. One call, explicit timeout,
/// no retries; the generator falls back on any `Err`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerationPort: Send + Sync {
    async fn generate_questions(&self, request: &GenerationRequest) -> Result<JsonValue>;
}

/// Outbound port for AI answer evaluation. Same failure contract as
/// [`QuestionGenerationPort`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerEvaluationPort: Send + Sync {
    async fn evaluate_answers(&self, request: &EvaluationRequest) -> Result<JsonValue>;
}

/// The generation payload is tolerated in three envelope shapes: a bare
/// array, `{"questions": [...]}` or `{"data": [...]}`. Decoded once here;
/// nothing past this point branches on the shape again.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuestionEnvelope {
    Questions { questions: Vec<JsonValue> },
    Data { data: Vec<JsonValue> },
    Bare(Vec<JsonValue>),
}

impl QuestionEnvelope {
    pub fn decode(raw: &JsonValue) -> Option<Vec<JsonValue>> {
        serde_json::from_value::<QuestionEnvelope>(raw.clone())
            .ok()
            .map(QuestionEnvelope::into_items)
    }

    pub fn into_items(self) -> Vec<JsonValue> {
        match self {
            QuestionEnvelope::Questions { questions } => questions,
            QuestionEnvelope::Data { data } => data,
            QuestionEnvelope::Bare(items) => items,
        }
    }
}
