use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::answer::AnswerRecord;
use crate::models::assessment::{AssessmentConfig, Proficiency};
use crate::models::evaluation::{EvaluationResult, OutcomeBreakdown, QuestionOutcome};
use crate::models::question::{Question, QuestionType};
use crate::ports::{AnswerEvaluationPort, EvaluationRequest, EvaluationRequestItem};
use crate::services::scoring::{self, ScoredQuestion};

/// Outcome classification: sorted lower bounds over the per-question score.
/// Identical on the AI and heuristic paths. An empty answer is always
/// `unanswered`, before this table is consulted.
const OUTCOME_THRESHOLDS: [(u8, QuestionOutcome); 3] = [
    (70, QuestionOutcome::Correct),
    (40, QuestionOutcome::PartiallyCorrect),
    (0, QuestionOutcome::Incorrect),
];

/// Proficiency bands over the overall score, used by the heuristic path.
const PROFICIENCY_BANDS: [(u8, Proficiency); 4] = [
    (85, Proficiency::Expert),
    (65, Proficiency::Advanced),
    (40, Proficiency::Intermediate),
    (0, Proficiency::Beginner),
];

/// Heuristic per-question score by trimmed answer length: sorted
/// (lower bound, score) pairs, policy as data rather than control flow.
const LENGTH_SCORE_TABLE: [(usize, u8); 5] = [
    (600, 85),
    (300, 70),
    (120, 55),
    (40, 35),
    (1, 15),
];

const TECHNICAL_MARKER_BONUS: u8 = 10;

/// Tokens suggesting a structured, code-bearing answer.
const CODE_MARKERS: [&str; 8] = ["```", "fn ", "()", "{", ";", "def ", "class ", "SELECT"];

pub fn classify_score(score: u8, answered: bool) -> QuestionOutcome {
    if !answered {
        return QuestionOutcome::Unanswered;
    }
    OUTCOME_THRESHOLDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map(|(_, outcome)| *outcome)
        .unwrap_or(QuestionOutcome::Incorrect)
}

pub fn proficiency_for_score(score: u8) -> Proficiency {
    PROFICIENCY_BANDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map(|(_, p)| *p)
        .unwrap_or(Proficiency::Beginner)
}

/// Heuristic per-question score. Empty answers always score 0; technical
/// types get a bonus when the answer carries code-like structure.
pub fn heuristic_score(question: &Question, record: &AnswerRecord) -> u8 {
    if !record.is_answered() {
        return 0;
    }
    let answer = record.answer_text.trim();
    let base = LENGTH_SCORE_TABLE
        .iter()
        .find(|(bound, _)| answer.len() >= *bound)
        .map(|(_, score)| *score)
        .unwrap_or(0);

    let bonus = if question.question_type.is_technical()
        && CODE_MARKERS.iter().any(|m| answer.contains(m))
    {
        TECHNICAL_MARKER_BONUS
    } else {
        0
    };

    base.saturating_add(bonus).min(100)
}

/// What the AI evaluation port must return. `question_scores` is optional;
/// when absent, bucket classification uses the heuristic per-question score.
#[derive(Debug, Deserialize)]
struct AiEvaluationPayload {
    overall_score: i64,
    assessed_proficiency: Proficiency,
    category_scores: BTreeMap<String, i64>,
    type_scores: BTreeMap<String, i64>,
    #[serde(default)]
    question_scores: BTreeMap<String, i64>,
    feedback: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Produces the single evaluation document for a completed session. Total:
/// the AI path is validated strictly and any failure falls through to the
/// deterministic heuristic.
#[derive(Clone)]
pub struct AnswerEvaluator {
    port: Arc<dyn AnswerEvaluationPort>,
}

impl AnswerEvaluator {
    pub fn new(port: Arc<dyn AnswerEvaluationPort>) -> Self {
        Self { port }
    }

    pub async fn evaluate(
        &self,
        questions: &[Question],
        records: &[AnswerRecord],
        config: &AssessmentConfig,
    ) -> EvaluationResult {
        let request = build_request(questions, records, config);
        match self.port.evaluate_answers(&request).await {
            Ok(raw) => match parse_ai_result(&raw, questions, records) {
                Ok(result) => {
                    tracing::info!(overall = result.overall_score, "AI evaluation accepted");
                    return result;
                }
                Err(e) => {
                    tracing::error!(error = ?e, "AI evaluation payload rejected, using heuristic")
                }
            },
            Err(e) => tracing::error!(error = ?e, "AI evaluation call failed, using heuristic"),
        }
        heuristic_evaluate(questions, records)
    }
}

fn build_request(
    questions: &[Question],
    records: &[AnswerRecord],
    config: &AssessmentConfig,
) -> EvaluationRequest {
    let items = questions
        .iter()
        .map(|q| {
            let record = records.iter().find(|r| r.question_id == q.id);
            EvaluationRequestItem {
                question_id: q.id,
                question: q.text.clone(),
                question_type: q.question_type,
                category: q.category.clone(),
                sample_answer: q.sample_answer.clone(),
                candidate_answer: record.map(|r| r.answer_text.clone()).unwrap_or_default(),
                time_spent_seconds: record.map(|r| r.time_spent_seconds).unwrap_or(0),
            }
        })
        .collect();

    EvaluationRequest {
        role: config.role.clone(),
        proficiency: config.proficiency,
        items,
    }
}

fn parse_ai_result(
    raw: &JsonValue,
    questions: &[Question],
    records: &[AnswerRecord],
) -> Result<EvaluationResult> {
    let payload: AiEvaluationPayload = serde_json::from_value(raw.clone())?;

    let overall_score = checked_score(payload.overall_score, "overall_score")?;

    let mut category_scores = BTreeMap::new();
    for (category, score) in &payload.category_scores {
        category_scores.insert(category.clone(), checked_score(*score, category)?);
    }
    let mut type_scores = BTreeMap::new();
    for (type_str, score) in &payload.type_scores {
        let qt = QuestionType::parse(type_str)
            .ok_or_else(|| Error::Validation(format!("unknown question type: {}", type_str)))?;
        type_scores.insert(qt, checked_score(*score, type_str)?);
    }

    for q in questions {
        if !category_scores.contains_key(&q.category) {
            return Err(Error::Validation(format!(
                "category_scores is missing '{}'",
                q.category
            )));
        }
        if !type_scores.contains_key(&q.question_type) {
            return Err(Error::Validation(format!(
                "type_scores is missing '{}'",
                q.question_type.as_str()
            )));
        }
    }

    let mut question_scores: BTreeMap<u32, u8> = BTreeMap::new();
    for (id_str, score) in &payload.question_scores {
        let id: u32 = id_str
            .parse()
            .map_err(|_| Error::Validation(format!("bad question id: {}", id_str)))?;
        question_scores.insert(id, checked_score(*score, id_str)?);
    }

    let mut outcomes = OutcomeBreakdown::default();
    for q in questions {
        let record = records.iter().find(|r| r.question_id == q.id);
        let answered = record.map(AnswerRecord::is_answered).unwrap_or(false);
        let score = if !answered {
            0
        } else {
            question_scores.get(&q.id).copied().unwrap_or_else(|| {
                heuristic_score(q, record.unwrap_or(&AnswerRecord::skipped(q.id, 0)))
            })
        };
        outcomes.push(q.id, classify_score(score, answered));
    }

    Ok(EvaluationResult {
        overall_score,
        total_questions: questions.len() as u32,
        assessed_proficiency: payload.assessed_proficiency,
        category_scores,
        type_scores,
        feedback: payload.feedback,
        recommendations: payload.recommendations,
        outcomes,
    })
}

fn checked_score(value: i64, field: &str) -> Result<u8> {
    if !(0..=100).contains(&value) {
        return Err(Error::Validation(format!(
            "score for '{}' out of range: {}",
            field, value
        )));
    }
    Ok(value as u8)
}

/// Deterministic evaluation used whenever the AI path errs or fails
/// validation. Same outcome thresholds as the AI path.
pub fn heuristic_evaluate(questions: &[Question], records: &[AnswerRecord]) -> EvaluationResult {
    let mut scored = Vec::with_capacity(questions.len());
    let mut outcomes = OutcomeBreakdown::default();

    for q in questions {
        let fallback_record = AnswerRecord::skipped(q.id, 0);
        let record = records
            .iter()
            .find(|r| r.question_id == q.id)
            .unwrap_or(&fallback_record);
        let score = heuristic_score(q, record);
        outcomes.push(q.id, classify_score(score, record.is_answered()));
        scored.push(ScoredQuestion {
            question_id: q.id,
            category: q.category.clone(),
            question_type: q.question_type,
            score,
        });
    }

    let aggregates = scoring::aggregate(&scored);
    let assessed = proficiency_for_score(aggregates.overall);
    let feedback = build_feedback(aggregates.overall, &outcomes);
    let recommendations = build_recommendations(&aggregates.by_category, &outcomes);

    EvaluationResult {
        overall_score: aggregates.overall,
        total_questions: questions.len() as u32,
        assessed_proficiency: assessed,
        category_scores: aggregates.by_category,
        type_scores: aggregates.by_type,
        feedback,
        recommendations,
        outcomes,
    }
}

fn build_feedback(overall: u8, outcomes: &OutcomeBreakdown) -> String {
    format!(
        "Overall score {} out of 100: {} correct, {} partially correct, {} incorrect, {} unanswered.",
        overall,
        outcomes.correct.len(),
        outcomes.partially_correct.len(),
        outcomes.incorrect.len(),
        outcomes.unanswered.len()
    )
}

fn build_recommendations(
    by_category: &BTreeMap<String, u8>,
    outcomes: &OutcomeBreakdown,
) -> Vec<String> {
    let mut ranked: Vec<(&String, &u8)> = by_category.iter().collect();
    ranked.sort_by_key(|(_, score)| **score);

    let mut recommendations: Vec<String> = ranked
        .iter()
        .take(2)
        .filter(|(_, score)| **score < 70)
        .map(|(category, score)| {
            format!(
                "Strengthen {} fundamentals; this category averaged {} out of 100.",
                category, score
            )
        })
        .collect();

    if !outcomes.unanswered.is_empty() {
        recommendations.push(format!(
            "Practice pacing: {} question(s) went unanswered.",
            outcomes.unanswered.len()
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Keep practicing at a higher difficulty to consolidate this level.".to_string());
    }
    recommendations
}
