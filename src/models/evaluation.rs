use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::assessment::Proficiency;
use crate::models::question::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionOutcome {
    Correct,
    PartiallyCorrect,
    Incorrect,
    Unanswered,
}

/// The four disjoint outcome buckets. Together they partition the question
/// set: every question id appears in exactly one bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeBreakdown {
    pub correct: Vec<u32>,
    pub partially_correct: Vec<u32>,
    pub incorrect: Vec<u32>,
    pub unanswered: Vec<u32>,
}

impl OutcomeBreakdown {
    pub fn push(&mut self, question_id: u32, outcome: QuestionOutcome) {
        match outcome {
            QuestionOutcome::Correct => self.correct.push(question_id),
            QuestionOutcome::PartiallyCorrect => self.partially_correct.push(question_id),
            QuestionOutcome::Incorrect => self.incorrect.push(question_id),
            QuestionOutcome::Unanswered => self.unanswered.push(question_id),
        }
    }

    pub fn total(&self) -> usize {
        self.correct.len() + self.partially_correct.len() + self.incorrect.len() + self.unanswered.len()
    }

    pub fn outcome_of(&self, question_id: u32) -> Option<QuestionOutcome> {
        if self.correct.contains(&question_id) {
            Some(QuestionOutcome::Correct)
        } else if self.partially_correct.contains(&question_id) {
            Some(QuestionOutcome::PartiallyCorrect)
        } else if self.incorrect.contains(&question_id) {
            Some(QuestionOutcome::Incorrect)
        } else if self.unanswered.contains(&question_id) {
            Some(QuestionOutcome::Unanswered)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall_score: u8,
    pub total_questions: u32,
    pub assessed_proficiency: Proficiency,
    pub category_scores: BTreeMap<String, u8>,
    pub type_scores: BTreeMap<QuestionType, u8>,
    pub feedback: String,
    pub recommendations: Vec<String>,
    pub outcomes: OutcomeBreakdown,
}
