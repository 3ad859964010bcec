use serde::{Deserialize, Serialize};

use crate::models::assessment::Proficiency;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    /// Always one of the configured skills.
    pub category: String,
    pub difficulty: Proficiency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    TechnicalCoding,
    TechnicalConcepts,
    SystemDesign,
    Behavioral,
    ProblemSolving,
    CaseStudy,
    Architecture,
    Debugging,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        QuestionType::TechnicalCoding,
        QuestionType::TechnicalConcepts,
        QuestionType::SystemDesign,
        QuestionType::Behavioral,
        QuestionType::ProblemSolving,
        QuestionType::CaseStudy,
        QuestionType::Architecture,
        QuestionType::Debugging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::TechnicalCoding => "technical-coding",
            QuestionType::TechnicalConcepts => "technical-concepts",
            QuestionType::SystemDesign => "system-design",
            QuestionType::Behavioral => "behavioral",
            QuestionType::ProblemSolving => "problem-solving",
            QuestionType::CaseStudy => "case-study",
            QuestionType::Architecture => "architecture",
            QuestionType::Debugging => "debugging",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Types whose answers are expected to contain structure (code, schemas,
    /// commands). The heuristic evaluator grants these a marker bonus.
    pub fn is_technical(&self) -> bool {
        matches!(
            self,
            QuestionType::TechnicalCoding
                | QuestionType::SystemDesign
                | QuestionType::Architecture
                | QuestionType::Debugging
        )
    }
}

/// Dedup key: lower-cased, whitespace-collapsed question text. Two questions
/// with the same key are considered identical across both generation paths.
pub fn normalized_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
