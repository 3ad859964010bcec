use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::question::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    pub fn label(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
            Proficiency::Expert => "expert",
        }
    }
}

/// The three ways a session can be run. Learning and mock interviews reveal
/// the sample answer after a submit; a formal evaluation never does.
/// Learning sessions carry no deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentMode {
    Learning,
    MockInterview,
    Evaluation,
}

impl AssessmentMode {
    pub fn reveals_answers(&self) -> bool {
        matches!(self, AssessmentMode::Learning | AssessmentMode::MockInterview)
    }

    pub fn is_timed(&self) -> bool {
        !matches!(self, AssessmentMode::Learning)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssessmentConfig {
    #[validate(length(min = 1, message = "role must not be empty"))]
    pub role: String,
    pub company: String,
    #[validate(length(min = 1, message = "at least one skill is required"))]
    pub skills: Vec<String>,
    pub proficiency: Proficiency,
    #[validate(range(min = 5, max = 30, message = "question count must be between 5 and 30"))]
    pub question_count: u32,
    #[validate(length(min = 1, message = "at least one question type is required"))]
    pub question_types: Vec<QuestionType>,
    pub mode: AssessmentMode,
}

impl AssessmentConfig {
    /// Runs derive-level validation plus the duplicate checks the derive
    /// cannot express. The config is immutable once a session starts, so
    /// this is the single gate.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;

        for (i, skill) in self.skills.iter().enumerate() {
            if skill.trim().is_empty() {
                return Err(Error::Config("skills must not contain blank entries".to_string()));
            }
            if self.skills[..i].contains(skill) {
                return Err(Error::Config(format!("duplicate skill: {}", skill)));
            }
        }

        for (i, qt) in self.question_types.iter().enumerate() {
            if self.question_types[..i].contains(qt) {
                return Err(Error::Config(format!("duplicate question type: {:?}", qt)));
            }
        }

        Ok(self)
    }
}
