use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::assessment::AssessmentConfig;
use crate::models::question::{normalized_text, Question, QuestionType};
use crate::ports::{GenerationRequest, QuestionEnvelope, QuestionGenerationPort};
use crate::services::fallback::FallbackGenerator;

/// Turns a validated configuration into exactly N deduplicated questions.
/// The AI path is best-effort; any shortfall is covered by the deterministic
/// fallback, so `generate` is total.
#[derive(Clone)]
pub struct QuestionBankGenerator {
    port: Arc<dyn QuestionGenerationPort>,
}

impl QuestionBankGenerator {
    pub fn new(port: Arc<dyn QuestionGenerationPort>) -> Self {
        Self { port }
    }

    pub async fn generate(&self, config: &AssessmentConfig) -> Vec<Question> {
        let target = config.question_count as usize;
        let quotas = type_quotas(config);
        let mut accepted: Vec<Question> = Vec::with_capacity(target);
        let mut seen: HashSet<String> = HashSet::new();

        let request = build_request(config, &quotas);
        match self.port.generate_questions(&request).await {
            Ok(raw) => match QuestionEnvelope::decode(&raw) {
                Some(items) => {
                    for item in &items {
                        if accepted.len() >= target {
                            break;
                        }
                        if let Some(q) = coerce_candidate(item, config, accepted.len(), &mut seen) {
                            accepted.push(q);
                        }
                    }
                    tracing::info!(
                        accepted = accepted.len(),
                        target,
                        "AI generation pass finished"
                    );
                }
                None => {
                    tracing::error!("AI generation payload had no recognizable question array")
                }
            },
            Err(e) => {
                tracing::error!(error = ?e, "AI question generation failed, filling from fallback templates")
            }
        }

        if accepted.len() < target {
            fill_from_fallback(config, &quotas, &mut accepted, &mut seen);
        }

        for (idx, q) in accepted.iter_mut().enumerate() {
            q.id = idx as u32 + 1;
        }
        accepted
    }
}

/// Even split of N across the configured types, remainder to the earliest
/// types in configuration order.
pub fn type_quotas(config: &AssessmentConfig) -> Vec<(QuestionType, u32)> {
    let n = config.question_count;
    let k = config.question_types.len() as u32;
    let base = n / k;
    let remainder = n % k;

    config
        .question_types
        .iter()
        .enumerate()
        .map(|(i, qt)| (*qt, base + u32::from((i as u32) < remainder)))
        .collect()
}

fn build_request(config: &AssessmentConfig, quotas: &[(QuestionType, u32)]) -> GenerationRequest {
    GenerationRequest {
        role: config.role.clone(),
        company: config.company.clone(),
        skills: config.skills.clone(),
        proficiency: config.proficiency,
        type_quotas: quotas.iter().copied().collect::<BTreeMap<_, _>>(),
        target_count: config.question_count,
    }
}

/// Validates one AI candidate: non-empty text, a type from the fixed
/// enumeration, a category that is a configured skill (reassigned
/// round-robin otherwise), and a text not seen earlier in this pass.
fn coerce_candidate(
    item: &JsonValue,
    config: &AssessmentConfig,
    position: usize,
    seen: &mut HashSet<String>,
) -> Option<Question> {
    let text = item
        .get("question")
        .or_else(|| item.get("text"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let question_type = item
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(QuestionType::parse)?;

    if !seen.insert(normalized_text(text)) {
        return None;
    }

    let category = item
        .get("category")
        .and_then(|v| v.as_str())
        .filter(|c| config.skills.iter().any(|s| s == c))
        .map(str::to_string)
        .unwrap_or_else(|| config.skills[position % config.skills.len()].clone());

    Some(Question {
        id: 0,
        question_type,
        text: text.to_string(),
        category,
        difficulty: config.proficiency,
        sample_answer: item
            .get("sample_answer")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        explanation: item
            .get("explanation")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        resources: item.get("resources").and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        }),
    })
}

/// Covers the shortfall with template questions: per-type deficits first
/// (in configuration order), then round-robin across types until the count
/// is exact.
fn fill_from_fallback(
    config: &AssessmentConfig,
    quotas: &[(QuestionType, u32)],
    accepted: &mut Vec<Question>,
    seen: &mut HashSet<String>,
) {
    let target = config.question_count as usize;
    let mut fallback = FallbackGenerator::new(config);

    for (question_type, quota) in quotas {
        let have = accepted
            .iter()
            .filter(|q| q.question_type == *question_type)
            .count();
        for _ in have..(*quota as usize) {
            if accepted.len() >= target {
                return;
            }
            accepted.push(fallback.next_unique(*question_type, seen));
        }
    }

    // The AI pass may have overfilled some types; top up round-robin.
    let mut cycle = config.question_types.iter().cycle();
    while accepted.len() < target {
        let question_type = *cycle.next().unwrap_or(&config.question_types[0]);
        accepted.push(fallback.next_unique(question_type, seen));
    }
}
