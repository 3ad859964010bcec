use std::collections::HashMap;
use std::collections::HashSet;

use crate::models::assessment::AssessmentConfig;
use crate::models::question::{normalized_text, Question, QuestionType};

/// Index-derived verbs that vary the templates so one (skill, type) pair
/// yields several distinct questions.
const MODIFIERS: [&str; 8] = [
    "implement", "design", "debug", "optimize", "refactor", "test", "scale", "secure",
];

/// Deterministic template-based generation, used whenever the AI path comes
/// up short. Enumerates (skill x modifier) combinations per question type in
/// a fixed order; once that space is exhausted it synthesizes numbered
/// variants, so the stream never runs dry.
pub struct FallbackGenerator<'a> {
    config: &'a AssessmentConfig,
    counters: HashMap<QuestionType, usize>,
}

impl<'a> FallbackGenerator<'a> {
    pub fn new(config: &'a AssessmentConfig) -> Self {
        Self {
            config,
            counters: HashMap::new(),
        }
    }

    /// Produces the next template question of the given type whose
    /// normalized text is not in `seen`, and claims its key. Total: always
    /// returns, for any requested count.
    pub fn next_unique(&mut self, question_type: QuestionType, seen: &mut HashSet<String>) -> Question {
        loop {
            let index = self.counters.entry(question_type).or_insert(0);
            let i = *index;
            *index += 1;

            let skills = &self.config.skills;
            let skill = &skills[i % skills.len()];
            let modifier = MODIFIERS[(i / skills.len()) % MODIFIERS.len()];
            let variant = i / (skills.len() * MODIFIERS.len());

            let mut text = template_text(question_type, skill, modifier, &self.config.role);
            if variant > 0 {
                text = format!("{} (variant {})", text, variant + 1);
            }

            let key = normalized_text(&text);
            if seen.insert(key) {
                return Question {
                    id: 0,
                    question_type,
                    text,
                    category: skill.clone(),
                    difficulty: self.config.proficiency,
                    sample_answer: Some(template_sample_answer(skill, modifier)),
                    explanation: Some(format!(
                        "Probes practical {} depth at the {} level.",
                        skill,
                        self.config.proficiency.label()
                    )),
                    resources: None,
                };
            }
        }
    }
}

fn template_text(question_type: QuestionType, skill: &str, modifier: &str, role: &str) -> String {
    match question_type {
        QuestionType::TechnicalCoding => format!(
            "Write a short program to {} a {} utility a {} would rely on, and walk through its complexity.",
            modifier, skill, role
        ),
        QuestionType::TechnicalConcepts => format!(
            "Explain the core {} concepts you would apply to {} a production feature.",
            skill, modifier
        ),
        QuestionType::SystemDesign => format!(
            "Design a high-traffic service around {}. How would you {} it for ten times the load?",
            skill, modifier
        ),
        QuestionType::Behavioral => format!(
            "Tell us about a time you had to {} a {} project under deadline pressure. What was the outcome?",
            modifier, skill
        ),
        QuestionType::ProblemSolving => format!(
            "A {} pipeline fails intermittently in production. Outline how you would {} it step by step.",
            skill, modifier
        ),
        QuestionType::CaseStudy => format!(
            "A client asks your team to {} their {} stack within one quarter. Walk through your plan and its risks.",
            modifier, skill
        ),
        QuestionType::Architecture => format!(
            "Sketch an architecture that uses {} as a core component. Where would you {} first, and why?",
            skill, modifier
        ),
        QuestionType::Debugging => format!(
            "A {} service regressed after a release. Describe how you would {} the faulty path.",
            skill, modifier
        ),
    }
}

fn template_sample_answer(skill: &str, modifier: &str) -> String {
    format!(
        "A strong answer states assumptions up front, shows concrete {} knowledge while explaining how to {} the problem, weighs at least one trade-off, and ends with how the result would be verified.",
        skill, modifier
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{AssessmentMode, Proficiency};

    fn config(skills: &[&str]) -> AssessmentConfig {
        AssessmentConfig {
            role: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            proficiency: Proficiency::Advanced,
            question_count: 10,
            question_types: vec![QuestionType::TechnicalCoding],
            mode: AssessmentMode::Evaluation,
        }
    }

    #[test]
    fn produces_unique_questions_in_fixed_order() {
        let cfg = config(&["Rust", "SQL"]);
        let mut gen = FallbackGenerator::new(&cfg);
        let mut seen = HashSet::new();

        let first: Vec<Question> = (0..6)
            .map(|_| gen.next_unique(QuestionType::TechnicalCoding, &mut seen))
            .collect();

        // Skills cycle fastest, then modifiers.
        assert_eq!(first[0].category, "Rust");
        assert_eq!(first[1].category, "SQL");
        assert!(first[0].text.contains("implement"));
        assert!(first[2].text.contains("design"));

        let keys: HashSet<String> = first.iter().map(|q| normalized_text(&q.text)).collect();
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn exhaustion_yields_numbered_variants() {
        // 1 skill x 8 modifiers = 8 base combinations per type.
        let cfg = config(&["Rust"]);
        let mut gen = FallbackGenerator::new(&cfg);
        let mut seen = HashSet::new();

        let questions: Vec<Question> = (0..20)
            .map(|_| gen.next_unique(QuestionType::Behavioral, &mut seen))
            .collect();

        let keys: HashSet<String> = questions.iter().map(|q| normalized_text(&q.text)).collect();
        assert_eq!(keys.len(), 20);
        assert!(questions[8].text.contains("(variant 2)"));
        assert!(questions[16].text.contains("(variant 3)"));
    }

    #[test]
    fn skips_keys_already_claimed_by_the_ai_pass() {
        let cfg = config(&["Rust"]);
        let mut gen = FallbackGenerator::new(&cfg);
        let mut seen = HashSet::new();
        seen.insert(normalized_text(&template_text(
            QuestionType::Debugging,
            "Rust",
            "implement",
            "Backend Engineer",
        )));

        let q = gen.next_unique(QuestionType::Debugging, &mut seen);
        assert!(q.text.contains("design"));
    }

    #[test]
    fn fallback_questions_carry_reveal_content() {
        let cfg = config(&["Rust"]);
        let mut gen = FallbackGenerator::new(&cfg);
        let mut seen = HashSet::new();
        let q = gen.next_unique(QuestionType::CaseStudy, &mut seen);
        assert!(q.sample_answer.is_some());
        assert!(q.explanation.is_some());
        assert_eq!(q.difficulty, Proficiency::Advanced);
    }
}
