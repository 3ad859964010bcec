use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use assessment_engine::error::{Error, Result};
use assessment_engine::models::assessment::{AssessmentConfig, AssessmentMode, Proficiency};
use assessment_engine::models::question::{normalized_text, QuestionType};
use assessment_engine::ports::{
    AnswerEvaluationPort, EvaluationRequest, GenerationRequest, QuestionGenerationPort,
};
use assessment_engine::services::session_service::SessionState;
use assessment_engine::services::timing::ManualClock;
use assessment_engine::Engine;

struct FailingGenerationPort;

#[async_trait]
impl QuestionGenerationPort for FailingGenerationPort {
    async fn generate_questions(&self, _request: &GenerationRequest) -> Result<JsonValue> {
        Err(Error::Generation("provider unavailable".to_string()))
    }
}

struct FailingEvaluationPort;

#[async_trait]
impl AnswerEvaluationPort for FailingEvaluationPort {
    async fn evaluate_answers(&self, _request: &EvaluationRequest) -> Result<JsonValue> {
        Err(Error::Generation("provider unavailable".to_string()))
    }
}

/// Returns a canned payload regardless of the request.
struct CannedEvaluationPort {
    payload: JsonValue,
}

#[async_trait]
impl AnswerEvaluationPort for CannedEvaluationPort {
    async fn evaluate_answers(&self, _request: &EvaluationRequest) -> Result<JsonValue> {
        Ok(self.payload.clone())
    }
}

fn offline_engine(clock: Arc<ManualClock>) -> Engine {
    Engine::with_ports(
        Arc::new(FailingGenerationPort),
        Arc::new(FailingEvaluationPort),
        clock,
    )
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new("2026-03-01T10:00:00Z".parse().unwrap()))
}

fn config(count: u32, types: Vec<QuestionType>, mode: AssessmentMode) -> AssessmentConfig {
    AssessmentConfig {
        role: "Backend Engineer".to_string(),
        company: "Acme".to_string(),
        skills: vec!["X".to_string()],
        proficiency: Proficiency::Intermediate,
        question_count: count,
        question_types: types,
        mode,
    }
}

#[tokio::test]
async fn generation_outage_still_yields_full_unique_set() {
    let engine = offline_engine(manual_clock());
    let cfg = config(
        10,
        vec![QuestionType::TechnicalCoding, QuestionType::Behavioral],
        AssessmentMode::Evaluation,
    );

    let session = engine.start_session(cfg).await.unwrap();
    let questions = session.questions();

    assert_eq!(questions.len(), 10);
    let keys: HashSet<String> = questions.iter().map(|q| normalized_text(&q.text)).collect();
    assert_eq!(keys.len(), 10);

    let coding = questions
        .iter()
        .filter(|q| q.question_type == QuestionType::TechnicalCoding)
        .count();
    let behavioral = questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Behavioral)
        .count();
    assert_eq!(coding, 5);
    assert_eq!(behavioral, 5);
}

#[tokio::test]
async fn full_offline_session_produces_consistent_results_document() {
    let clock = manual_clock();
    let engine = offline_engine(clock.clone());
    let cfg = config(
        6,
        vec![QuestionType::TechnicalConcepts, QuestionType::ProblemSolving],
        AssessmentMode::Evaluation,
    );

    let mut session = engine.start_session(cfg).await.unwrap();
    for i in 0..6 {
        if i % 3 == 2 {
            session.skip(engine.now()).unwrap();
        } else {
            clock.advance_secs(30);
            session
                .submit(
                    "A reasonably detailed answer describing trade-offs, the chosen approach and how the result would be verified in production.",
                    engine.now(),
                )
                .unwrap();
        }
        if i < 5 {
            session.next(engine.now()).unwrap();
        }
    }

    let document = engine.complete_session(&mut session).await.unwrap();

    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(document.answers.len(), 6);
    assert_eq!(document.evaluation.total_questions, 6);
    assert_eq!(document.evaluation.outcomes.total(), 6);
    assert_eq!(document.evaluation.outcomes.unanswered.len(), 2);

    // Every question id appears in exactly one bucket.
    for q in &document.questions {
        assert!(document.evaluation.outcomes.outcome_of(q.id).is_some());
    }

    // All scores bounded.
    assert!(document.evaluation.overall_score <= 100);
    assert!(document.evaluation.category_scores.values().all(|s| *s <= 100));
    assert!(document.evaluation.type_scores.values().all(|s| *s <= 100));

    // The document round-trips as JSON.
    let raw = document.to_json_string().unwrap();
    let parsed: JsonValue = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["evaluation"]["total_questions"], json!(6));
}

#[tokio::test]
async fn question_deadline_auto_skips_after_limit() {
    let clock = manual_clock();
    let engine = offline_engine(clock.clone());
    // ProblemSolving at intermediate difficulty carries a 300-second limit.
    let cfg = config(5, vec![QuestionType::ProblemSolving], AssessmentMode::MockInterview);

    let mut session = engine.start_session(cfg).await.unwrap();
    let first_id = session.current_question().id;

    clock.advance_secs(301);
    engine.tick(&mut session).unwrap();

    let record = session.record_for(first_id).unwrap();
    assert_eq!(record.answer_text, "");
    assert_eq!(record.time_spent_seconds, 300);
    assert_eq!(session.current_index(), 1);
}

#[tokio::test]
async fn session_ceiling_forces_finish_and_evaluation_covers_everything() {
    let clock = manual_clock();
    let engine = offline_engine(clock.clone());
    let cfg = config(
        10,
        vec![QuestionType::Behavioral],
        AssessmentMode::Evaluation,
    );

    let mut session = engine.start_session(cfg).await.unwrap();
    for _ in 0..7 {
        session.submit("An answer with enough substance to score.", engine.now()).unwrap();
        session.next(engine.now()).unwrap();
    }

    clock.advance_secs(3600);
    engine.tick(&mut session).unwrap();
    assert_eq!(session.state(), SessionState::Completed);

    let document = engine.complete_session(&mut session).await.unwrap();
    assert_eq!(document.evaluation.outcomes.unanswered.len(), 3);
    assert_eq!(document.evaluation.outcomes.total(), 10);
}

#[tokio::test]
async fn invalid_ai_evaluation_scores_fall_back_to_heuristic() {
    let clock = manual_clock();
    let evaluation_port = CannedEvaluationPort {
        payload: json!({
            "overall_score": 80,
            "assessed_proficiency": "advanced",
            "category_scores": {"X": 150},
            "type_scores": {"behavioral": 80},
            "feedback": "out of range",
            "recommendations": []
        }),
    };
    let engine = Engine::with_ports(
        Arc::new(FailingGenerationPort),
        Arc::new(evaluation_port),
        clock.clone(),
    );

    let cfg = config(5, vec![QuestionType::Behavioral], AssessmentMode::Evaluation);
    let mut session = engine.start_session(cfg).await.unwrap();
    for i in 0..5 {
        session.submit("A short answer.", engine.now()).unwrap();
        if i < 4 {
            session.next(engine.now()).unwrap();
        }
    }

    let document = engine.complete_session(&mut session).await.unwrap();

    assert_ne!(document.evaluation.feedback, "out of range");
    assert!(document.evaluation.overall_score <= 100);
    assert!(document.evaluation.category_scores.values().all(|s| *s <= 100));
    assert!(document.evaluation.type_scores.values().all(|s| *s <= 100));
    assert_eq!(document.evaluation.outcomes.total(), 5);
}

#[tokio::test]
async fn learning_mode_reveals_and_never_times_out() {
    let clock = manual_clock();
    let engine = offline_engine(clock.clone());
    let cfg = config(5, vec![QuestionType::TechnicalConcepts], AssessmentMode::Learning);

    let mut session = engine.start_session(cfg).await.unwrap();
    clock.advance_secs(10_000);
    engine.tick(&mut session).unwrap();
    assert_eq!(session.state(), SessionState::InProgress);

    session.submit("My attempt.", engine.now()).unwrap();
    assert!(session.is_revealed(0));
}
