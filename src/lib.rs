pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::assessment::AssessmentConfig;
use crate::ports::openai::OpenAiPort;
use crate::ports::{AnswerEvaluationPort, QuestionGenerationPort};
use crate::services::evaluation_service::AnswerEvaluator;
use crate::services::export_service::ResultsDocument;
use crate::services::generator_service::QuestionBankGenerator;
use crate::services::session_service::AssessmentSession;
use crate::services::timing::{Clock, SystemClock};

/// Installs the default tracing subscriber. For embedding binaries and
/// tests; safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Wires the generator and evaluator to their AI ports and a clock. One
/// engine can run many sessions; each session owns its own state.
#[derive(Clone)]
pub struct Engine {
    pub generator: QuestionBankGenerator,
    pub evaluator: AnswerEvaluator,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.ai_request_timeout_secs))
            .build()
            .unwrap();
        let port = Arc::new(OpenAiPort::new(config, http_client));

        Self {
            generator: QuestionBankGenerator::new(port.clone()),
            evaluator: AnswerEvaluator::new(port),
            clock: Arc::new(SystemClock),
        }
    }

    /// Alternate wiring for other providers, or for tests that inject fake
    /// ports and a manual clock.
    pub fn with_ports(
        generation_port: Arc<dyn QuestionGenerationPort>,
        evaluation_port: Arc<dyn AnswerEvaluationPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            generator: QuestionBankGenerator::new(generation_port),
            evaluator: AnswerEvaluator::new(evaluation_port),
            clock,
        }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Validates the configuration, generates the question set and starts
    /// the session. Generation is total; this fails only on an invalid
    /// configuration or an illegal double start.
    pub async fn start_session(&self, config: AssessmentConfig) -> Result<AssessmentSession> {
        let config = config.validated()?;
        let questions = self.generator.generate(&config).await;
        let mut session = AssessmentSession::new(config, questions);
        session.start(self.clock.now())?;
        Ok(session)
    }

    /// Drives the session timers once. Call periodically (e.g. once a
    /// second) from the embedding application.
    pub fn tick(&self, session: &mut AssessmentSession) -> Result<()> {
        session.tick(self.clock.now())
    }

    /// Finishes the session (if not already finished by a deadline),
    /// evaluates it and assembles the results document.
    pub async fn complete_session(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<ResultsDocument> {
        if session.state() != services::session_service::SessionState::Completed {
            session.finish(self.clock.now())?;
        }
        let records = session.answer_records()?;
        let evaluation = self
            .evaluator
            .evaluate(session.questions(), &records, session.config())
            .await;
        ResultsDocument::from_session(session, evaluation, self.clock.now())
    }
}
