use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ports::{
    AnswerEvaluationPort, EvaluationRequest, GenerationRequest, QuestionGenerationPort,
};

/// OpenAI-backed implementation of both AI ports. Single outbound call per
/// request, explicit timeout, JSON-object response format.
#[derive(Clone)]
pub struct OpenAiPort {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiPort {
    pub fn new(config: &EngineConfig, client: Client) -> Self {
        Self {
            client,
            api_key: config.openai_api_key.clone(),
            model: config.ai_model.clone(),
            timeout: Duration::from_secs(config.ai_request_timeout_secs),
        }
    }

    async fn chat(&self, system_prompt: &str, user_content: String) -> Result<JsonValue> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        });

        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response format").into())
    }
}

const GENERATION_SYSTEM_PROMPT: &str = r#"You are a Senior Technical Recruiter and Engineering Manager.
Generate an interview question set for the role, company, skills and proficiency given by the user.

Rules:
1. Generate exactly the requested number of questions, honoring the per-type quotas.
2. Every question text MUST be unique; do not rephrase the same question twice.
3. 'type' must be one of: technical-coding, technical-concepts, system-design, behavioral,
   problem-solving, case-study, architecture, debugging.
4. 'category' must be one of the listed skills.
5. Include a concise 'sample_answer' and 'explanation' for each question.

Output a JSON object: {"questions": [{"question": "...", "type": "...", "category": "...",
"sample_answer": "...", "explanation": "..."}]}"#;

const EVALUATION_SYSTEM_PROMPT: &str = r#"You are a strict, unbiased technical interviewer grading a completed assessment.
The user supplies every question with its type, category, optional sample answer,
the candidate's answer and the time spent.

Rules:
1. All scores are integers from 0 to 100.
2. A question with an empty candidate answer scores 0.
3. 'category_scores' must contain an entry for every category present in the question set;
   'type_scores' likewise for every question type present.
4. 'assessed_proficiency' is one of: beginner, intermediate, advanced, expert.

Output a JSON object: {"overall_score": <0-100>, "assessed_proficiency": "...",
"category_scores": {"<category>": <0-100>}, "type_scores": {"<type>": <0-100>},
"question_scores": {"<question_id>": <0-100>}, "feedback": "...",
"recommendations": ["..."]}"#;

#[async_trait]
impl QuestionGenerationPort for OpenAiPort {
    async fn generate_questions(&self, request: &GenerationRequest) -> Result<JsonValue> {
        tracing::info!(
            target_count = request.target_count,
            role = %request.role,
            "Requesting AI question generation"
        );
        self.chat(GENERATION_SYSTEM_PROMPT, serde_json::to_string(request)?)
            .await
    }
}

#[async_trait]
impl AnswerEvaluationPort for OpenAiPort {
    async fn evaluate_answers(&self, request: &EvaluationRequest) -> Result<JsonValue> {
        tracing::info!(
            questions = request.items.len(),
            role = %request.role,
            "Requesting AI answer evaluation"
        );
        self.chat(EVALUATION_SYSTEM_PROMPT, serde_json::to_string(request)?)
            .await
    }
}
