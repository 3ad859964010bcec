use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

/// Engine-level settings, read once from the environment. Session-level
/// settings live in [`crate::models::assessment::AssessmentConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub openai_api_key: String,
    pub ai_model: String,
    pub ai_request_timeout_secs: u64,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            openai_api_key: get_env("OPENAI_API_KEY")?,
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            ai_request_timeout_secs: get_env_parse_or("AI_REQUEST_TIMEOUT_SECS", 60)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
