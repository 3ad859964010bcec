pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation failure: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Config validation error: {0}")]
    ConfigValidation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures the engine recovers from internally via a fallback
    /// path (AI generation or evaluation problems). These are logged and
    /// never surfaced to the end user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Generation(_) | Error::Validation(_) | Error::Json(_) | Error::Reqwest(_)
        )
    }
}
