use thiserror::Error;

/// Central error type for the audio-fx-client crate.
#[derive(Debug, Error)]
pub enum FxError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("{0}")]
    Validation(String),

    #[error("{detail}")]
    Service { status: u16, detail: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Playback blocked: {0}")]
    PlaybackPolicy(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl FxError {
    /// HTTP status of a service failure, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FxError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for FxError {
    fn from(e: std::io::Error) -> Self {
        FxError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(e: serde_json::Error) -> Self {
        FxError::Anyhow(e.into())
    }
}

impl From<reqwest::Error> for FxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FxError::Transport(format!("request timed out: {e}"))
        } else {
            FxError::Transport(e.to_string())
        }
    }
}

impl From<toml::de::Error> for FxError {
    fn from(e: toml::de::Error) -> Self {
        FxError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
