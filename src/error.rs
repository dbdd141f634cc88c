use thiserror::Error;

/// Every failure the gateway can produce.
///
/// Messages only ever name the *virtual* path that was requested, never the
/// backing-store location it was mapped to, so they are safe to put in a
/// response body as-is.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Storage not configured, cannot resolve {0}")]
    ConfigMissing(String),
    #[error("File not found: {path}")]
    NotFound { path: String },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Transport failure while fetching {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Control message rejected: {0}")]
    Control(String),
    #[error("Unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl GateError {
    /// HTTP-style status code this error is reported with.
    pub fn status(&self) -> u16 {
        match self {
            GateError::InvalidPath(_) => 400,
            GateError::ConfigMissing(_) | GateError::NotFound { .. } => 404,
            GateError::Decode(_)
            | GateError::Transport { .. }
            | GateError::Config(_)
            | GateError::Control(_)
            | GateError::Unexpected(_) => 500,
        }
    }
}

impl From<base64::DecodeError> for GateError {
    fn from(err: base64::DecodeError) -> Self {
        GateError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::Decode(err.to_string())
    }
}
