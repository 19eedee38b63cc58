use thiserror::Error;

/// Failure of a single fetch against the dashboard backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("session expired or missing credentials")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

impl FetchError {
    /// Message suitable for the inline error indicator of a view.
    pub fn display_message(&self) -> String {
        match self {
            FetchError::Server { status, message } => {
                let detail = serde_json::from_str::<serde_json::Value>(message)
                    .ok()
                    .and_then(|body| body.get("detail").and_then(|d| d.as_str()).map(String::from));
                match detail {
                    Some(detail) => format!("HTTP {status}: {detail}"),
                    None if message.is_empty() => format!("HTTP {status}"),
                    None => format!("HTTP {status}: {message}"),
                }
            }
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized)
    }
}
