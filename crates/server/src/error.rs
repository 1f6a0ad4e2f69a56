use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur when running the RecallGuard server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener or reading the config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound event report could not be interpreted.
    #[error("invalid event: {0}")]
    Event(String),

    /// The event loop is no longer accepting events.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl From<toml::de::Error> for ServerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<recallguard_onebot::OneBotError> for ServerError {
    fn from(err: recallguard_onebot::OneBotError) -> Self {
        Self::Event(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Event(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
