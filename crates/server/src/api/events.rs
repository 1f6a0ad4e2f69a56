use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, warn};

use recallguard_onebot::parse_event;

use super::AppState;
use crate::error::ServerError;

/// `POST {event_path}` -- accept a OneBot HTTP-POST event report.
///
/// Reports of interest are queued on the event loop; every other report is
/// acknowledged and dropped. Both answer `204 No Content`, which OneBot
/// treats as "no quick operation".
pub async fn receive(
    State(state): State<AppState>,
    Json(report): Json<serde_json::Value>,
) -> Result<StatusCode, ServerError> {
    let event = match parse_event(&report) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("ignoring unrelated event report");
            return Ok(StatusCode::NO_CONTENT);
        }
        Err(e) => {
            warn!(error = %e, "rejecting malformed event report");
            return Err(e.into());
        }
    };

    state
        .sender
        .send(event)
        .await
        .map_err(|e| ServerError::Unavailable(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
