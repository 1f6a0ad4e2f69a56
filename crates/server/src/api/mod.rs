pub mod events;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use recallguard_shadow::{EventSender, RecallGuard};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Queue feeding the guard's event loop.
    pub sender: EventSender,
    /// The running guard, for counts and metrics.
    pub guard: Arc<RecallGuard>,
}

/// Build the Axum router: the OneBot event intake at `event_path` plus
/// health and metrics.
pub fn router(state: AppState, event_path: &str) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route(event_path, post(events::receive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
