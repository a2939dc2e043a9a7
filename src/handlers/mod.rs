mod chat;
mod generate;
mod health;
mod metrics;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::generation::LanguageModel;
use crate::proxy::Upstream;
use crate::state::SharedState;

pub use chat::{chat_handler, chat_preflight_handler};
pub use generate::{generate_handler, model_info_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;

pub fn router<M, U>(state: SharedState<M, U>) -> Router
where
    M: LanguageModel + 'static,
    U: Upstream + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/chat", post(chat_handler::<M, U>).options(chat_preflight_handler::<M, U>))
        .route("/api/generate", post(generate_handler::<M, U>))
        .route("/api/model", get(model_info_handler::<M, U>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
