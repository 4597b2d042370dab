//! HTTP surface: the form page, the source-disclosure route, and the
//! compile endpoint.

pub mod compile;
mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::Html,
    routing::{get, post},
};

use crate::application::{license::LicenseGate, pipeline::RenderService};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared read-only request state. The gate is computed once at startup and
/// travels here explicitly; nothing recomputes it per request.
#[derive(Clone)]
pub struct HttpState {
    pub renderer: Arc<RenderService>,
    pub license: Arc<LicenseGate>,
}

pub fn build_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/source", get(source))
        .route("/compile", post(compile::compile))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum::middleware::from_fn(middleware::log_responses))
        .layer(axum::middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}

/// Serve the embedded form page with the crate version and the licensing
/// identity spliced in, so operators can derive their access code from the
/// page itself.
async fn index(State(state): State<HttpState>) -> Html<String> {
    Html(
        INDEX_HTML
            .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
            .replace("{{AUTH_BASE}}", state.license.identity()),
    )
}

async fn source() -> String {
    format!(
        "This service is open source. Full code:\n{}",
        env!("CARGO_PKG_REPOSITORY")
    )
}
