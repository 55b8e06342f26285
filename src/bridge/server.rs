//! Local HTTP endpoint fronting the content-script relay.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use super::messages::PageMessage;
use super::relay::{ContentScriptRelay, RelayOutcome};

/// Build the router: `POST /bridge` and `GET /health`
pub fn router(relay: Arc<ContentScriptRelay>) -> Router {
    let policy = relay.policy().clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(|o| policy.is_allowed(o))
        }))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/bridge", post(handle_bridge))
        .layer(cors)
        .with_state(relay)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, relay: Arc<ContentScriptRelay>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("bridge listening on http://{addr}");
    }
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_bridge(
    State(relay): State<Arc<ContentScriptRelay>>,
    headers: HeaderMap,
    Json(message): Json<PageMessage>,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());

    match relay.handle(origin, message).await {
        RelayOutcome::Reply(reply) => (StatusCode::OK, Json(reply)).into_response(),
        RelayOutcome::Rejected(reply) => (StatusCode::FORBIDDEN, Json(reply)).into_response(),
        RelayOutcome::Ignored => StatusCode::NO_CONTENT.into_response(),
    }
}
