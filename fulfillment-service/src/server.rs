use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, Response},
    routing::{get, post},
    Json, Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    dialogflow::{WebhookRequest, WebhookResponse},
    display::DisplayLog,
    intents::IntentRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<IntentRegistry>,
    pub display: Arc<DisplayLog>,
    pub auth_bearer_token: Option<Arc<str>>,
}

type HmacSha256 = Hmac<Sha256>;

pub fn router(state: AppState) -> Router {
    // The token check runs before the JSON body is read.
    let webhook = Router::new()
        .route("/webhook", post(fulfill))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(webhook)
        .route("/display", get(display_page))
        .with_state(state)
}

/// Bind `bind_addr` and serve until the listener fails.
pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind addr {bind_addr}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind webhook listener on {addr}"))?;
    tracing::info!(%addr, "webhook server listening");

    axum::serve(listener, router(state).into_make_service())
        .await
        .context("webhook server error")
}

/// Compare tokens through HMAC tags so the check takes the same time
/// wherever the first differing byte is.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (Ok(mut reference), Ok(mut candidate)) = (
        HmacSha256::new_from_slice(expected.as_bytes()),
        HmacSha256::new_from_slice(expected.as_bytes()),
    ) else {
        return false;
    };
    reference.update(expected.as_bytes());
    candidate.update(presented.as_bytes());
    candidate.verify_slice(&reference.finalize().into_bytes()).is_ok()
}

fn authorized(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| tokens_match(token, expected))
}

async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    metrics::counter!("webhook_requests_total").increment(1);

    if !authorized(state.auth_bearer_token.as_deref(), request.headers()) {
        metrics::counter!("webhook_unauthorized_total").increment(1);
        tracing::warn!("rejected webhook call with bad bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

async fn fulfill(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
    Json(state.registry.dispatch(&request).await)
}

async fn display_page(State(state): State<AppState>) -> Html<String> {
    Html(state.display.render_page())
}
