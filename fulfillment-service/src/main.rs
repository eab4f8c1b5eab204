use std::sync::Arc;

use amt_client::AssetStatisticClient;
use anyhow::Result;
use fulfillment_service::{
    config::AppConfig,
    display::DisplayLog,
    intents::{record_usage, IntentRegistry, RecordUsageHandler},
    metrics_server, observability,
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let client = AssetStatisticClient::new(cfg.client_settings()?)?;
    tracing::info!(endpoint = client.endpoint_url(), "asset statistic client ready");

    let display = Arc::new(DisplayLog::new(cfg.server.display_capacity()));

    let mut registry = IntentRegistry::new();
    registry.register(
        record_usage::INTENT,
        Arc::new(RecordUsageHandler::new(
            Arc::new(client),
            display.clone(),
            cfg.message_defaults.clone(),
        )),
    );
    tracing::info!(intents = ?registry.intents().collect::<Vec<_>>(), "intent handlers registered");

    let state = AppState {
        registry: Arc::new(registry),
        display,
        auth_bearer_token: cfg.server.auth_bearer_token.as_deref().map(Arc::from),
    };

    server::serve(&cfg.server.http_bind_addr, state).await
}
