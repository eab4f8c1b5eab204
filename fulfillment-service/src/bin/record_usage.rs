use std::{env, fs, sync::Arc};

use amt_client::AssetStatisticClient;
use anyhow::{bail, Context, Result};
use fulfillment_service::{config::AppConfig, display::TracingDisplaySink, observability, RecordUsageHandler};
use serde_json::{Map, Value};

/// Submit one usage reading from a JSON file holding the webhook parameters,
/// e.g. `{"modelCode": "D6T", "serialNumber": "GCT01234", "uom": "HR",
/// "usageReading": 1200, "readingDate": "2018-10-05"}`.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: record_usage <params_json_path>");
    }
    let params_path = &args[1];

    // Load configuration (FULFILLMENT_CONFIG can point at another file).
    let cfg = AppConfig::load()?;

    let raw = fs::read_to_string(params_path).with_context(|| format!("reading {params_path}"))?;
    let params: Map<String, Value> =
        serde_json::from_str(&raw).with_context(|| format!("{params_path} is not a JSON object"))?;

    let client = AssetStatisticClient::new(cfg.client_settings()?)?;
    let handler = RecordUsageHandler::new(Arc::new(client), Arc::new(TracingDisplaySink), cfg.message_defaults.clone());

    let response = handler.record(&params).await;
    println!("{}", response.fulfillment_text);

    Ok(())
}
