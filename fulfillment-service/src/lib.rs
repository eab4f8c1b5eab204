pub mod config;
pub mod dialogflow;
pub mod display;
pub mod intents;
pub mod metrics_server;
pub mod observability;
pub mod server;

pub use dialogflow::{WebhookRequest, WebhookResponse};
pub use intents::{IntentHandler, IntentRegistry, RecordUsageHandler};
