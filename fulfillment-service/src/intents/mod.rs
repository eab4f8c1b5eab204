pub mod params;
pub mod record_usage;

use std::{collections::HashMap, sync::Arc};

use crate::dialogflow::{WebhookRequest, WebhookResponse};

pub use record_usage::RecordUsageHandler;

#[async_trait::async_trait]
pub trait IntentHandler: Send + Sync {
    /// Always produces a response; failures are reported as fulfillment text.
    async fn handle(&self, request: &WebhookRequest) -> WebhookResponse;
}

/// Handlers keyed by Dialogflow intent display name.
#[derive(Default, Clone)]
pub struct IntentRegistry {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, intent: impl Into<String>, handler: Arc<dyn IntentHandler>) -> &mut Self {
        self.handlers.insert(intent.into(), handler);
        self
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub async fn dispatch(&self, request: &WebhookRequest) -> WebhookResponse {
        let Some(name) = request.intent_name() else {
            tracing::warn!(session = %request.session, "webhook request without intent");
            metrics::counter!("webhook_unknown_intent_total").increment(1);
            return WebhookResponse::text("Sorry, I can't help with that yet.");
        };

        match self.handlers.get(name) {
            Some(handler) => handler.handle(request).await,
            None => {
                tracing::warn!(intent = name, session = %request.session, "no handler for intent");
                metrics::counter!("webhook_unknown_intent_total").increment(1);
                WebhookResponse::text(format!("Sorry, I can't help with \"{name}\" yet."))
            }
        }
    }
}
