use std::sync::Arc;

use amt_client::{ClientError, MessageDefaults, ProcessUsageReading, UsageReadingOutcome, UsageReadingService};
use serde_json::{Map, Value};

use crate::{
    dialogflow::{WebhookRequest, WebhookResponse},
    display::{div, DisplaySink},
    intents::{params::{extract_submission, Reprompt}, IntentHandler},
};

/// Dialogflow display name of the intent this handler serves.
pub const INTENT: &str = "amt.recordusage";

pub const RECORDED: &str = "Usage Reading Recorded.";

#[derive(thiserror::Error, Debug)]
pub enum FulfillmentError {
    #[error(transparent)]
    Reprompt(#[from] Reprompt),
    #[error(transparent)]
    Remote(#[from] ClientError),
}

/// Text returned to the assistant for a service outcome.
pub fn fulfillment_text(outcome: &UsageReadingOutcome) -> String {
    match outcome {
        UsageReadingOutcome::Warning(message) => format!("Warning: {message}"),
        UsageReadingOutcome::Failure(message) => format!("Failure: {message}"),
        UsageReadingOutcome::Success => RECORDED.to_string(),
    }
}

fn display_text(outcome: &UsageReadingOutcome) -> &str {
    match outcome {
        UsageReadingOutcome::Warning(message) | UsageReadingOutcome::Failure(message) => message,
        UsageReadingOutcome::Success => RECORDED,
    }
}

/// Records an equipment usage reading with the asset statistic service.
pub struct RecordUsageHandler {
    service: Arc<dyn UsageReadingService>,
    display: Arc<dyn DisplaySink>,
    defaults: MessageDefaults,
}

impl RecordUsageHandler {
    pub fn new(service: Arc<dyn UsageReadingService>, display: Arc<dyn DisplaySink>, defaults: MessageDefaults) -> Self {
        Self {
            service,
            display,
            defaults,
        }
    }

    /// Validate, then make the single remote call. Nothing goes over the
    /// network unless every parameter is valid.
    pub async fn submit(&self, params: &Map<String, Value>) -> Result<UsageReadingOutcome, FulfillmentError> {
        let submission = extract_submission(params)?;
        let request = ProcessUsageReading::for_submission(&submission, &self.defaults);
        let outcome = self.service.process_usage_reading(&request).await?;
        Ok(outcome)
    }

    /// Run [`submit`](Self::submit) and turn whatever happens into a reply.
    pub async fn record(&self, params: &Map<String, Value>) -> WebhookResponse {
        match self.submit(params).await {
            Ok(outcome) => {
                let status = outcome.status();
                metrics::counter!("usage_reading_submissions_total", "status" => status.as_str()).increment(1);
                tracing::info!(%status, "usage reading submitted");

                self.display.show(&div(display_text(&outcome)));
                WebhookResponse::text(fulfillment_text(&outcome))
            }
            Err(e) => {
                match &e {
                    FulfillmentError::Reprompt(prompt) => {
                        metrics::counter!("usage_reading_reprompts_total", "parameter" => prompt.parameter())
                            .increment(1);
                        tracing::info!(parameter = prompt.parameter(), "re-prompting for parameter");
                    }
                    FulfillmentError::Remote(err) => {
                        metrics::counter!("usage_reading_remote_errors_total").increment(1);
                        tracing::error!(error = %err, "usage reading submission failed");
                    }
                }

                let text = e.to_string();
                let report = anyhow::Error::new(e);
                self.display.show(&div(&format!("{report:?}")));
                WebhookResponse::text(text)
            }
        }
    }
}

#[async_trait::async_trait]
impl IntentHandler for RecordUsageHandler {
    async fn handle(&self, request: &WebhookRequest) -> WebhookResponse {
        tracing::debug!(session = %request.session, "handling {INTENT}");
        self.record(request.parameters()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayLog;
    use amt_client::{AssetStatisticClient, ClientSettings, Credentials};
    use serde_json::json;
    use std::{sync::Mutex, time::Duration};

    enum Reply {
        Outcome(UsageReadingOutcome),
        Fault(&'static str),
    }

    struct FakeService {
        reply: Reply,
        calls: Mutex<Vec<ProcessUsageReading>>,
    }

    impl FakeService {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl UsageReadingService for FakeService {
        async fn process_usage_reading(
            &self,
            request: &ProcessUsageReading,
        ) -> Result<UsageReadingOutcome, ClientError> {
            self.calls.lock().unwrap().push(request.clone());
            match &self.reply {
                Reply::Outcome(o) => Ok(o.clone()),
                Reply::Fault(message) => Err(ClientError::Fault {
                    code: "s:Server".to_string(),
                    message: message.to_string(),
                }),
            }
        }
    }

    fn handler(service: Arc<FakeService>) -> (RecordUsageHandler, Arc<DisplayLog>) {
        let display = Arc::new(DisplayLog::new(10));
        let handler = RecordUsageHandler::new(service, display.clone(), MessageDefaults::default());
        (handler, display)
    }

    fn valid_params() -> Map<String, Value> {
        match json!({
            "modelCode": "D6T",
            "serialNumber": "GCT01234",
            "uom": "HR",
            "usageReading": 1200,
            "readingDate": "2018-10-05"
        }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn success_is_recorded() {
        let service = FakeService::new(Reply::Outcome(UsageReadingOutcome::Success));
        let (handler, display) = handler(service.clone());

        let resp = handler.record(&valid_params()).await;

        assert_eq!(resp.fulfillment_text, "Usage Reading Recorded.");
        assert_eq!(display.snapshot(), vec!["<div>Usage Reading Recorded.</div>"]);
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn warning_is_prefixed() {
        let service = FakeService::new(Reply::Outcome(UsageReadingOutcome::Warning("X".to_string())));
        let (handler, display) = handler(service);

        let resp = handler.record(&valid_params()).await;

        assert_eq!(resp.fulfillment_text, "Warning: X");
        assert_eq!(display.snapshot(), vec!["<div>X</div>"]);
    }

    #[tokio::test]
    async fn failure_is_prefixed() {
        let service = FakeService::new(Reply::Outcome(UsageReadingOutcome::Failure("Y".to_string())));
        let (handler, display) = handler(service);

        let resp = handler.record(&valid_params()).await;

        assert_eq!(resp.fulfillment_text, "Failure: Y");
        assert_eq!(display.snapshot(), vec!["<div>Y</div>"]);
    }

    #[tokio::test]
    async fn invalid_parameters_never_reach_the_service() {
        let service = FakeService::new(Reply::Outcome(UsageReadingOutcome::Success));
        let (handler, display) = handler(service.clone());

        let mut params = valid_params();
        params.insert("usageReading".to_string(), json!(0));
        let resp = handler.record(&params).await;

        assert_eq!(resp.fulfillment_text, "What is your reading? It should be greater than 0.");
        assert_eq!(service.call_count(), 0);
        assert_eq!(display.snapshot().len(), 1);
        assert!(display.snapshot()[0].contains("What is your reading?"));
    }

    #[tokio::test]
    async fn remote_error_text_is_surfaced() {
        let service = FakeService::new(Reply::Fault("The request channel timed out."));
        let (handler, display) = handler(service.clone());

        let resp = handler.record(&valid_params()).await;

        assert_eq!(resp.fulfillment_text, "The request channel timed out.");
        assert_eq!(service.call_count(), 1);
        assert!(display.snapshot()[0].starts_with("<div>The request channel timed out."));
    }

    #[tokio::test]
    async fn unreachable_service_error_text_is_surfaced() {
        let client = AssetStatisticClient::new(ClientSettings {
            endpoint_url: "http://127.0.0.1:9/AssetStatisticIntegrationService.svc".to_string(),
            namespace: "urn:test".to_string(),
            soap_action: None,
            credentials: Credentials {
                username: "svc-user".to_string(),
                password: "s3cret".to_string(),
            },
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap();

        let submission = extract_submission(&valid_params()).unwrap();
        let request = ProcessUsageReading::for_submission(&submission, &MessageDefaults::default());
        let expected = client.process_usage_reading(&request).await.unwrap_err();
        assert!(matches!(expected, ClientError::Transport(_)));

        let display = Arc::new(DisplayLog::new(10));
        let handler = RecordUsageHandler::new(Arc::new(client), display.clone(), MessageDefaults::default());
        let resp = handler.record(&valid_params()).await;

        assert_eq!(resp.fulfillment_text, expected.to_string());
        assert!(resp
            .fulfillment_text
            .starts_with("could not reach the asset statistic service"));
        assert_eq!(display.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn request_carries_validated_values() {
        let service = FakeService::new(Reply::Outcome(UsageReadingOutcome::Success));
        let (handler, _display) = handler(service.clone());

        handler.record(&valid_params()).await;

        let calls = service.calls.lock().unwrap();
        let reading = &calls[0].usage_readings[0];
        assert_eq!(reading.asset_id.model_code, "D6T");
        assert_eq!(reading.asset_id.serial_number, "GCT01234");
        assert_eq!(reading.meter_readings[0].uom_code, "HR");
        assert_eq!(reading.meter_readings[0].value, 1200.0);
        assert_eq!(reading.meter_readings[0].type_code, "C");
    }

    #[test]
    fn outcome_texts() {
        assert_eq!(fulfillment_text(&UsageReadingOutcome::Success), RECORDED);
        assert_eq!(fulfillment_text(&UsageReadingOutcome::Warning(String::new())), "Warning: ");
    }
}
