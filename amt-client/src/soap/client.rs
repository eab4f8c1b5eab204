use std::{fmt, time::Duration};

use reqwest::header::CONTENT_TYPE;

use crate::{
    domain::UsageReadingOutcome,
    soap::{parse_response, ClientError, ProcessUsageReading},
};

/// The remote "process usage reading" operation.
///
/// Implemented by [`AssetStatisticClient`] for the live service; tests
/// substitute their own implementations.
#[async_trait::async_trait]
pub trait UsageReadingService: Send + Sync {
    async fn process_usage_reading(
        &self,
        request: &ProcessUsageReading,
    ) -> Result<UsageReadingOutcome, ClientError>;
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint_url: String,
    pub namespace: String,
    pub soap_action: Option<String>,
    pub credentials: Credentials,
    /// Falls back to reqwest's default (no timeout) when unset.
    pub timeout: Option<Duration>,
}

pub struct AssetStatisticClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl AssetStatisticClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            settings,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.settings.endpoint_url
    }
}

#[async_trait::async_trait]
impl UsageReadingService for AssetStatisticClient {
    async fn process_usage_reading(
        &self,
        request: &ProcessUsageReading,
    ) -> Result<UsageReadingOutcome, ClientError> {
        let body = request.to_soap_envelope(&self.settings.namespace)?;
        let soap_action = format!("\"{}\"", self.settings.soap_action.as_deref().unwrap_or(""));
        let creds = &self.settings.credentials;

        tracing::debug!(endpoint = %self.settings.endpoint_url, "sending ProcessUsageReading");

        let resp = self
            .http
            .post(&self.settings.endpoint_url)
            .basic_auth(&creds.username, Some(&creds.password))
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", soap_action)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        // SOAP 1.1 reports faults with HTTP 500, so look for a fault body first.
        match parse_response(&text) {
            Err(e @ ClientError::Fault { .. }) => Err(e),
            _ if !status.is_success() => Err(ClientError::Status(status)),
            parsed => parsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UsageReadingSubmission,
        soap::MessageDefaults,
    };
    use time::macros::datetime;
    use wiremock::{
        matchers::{basic_auth, body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const SUCCESS_BODY: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
        <ProcessUsageReadingResponse xmlns="urn:test"><ApplicationArea><Result>
        <ResultStatus>Success</ResultStatus></Result></ApplicationArea><DataArea/></ProcessUsageReadingResponse>
        </s:Body></s:Envelope>"#;

    fn settings(server: &MockServer) -> ClientSettings {
        ClientSettings {
            endpoint_url: format!("{}/AssetStatisticIntegrationService.svc", server.uri()),
            namespace: "urn:test".to_string(),
            soap_action: Some("urn:test/ProcessUsageReading".to_string()),
            credentials: Credentials {
                username: "svc-user".to_string(),
                password: "s3cret".to_string(),
            },
            timeout: Some(Duration::from_secs(5)),
        }
    }

    fn request() -> ProcessUsageReading {
        let submission = UsageReadingSubmission {
            model_code: "D6T".to_string(),
            serial_number: "GCT01234".to_string(),
            uom: "HR".to_string(),
            usage_reading: 10.0,
            reading_date: datetime!(2018-10-05 00:00:00 UTC),
        };
        ProcessUsageReading::for_submission(&submission, &MessageDefaults::default())
    }

    #[tokio::test]
    async fn posts_envelope_with_basic_auth_and_soap_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/AssetStatisticIntegrationService.svc"))
            .and(basic_auth("svc-user", "s3cret"))
            .and(header("SOAPAction", "\"urn:test/ProcessUsageReading\""))
            .and(body_string_contains("<SerialNumber>GCT01234</SerialNumber>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssetStatisticClient::new(settings(&server)).unwrap();
        let outcome = client.process_usage_reading(&request()).await.unwrap();
        assert_eq!(outcome, UsageReadingOutcome::Success);
    }

    #[tokio::test]
    async fn fault_with_http_500_surfaces_fault_string() {
        let server = MockServer::start().await;
        let fault = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault>
            <faultcode>s:Client</faultcode><faultstring>Access is denied.</faultstring>
            </s:Fault></s:Body></s:Envelope>"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string(fault))
            .mount(&server)
            .await;

        let client = AssetStatisticClient::new(settings(&server)).unwrap();
        let err = client.process_usage_reading(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Fault { .. }));
        assert_eq!(err.to_string(), "Access is denied.");
    }

    #[tokio::test]
    async fn non_soap_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = AssetStatisticClient::new(settings(&server)).unwrap();
        let err = client.process_usage_reading(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Status(s) if s.as_u16() == 401));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let server = MockServer::start().await;
        let mut s = settings(&server);
        drop(server);
        s.endpoint_url = "http://127.0.0.1:9/unreachable".to_string();

        let client = AssetStatisticClient::new(s).unwrap();
        let err = client.process_usage_reading(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let c = Credentials {
            username: "u".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{c:?}").contains("hunter2"));
    }
}
