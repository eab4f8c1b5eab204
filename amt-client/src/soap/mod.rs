pub mod client;
pub mod request;
pub mod response;

pub use client::{AssetStatisticClient, ClientSettings, Credentials, UsageReadingService};
pub use request::{MessageDefaults, ProcessUsageReading};
pub use response::parse_response;

/// Failure of a `ProcessUsageReading` call (SOAP 1.1 over HTTP basic auth).
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("could not reach the asset statistic service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("asset statistic service returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("{message}")]
    Fault { code: String, message: String },
    #[error("SOAP XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed response from asset statistic service: {0}")]
    Malformed(String),
    #[error("could not encode usage reading request: {0}")]
    Encode(String),
}
