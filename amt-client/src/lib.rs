pub mod domain;
pub mod soap;

pub use domain::{ResultStatus, UsageReadingOutcome, UsageReadingSubmission};
pub use soap::{AssetStatisticClient, ClientError, ClientSettings, Credentials, MessageDefaults, ProcessUsageReading, UsageReadingService};
