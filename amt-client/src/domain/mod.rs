pub mod outcome;
pub mod usage_reading;

pub use outcome::{ResultStatus, UsageReadingOutcome};
pub use usage_reading::UsageReadingSubmission;
