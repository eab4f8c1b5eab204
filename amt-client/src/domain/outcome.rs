use std::fmt;

/// Result status carried in the service's `ApplicationArea/Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Warning,
    Failure,
}

impl ResultStatus {
    /// Parse the wire value. Unknown values are `None`; callers treat them as success.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim() {
            "Success" => Some(Self::Success),
            "Warning" => Some(Self::Warning),
            "Failure" => Some(Self::Failure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Failure => "Failure",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the service reported for a submitted reading.
///
/// Warning and failure are business outcomes, not transport errors. Whether a
/// warning still means the reading was stored is up to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageReadingOutcome {
    Success,
    Warning(String),
    Failure(String),
}

impl UsageReadingOutcome {
    pub fn from_status(status: ResultStatus, message: String) -> Self {
        match status {
            ResultStatus::Success => Self::Success,
            ResultStatus::Warning => Self::Warning(message),
            ResultStatus::Failure => Self::Failure(message),
        }
    }

    pub fn status(&self) -> ResultStatus {
        match self {
            Self::Success => ResultStatus::Success,
            Self::Warning(_) => ResultStatus::Warning,
            Self::Failure(_) => ResultStatus::Failure,
        }
    }
}
