use time::{macros::datetime, OffsetDateTime, PrimitiveDateTime};

/// Date/time the assistant platform reports when a date slot was never filled.
pub const UNSET_READING_DATE: PrimitiveDateTime = datetime!(0001-01-01 00:00:00);

/// A single equipment usage reading, validated and ready to submit.
///
/// Built fresh for every webhook request and dropped once the remote call
/// returns.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReadingSubmission {
    pub model_code: String,
    pub serial_number: String,
    pub uom: String,
    pub usage_reading: f64,
    pub reading_date: OffsetDateTime,
}

/// True when `ts` carries the unset sentinel in its own offset.
pub fn is_unset_reading_date(ts: OffsetDateTime) -> bool {
    PrimitiveDateTime::new(ts.date(), ts.time()) == UNSET_READING_DATE
}
