use amt_client::{domain::usage_reading::is_unset_reading_date, UsageReadingSubmission};
use serde_json::{Map, Value};
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime,
};

pub const MODEL_CODE: &str = "modelCode";
pub const SERIAL_NUMBER: &str = "serialNumber";
pub const UOM: &str = "uom";
pub const USAGE_READING: &str = "usageReading";
pub const READING_DATE: &str = "readingDate";

const LOCAL_DATE_TIMES: &[&[FormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];
const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// 2^96, one past the largest value the service's decimal `MeterReadingValue`
/// can hold. Readings must stay below it.
pub const USAGE_READING_LIMIT: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// A question put back to the user when a slot is missing or unusable.
///
/// The display text is shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Reprompt {
    #[error("What is the Model Code of your equipment?")]
    ModelCode,
    #[error("What is the Serial Number of your equipment?")]
    SerialNumber,
    #[error("What is your Unit of Measure?")]
    UnitOfMeasure,
    #[error("What is your reading? It should be greater than 0.")]
    UsageReading,
    #[error("What is your reading date? I don't get it. {0}")]
    UnparsableReadingDate(String),
    #[error("What is your reading date? I don't get it.")]
    UnsetReadingDate,
}

impl Reprompt {
    /// Parameter the prompt asks for, for logs and metric labels.
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::ModelCode => MODEL_CODE,
            Self::SerialNumber => SERIAL_NUMBER,
            Self::UnitOfMeasure => UOM,
            Self::UsageReading => USAGE_READING,
            Self::UnparsableReadingDate(_) | Self::UnsetReadingDate => READING_DATE,
        }
    }
}

fn string_param<'a>(params: &'a Map<String, Value>, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).map(str::trim).unwrap_or("")
}

fn required_string(params: &Map<String, Value>, key: &str, missing: Reprompt) -> Result<String, Reprompt> {
    match string_param(params, key) {
        "" => Err(missing),
        v => Ok(v.to_string()),
    }
}

/// Validate the five slots in order and build a submission.
///
/// Rules:
/// - model code, serial number and unit of measure must be non-blank strings.
/// - the reading must be a number strictly greater than zero and below
///   [`USAGE_READING_LIMIT`].
/// - the reading date must parse and must not be the unset sentinel.
pub fn extract_submission(params: &Map<String, Value>) -> Result<UsageReadingSubmission, Reprompt> {
    let model_code = required_string(params, MODEL_CODE, Reprompt::ModelCode)?;
    let serial_number = required_string(params, SERIAL_NUMBER, Reprompt::SerialNumber)?;
    let uom = required_string(params, UOM, Reprompt::UnitOfMeasure)?;

    let usage_reading = params.get(USAGE_READING).and_then(Value::as_f64).unwrap_or(0.0);
    // Written so NaN also fails.
    if !(usage_reading > 0.0 && usage_reading < USAGE_READING_LIMIT) {
        return Err(Reprompt::UsageReading);
    }

    let reading_date = parse_reading_date(string_param(params, READING_DATE))?;
    if is_unset_reading_date(reading_date) {
        return Err(Reprompt::UnsetReadingDate);
    }

    Ok(UsageReadingSubmission {
        model_code,
        serial_number,
        uom,
        usage_reading,
        reading_date,
    })
}

/// Parse a reading date in any of the shapes the assistant platform emits.
///
/// Values without an offset are taken as UTC.
pub fn parse_reading_date(raw: &str) -> Result<OffsetDateTime, Reprompt> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Reprompt::UnparsableReadingDate("No date was given.".to_string()));
    }

    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    for format in LOCAL_DATE_TIMES {
        if let Ok(ts) = PrimitiveDateTime::parse(raw, format) {
            return Ok(ts.assume_utc());
        }
    }
    match Date::parse(raw, DATE_ONLY) {
        Ok(date) => Ok(date.midnight().assume_utc()),
        Err(e) => {
            tracing::debug!(error = %e, raw, "reading date not recognised");
            Err(Reprompt::UnparsableReadingDate(format!(
                "\"{raw}\" is not a date I recognise."
            )))
        }
    }
}
