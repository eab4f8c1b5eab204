use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::{domain::UsageReadingSubmission, soap::ClientError};

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Values stamped on every `ProcessUsageReading` message: the sending
/// system in the header and the meter reading type code in the data area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageDefaults {
    pub sending_system_id: String,
    pub sending_system_name: String,
    pub reading_type_code: String,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            sending_system_id: "AMT".to_string(),
            sending_system_name: "Finning".to_string(),
            reading_type_code: "C".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessUsageReading {
    pub application_area: ApplicationArea,
    pub usage_readings: Vec<UsageReading>,
}

/// Message header. Only the sender and creation time carry data on the way
/// out; ids, reply-to and result are sent empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationArea {
    pub sending_system_id: String,
    pub sending_system_name: String,
    pub creation_date_time: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageReading {
    pub id: Uuid,
    pub asset_id: AssetId,
    pub meter_readings: Vec<MeterReading>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId {
    pub model_code: String,
    pub serial_number: String,
    pub registration_counter: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    pub id: Uuid,
    pub reading_date: OffsetDateTime,
    pub uom_code: String,
    pub value: f64,
    pub type_code: String,
}

impl ProcessUsageReading {
    /// Build the one-asset, one-reading message for a validated submission.
    ///
    /// Both record ids are fresh v4 UUIDs, so resubmitting the same reading
    /// creates a second record on the service side.
    pub fn for_submission(submission: &UsageReadingSubmission, defaults: &MessageDefaults) -> Self {
        Self {
            application_area: ApplicationArea {
                sending_system_id: defaults.sending_system_id.clone(),
                sending_system_name: defaults.sending_system_name.clone(),
                creation_date_time: OffsetDateTime::now_utc(),
            },
            usage_readings: vec![UsageReading {
                id: Uuid::new_v4(),
                asset_id: AssetId {
                    model_code: submission.model_code.clone(),
                    serial_number: submission.serial_number.clone(),
                    registration_counter: String::new(),
                },
                meter_readings: vec![MeterReading {
                    id: Uuid::new_v4(),
                    reading_date: submission.reading_date,
                    uom_code: submission.uom.clone(),
                    value: submission.usage_reading,
                    type_code: defaults.reading_type_code.clone(),
                }],
            }],
        }
    }

    /// Serialize as a SOAP 1.1 envelope with the BOD in `namespace`.
    pub fn to_soap_envelope(&self, namespace: &str) -> Result<String, ClientError> {
        let mut w = Writer::new(Vec::new());
        write_envelope(&mut w, self, namespace)?;
        String::from_utf8(w.into_inner()).map_err(|e| ClientError::Encode(e.to_string()))
    }
}

fn format_ts(ts: OffsetDateTime) -> Result<String, ClientError> {
    ts.format(&Rfc3339)
        .map_err(|e| ClientError::Encode(format!("invalid timestamp {ts}: {e}")))
}

fn open(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ClientError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ClientError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write `<name>value</name>`, or `<name/>` when the value is empty.
fn text_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), ClientError> {
    if value.is_empty() {
        w.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    open(w, name)?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    close(w, name)
}

fn write_envelope(
    w: &mut Writer<Vec<u8>>,
    req: &ProcessUsageReading,
    namespace: &str,
) -> Result<(), ClientError> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut envelope = BytesStart::new("s:Envelope");
    envelope.push_attribute(("xmlns:s", SOAP_ENVELOPE_NS));
    w.write_event(Event::Start(envelope))?;
    open(w, "s:Body")?;

    let mut op = BytesStart::new("ProcessUsageReading");
    op.push_attribute(("xmlns", namespace));
    w.write_event(Event::Start(op))?;

    write_application_area(w, &req.application_area)?;

    open(w, "DataArea")?;
    open(w, "Process")?;
    for reading in &req.usage_readings {
        write_usage_reading(w, reading)?;
    }
    close(w, "Process")?;
    close(w, "DataArea")?;

    close(w, "ProcessUsageReading")?;
    close(w, "s:Body")?;
    close(w, "s:Envelope")
}

fn write_application_area(w: &mut Writer<Vec<u8>>, area: &ApplicationArea) -> Result<(), ClientError> {
    open(w, "ApplicationArea")?;

    open(w, "Sender")?;
    text_element(w, "SendingSystemID", &area.sending_system_id)?;
    text_element(w, "SendingSystemName", &area.sending_system_name)?;
    close(w, "Sender")?;

    text_element(w, "CreationDateTime", &format_ts(area.creation_date_time)?)?;
    text_element(w, "MessageID", "")?;
    text_element(w, "CorrelationID", "")?;

    open(w, "ReplyTo")?;
    text_element(w, "QueueName", "")?;
    text_element(w, "TopicName", "")?;
    close(w, "ReplyTo")?;

    // Outbound messages always claim success; the service overwrites it.
    open(w, "Result")?;
    text_element(w, "ResultStatus", "Success")?;
    text_element(w, "ErrorCode", "")?;
    text_element(w, "ErrorMessage", "")?;
    close(w, "Result")?;

    close(w, "ApplicationArea")
}

fn write_usage_reading(w: &mut Writer<Vec<u8>>, reading: &UsageReading) -> Result<(), ClientError> {
    open(w, "UsageReading")?;
    text_element(w, "ID", &reading.id.to_string())?;

    open(w, "AssetID")?;
    text_element(w, "ModelCode", &reading.asset_id.model_code)?;
    text_element(w, "SerialNumber", &reading.asset_id.serial_number)?;
    text_element(w, "RegistrationCounter", &reading.asset_id.registration_counter)?;
    close(w, "AssetID")?;

    for meter in &reading.meter_readings {
        open(w, "MeterReading")?;
        text_element(w, "ID", &meter.id.to_string())?;
        text_element(w, "MeterReadingDate", &format_ts(meter.reading_date)?)?;
        text_element(w, "MeterUOMCode", &meter.uom_code)?;
        text_element(w, "MeterReadingValue", &meter.value.to_string())?;
        text_element(w, "MeterReadingTypeCode", &meter.type_code)?;
        close(w, "MeterReading")?;
    }

    close(w, "UsageReading")
}
