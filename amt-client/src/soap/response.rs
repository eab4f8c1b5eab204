use quick_xml::{events::Event, Reader};

use crate::{
    domain::{ResultStatus, UsageReadingOutcome},
    soap::ClientError,
};

#[derive(Debug, Default)]
struct ResponseFields {
    saw_application_area: bool,
    status: Option<String>,
    result_message: Option<String>,
    data_message: Option<String>,
    fault_code: Option<String>,
    fault_string: Option<String>,
}

/// Parse a `ProcessUsageReadingResponse` envelope.
///
/// Element names are matched on their local part so any namespace prefixes
/// the service picks are accepted. A SOAP fault becomes `ClientError::Fault`.
/// The message comes from the first `DataArea` error message, falling back to
/// the one in `ApplicationArea/Result`.
pub fn parse_response(xml: &str) -> Result<UsageReadingOutcome, ClientError> {
    let fields = scan(xml)?;

    if fields.fault_code.is_some() || fields.fault_string.is_some() {
        return Err(ClientError::Fault {
            code: fields.fault_code.unwrap_or_default(),
            message: fields.fault_string.unwrap_or_default(),
        });
    }

    if !fields.saw_application_area {
        return Err(ClientError::Malformed(
            "response has no ApplicationArea".to_string(),
        ));
    }

    let status = match fields.status.as_deref() {
        None => ResultStatus::Success,
        Some(raw) => ResultStatus::from_wire(raw).unwrap_or_else(|| {
            tracing::warn!(status = raw, "unrecognised result status, treating as success");
            ResultStatus::Success
        }),
    };

    let message = fields
        .data_message
        .or(fields.result_message)
        .unwrap_or_default();

    Ok(UsageReadingOutcome::from_status(status, message))
}

fn scan(xml: &str) -> Result<ResponseFields, ClientError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut fields = ResponseFields::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "ApplicationArea" {
                    fields.saw_application_area = true;
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"ApplicationArea" {
                    fields.saw_application_area = true;
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                record_text(&mut fields, &path, text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                record_text(&mut fields, &path, text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

fn record_text(fields: &mut ResponseFields, path: &[String], text: String) {
    let Some(leaf) = path.last() else {
        return;
    };
    let parent = path.len().checked_sub(2).map(|i| path[i].as_str());
    let within = |name: &str| path.iter().any(|p| p == name);

    match leaf.as_str() {
        "ResultStatus" if parent == Some("Result") => {
            fields.status.get_or_insert(text);
        }
        "ErrorMessage" if within("DataArea") => {
            fields.data_message.get_or_insert(text);
        }
        "ErrorMessage" if within("ApplicationArea") => {
            fields.result_message.get_or_insert(text);
        }
        "faultcode" => {
            fields.fault_code.get_or_insert(text);
        }
        "faultstring" => {
            fields.fault_string.get_or_insert(text);
        }
        _ => {}
    }
}
