//! Webhook payload decoding
//!
//! The website CMS has delivered form submissions in three shapes over
//! time. The decoder tries each shape in order and falls through to the
//! next whenever the current one yields zero fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrmError, CrmResult};

/// A form submission, decoded from any of the supported payload shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub form_id: Option<i32>,
    pub submission_id: Option<String>,
    /// Raw `(field, value)` pairs; field names are matched case-insensitively
    pub fields: Vec<(String, String)>,
    pub page_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Top-level keys recognized by the flat (shape 3) payload
const FLAT_FIELD_KEYS: &[&str] = &[
    "firstname",
    "surname",
    "email",
    "phone",
    "message",
    "full-name",
    "name",
];

/// Decode a webhook payload, trying the three known shapes in order:
///
/// 1. `{formId, submissionId, submissionData: [{field, value}], formTitle}`
/// 2. `{doc: {form, submissionData, id}}`
/// 3. a flat object with known top-level keys
pub fn parse_webhook_payload(
    payload: &Value,
    received_at: DateTime<Utc>,
) -> CrmResult<FormSubmission> {
    if let Some(submission) = try_envelope_shape(payload, received_at) {
        return Ok(submission);
    }
    if let Some(doc) = payload.get("doc") {
        if let Some(submission) = try_doc_shape(doc, received_at) {
            return Ok(submission);
        }
    }
    if let Some(submission) = try_flat_shape(payload, received_at) {
        return Ok(submission);
    }
    Err(CrmError::payload(
        "unrecognized form payload: no shape yielded any fields",
    ))
}

/// Shape 1: `{formId, submissionId, submissionData, formTitle}`
fn try_envelope_shape(payload: &Value, received_at: DateTime<Utc>) -> Option<FormSubmission> {
    let fields = field_pairs(payload.get("submissionData")?)?;
    if fields.is_empty() {
        return None;
    }
    Some(FormSubmission {
        form_id: int_value(payload.get("formId")),
        submission_id: string_value(payload.get("submissionId")),
        fields,
        page_url: string_value(payload.get("pageURL")),
        submitted_at: timestamp_value(payload.get("createdAt")).unwrap_or(received_at),
    })
}

/// Shape 2: `{doc: {form, submissionData, id}}`
fn try_doc_shape(doc: &Value, received_at: DateTime<Utc>) -> Option<FormSubmission> {
    let fields = field_pairs(doc.get("submissionData")?)?;
    if fields.is_empty() {
        return None;
    }
    Some(FormSubmission {
        form_id: int_value(doc.get("form")),
        submission_id: string_value(doc.get("id")),
        fields,
        page_url: string_value(doc.get("pageURL")),
        submitted_at: timestamp_value(doc.get("createdAt")).unwrap_or(received_at),
    })
}

/// Shape 3: flat object with known top-level keys
fn try_flat_shape(payload: &Value, received_at: DateTime<Utc>) -> Option<FormSubmission> {
    let object = payload.as_object()?;
    let mut fields = Vec::new();
    for key in FLAT_FIELD_KEYS {
        if let Some(value) = object.get(*key).and_then(scalar_to_string) {
            if !value.trim().is_empty() {
                fields.push((key.to_string(), value));
            }
        }
    }
    if fields.is_empty() {
        return None;
    }
    Some(FormSubmission {
        form_id: None,
        submission_id: string_value(object.get("submissionId")),
        fields,
        page_url: string_value(object.get("pageURL")),
        submitted_at: received_at,
    })
}

/// Decode a `[{field, value}]` array into `(field, value)` pairs
fn field_pairs(data: &Value) -> Option<Vec<(String, String)>> {
    let entries = data.as_array()?;
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.get("field").and_then(Value::as_str)?;
        let value = entry
            .get("value")
            .and_then(scalar_to_string)
            .unwrap_or_default();
        pairs.push((name.to_string(), value));
    }
    Some(pairs)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_value(value: Option<&Value>) -> Option<String> {
    value.and_then(scalar_to_string).filter(|s| !s.is_empty())
}

fn int_value(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n.as_i64().map(|n| n as i32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let payload = json!({
            "formId": 2,
            "submissionId": "abc123",
            "formTitle": "Property enquiry",
            "submissionData": [
                {"field": "firstname", "value": "Ayşe"},
                {"field": "email", "value": "ayse@x.com"}
            ]
        });
        let submission = parse_webhook_payload(&payload, Utc::now()).unwrap();
        assert_eq!(submission.form_id, Some(2));
        assert_eq!(submission.submission_id.as_deref(), Some("abc123"));
        assert_eq!(submission.fields.len(), 2);
    }

    #[test]
    fn test_envelope_shape_with_string_form_id() {
        let payload = json!({
            "formId": "3",
            "submissionId": 9912,
            "submissionData": [{"field": "name", "value": "John Smith"}]
        });
        let submission = parse_webhook_payload(&payload, Utc::now()).unwrap();
        assert_eq!(submission.form_id, Some(3));
        assert_eq!(submission.submission_id.as_deref(), Some("9912"));
    }

    #[test]
    fn test_doc_shape() {
        let payload = json!({
            "doc": {
                "form": 1,
                "id": "doc-55",
                "submissionData": [
                    {"field": "first-name", "value": "Jane"},
                    {"field": "email", "value": "jane@x.com"}
                ]
            }
        });
        let submission = parse_webhook_payload(&payload, Utc::now()).unwrap();
        assert_eq!(submission.form_id, Some(1));
        assert_eq!(submission.submission_id.as_deref(), Some("doc-55"));
    }

    #[test]
    fn test_flat_shape() {
        let payload = json!({
            "firstname": "John",
            "surname": "Smith",
            "email": "john@x.com",
            "pageURL": "https://example.com/villas"
        });
        let submission = parse_webhook_payload(&payload, Utc::now()).unwrap();
        assert_eq!(submission.form_id, None);
        assert_eq!(submission.page_url.as_deref(), Some("https://example.com/villas"));
        assert!(submission
            .fields
            .iter()
            .any(|(k, v)| k == "firstname" && v == "John"));
    }

    #[test]
    fn test_empty_submission_data_falls_through_to_flat_keys() {
        // An envelope with an empty submissionData array yields zero fields,
        // so the decoder falls back to the flat shape
        let payload = json!({
            "formId": 1,
            "submissionData": [],
            "email": "fallback@x.com",
            "name": "Fallback Fred"
        });
        let submission = parse_webhook_payload(&payload, Utc::now()).unwrap();
        assert_eq!(submission.form_id, None);
        assert_eq!(submission.fields.len(), 2);
    }

    #[test]
    fn test_unrecognized_payload_is_an_error() {
        let payload = json!({"unrelated": true});
        let err = parse_webhook_payload(&payload, Utc::now()).unwrap_err();
        assert!(matches!(err, CrmError::Payload { .. }));
    }

    #[test]
    fn test_created_at_overrides_received_time() {
        let received = Utc::now();
        let payload = json!({
            "formId": 2,
            "createdAt": "2026-03-01T10:00:00Z",
            "submissionData": [{"field": "email", "value": "a@b.com"}]
        });
        let submission = parse_webhook_payload(&payload, received).unwrap();
        assert_eq!(
            submission.submitted_at,
            DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z").unwrap()
        );
    }
}
