//! Wire types for the website-forms CMS API

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::intake::FormSubmission;

/// Response envelope for the submissions listing endpoint
#[derive(Debug, Deserialize)]
pub struct SubmissionsResponse {
    pub data: Vec<SubmissionRecord>,
}

/// One stored form submission as the CMS returns it
#[derive(Debug, Deserialize)]
pub struct SubmissionRecord {
    pub id: IdValue,
    pub form: Option<i32>,
    #[serde(rename = "submissionData", default)]
    pub submission_data: Vec<FieldEntry>,
    #[serde(rename = "pageURL")]
    pub page_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One `(field, value)` pair inside a submission
#[derive(Debug, Deserialize)]
pub struct FieldEntry {
    pub field: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Submission ids arrive as strings or numbers depending on CMS version
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    String(String),
    Number(i64),
}

impl std::fmt::Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::String(s) => write!(f, "{}", s),
            IdValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl SubmissionRecord {
    /// Convert to the canonical intake shape. `fetched_at` stands in for a
    /// missing creation timestamp.
    pub fn into_form_submission(self, fetched_at: DateTime<Utc>) -> FormSubmission {
        let fields = self
            .submission_data
            .into_iter()
            .map(|entry| {
                let value = match entry.value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => String::new(),
                };
                (entry.field, value)
            })
            .collect();
        FormSubmission {
            form_id: self.form,
            submission_id: Some(self.id.to_string()),
            fields,
            page_url: self.page_url,
            submitted_at: self.created_at.unwrap_or(fetched_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_record_decoding_and_conversion() {
        let json = r#"{
            "id": 811,
            "form": 2,
            "submissionData": [
                {"field": "firstname", "value": "Ayşe"},
                {"field": "email", "value": "ayse@x.com"}
            ],
            "pageURL": "https://example.com/apartments",
            "createdAt": "2026-03-01T10:00:00Z"
        }"#;
        let record: SubmissionRecord = serde_json::from_str(json).unwrap();
        let submission = record.into_form_submission(Utc::now());
        assert_eq!(submission.form_id, Some(2));
        assert_eq!(submission.submission_id.as_deref(), Some("811"));
        assert_eq!(submission.fields.len(), 2);
        assert_eq!(
            submission.page_url.as_deref(),
            Some("https://example.com/apartments")
        );
    }

    #[test]
    fn test_missing_created_at_uses_fetch_time() {
        let json = r#"{"id": "abc", "form": null, "submissionData": []}"#;
        let record: SubmissionRecord = serde_json::from_str(json).unwrap();
        let fetched = Utc::now();
        let submission = record.into_form_submission(fetched);
        assert_eq!(submission.submitted_at, fetched);
        assert_eq!(submission.submission_id.as_deref(), Some("abc"));
    }
}
