//! Canonicalization of form submissions into the enquiry shape
//!
//! Maps a submission's `(field, value)` pairs through the form's alias
//! table, splits combined name fields, trims everything, lower-cases the
//! email, and rejects records that lack the required fields.

use serde::{Deserialize, Serialize};

use super::forms::{aliases_for, first_non_empty};
use super::payload::FormSubmission;

/// The canonical contact shape produced by intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEnquiry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source_url: Option<String>,
}

/// Why a submission could not become an enquiry. Reported as a distinct
/// outcome, never raised as an error that aborts a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingFirstName,
    MissingEmail,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingFirstName => write!(f, "missing first name"),
            SkipReason::MissingEmail => write!(f, "missing email"),
        }
    }
}

/// Split a combined full-name value on whitespace runs.
///
/// One token: that token is the first name and the last name is empty.
/// Otherwise the first token is the first name and the remaining tokens are
/// rejoined with single spaces as the last name.
pub fn split_full_name(full: &str) -> (String, String) {
    let mut tokens = full.split_whitespace();
    let first = tokens.next().unwrap_or("").to_string();
    let rest: Vec<&str> = tokens.collect();
    (first, rest.join(" "))
}

/// Map and normalize one submission into the canonical shape
pub fn normalize_submission(
    submission: &FormSubmission,
) -> Result<NormalizedEnquiry, SkipReason> {
    let aliases = aliases_for(submission.form_id);

    let mut first_name = first_non_empty(aliases.first_name, &submission.fields)
        .unwrap_or_default();
    let mut last_name =
        first_non_empty(aliases.last_name, &submission.fields).unwrap_or_default();
    let email = first_non_empty(aliases.email, &submission.fields)
        .unwrap_or_default()
        .to_lowercase();
    let phone = first_non_empty(aliases.phone, &submission.fields);
    let message = first_non_empty(aliases.message, &submission.fields);
    let source_url = first_non_empty(aliases.source_url, &submission.fields)
        .or_else(|| submission.page_url.clone());

    // A full name typed into (or mapped onto) the first-name slot with no
    // separate last-name value gets split here. Covers the callback form's
    // combined field and the unknown-form fallback path alike.
    if last_name.is_empty() && first_name.contains(char::is_whitespace) {
        let (first, last) = split_full_name(&first_name);
        first_name = first;
        last_name = last;
    }

    if first_name.is_empty() {
        return Err(SkipReason::MissingFirstName);
    }
    if email.is_empty() {
        return Err(SkipReason::MissingEmail);
    }

    Ok(NormalizedEnquiry {
        first_name,
        last_name,
        email,
        phone,
        message,
        source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn submission(form_id: Option<i32>, pairs: &[(&str, &str)]) -> FormSubmission {
        FormSubmission {
            form_id,
            submission_id: None,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            page_url: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(split_full_name("John"), ("John".to_string(), String::new()));
        assert_eq!(
            split_full_name("John Smith"),
            ("John".to_string(), "Smith".to_string())
        );
        assert_eq!(
            split_full_name("John Michael Smith"),
            ("John".to_string(), "Michael Smith".to_string())
        );
        assert_eq!(
            split_full_name("  John   Smith  "),
            ("John".to_string(), "Smith".to_string())
        );
    }

    #[test]
    fn test_form_two_mapping_lowercases_email() {
        let s = submission(
            Some(2),
            &[
                ("firstname", "Ayşe"),
                ("surname", "Yılmaz"),
                ("email", "AYSE@X.COM"),
            ],
        );
        let normalized = normalize_submission(&s).unwrap();
        assert_eq!(normalized.first_name, "Ayşe");
        assert_eq!(normalized.last_name, "Yılmaz");
        assert_eq!(normalized.email, "ayse@x.com");
    }

    #[test]
    fn test_combined_name_field_is_split() {
        let s = submission(
            Some(3),
            &[("full-name", "John Michael Smith"), ("email", "j@x.com")],
        );
        let normalized = normalize_submission(&s).unwrap();
        assert_eq!(normalized.first_name, "John");
        assert_eq!(normalized.last_name, "Michael Smith");
    }

    #[test]
    fn test_unknown_form_resplits_first_name_without_separate_surname() {
        let s = submission(None, &[("name", "Jane Roe"), ("email", "jane@x.com")]);
        let normalized = normalize_submission(&s).unwrap();
        assert_eq!(normalized.first_name, "Jane");
        assert_eq!(normalized.last_name, "Roe");
    }

    #[test]
    fn test_separate_surname_suppresses_resplit() {
        let s = submission(
            None,
            &[
                ("firstname", "Mary Ann"),
                ("surname", "Smith"),
                ("email", "m@x.com"),
            ],
        );
        let normalized = normalize_submission(&s).unwrap();
        assert_eq!(normalized.first_name, "Mary Ann");
        assert_eq!(normalized.last_name, "Smith");
    }

    #[test]
    fn test_missing_required_fields_reject_for_any_form() {
        for form_id in [Some(1), Some(2), Some(3), None] {
            let s = submission(form_id, &[("email", "x@y.com")]);
            assert_eq!(
                normalize_submission(&s),
                Err(SkipReason::MissingFirstName),
                "form {:?}",
                form_id
            );

            let s = submission(form_id, &[("firstname", "John"), ("first-name", "John"), ("full-name", "John")]);
            assert_eq!(
                normalize_submission(&s),
                Err(SkipReason::MissingEmail),
                "form {:?}",
                form_id
            );
        }
    }

    #[test]
    fn test_outputs_are_trimmed() {
        let s = submission(
            Some(1),
            &[
                ("first-name", "  John "),
                ("last-name", " Smith "),
                ("email", " J@X.COM "),
                ("phone", " +90 555 000 "),
            ],
        );
        let normalized = normalize_submission(&s).unwrap();
        assert_eq!(normalized.first_name, "John");
        assert_eq!(normalized.last_name, "Smith");
        assert_eq!(normalized.email, "j@x.com");
        assert_eq!(normalized.phone.as_deref(), Some("+90 555 000"));
    }

    proptest! {
        /// Splitting never loses tokens and never introduces empties beyond
        /// the single-token case.
        #[test]
        fn prop_split_preserves_tokens(name in "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,4}") {
            let (first, last) = split_full_name(&name);
            let original: Vec<&str> = name.split_whitespace().collect();
            let mut rebuilt = vec![first.as_str()];
            rebuilt.extend(last.split_whitespace());
            prop_assert_eq!(original, rebuilt);
        }
    }
}
