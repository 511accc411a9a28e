//! Duplicate suppression for inbound form submissions
//!
//! Two independent checks run before an enquiry row is created:
//!
//! 1. submission marker: an existing enquiry whose source reference contains
//!    `submission:<id>` means the external submission was already synced;
//! 2. email + source window: an existing enquiry with the same normalized
//!    email and source tag inside a time window means a duplicate delivery.
//!
//! The two intake paths use two independently evolved windows. They are
//! deliberately kept as distinct named policies; unifying them would be a
//! behavior change, not a refactor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Marker prefix embedded in `source_ref` for externally synced submissions
pub const SUBMISSION_MARKER_PREFIX: &str = "submission:";

/// Half-width of the symmetric window used by the webhook path
const WEBHOOK_WINDOW_SECS: i64 = 60;

/// Length of the trailing window used by the polling sync path
const SYNC_WINDOW_SECS: i64 = 300;

/// The duplicate-suppression window for one intake path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupWindow {
    /// ±60 seconds around the submission's own timestamp (webhook delivery)
    AroundEvent,
    /// The 5 minutes before now (periodic CMS sync)
    TrailingFromNow,
}

impl DedupWindow {
    /// Resolve the window to concrete `[lower, upper]` bounds
    pub fn bounds(
        &self,
        event_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            DedupWindow::AroundEvent => (
                event_time - Duration::seconds(WEBHOOK_WINDOW_SECS),
                event_time + Duration::seconds(WEBHOOK_WINDOW_SECS),
            ),
            DedupWindow::TrailingFromNow => (now - Duration::seconds(SYNC_WINDOW_SECS), now),
        }
    }
}

/// The `submission:<id>` marker stored in (and searched for in) `source_ref`
pub fn submission_marker(submission_id: &str) -> String {
    format!("{}{}", SUBMISSION_MARKER_PREFIX, submission_id)
}

/// Compose the stored source reference from the page URL and submission id.
///
/// `<url> | submission:<id>` when both are present, the marker alone when
/// only the id is present, the URL alone when only it is present, `None`
/// when neither is.
pub fn compose_source_ref(
    source_url: Option<&str>,
    submission_id: Option<&str>,
) -> Option<String> {
    match (source_url, submission_id) {
        (Some(url), Some(id)) => Some(format!("{} | {}", url, submission_marker(id))),
        (None, Some(id)) => Some(submission_marker(id)),
        (Some(url), None) => Some(url.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_source_ref_composition() {
        assert_eq!(
            compose_source_ref(Some("https://x.com/p"), Some("42")),
            Some("https://x.com/p | submission:42".to_string())
        );
        assert_eq!(
            compose_source_ref(None, Some("42")),
            Some("submission:42".to_string())
        );
        assert_eq!(
            compose_source_ref(Some("https://x.com/p"), None),
            Some("https://x.com/p".to_string())
        );
        assert_eq!(compose_source_ref(None, None), None);
    }

    #[test]
    fn test_around_event_window_is_symmetric() {
        let event = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let (lower, upper) = DedupWindow::AroundEvent.bounds(event, now);
        assert_eq!(lower, event - Duration::seconds(60));
        assert_eq!(upper, event + Duration::seconds(60));
    }

    #[test]
    fn test_trailing_window_ignores_event_time() {
        let event = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let (lower, upper) = DedupWindow::TrailingFromNow.bounds(event, now);
        assert_eq!(upper, now);
        assert_eq!(lower, now - Duration::seconds(300));
    }

    #[test]
    fn test_window_membership() {
        let event = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let (lower, upper) = DedupWindow::AroundEvent.bounds(event, event);

        // 30 seconds apart: inside the ±60 second window
        let near = event + Duration::seconds(30);
        assert!(near >= lower && near <= upper);

        // 10 minutes apart: outside
        let far = event + Duration::minutes(10);
        assert!(far > upper);
    }
}
