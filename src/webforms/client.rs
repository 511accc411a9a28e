//! HTTP client for the website-forms CMS API

use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

use crate::error::{CrmError, CrmResult};
use crate::intake::FormSubmission;

use super::types::SubmissionsResponse;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct WebformsClient {
    client: Client,
    base_url: String,
}

impl WebformsClient {
    pub fn new(base_url: impl Into<String>) -> CrmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CrmError::upstream(0, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch submissions for one form, newest first, optionally only those
    /// created after `since`.
    pub async fn list_submissions(
        &self,
        form_id: i32,
        since: Option<DateTime<Utc>>,
    ) -> CrmResult<Vec<FormSubmission>> {
        let mut url = format!("{}/api/forms/{}/submissions", self.base_url, form_id);
        if let Some(since) = since {
            url.push_str(&format!("?since={}", since.to_rfc3339()));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CrmError::upstream(0, format!("CMS did not respond: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::upstream(
                status.as_u16(),
                body.chars().take(200).collect::<String>(),
            ));
        }

        let parsed: SubmissionsResponse = response
            .json()
            .await
            .map_err(|e| CrmError::upstream(status.as_u16(), format!("bad CMS payload: {}", e)))?;

        let fetched_at = Utc::now();
        Ok(parsed
            .data
            .into_iter()
            .map(|record| record.into_form_submission(fetched_at))
            .collect())
    }
}
