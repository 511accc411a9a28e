//! Intake orchestration over the storage seam
//!
//! Entry points for the three intake paths: the single-event webhook, the
//! periodic CMS sync, and manual assignment from the UI. Every entry point
//! takes the authenticated caller explicitly as a [`RequestContext`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::intake::{
    parse_webhook_payload, process_batch, route_and_assign, AdminNotifier, BatchSummary,
    DedupWindow, FormSubmission, IntakeStore, ItemOutcome,
};
use crate::models::{Enquiry, EnquirySource, RequestContext};
use crate::routing::RoutingPolicy;
use crate::webforms::WebformsClient;

pub struct IntakeService {
    store: Arc<dyn IntakeStore>,
    notifier: Arc<dyn AdminNotifier>,
    webforms: Option<WebformsClient>,
    /// Form ids the periodic sync pulls from the CMS
    sync_form_ids: Vec<i32>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn IntakeStore>, notifier: Arc<dyn AdminNotifier>) -> Self {
        Self {
            store,
            notifier,
            webforms: None,
            sync_form_ids: Vec::new(),
        }
    }

    pub fn with_webforms(mut self, client: WebformsClient, form_ids: Vec<i32>) -> Self {
        self.webforms = Some(client);
        self.sync_form_ids = form_ids;
        self
    }

    /// Single-event webhook path (±60 second dedup window around the
    /// submission's own timestamp)
    pub async fn handle_webhook(
        &self,
        ctx: &RequestContext,
        payload: &Value,
    ) -> CrmResult<ItemOutcome> {
        let submission = parse_webhook_payload(payload, Utc::now())?;
        info!(
            caller = %ctx.display_name,
            form_id = ?submission.form_id,
            submission_id = ?submission.submission_id,
            "webhook submission received"
        );
        let mut summary = process_batch(
            self.store.as_ref(),
            self.notifier.as_ref(),
            ctx,
            std::slice::from_ref(&submission),
            EnquirySource::WebsiteForm,
            DedupWindow::AroundEvent,
        )
        .await;
        Ok(summary.outcomes.remove(0))
    }

    /// Periodic sync path: pull recent submissions for every configured
    /// form and run them through the batch engine (trailing 5-minute dedup
    /// window). Upstream failures surface to the caller and are not
    /// retried here.
    pub async fn run_sync(&self, ctx: &RequestContext) -> CrmResult<BatchSummary> {
        let client = self.webforms.as_ref().ok_or_else(|| {
            CrmError::upstream(0, "website-forms sync is not configured")
        })?;

        let mut submissions: Vec<FormSubmission> = Vec::new();
        for form_id in &self.sync_form_ids {
            let mut batch = client.list_submissions(*form_id, None).await?;
            info!(form_id, count = batch.len(), "fetched CMS submissions");
            submissions.append(&mut batch);
        }

        let summary = process_batch(
            self.store.as_ref(),
            self.notifier.as_ref(),
            ctx,
            &submissions,
            EnquirySource::WebsiteForm,
            DedupWindow::TrailingFromNow,
        )
        .await;

        info!(
            caller = %ctx.display_name,
            created = summary.created,
            already_synced = summary.already_synced,
            skipped = summary.skipped,
            failed = summary.failed,
            "enquiry sync finished"
        );
        Ok(summary)
    }

    /// Manual assignment from the UI: a chosen agent, or policy-based
    /// selection when none is given. Returns the owning agent, or `None`
    /// when no eligible agents exist or the enquiry refused assignment.
    pub async fn assign(
        &self,
        ctx: &RequestContext,
        enquiry_id: Uuid,
        agent_id: Option<Uuid>,
        policy: RoutingPolicy,
        country: Option<String>,
    ) -> CrmResult<Option<Uuid>> {
        let assigned = match agent_id {
            Some(agent_id) => {
                if self.store.assign_enquiry(enquiry_id, agent_id).await? {
                    Some(agent_id)
                } else {
                    None
                }
            }
            None => route_and_assign(self.store.as_ref(), enquiry_id, policy, country).await?,
        };

        match assigned {
            Some(agent) => info!(
                caller = %ctx.display_name, %enquiry_id, agent_id = %agent,
                "enquiry assigned"
            ),
            None => warn!(
                caller = %ctx.display_name, %enquiry_id,
                "enquiry left unassigned"
            ),
        }
        Ok(assigned)
    }

    pub async fn get_enquiry(&self, enquiry_id: Uuid) -> CrmResult<Option<Enquiry>> {
        Ok(self.store.get_enquiry(enquiry_id).await?)
    }

    pub async fn list_enquiries(&self, limit: i64) -> CrmResult<Vec<Enquiry>> {
        Ok(self.store.list_enquiries(limit).await?)
    }
}
