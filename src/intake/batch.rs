//! The intake pipeline: normalize, deduplicate, create, route
//!
//! Batches are processed strictly sequentially with per-item isolation: one
//! malformed or failing submission is recorded in the result list and the
//! loop continues. Auto-assignment and the administrative notification are
//! best-effort; their failure never rolls back a created enquiry.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::{EnquirySource, NewEnquiry, RequestContext};
use crate::routing::{select_agent, RoutingContext, RoutingPolicy};

use super::dedup::{compose_source_ref, submission_marker, DedupWindow};
use super::normalize::{normalize_submission, SkipReason};
use super::payload::FormSubmission;
use super::store::{AdminNotifier, IntakeStore};

/// Per-item result of an intake pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Created {
        enquiry_id: Uuid,
        assigned_agent_id: Option<Uuid>,
    },
    AlreadySynced {
        enquiry_id: Uuid,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
    },
}

/// Outcome list plus counts for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<ItemOutcome>,
    pub created: usize,
    pub already_synced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let mut summary = BatchSummary {
            created: 0,
            already_synced: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        };
        for outcome in &outcomes {
            match outcome {
                ItemOutcome::Created { .. } => summary.created += 1,
                ItemOutcome::AlreadySynced { .. } => summary.already_synced += 1,
                ItemOutcome::Skipped { .. } => summary.skipped += 1,
                ItemOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }
}

/// Run one submission through the pipeline.
///
/// Storage failures surface as `Failed`; nothing escapes to the caller.
pub async fn process_submission(
    store: &dyn IntakeStore,
    submission: &FormSubmission,
    source: EnquirySource,
    window: DedupWindow,
) -> ItemOutcome {
    match try_process(store, submission, source, window).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, submission_id = ?submission.submission_id, "intake item failed");
            ItemOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

async fn try_process(
    store: &dyn IntakeStore,
    submission: &FormSubmission,
    source: EnquirySource,
    window: DedupWindow,
) -> Result<ItemOutcome> {
    let normalized = match normalize_submission(submission) {
        Ok(normalized) => normalized,
        Err(reason) => return Ok(ItemOutcome::Skipped { reason }),
    };

    // Already synced from this exact external submission?
    if let Some(id) = submission.submission_id.as_deref() {
        if let Some(existing) = store
            .find_by_submission_marker(&submission_marker(id))
            .await?
        {
            return Ok(ItemOutcome::AlreadySynced {
                enquiry_id: existing,
            });
        }
    }

    // Same contact, same source, close enough in time?
    let (lower, upper) = window.bounds(submission.submitted_at, Utc::now());
    if let Some(existing) = store
        .find_duplicate(&normalized.email, source, lower, upper)
        .await?
    {
        return Ok(ItemOutcome::AlreadySynced {
            enquiry_id: existing,
        });
    }

    let new = NewEnquiry {
        first_name: normalized.first_name,
        last_name: normalized.last_name,
        email: normalized.email,
        phone: normalized.phone,
        message: normalized.message,
        source,
        source_ref: compose_source_ref(
            normalized.source_url.as_deref(),
            submission.submission_id.as_deref(),
        ),
        created_at: submission.submitted_at,
    };
    let enquiry_id = store.insert_enquiry(&new).await?;

    // Best-effort: ownership routing must not fail the creation
    let assigned_agent_id = match route_and_assign(store, enquiry_id, RoutingPolicy::Capacity, None)
        .await
    {
        Ok(agent) => agent,
        Err(e) => {
            warn!(error = %e, %enquiry_id, "auto-assignment failed");
            None
        }
    };

    Ok(ItemOutcome::Created {
        enquiry_id,
        assigned_agent_id,
    })
}

/// Select an owner under `policy` and apply the assignment.
///
/// Returns the agent that now owns the enquiry, or `None` when no eligible
/// agents exist or the enquiry refused assignment (terminal state).
pub async fn route_and_assign(
    store: &dyn IntakeStore,
    enquiry_id: Uuid,
    policy: RoutingPolicy,
    country: Option<String>,
) -> Result<Option<Uuid>> {
    let candidates = store.candidate_agents().await?;
    let ctx = RoutingContext {
        last_assigned_agent: store.last_assigned_agent().await?,
        country,
    };
    let Some(agent_id) = select_agent(policy, &candidates, &ctx) else {
        return Ok(None);
    };
    if store.assign_enquiry(enquiry_id, agent_id).await? {
        Ok(Some(agent_id))
    } else {
        Ok(None)
    }
}

/// Process a batch of submissions sequentially and send one summary
/// notification for the whole pass.
pub async fn process_batch(
    store: &dyn IntakeStore,
    notifier: &dyn AdminNotifier,
    ctx: &RequestContext,
    submissions: &[FormSubmission],
    source: EnquirySource,
    window: DedupWindow,
) -> BatchSummary {
    let mut outcomes = Vec::with_capacity(submissions.len());
    for submission in submissions {
        outcomes.push(process_submission(store, submission, source, window).await);
    }
    let summary = BatchSummary::from_outcomes(outcomes);

    if summary.created > 0 || summary.skipped > 0 || summary.failed > 0 {
        let body = format!(
            "{} new enquiries created, {} already synced, {} skipped, {} failed (run by {})",
            summary.created, summary.already_synced, summary.skipped, summary.failed,
            ctx.display_name,
        );
        if let Err(e) = notifier
            .notify("enquiry_sync", "Website enquiry sync", &body, None)
            .await
        {
            warn!(error = %e, "admin notification failed");
        }
    }

    summary
}
