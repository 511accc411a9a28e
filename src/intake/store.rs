//! Storage and notification seams consumed by the intake pipeline
//!
//! The surrounding application owns persistence; the pipeline only needs
//! the handful of queries captured by [`IntakeStore`]. The Postgres
//! implementation lives in `crate::database` behind the `database` feature;
//! [`MemoryStore`] backs the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{CandidateAgent, Enquiry, EnquirySource, EnquiryStatus, NewEnquiry};

/// Data-store contract consumed by routing and intake
#[async_trait]
pub trait IntakeStore: Send + Sync {
    /// Active agents with a routable sales role, annotated with open-lead
    /// and open-enquiry counts, sorted by `agent_id`
    async fn candidate_agents(&self) -> Result<Vec<CandidateAgent>>;

    /// Assignee of the most recently updated enquiry that has one
    async fn last_assigned_agent(&self) -> Result<Option<Uuid>>;

    /// Existing enquiry whose source reference contains the marker
    async fn find_by_submission_marker(&self, marker: &str) -> Result<Option<Uuid>>;

    /// Existing enquiry with the same email and source created inside
    /// `[lower, upper]`
    async fn find_duplicate(
        &self,
        email: &str,
        source: EnquirySource,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Result<Option<Uuid>>;

    async fn insert_enquiry(&self, new: &NewEnquiry) -> Result<Uuid>;

    /// Set the assignee and move the enquiry to `Assigned`. Returns whether
    /// a row actually changed; enquiries in a terminal state are refused.
    async fn assign_enquiry(&self, enquiry_id: Uuid, agent_id: Uuid) -> Result<bool>;

    async fn get_enquiry(&self, enquiry_id: Uuid) -> Result<Option<Enquiry>>;

    async fn list_enquiries(&self, limit: i64) -> Result<Vec<Enquiry>>;
}

/// Fire-and-forget administrative notification capability
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify(&self, kind: &str, title: &str, body: &str, link: Option<&str>)
        -> Result<()>;
}

/// Notifier that records notifications in the log only. The real outbound
/// channel is owned by the surrounding application.
pub struct TracingNotifier;

#[async_trait]
impl AdminNotifier for TracingNotifier {
    async fn notify(
        &self,
        kind: &str,
        title: &str,
        body: &str,
        link: Option<&str>,
    ) -> Result<()> {
        tracing::info!(kind, title, body, link, "admin notification");
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    agents: Vec<CandidateAgentSeed>,
    enquiries: Vec<Enquiry>,
    /// Open lead counts per agent (the leads relation is out of scope)
    open_leads: HashMap<Uuid, i64>,
    fail_next_insert: bool,
}

struct CandidateAgentSeed {
    agent_id: Uuid,
    display_name: String,
    office: Option<String>,
}

/// In-memory [`IntakeStore`] used by unit and integration tests
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agent(&self, agent_id: Uuid, display_name: &str, office: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.agents.push(CandidateAgentSeed {
            agent_id,
            display_name: display_name.to_string(),
            office: office.map(|s| s.to_string()),
        });
    }

    pub fn set_open_leads(&self, agent_id: Uuid, count: i64) {
        self.state.lock().unwrap().open_leads.insert(agent_id, count);
    }

    /// Make the next `insert_enquiry` call fail, for isolation tests
    pub fn fail_next_insert(&self) {
        self.state.lock().unwrap().fail_next_insert = true;
    }

    pub fn enquiries(&self) -> Vec<Enquiry> {
        self.state.lock().unwrap().enquiries.clone()
    }
}

#[async_trait]
impl IntakeStore for MemoryStore {
    async fn candidate_agents(&self) -> Result<Vec<CandidateAgent>> {
        let state = self.state.lock().unwrap();
        let mut candidates: Vec<CandidateAgent> = state
            .agents
            .iter()
            .map(|seed| {
                let open_enquiry_count = state
                    .enquiries
                    .iter()
                    .filter(|e| e.assigned_agent_id == Some(seed.agent_id) && e.status.is_open())
                    .count() as i64;
                CandidateAgent {
                    agent_id: seed.agent_id,
                    display_name: seed.display_name.clone(),
                    office: seed.office.clone(),
                    open_lead_count: state.open_leads.get(&seed.agent_id).copied().unwrap_or(0),
                    open_enquiry_count,
                }
            })
            .collect();
        candidates.sort_by_key(|c| c.agent_id);
        Ok(candidates)
    }

    async fn last_assigned_agent(&self) -> Result<Option<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enquiries
            .iter()
            .filter(|e| e.assigned_agent_id.is_some())
            .max_by_key(|e| e.updated_at)
            .and_then(|e| e.assigned_agent_id))
    }

    async fn find_by_submission_marker(&self, marker: &str) -> Result<Option<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enquiries
            .iter()
            .find(|e| {
                e.source_ref
                    .as_deref()
                    .map(|r| r.contains(marker))
                    .unwrap_or(false)
            })
            .map(|e| e.enquiry_id))
    }

    async fn find_duplicate(
        &self,
        email: &str,
        source: EnquirySource,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Result<Option<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enquiries
            .iter()
            .find(|e| {
                e.email == email
                    && e.source == source
                    && e.created_at >= lower
                    && e.created_at <= upper
            })
            .map(|e| e.enquiry_id))
    }

    async fn insert_enquiry(&self, new: &NewEnquiry) -> Result<Uuid> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_insert {
            state.fail_next_insert = false;
            anyhow::bail!("simulated insert failure");
        }
        let enquiry_id = Uuid::new_v4();
        state.enquiries.push(Enquiry {
            enquiry_id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            message: new.message.clone(),
            source: new.source,
            source_ref: new.source_ref.clone(),
            status: EnquiryStatus::New,
            assigned_agent_id: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        });
        Ok(enquiry_id)
    }

    async fn assign_enquiry(&self, enquiry_id: Uuid, agent_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .enquiries
            .iter_mut()
            .find(|e| e.enquiry_id == enquiry_id)
        {
            Some(enquiry) if !enquiry.status.is_terminal() => {
                enquiry.assigned_agent_id = Some(agent_id);
                enquiry.status = EnquiryStatus::Assigned;
                enquiry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_enquiry(&self, enquiry_id: Uuid) -> Result<Option<Enquiry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enquiries
            .iter()
            .find(|e| e.enquiry_id == enquiry_id)
            .cloned())
    }

    async fn list_enquiries(&self, limit: i64) -> Result<Vec<Enquiry>> {
        let state = self.state.lock().unwrap();
        let mut enquiries = state.enquiries.clone();
        enquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        enquiries.truncate(limit.max(0) as usize);
        Ok(enquiries)
    }
}
