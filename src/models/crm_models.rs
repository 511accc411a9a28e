//! Domain models for agents and inbound enquiries
//!
//! These types mirror the rows owned by the surrounding CRM application.
//! Agents are read-only to this module; enquiries are created by the intake
//! normalizer and mutated by the assignment step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a CRM staff member. Only sales roles are routing candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[cfg_attr(
    feature = "database",
    sqlx(type_name = "agent_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    SalesAgent,
    SalesManager,
    Admin,
}

impl AgentRole {
    /// Whether this role is eligible to own inbound enquiries
    pub fn is_routable(&self) -> bool {
        matches!(self, AgentRole::SalesAgent | AgentRole::SalesManager)
    }
}

/// Lifecycle status of an inbound enquiry.
///
/// `Converted` and `Spam` are terminal: the router and the assignment step
/// must not touch an enquiry once it reaches either of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[cfg_attr(
    feature = "database",
    sqlx(type_name = "enquiry_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    New,
    Assigned,
    Contacted,
    Converted,
    Spam,
}

impl EnquiryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnquiryStatus::Converted | EnquiryStatus::Spam)
    }

    /// Statuses that count toward an agent's open workload
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl Default for EnquiryStatus {
    fn default() -> Self {
        EnquiryStatus::New
    }
}

impl std::fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Assigned => "assigned",
            EnquiryStatus::Contacted => "contacted",
            EnquiryStatus::Converted => "converted",
            EnquiryStatus::Spam => "spam",
        };
        write!(f, "{}", s)
    }
}

/// Where an enquiry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[cfg_attr(
    feature = "database",
    sqlx(type_name = "enquiry_source", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum EnquirySource {
    WebsiteForm,
    PhoneCall,
    Referral,
    Other,
}

impl std::fmt::Display for EnquirySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnquirySource::WebsiteForm => "website_form",
            EnquirySource::PhoneCall => "phone_call",
            EnquirySource::Referral => "referral",
            EnquirySource::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// A sales staff member eligible to own inbound contacts and leads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: AgentRole,
    /// Free-text office/territory label, e.g. "Turkey Office"
    pub office: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An active routable agent annotated with its current open workload,
/// as returned by the candidate query (sorted by `agent_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAgent {
    pub agent_id: Uuid,
    pub display_name: String,
    pub office: Option<String>,
    pub open_lead_count: i64,
    pub open_enquiry_count: i64,
}

impl CandidateAgent {
    /// Total open workload used by the capacity policy
    pub fn open_workload(&self) -> i64 {
        self.open_lead_count + self.open_enquiry_count
    }
}

/// A raw lead captured from a web form, call, or partner referral
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enquiry {
    pub enquiry_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: EnquirySource,
    /// Source reference string; carries the `submission:<id>` marker for
    /// enquiries created from external form submissions
    pub source_ref: Option<String>,
    pub status: EnquiryStatus,
    pub assigned_agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new enquiry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnquiry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: EnquirySource,
    pub source_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, threaded explicitly into every entry point
/// instead of being looked up from ambient request state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub display_name: String,
}

impl RequestContext {
    pub fn new(user_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }

    /// Context for unattended callers (webhook deliveries, scheduled sync)
    pub fn system() -> Self {
        Self {
            user_id: Uuid::nil(),
            display_name: "system".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(EnquiryStatus::Converted.is_terminal());
        assert!(EnquiryStatus::Spam.is_terminal());
        assert!(!EnquiryStatus::New.is_terminal());
        assert!(!EnquiryStatus::Assigned.is_terminal());
        assert!(!EnquiryStatus::Contacted.is_terminal());
    }

    #[test]
    fn test_routable_roles() {
        assert!(AgentRole::SalesAgent.is_routable());
        assert!(AgentRole::SalesManager.is_routable());
        assert!(!AgentRole::Admin.is_routable());
    }

    #[test]
    fn test_open_workload_sum() {
        let candidate = CandidateAgent {
            agent_id: Uuid::new_v4(),
            display_name: "Test Agent".to_string(),
            office: None,
            open_lead_count: 3,
            open_enquiry_count: 4,
        };
        assert_eq!(candidate.open_workload(), 7);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EnquiryStatus::New.to_string(), "new");
        assert_eq!(EnquirySource::WebsiteForm.to_string(), "website_form");
    }
}
