//! Estate CRM - Lead Intake and Agent Routing Core
//!
//! The module that sits between the website's form submissions and the CRM
//! proper: it normalizes heterogeneous form payloads into canonical enquiry
//! records, suppresses duplicate deliveries, and routes each new enquiry to
//! a sales agent under one of three interchangeable policies.
//!
//! ## Quick start
//!
//! ```rust
//! use estate_crm::models::CandidateAgent;
//! use estate_crm::routing::{select_agent, RoutingContext, RoutingPolicy};
//! use uuid::Uuid;
//!
//! let candidates = vec![CandidateAgent {
//!     agent_id: Uuid::new_v4(),
//!     display_name: "A. Agent".to_string(),
//!     office: Some("Turkey Office".to_string()),
//!     open_lead_count: 1,
//!     open_enquiry_count: 0,
//! }];
//! let ctx = RoutingContext::default();
//! let owner = select_agent(RoutingPolicy::Capacity, &candidates, &ctx);
//! assert_eq!(owner, Some(candidates[0].agent_id));
//! ```

// Core error handling
pub mod error;

// Domain models shared by routing and intake
pub mod models;

// Agent routing policies
pub mod routing;

// Form intake: normalization, deduplication, batch processing
pub mod intake;

// Website-forms CMS integration
pub mod webforms;

// Database integration (when enabled)
#[cfg(feature = "database")]
pub mod database;

// Services wiring intake to its collaborators
#[cfg(feature = "database")]
pub mod services;

// Essential re-exports
pub use error::{CrmError, CrmResult};
pub use intake::{
    process_batch, process_submission, route_and_assign, BatchSummary, DedupWindow,
    FormSubmission, IntakeStore, ItemOutcome,
};
pub use models::{
    Agent, AgentRole, CandidateAgent, Enquiry, EnquirySource, EnquiryStatus, NewEnquiry,
    RequestContext,
};
pub use routing::{select_agent, RoutingContext, RoutingPolicy};

#[cfg(feature = "database")]
pub use database::EnquiryRepository;
#[cfg(feature = "database")]
pub use services::IntakeService;
