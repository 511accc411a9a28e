//! Core domain models shared across the intake and routing modules.

pub mod crm_models;

pub use crm_models::{
    Agent, AgentRole, CandidateAgent, Enquiry, EnquirySource, EnquiryStatus, NewEnquiry,
    RequestContext,
};
