//! Website-forms CMS integration
//!
//! Read-only client for the CMS that hosts the public website forms. The
//! periodic sync path pulls recent submissions from here and feeds them
//! through the intake pipeline.

pub mod client;
pub mod types;

pub use client::WebformsClient;
pub use types::{FieldEntry, SubmissionRecord, SubmissionsResponse};
