//! Website-form intake: normalization, deduplication, batch processing
//!
//! Turns heterogeneous third-party form submissions into canonical enquiry
//! rows, suppresses duplicate deliveries, and routes each created enquiry to
//! an owning agent.

pub mod batch;
pub mod dedup;
pub mod forms;
pub mod normalize;
pub mod payload;
pub mod store;

pub use batch::{process_batch, process_submission, route_and_assign, BatchSummary, ItemOutcome};
pub use dedup::{compose_source_ref, submission_marker, DedupWindow};
pub use normalize::{normalize_submission, split_full_name, NormalizedEnquiry, SkipReason};
pub use payload::{parse_webhook_payload, FormSubmission};
pub use store::{AdminNotifier, IntakeStore, MemoryStore, TracingNotifier};
