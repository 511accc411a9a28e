//! Database access layer (Postgres via sqlx)
//!
//! Compiled only with the `database` feature. The repository implements the
//! [`IntakeStore`](crate::intake::IntakeStore) seam consumed by the intake
//! pipeline; the schema it queries lives in `migrations/`.

pub mod enquiry_repository;

pub use enquiry_repository::EnquiryRepository;
