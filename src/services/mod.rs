//! Service layer wiring the intake pipeline to its collaborators

pub mod intake_service;

pub use intake_service::IntakeService;
