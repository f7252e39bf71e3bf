//! # Percapita API
//!
//! Async client for the Percapita backend and the reconciliation service built on top of it.
//!
//! The crate is split along the same seam as the reconciliation engine:
//! - [`ApiClient`] speaks HTTP/JSON to the backend and nothing else
//! - [`ExtractSource`], [`EnrollmentStore`] and [`BatchValidator`] are the collaborator traits the
//!   service depends on, so tests can substitute in-memory fakes
//! - [`ReconciliationService`] fetches extract data, runs the pure engine from `percapita-core`
//!   and writes changed statuses back
//!
//! No request timeouts or retries are applied. A failed reconciliation degrades to a pending,
//! no-update outcome rather than an error.

mod client;
mod error;
mod service;
mod traits;
pub mod wire;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use service::{
    BatchItem, BatchOutcome, BatchReport, ReconciledEnrollment, ReconciliationService,
};
pub use traits::{BatchValidator, EnrollmentStore, ExtractSource};
pub use wire::{EnrollmentPage, EnrollmentQuery};
