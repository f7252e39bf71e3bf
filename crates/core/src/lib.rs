//! # Percapita Core
//!
//! Core business logic for the Percapita enrollment management system.
//!
//! This crate contains pure data operations:
//! - Enrollment records, registration drafts and per-status statistics
//! - Reference extracts ("cortes") and latest-period selection
//! - Lookup catalogs and seed-file loading
//! - The reconciliation engine that derives an enrollment's status from extract data
//!
//! **No transport concerns**: HTTP calls to the backend, retries and write-back live in
//! `percapita-api`. Every function here takes its data as parameters.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod enrollment;
pub mod error;
pub mod extract;
pub mod reconciliation;
pub mod validation;

pub use catalog::{dropdown_options, CatalogItem, CatalogKind, CatalogSeed};
pub use config::CoreConfig;
pub use enrollment::{
    confirm_deletion, ConfirmationError, ConfirmedDeletion, Enrollment, EnrollmentDraft,
    EnrollmentPatch, EnrollmentStats,
};
pub use error::{PercapitaError, PercapitaResult};
pub use extract::{latest_period, ExtractPeriod, ExtractRow};
pub use reconciliation::{
    classify_row, needs_lookup, parse_inscription_period, reconcile, ReconciliationInput,
    ReconciliationOutcome, ValidationInfo,
};

pub use percapita_rut::Rut;
pub use percapita_types::{EnrollmentStatus, NonEmptyText, Period};
