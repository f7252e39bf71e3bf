//! Collaborator traits used by [`crate::ReconciliationService`].
//!
//! [`crate::ApiClient`] implements all three against the backend.

use crate::wire::{BatchResponse, BatchUser};
use crate::ApiResult;
use percapita_core::{EnrollmentStatus, ExtractPeriod, ExtractRow};
use std::future::Future;

/// Read access to the loaded extracts.
pub trait ExtractSource {
    /// Every period for which an extract has been loaded, in any order.
    fn extract_periods(&self) -> impl Future<Output = ApiResult<Vec<ExtractPeriod>>> + Send;

    /// Rows from any extract whose RUN matches `run` on the backend's loose search.
    fn search_extract_rows(
        &self,
        run: &str,
    ) -> impl Future<Output = ApiResult<Vec<ExtractRow>>> + Send;
}

/// Write access to enrollment status.
pub trait EnrollmentStore {
    fn update_status(
        &self,
        id: u64,
        estado: EnrollmentStatus,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

/// Server-side reconciliation of many enrollments in one call.
pub trait BatchValidator {
    fn validate_batch(
        &self,
        usuarios: Vec<BatchUser>,
    ) -> impl Future<Output = ApiResult<BatchResponse>> + Send;
}
