//! Reconciliation against the live backend.
//!
//! Wraps the pure engine from `percapita-core` with the network calls it needs. Failures never
//! escape: a lookup that fails yields [`ReconciliationOutcome::degraded`], a failed write-back is
//! reported as not updated, and a failed batch call falls back to per-record processing.

use crate::traits::{BatchValidator, EnrollmentStore, ExtractSource};
use crate::wire::{BatchResponse, BatchUser};
use crate::{ApiError, ApiResult};
use futures::future::join_all;
use percapita_core::{
    latest_period, needs_lookup, reconcile, Enrollment, EnrollmentStatus, ReconciliationInput,
    ReconciliationOutcome,
};
use std::collections::HashMap;

/// An enrollment queued for batch reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchItem {
    pub id: u64,
    pub input: ReconciliationInput,
}

impl BatchItem {
    /// `None` for a record that has not been saved yet.
    pub fn from_enrollment(enrollment: &Enrollment) -> Option<Self> {
        Some(Self {
            id: enrollment.id?,
            input: enrollment.reconciliation_input(),
        })
    }

    fn current_status(&self) -> EnrollmentStatus {
        self.input.estado_actual.unwrap_or_default()
    }

    fn reference_date(&self) -> Option<&str> {
        self.input
            .fecha_inscripcion
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Result of reconciling one enrollment and writing its status back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciledEnrollment {
    pub id: u64,
    pub outcome: ReconciliationOutcome,
    /// True only if a status change was requested and the backend accepted it.
    pub actualizado: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    pub id: u64,
    pub estado: EnrollmentStatus,
    pub actualizado: bool,
}

/// Results of a batch run, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub resultados: Vec<BatchOutcome>,
    pub total_procesados: usize,
    pub total_actualizados: usize,
    /// Set when the batched endpoint was skipped or failed and records were processed one by one.
    pub per_record: bool,
}

impl BatchReport {
    fn from_outcomes(resultados: Vec<BatchOutcome>, per_record: bool) -> Self {
        Self {
            total_procesados: resultados.len(),
            total_actualizados: resultados.iter().filter(|r| r.actualizado).count(),
            resultados,
            per_record,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReconciliationService<C> {
    client: C,
    use_batch_endpoint: bool,
}

impl<C> ReconciliationService<C> {
    pub fn new(client: C, use_batch_endpoint: bool) -> Self {
        Self {
            client,
            use_batch_endpoint,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: ExtractSource> ReconciliationService<C> {
    /// Reconciles one enrollment without writing anything back.
    pub async fn reconcile(&self, input: &ReconciliationInput) -> ReconciliationOutcome {
        match self.try_reconcile(input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    run = %input.run,
                    error = %e,
                    "extract lookup failed, leaving pending"
                );
                ReconciliationOutcome::degraded()
            }
        }
    }

    async fn try_reconcile(&self, input: &ReconciliationInput) -> ApiResult<ReconciliationOutcome> {
        if input.period().is_none() {
            return Ok(reconcile(input, None, &[]));
        }

        let periods = self.client.extract_periods().await?;
        let latest = latest_period(&periods);

        let rows = if needs_lookup(input, latest) {
            self.client.search_extract_rows(&input.run).await?
        } else {
            Vec::new()
        };

        Ok(reconcile(input, latest, &rows))
    }
}

impl<C: ExtractSource + EnrollmentStore> ReconciliationService<C> {
    /// Reconciles one enrollment and PATCHes its status when it changed.
    pub async fn reconcile_and_update(
        &self,
        id: u64,
        input: &ReconciliationInput,
    ) -> ReconciledEnrollment {
        let outcome = self.reconcile(input).await;

        let actualizado = if outcome.debe_actualizar {
            match self.client.update_status(id, outcome.estado).await {
                Ok(()) => {
                    tracing::info!(id, estado = %outcome.estado, "enrollment status updated");
                    true
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "failed to update enrollment status");
                    false
                }
            }
        } else {
            false
        };

        ReconciledEnrollment {
            id,
            outcome,
            actualizado,
        }
    }
}

impl<C: ExtractSource + EnrollmentStore + BatchValidator> ReconciliationService<C> {
    /// Reconciles many enrollments.
    ///
    /// Uses the batched endpoint when enabled. If that call fails, or its response does not
    /// account for every submitted id, every record is reconciled independently instead. Records
    /// without a reference date are never submitted and are reported with their current status.
    pub async fn reconcile_batch(&self, items: &[BatchItem]) -> BatchReport {
        if items.is_empty() {
            return BatchReport::default();
        }

        if self.use_batch_endpoint {
            match self.try_batch(items).await {
                Ok(resultados) => {
                    let report = BatchReport::from_outcomes(resultados, false);
                    tracing::info!(
                        procesados = report.total_procesados,
                        actualizados = report.total_actualizados,
                        "batch reconciliation finished"
                    );
                    return report;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "batch validation failed, reconciling per record");
                }
            }
        }

        let resultados = join_all(items.iter().map(|item| self.reconcile_item(item))).await;
        let report = BatchReport::from_outcomes(resultados, true);
        tracing::info!(
            procesados = report.total_procesados,
            actualizados = report.total_actualizados,
            "per-record reconciliation finished"
        );
        report
    }

    async fn try_batch(&self, items: &[BatchItem]) -> ApiResult<Vec<BatchOutcome>> {
        let usuarios: Vec<BatchUser> = items
            .iter()
            .filter_map(|item| {
                Some(BatchUser {
                    id: item.id,
                    run: item.input.run.clone(),
                    fecha_inscripcion: item.reference_date()?.to_string(),
                })
            })
            .collect();

        let response = if usuarios.is_empty() {
            BatchResponse::default()
        } else {
            let submitted: Vec<u64> = usuarios.iter().map(|u| u.id).collect();
            let response = self.client.validate_batch(usuarios).await?;
            check_complete(&submitted, &response)?;
            response
        };

        let by_id: HashMap<u64, _> = response
            .resultados
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        Ok(items
            .iter()
            .map(|item| match by_id.get(&item.id) {
                Some(r) if item.reference_date().is_some() => BatchOutcome {
                    id: item.id,
                    estado: r.estado,
                    actualizado: r.actualizado,
                },
                _ => unchanged(item),
            })
            .collect())
    }

    async fn reconcile_item(&self, item: &BatchItem) -> BatchOutcome {
        if item.reference_date().is_none() {
            return unchanged(item);
        }
        let reconciled = self.reconcile_and_update(item.id, &item.input).await;
        BatchOutcome {
            id: item.id,
            estado: reconciled.outcome.estado,
            actualizado: reconciled.actualizado,
        }
    }
}

fn unchanged(item: &BatchItem) -> BatchOutcome {
    BatchOutcome {
        id: item.id,
        estado: item.current_status(),
        actualizado: false,
    }
}

fn check_complete(submitted: &[u64], response: &BatchResponse) -> ApiResult<()> {
    let returned: std::collections::HashSet<u64> =
        response.resultados.iter().map(|r| r.id).collect();
    let missing: Vec<u64> = submitted
        .iter()
        .copied()
        .filter(|id| !returned.contains(id))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::IncompleteBatch { missing })
    }
}
