//! Enrollment reconciliation engine.
//!
//! Derives the status an enrollment *should* have by comparing its inscription period against the
//! latest loaded extract and searching the extract rows for its RUN. The engine is pure: the
//! latest period and the candidate rows are supplied by the caller, and every input yields a
//! well-formed [`ReconciliationOutcome`]. Nothing here returns an error.
//!
//! Decision table, first match wins:
//!
//! | Condition | Status |
//! |---|---|
//! | inscription date missing or malformed | `PENDIENTE` (never updates) |
//! | no extract loaded | `PENDIENTE` |
//! | inscription period after the latest extract | `PENDIENTE` |
//! | matching row | see [`classify_row`] |
//! | no matching row | `NO_VALIDADO` with a synthesized reason |

use crate::constants::{
    ACCEPTED_MARKERS, DECEASED_MARKER, MISSING_FROM_EXTRACT_CODE, MISSING_FROM_EXTRACT_REASON,
    NON_VALIDATED_REASONS, REJECTED_MARKER,
};
use crate::extract::ExtractRow;
use percapita_rut::normalize_for_match;
use percapita_types::{EnrollmentStatus, Period};
use serde::{Deserialize, Serialize};

/// What the engine needs to know about one enrollment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationInput {
    pub run: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub fecha_inscripcion: Option<String>,
    /// Status currently stored by the backend. When absent no update is ever requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado_actual: Option<EnrollmentStatus>,
}

impl ReconciliationInput {
    pub fn new(run: impl Into<String>, fecha_inscripcion: Option<String>) -> Self {
        Self {
            run: run.into(),
            fecha_inscripcion,
            estado_actual: None,
        }
    }

    pub fn with_current_status(mut self, status: EnrollmentStatus) -> Self {
        self.estado_actual = Some(status);
        self
    }

    /// The inscription period, if the date is well formed.
    pub fn period(&self) -> Option<Period> {
        self.fecha_inscripcion
            .as_deref()
            .and_then(parse_inscription_period)
    }
}

/// Explanation attached to an outcome, taken from the matching row or synthesized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationInfo {
    pub aceptado_rechazado: String,
    pub motivo: String,
    pub motivo_normalizado: String,
}

impl ValidationInfo {
    fn from_row(row: &ExtractRow) -> Self {
        Self {
            aceptado_rechazado: row.aceptado_rechazado.clone(),
            motivo: row.reason().to_string(),
            motivo_normalizado: row.motivo_normalizado.clone(),
        }
    }

    /// Sentinel used when an enrollment is absent from every extract that should contain it.
    pub fn missing_from_extract() -> Self {
        Self {
            aceptado_rechazado: MISSING_FROM_EXTRACT_CODE.to_string(),
            motivo: MISSING_FROM_EXTRACT_REASON.to_string(),
            motivo_normalizado: MISSING_FROM_EXTRACT_CODE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub estado: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultimo_corte: Option<Period>,
    pub existe_en_corte: bool,
    pub debe_actualizar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_validacion: Option<ValidationInfo>,
}

impl ReconciliationOutcome {
    /// Safe default for malformed input and failed lookups: pending, never written back.
    pub fn degraded() -> Self {
        Self {
            estado: EnrollmentStatus::Pendiente,
            ultimo_corte: None,
            existe_en_corte: false,
            debe_actualizar: false,
            info_validacion: None,
        }
    }
}

/// Parses the period of a `YYYY-MM-DD` date.
///
/// Requires exactly three dash-separated, all-digit components and a month in 1..=12. The day is
/// not checked against the calendar.
pub fn parse_inscription_period(date: &str) -> Option<Period> {
    let mut parts = date.trim().split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(numeric(year) && numeric(month) && numeric(day)) {
        return None;
    }

    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    Period::new(year, month).ok()
}

/// Whether [`reconcile`] will consult extract rows for this input.
///
/// `false` when the outcome is already decided without rows: malformed date, no extract loaded,
/// or an inscription period later than `latest`.
pub fn needs_lookup(input: &ReconciliationInput, latest: Option<Period>) -> bool {
    match (input.period(), latest) {
        (Some(inscription), Some(latest)) => inscription.key() <= latest.key(),
        _ => false,
    }
}

/// Status implied by a matching extract row.
///
/// Fields are compared after trim + uppercase, in this order:
/// 1. reason contains `FALLECIDO` -> `FALLECIDO`
/// 2. acceptance contains `RECHAZADO` -> `NO_VALIDADO`
/// 3. reason contains `TRASLADO NEGATIVO` or `RECHAZADO PREVISIONAL` -> `NO_VALIDADO`
/// 4. acceptance contains `ACEPTADO` or `MANTIENE` -> `VALIDADO`
/// 5. otherwise `VALIDADO`; presence in an extract counts as acceptance.
pub fn classify_row(row: &ExtractRow) -> EnrollmentStatus {
    let reason = row.reason().trim().to_uppercase();
    let acceptance = row.acceptance().trim().to_uppercase();

    if reason.contains(DECEASED_MARKER) {
        return EnrollmentStatus::Fallecido;
    }
    if acceptance.contains(REJECTED_MARKER)
        || NON_VALIDATED_REASONS.iter().any(|r| reason.contains(r))
    {
        return EnrollmentStatus::NoValidado;
    }
    if !ACCEPTED_MARKERS.iter().any(|m| acceptance.contains(m)) {
        tracing::trace!(run = %row.run, "ambiguous extract row, treating as accepted");
    }
    EnrollmentStatus::Validado
}

/// Reconciles one enrollment against the loaded extracts.
///
/// `rows` may come from any extract, not only the latest; the first row whose RUN matches is
/// used.
pub fn reconcile(
    input: &ReconciliationInput,
    latest: Option<Period>,
    rows: &[ExtractRow],
) -> ReconciliationOutcome {
    let Some(inscription) = input.period() else {
        tracing::debug!(
            run = %input.run,
            fecha = ?input.fecha_inscripcion,
            "inscription date missing or malformed"
        );
        return ReconciliationOutcome::degraded();
    };

    let Some(latest) = latest else {
        tracing::debug!(run = %input.run, "no extract loaded");
        return decided(input, EnrollmentStatus::Pendiente, None, false, None);
    };

    if inscription.key() > latest.key() {
        tracing::debug!(
            run = %input.run,
            inscription = %inscription,
            latest = %latest,
            "inscription period not yet covered by an extract"
        );
        return decided(input, EnrollmentStatus::Pendiente, Some(latest), false, None);
    }

    let wanted = normalize_for_match(&input.run);
    let matching = if wanted.is_empty() {
        None
    } else {
        rows.iter().find(|row| normalize_for_match(&row.run) == wanted)
    };

    match matching {
        Some(row) => {
            let status = classify_row(row);
            tracing::debug!(run = %input.run, status = %status, "matched extract row");
            decided(
                input,
                status,
                Some(latest),
                true,
                Some(ValidationInfo::from_row(row)),
            )
        }
        None => {
            tracing::debug!(
                run = %input.run,
                latest = %latest,
                "absent from every extract covering its period"
            );
            decided(
                input,
                EnrollmentStatus::NoValidado,
                Some(latest),
                false,
                Some(ValidationInfo::missing_from_extract()),
            )
        }
    }
}

fn decided(
    input: &ReconciliationInput,
    estado: EnrollmentStatus,
    ultimo_corte: Option<Period>,
    existe_en_corte: bool,
    info_validacion: Option<ValidationInfo>,
) -> ReconciliationOutcome {
    ReconciliationOutcome {
        estado,
        ultimo_corte,
        existe_en_corte,
        debe_actualizar: input.estado_actual.is_some_and(|current| current != estado),
        info_validacion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn september_2025() -> Option<Period> {
        Some(Period::new(2025, 9).expect("valid"))
    }

    fn row(run: &str, motivo: &str, aceptado_rechazado: &str) -> ExtractRow {
        ExtractRow {
            run: run.into(),
            motivo: motivo.into(),
            motivo_normalizado: String::new(),
            aceptado_rechazado: aceptado_rechazado.into(),
        }
    }

    fn input(run: &str, date: &str) -> ReconciliationInput {
        ReconciliationInput::new(run, Some(date.into()))
    }

    #[test]
    fn inscription_after_latest_extract_stays_pending() {
        let input =
            input("12345678-5", "2025-10-05").with_current_status(EnrollmentStatus::Pendiente);
        let outcome = reconcile(&input, september_2025(), &[]);

        assert_eq!(outcome.estado, EnrollmentStatus::Pendiente);
        assert!(!outcome.debe_actualizar);
        assert!(!outcome.existe_en_corte);
        assert_eq!(outcome.ultimo_corte, september_2025());
        assert!(!needs_lookup(&input, september_2025()));
    }

    #[test]
    fn inscription_after_latest_extract_ignores_matching_rows() {
        let input =
            input("12345678-5", "2025-10-05").with_current_status(EnrollmentStatus::Validado);
        let rows = [row("12345678-5", "", "ACEPTADO")];
        let outcome = reconcile(&input, september_2025(), &rows);

        assert_eq!(outcome.estado, EnrollmentStatus::Pendiente);
        assert!(outcome.debe_actualizar);
    }

    #[test]
    fn rejected_row_is_not_validated_regardless_of_reason() {
        let input = input("12345678-5", "2025-08-01");
        let rows = [row("12.345.678-5", "TRASLADO POSITIVO", "RECHAZADO")];
        let outcome = reconcile(&input, september_2025(), &rows);

        assert_eq!(outcome.estado, EnrollmentStatus::NoValidado);
        assert!(outcome.existe_en_corte);
        let info = outcome.info_validacion.expect("row info");
        assert_eq!(info.aceptado_rechazado, "RECHAZADO");
        assert_eq!(info.motivo, "TRASLADO POSITIVO");
    }

    #[test]
    fn deceased_takes_priority_over_rejection() {
        let rows = [row("123456785", "  fallecido  ", "RECHAZADO")];
        let outcome = reconcile(&input("12.345.678-5", "2025-08-01"), september_2025(), &rows);
        assert_eq!(outcome.estado, EnrollmentStatus::Fallecido);
    }

    #[test]
    fn absent_record_is_not_validated_with_sentinel_reason() {
        let input =
            input("12345678-5", "2025-08-01").with_current_status(EnrollmentStatus::Pendiente);
        let rows = [row("11111111-1", "", "ACEPTADO")];
        let outcome = reconcile(&input, september_2025(), &rows);

        assert_eq!(outcome.estado, EnrollmentStatus::NoValidado);
        assert!(!outcome.existe_en_corte);
        assert!(outcome.debe_actualizar);
        let info = outcome.info_validacion.expect("sentinel info");
        assert_eq!(
            info.motivo,
            "Usuario inscrito pero no aparece en ningún corte FONASA disponible"
        );
        assert_eq!(info.motivo_normalizado, "NO APARECE EN CORTE");
    }

    #[test]
    fn inscription_in_latest_period_is_looked_up() {
        let input = input("12345678-5", "2025-09-30");
        assert!(needs_lookup(&input, september_2025()));
        let outcome = reconcile(&input, september_2025(), &[row("12345678-5", "", "ACEPTADO")]);
        assert_eq!(outcome.estado, EnrollmentStatus::Validado);
    }

    #[test]
    fn malformed_date_is_pending_without_update() {
        for date in ["", "2025-08", "2025/08/01", "2025-8a-01", "2025-13-01", "2025-08-01-02"] {
            let input = input("12345678-5", date).with_current_status(EnrollmentStatus::Validado);
            let outcome = reconcile(&input, september_2025(), &[row("12345678-5", "", "")]);
            assert_eq!(outcome, ReconciliationOutcome::degraded(), "date {date:?}");
            assert!(!needs_lookup(&input, september_2025()));
        }

        let missing = ReconciliationInput::new("12345678-5", None)
            .with_current_status(EnrollmentStatus::Validado);
        assert_eq!(
            reconcile(&missing, september_2025(), &[]),
            ReconciliationOutcome::degraded()
        );
    }

    #[test]
    fn malformed_date_wins_over_missing_extracts() {
        let input = input("12345678-5", "ayer").with_current_status(EnrollmentStatus::Validado);
        let outcome = reconcile(&input, None, &[]);
        assert!(!outcome.debe_actualizar);
    }

    #[test]
    fn no_extracts_requests_update_only_when_not_pending() {
        let validated =
            input("12345678-5", "2025-08-01").with_current_status(EnrollmentStatus::Validado);
        let outcome = reconcile(&validated, None, &[]);
        assert_eq!(outcome.estado, EnrollmentStatus::Pendiente);
        assert!(outcome.debe_actualizar);
        assert_eq!(outcome.ultimo_corte, None);

        let pending =

            input("12345678-5", "2025-08-01").with_current_status(EnrollmentStatus::Pendiente);
        assert!(!reconcile(&pending, None, &[]).debe_actualizar);
    }

    #[test]
    fn omitted_current_status_never_requests_update() {
        let outcome = reconcile(&input("12345678-5", "2025-08-01"), september_2025(), &[]);
        assert_eq!(outcome.estado, EnrollmentStatus::NoValidado);
        assert!(!outcome.debe_actualizar);
    }

    #[test]
    fn empty_run_never_matches() {
        let rows = [row("", "", "ACEPTADO")];
        let outcome = reconcile(&input(" - ", "2025-08-01"), september_2025(), &rows);
        assert_eq!(outcome.estado, EnrollmentStatus::NoValidado);
        assert!(!outcome.existe_en_corte);
    }

    #[test]
    fn classify_row_precedence() {
        assert_eq!(
            classify_row(&row("1", "TRASLADO NEGATIVO", "")),
            EnrollmentStatus::NoValidado
        );
        assert_eq!(
            classify_row(&row("1", "Rechazado previsional", "ACEPTADO")),
            EnrollmentStatus::NoValidado
        );
        assert_eq!(classify_row(&row("1", "", "mantiene")), EnrollmentStatus::Validado);
        assert_eq!(classify_row(&row("1", "", "")), EnrollmentStatus::Validado);
        assert_eq!(
            classify_row(&row("1", "OTRO", "PENDIENTE REVISION")),
            EnrollmentStatus::Validado
        );
    }

    #[test]
    fn classify_row_uses_normalized_reason_when_reason_is_blank() {
        let row = ExtractRow {
            run: "1".into(),
            motivo: String::new(),
            motivo_normalizado: "FALLECIDO".into(),
            aceptado_rechazado: "ACEPTADO".into(),
        };
        assert_eq!(classify_row(&row), EnrollmentStatus::Fallecido);
    }

    #[test]
    fn outcome_serializes_in_camel_case() {
        let outcome = reconcile(&input("12345678-5", "2025-08-01"), september_2025(), &[]);
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["estado"], "NO_VALIDADO");
        assert_eq!(json["existeEnCorte"], false);
        assert_eq!(json["debeActualizar"], false);
        assert_eq!(json["ultimoCorte"], serde_json::json!({"mes": 9, "anio": 2025}));
        assert_eq!(json["infoValidacion"]["motivoNormalizado"], "NO APARECE EN CORTE");

        let degraded = serde_json::to_value(ReconciliationOutcome::degraded()).expect("serialize");
        assert!(degraded.get("ultimoCorte").is_none());
        assert!(degraded.get("infoValidacion").is_none());
    }

    #[test]
    fn parse_inscription_period_accepts_iso_dates() {
        assert_eq!(
            parse_inscription_period("2025-08-01"),
            Some(Period::new(2025, 8).expect("valid"))
        );
        assert_eq!(parse_inscription_period("2025-8-1"), Period::new(2025, 8).ok());
    }
}
