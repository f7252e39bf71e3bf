//! Enrollment records.
//!
//! An enrollment is one person's request to register with a health establishment in a given
//! monthly period. The backend owns persistence; this module models the record as it travels over
//! the wire, validates new registrations and edits, summarises lists per status and guards deletion
//! behind an operator confirmation.

use crate::reconciliation::ReconciliationInput;
use crate::{PercapitaError, PercapitaResult};
use chrono::{Datelike, NaiveDate};
use percapita_rut::{normalize_for_match, Rut};
use percapita_types::{EnrollmentStatus, NonEmptyText, Period};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An enrollment as exchanged with the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub run: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombres: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido_paterno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_completo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_solicitud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inscripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodo_mes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodo_anio: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nacionalidad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etnia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_percapita: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establecimiento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub estado: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creado_por: Option<String>,
    #[serde(default)]
    pub revisado: bool,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Enrollment {
    /// Date the enrollment is reconciled by: the inscription date, or the request date when no
    /// inscription date was recorded.
    pub fn reference_date(&self) -> Option<&str> {
        non_blank(&self.fecha_inscripcion).or_else(|| non_blank(&self.fecha_solicitud))
    }

    /// The stored period, if both halves are present and valid.
    pub fn period(&self) -> Option<Period> {
        Period::new(self.periodo_anio?, self.periodo_mes?).ok()
    }

    pub fn reconciliation_input(&self) -> ReconciliationInput {
        ReconciliationInput::new(self.run.clone(), self.reference_date().map(str::to_string))
            .with_current_status(self.estado)
    }

    /// `nombreCompleto`, or the name parts joined when it is blank.
    pub fn display_name(&self) -> String {
        if let Some(full) = non_blank(&self.nombre_completo) {
            return full.to_string();
        }
        [&self.nombres, &self.apellido_paterno, &self.apellido_materno]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A registration as typed into the creation form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDraft {
    pub run: String,
    pub nombre_completo: String,
    pub fecha_solicitud: String,
    #[serde(default)]
    pub fecha_inscripcion: Option<String>,
    #[serde(default)]
    pub periodo_mes: Option<u32>,
    #[serde(default)]
    pub periodo_anio: Option<i32>,
    #[serde(default)]
    pub nacionalidad: Option<String>,
    #[serde(default)]
    pub etnia: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub subsector: Option<String>,
    #[serde(default)]
    pub codigo_percapita: Option<String>,
    #[serde(default)]
    pub establecimiento: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl EnrollmentDraft {
    /// Validates the draft and produces a new, pending enrollment.
    ///
    /// The period defaults to the month of the request date when not given.
    ///
    /// # Errors
    ///
    /// - [`PercapitaError::InvalidRut`] if the RUN fails the check-character test
    /// - [`PercapitaError::InvalidValue`] if the name is blank or the month is out of range
    /// - [`PercapitaError::InvalidDate`] if a date is not a real `YYYY-MM-DD` calendar date
    pub fn validate(self) -> PercapitaResult<Enrollment> {
        let rut = Rut::parse(&self.run)?;
        let nombre = NonEmptyText::new(&self.nombre_completo)?;
        let solicitud = parse_date(&self.fecha_solicitud)?;

        let fecha_inscripcion = match non_blank(&self.fecha_inscripcion) {
            Some(date) => Some(parse_date(date)?.format(DATE_FORMAT).to_string()),
            None => None,
        };

        let period = Period::new(
            self.periodo_anio.unwrap_or_else(|| solicitud.year()),
            self.periodo_mes.unwrap_or_else(|| solicitud.month()),
        )?;

        let optional = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Ok(Enrollment {
            id: None,
            run: rut.to_string(),
            nombre_completo: Some(nombre.into_inner()),
            fecha_solicitud: Some(solicitud.format(DATE_FORMAT).to_string()),
            fecha_inscripcion,
            periodo_mes: Some(period.month()),
            periodo_anio: Some(period.year()),
            nacionalidad: optional(self.nacionalidad),
            etnia: optional(self.etnia),
            sector: optional(self.sector),
            subsector: optional(self.subsector),
            codigo_percapita: optional(self.codigo_percapita),
            establecimiento: optional(self.establecimiento),
            observaciones: optional(self.observaciones),
            estado: EnrollmentStatus::Pendiente,
            ..Enrollment::default()
        })
    }
}

/// Partial update of a stored enrollment, as sent by the edit form.
///
/// Only the fields that are set are serialized, so the backend leaves the rest untouched. A
/// manual status override goes through here as well; the reconciliation write-back is the same
/// body with only `estado` set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_paterno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_completo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_inscripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodo_mes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodo_anio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establecimiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<EnrollmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revisado: Option<bool>,
}

impl EnrollmentPatch {
    pub fn status(estado: EnrollmentStatus) -> Self {
        Self {
            estado: Some(estado),
            ..Self::default()
        }
    }

    pub fn with_revisado(mut self, revisado: bool) -> Self {
        self.revisado = Some(revisado);
        self
    }

    /// Trimmed notes; blank notes are sent as an empty string to clear them.
    pub fn with_observaciones(mut self, observaciones: &str) -> Self {
        self.observaciones = Some(observaciones.trim().to_string());
        self
    }

    /// Sets the inscription date and moves the period to its month.
    ///
    /// # Errors
    ///
    /// [`PercapitaError::InvalidDate`] unless `date` is a real `YYYY-MM-DD` calendar date.
    pub fn with_inscription_date(mut self, date: &str) -> PercapitaResult<Self> {
        let parsed = parse_date(date)?;
        self.fecha_inscripcion = Some(parsed.format(DATE_FORMAT).to_string());
        self.periodo_mes = Some(parsed.month());
        self.periodo_anio = Some(parsed.year());
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_date(input: &str) -> PercapitaResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| PercapitaError::InvalidDate(input.to_string()))
}

/// Count of enrollments per status, shaped like the backend's `estadisticas` block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    pub total: u64,
    pub pendientes: u64,
    pub validados: u64,
    pub no_validados: u64,
    #[serde(default)]
    pub fallecidos: u64,
}

impl EnrollmentStats {
    pub fn from_enrollments<'a, I>(enrollments: I) -> Self
    where
        I: IntoIterator<Item = &'a Enrollment>,
    {
        let mut stats = Self::default();
        for enrollment in enrollments {
            stats.record(enrollment.estado);
        }
        stats
    }

    pub fn record(&mut self, status: EnrollmentStatus) {
        self.total += 1;
        match status {
            EnrollmentStatus::Pendiente => self.pendientes += 1,
            EnrollmentStatus::Validado => self.validados += 1,
            EnrollmentStatus::NoValidado => self.no_validados += 1,
            EnrollmentStatus::Fallecido => self.fallecidos += 1,
        }
    }

    pub fn count(&self, status: EnrollmentStatus) -> u64 {
        match status {
            EnrollmentStatus::Pendiente => self.pendientes,
            EnrollmentStatus::Validado => self.validados,
            EnrollmentStatus::NoValidado => self.no_validados,
            EnrollmentStatus::Fallecido => self.fallecidos,
        }
    }
}

/// Why a deletion was not confirmed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Debe ingresar el RUT para confirmar")]
    Empty,
    #[error("El RUT ingresado no coincide")]
    Mismatch,
    #[error("el registro no tiene identificador")]
    MissingId,
}

/// Proof that the operator retyped the RUN of the record to delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmedDeletion {
    id: u64,
}

impl ConfirmedDeletion {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Checks the operator's retyped RUN against the stored record.
///
/// Both sides are compared in their loose matching form, so `12.345.678-5` confirms `123456785`.
pub fn confirm_deletion(
    stored: &Enrollment,
    typed: &str,
) -> Result<ConfirmedDeletion, ConfirmationError> {
    let typed = normalize_for_match(typed);
    if typed.is_empty() {
        return Err(ConfirmationError::Empty);
    }
    if typed != normalize_for_match(&stored.run) {
        return Err(ConfirmationError::Mismatch);
    }
    let id = stored.id.ok_or(ConfirmationError::MissingId)?;
    Ok(ConfirmedDeletion { id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(estado: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: Some(7),
            run: "12.345.678-5".into(),
            estado,
            ..Enrollment::default()
        }
    }

    fn draft() -> EnrollmentDraft {
        EnrollmentDraft {
            run: "12.345.678-5".into(),
            nombre_completo: "  Juana Pérez Soto ".into(),
            fecha_solicitud: "2025-03-14".into(),
            ..EnrollmentDraft::default()
        }
    }

    #[test]
    fn deserializes_backend_record() {
        let json = serde_json::json!({
            "id": 42,
            "run": "12345678-5",
            "nombres": "Juana",
            "apellidoPaterno": "Pérez",
            "apellidoMaterno": null,
            "nombreCompleto": "Juana Pérez",
            "fechaSolicitud": "2025-03-01",
            "fechaInscripcion": null,
            "periodoMes": 3,
            "periodoAnio": 2025,
            "estado": "NO_VALIDADO",
            "revisado": true
        });
        let record: Enrollment = serde_json::from_value(json).expect("deserialize");

        assert_eq!(record.id, Some(42));
        assert_eq!(record.estado, EnrollmentStatus::NoValidado);
        assert_eq!(record.period(), Period::new(2025, 3).ok());
        assert!(record.revisado);
        assert_eq!(record.reference_date(), Some("2025-03-01"));
    }

    #[test]
    fn reference_date_prefers_inscription_date() {
        let mut record = enrollment(EnrollmentStatus::Pendiente);
        record.fecha_solicitud = Some("2025-03-01".into());
        record.fecha_inscripcion = Some("2025-04-02".into());
        assert_eq!(record.reference_date(), Some("2025-04-02"));

        record.fecha_inscripcion = Some("  ".into());
        assert_eq!(record.reference_date(), Some("2025-03-01"));

        record.fecha_solicitud = None;
        assert_eq!(record.reference_date(), None);
    }

    #[test]
    fn reconciliation_input_carries_current_status() {
        let mut record = enrollment(EnrollmentStatus::Validado);
        record.fecha_inscripcion = Some("2025-04-02".into());
        let input = record.reconciliation_input();
        assert_eq!(input.run, "12.345.678-5");
        assert_eq!(input.fecha_inscripcion.as_deref(), Some("2025-04-02"));
        assert_eq!(input.estado_actual, Some(EnrollmentStatus::Validado));
    }

    #[test]
    fn display_name_falls_back_to_parts() {
        let mut record = enrollment(EnrollmentStatus::Pendiente);
        record.nombres = Some("Juana".into());
        record.apellido_paterno = Some("Pérez".into());
        record.apellido_materno = Some(" ".into());
        assert_eq!(record.display_name(), "Juana Pérez");

        record.nombre_completo = Some("Juana Pérez Soto".into());
        assert_eq!(record.display_name(), "Juana Pérez Soto");
    }

    #[test]
    fn draft_validates_into_pending_enrollment() {
        let record = draft().validate().expect("valid draft");
        assert_eq!(record.run, "12345678-5");
        assert_eq!(record.nombre_completo.as_deref(), Some("Juana Pérez Soto"));
        assert_eq!(record.periodo_mes, Some(3));
        assert_eq!(record.periodo_anio, Some(2025));
        assert_eq!(record.estado, EnrollmentStatus::Pendiente);
        assert_eq!(record.id, None);
    }

    #[test]
    fn draft_rejects_bad_input() {
        let mut bad_rut = draft();
        bad_rut.run = "12345678-6".into();
        assert!(matches!(bad_rut.validate(), Err(PercapitaError::InvalidRut(_))));

        let mut blank_name = draft();
        blank_name.nombre_completo = "   ".into();
        assert!(matches!(blank_name.validate(), Err(PercapitaError::InvalidValue(_))));

        let mut bad_date = draft();
        bad_date.fecha_solicitud = "2025-02-30".into();
        assert!(matches!(bad_date.validate(), Err(PercapitaError::InvalidDate(_))));

        let mut bad_month = draft();
        bad_month.periodo_mes = Some(13);
        assert!(matches!(bad_month.validate(), Err(PercapitaError::InvalidValue(_))));
    }

    #[test]
    fn draft_keeps_explicit_period() {
        let mut explicit = draft();
        explicit.periodo_mes = Some(12);
        explicit.periodo_anio = Some(2024);
        let record = explicit.validate().expect("valid draft");
        assert_eq!(record.period(), Period::new(2024, 12).ok());
    }

    #[test]
    fn record_without_run_still_deserializes() {
        let page: Vec<Enrollment> = serde_json::from_value(serde_json::json!([
            {"id": 1, "estado": "PENDIENTE"},
            {"id": 2, "run": "12345678-5", "estado": "VALIDADO"}
        ]))
        .expect("deserialize");

        assert_eq!(page[0].run, "");
        assert_eq!(page[0].reconciliation_input().run, "");
        assert_eq!(page[1].run, "12345678-5");
    }

    #[test]
    fn status_patch_serializes_only_set_fields() {
        let patch = EnrollmentPatch::status(EnrollmentStatus::Fallecido);
        assert_eq!(
            serde_json::to_value(&patch).expect("serialize"),
            serde_json::json!({"estado": "FALLECIDO"})
        );

        let reviewed = EnrollmentPatch::status(EnrollmentStatus::NoValidado)
            .with_revisado(true)
            .with_observaciones("  traslado a otro CESFAM ");
        assert_eq!(
            serde_json::to_value(&reviewed).expect("serialize"),
            serde_json::json!({
                "estado": "NO_VALIDADO",
                "revisado": true,
                "observaciones": "traslado a otro CESFAM"
            })
        );
    }

    #[test]
    fn patch_inscription_date_moves_period() {
        let patch = EnrollmentPatch::default()
            .with_inscription_date("2025-11-03")
            .expect("valid date");
        assert_eq!(patch.fecha_inscripcion.as_deref(), Some("2025-11-03"));
        assert_eq!(patch.periodo_mes, Some(11));
        assert_eq!(patch.periodo_anio, Some(2025));

        let err = EnrollmentPatch::default()
            .with_inscription_date("2025-11-31")
            .expect_err("not a calendar date");
        assert!(matches!(err, PercapitaError::InvalidDate(_)));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(EnrollmentPatch::default().is_empty());
        assert!(!EnrollmentPatch::default().with_revisado(false).is_empty());
    }

    #[test]
    fn stats_count_every_status() {
        let records = vec![
            enrollment(EnrollmentStatus::Pendiente),
            enrollment(EnrollmentStatus::Validado),
            enrollment(EnrollmentStatus::Validado),
            enrollment(EnrollmentStatus::Fallecido),
        ];
        let stats = EnrollmentStats::from_enrollments(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(EnrollmentStatus::Validado), 2);
        assert_eq!(stats.count(EnrollmentStatus::NoValidado), 0);
        assert_eq!(stats.fallecidos, 1);
    }

    #[test]
    fn stats_deserialize_without_deceased_count() {
        let stats: EnrollmentStats = serde_json::from_value(serde_json::json!({
            "total": 3, "pendientes": 1, "validados": 1, "noValidados": 1
        }))
        .expect("deserialize");
        assert_eq!(stats.fallecidos, 0);
        assert_eq!(stats.no_validados, 1);
    }

    #[test]
    fn deletion_requires_matching_run() {
        let record = enrollment(EnrollmentStatus::Pendiente);

        assert_eq!(confirm_deletion(&record, " "), Err(ConfirmationError::Empty));
        assert_eq!(
            confirm_deletion(&record, "11.111.111-1"),
            Err(ConfirmationError::Mismatch)
        );

        let confirmed = confirm_deletion(&record, "123456785").expect("confirmed");
        assert_eq!(confirmed.id(), 7);

        let confirmed = confirm_deletion(&record, "12 345 678-5").expect("confirmed");
        assert_eq!(confirmed.id(), 7);
    }

    #[test]
    fn deletion_of_unsaved_record_is_refused() {
        let mut record = enrollment(EnrollmentStatus::Pendiente);
        record.id = None;
        assert_eq!(
            confirm_deletion(&record, "12345678-5"),
            Err(ConfirmationError::MissingId)
        );
    }
}
