//! JSON bodies exchanged with the backend.
//!
//! Field names follow the backend verbatim (`summary`, `rows`, `usuarios`, `resultados`, ...).
//! Response types default every collection so that an omitted key reads as empty.

use percapita_core::{
    Enrollment, EnrollmentStats, EnrollmentStatus, ExtractPeriod, ExtractRow, Period,
};
use serde::{Deserialize, Serialize};

/// `GET /api/corte-fonasa/?summary_only=true`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: Vec<SummaryEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// `YYYY-MM`.
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl SummaryResponse {
    /// Entries whose month key cannot be parsed are dropped.
    pub fn into_periods(self) -> Vec<ExtractPeriod> {
        self.summary
            .into_iter()
            .filter_map(|entry| {
                let period = ExtractPeriod::from_month_key(&entry.month, entry.label);
                if period.is_none() {
                    tracing::debug!(month = %entry.month, "skipping unparseable extract period");
                }
                period
            })
            .collect()
    }
}

/// `GET /api/corte-fonasa/?search={run}&all=true`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RowsResponse {
    #[serde(default)]
    pub rows: Vec<ExtractRow>,
}

/// One enrollment submitted to the batched validation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUser {
    pub id: u64,
    pub run: String,
    pub fecha_inscripcion: String,
}

/// `POST /api/nuevos-usuarios/validar-lote/`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub usuarios: Vec<BatchUser>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub id: u64,
    pub estado: EnrollmentStatus,
    #[serde(default)]
    pub actualizado: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(default)]
    pub resultados: Vec<BatchResult>,
    #[serde(default)]
    pub total_procesados: u64,
    #[serde(default)]
    pub total_actualizados: u64,
}

/// Filters for `GET /api/nuevos-usuarios/`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentQuery {
    pub period: Option<Period>,
    pub estado: Option<EnrollmentStatus>,
    /// Matches RUN or full name on the backend.
    pub search: Option<String>,
}

impl EnrollmentQuery {
    pub fn for_period(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, estado: EnrollmentStatus) -> Self {
        self.estado = Some(estado);
        self
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(period) = self.period {
            pairs.push(("periodoMes", period.month().to_string()));
            pairs.push(("periodoAnio", period.year().to_string()));
        }
        if let Some(estado) = self.estado {
            pairs.push(("estado", estado.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// `GET /api/nuevos-usuarios/` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnrollmentPage {
    #[serde(default)]
    pub usuarios: Vec<Enrollment>,
    #[serde(default)]
    pub estadisticas: EnrollmentStats,
}
