//! Reference extracts ("cortes").
//!
//! An extract is an immutable monthly snapshot published by the funding agency. The backend
//! exposes it as a list of period summaries plus searchable rows; both shapes are modelled here
//! as explicit structures so that the reconciliation engine never sees untyped JSON.

use percapita_types::Period;
use serde::{Deserialize, Serialize};

/// One row of an extract, as returned by the row search endpoint.
///
/// Every text field is optional on the wire; absent values deserialize as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRow {
    #[serde(default, deserialize_with = "nullable_string")]
    pub run: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub motivo: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub motivo_normalizado: String,
    #[serde(rename = "aceptadoRechazado", default, deserialize_with = "nullable_string")]
    pub aceptado_rechazado: String,
}

impl ExtractRow {
    /// Reason text used for classification: `motivo`, or `motivo_normalizado` when `motivo` is
    /// blank.
    pub fn reason(&self) -> &str {
        if self.motivo.trim().is_empty() {
            &self.motivo_normalizado
        } else {
            &self.motivo
        }
    }

    pub fn acceptance(&self) -> &str {
        &self.aceptado_rechazado
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A period for which an extract has been loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractPeriod {
    pub period: Period,
    pub label: String,
}

impl ExtractPeriod {
    /// Builds a summary entry from its `YYYY-MM` key. Entries with an unusable key yield `None`.
    pub fn from_month_key(month_key: &str, label: Option<String>) -> Option<Self> {
        let period = Period::parse_month_key(month_key).ok()?;
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| period.label());
        Some(Self { period, label })
    }
}

/// The most recent extract period, by numeric key.
///
/// The backend lists periods newest first, but that ordering is not relied upon.
pub fn latest_period<'a, I>(periods: I) -> Option<Period>
where
    I: IntoIterator<Item = &'a ExtractPeriod>,
{
    periods.into_iter().map(|p| p.period).max_by_key(Period::key)
}
