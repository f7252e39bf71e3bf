use crate::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// A calendar month (`month` 1..=12 of `year`).
///
/// Periods are compared through their numeric key `year * 100 + month`, which avoids any
/// calendar or timezone handling. The derived ordering (year, then month) agrees with the key.
///
/// On the wire a period is `{"mes": 9, "anio": 2025}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PeriodWire", into = "PeriodWire")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Serialize, Deserialize)]
struct PeriodWire {
    mes: u32,
    anio: i32,
}

impl TryFrom<PeriodWire> for Period {
    type Error = TypesError;

    fn try_from(wire: PeriodWire) -> TypesResult<Self> {
        Period::new(wire.anio, wire.mes)
    }
}

impl From<Period> for PeriodWire {
    fn from(period: Period) -> Self {
        PeriodWire {
            mes: period.month,
            anio: period.year,
        }
    }
}

impl Period {
    /// # Errors
    ///
    /// Returns [`TypesError::MonthOutOfRange`] unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> TypesResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(TypesError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// Parses a `YYYY-MM` month key as produced by the extract summary endpoint.
    pub fn parse_month_key(input: &str) -> TypesResult<Self> {
        let invalid = || TypesError::InvalidPeriodKey(input.to_string());

        let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Numeric comparison key, e.g. `202509` for September 2025.
    pub fn key(&self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }

    /// `YYYY-MM`.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Spanish label, e.g. `Octubre 2024`.
    pub fn label(&self) -> String {
        // month is validated on construction
        let name = MONTH_NAMES_ES[(self.month - 1) as usize];
        format!("{name} {}", self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.month_key())
    }
}
