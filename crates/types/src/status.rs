use crate::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle status of an enrollment.
///
/// Wire names are the upper-case forms stored by the backend (`PENDIENTE`, `VALIDADO`,
/// `NO_VALIDADO`, `FALLECIDO`). New enrollments start as [`EnrollmentStatus::Pendiente`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    /// Waiting for an extract that covers the enrollment period.
    #[default]
    Pendiente,
    /// Accepted in an extract.
    Validado,
    /// Rejected in an extract, or absent from every extract that should contain it.
    NoValidado,
    /// Reported deceased by an extract.
    Fallecido,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Pendiente,
        EnrollmentStatus::Validado,
        EnrollmentStatus::NoValidado,
        EnrollmentStatus::Fallecido,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Pendiente => "PENDIENTE",
            EnrollmentStatus::Validado => "VALIDADO",
            EnrollmentStatus::NoValidado => "NO_VALIDADO",
            EnrollmentStatus::Fallecido => "FALLECIDO",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pendiente => "Pendiente",
            EnrollmentStatus::Validado => "Validado",
            EnrollmentStatus::NoValidado => "No Validado",
            EnrollmentStatus::Fallecido => "Fallecido",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = TypesError;

    /// Case-insensitive; spaces are accepted in place of underscores (`"no validado"`).
    fn from_str(s: &str) -> TypesResult<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace(' ', "_");
        EnrollmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| TypesError::UnknownStatus(s.to_string()))
    }
}
