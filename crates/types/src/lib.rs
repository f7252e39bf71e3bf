//! Shared primitive types for Percapita.
//!
//! Small value types used by more than one crate: the enrollment lifecycle status, the monthly
//! period an enrollment or extract belongs to, and validated non-empty text.

mod period;
mod status;
mod text;

pub use period::Period;
pub use status::EnrollmentStatus;
pub use text::NonEmptyText;

/// Errors that can occur when constructing validated primitive types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    EmptyText,
    /// A month outside 1..=12
    #[error("month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u32),
    /// A period key that is not `YYYY-MM`
    #[error("invalid period key: '{0}' (expected YYYY-MM)")]
    InvalidPeriodKey(String),
    /// A status name outside the four lifecycle states
    #[error("unknown enrollment status: '{0}'")]
    UnknownStatus(String),
}

pub type TypesResult<T> = Result<T, TypesError>;
