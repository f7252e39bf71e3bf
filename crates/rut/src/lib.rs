//! RUT (Rol Único Tributario) utilities.
//!
//! Every person handled by Percapita is identified by a Chilean RUT: a numeric body followed by a
//! single check character (`0-9` or `K`) computed with the modulo-11 weighted-sum algorithm.
//!
//! This crate provides:
//! - Pure codec functions ([`sanitize_input`], [`format`], [`validate`], [`compute_check_char`])
//!   used for format-as-you-type and blur validation.
//! - A wrapper type ([`Rut`]) that *guarantees* a structurally valid RUT with a correct check
//!   character once constructed.
//! - The loose matching form ([`normalize_for_match`]) used when comparing identifiers found in
//!   bulk extract data.
//! - A small form-field state machine ([`RutField`]) that only surfaces errors after first blur.
//!
//! ## Forms
//! - Storage form: punctuation stripped, uppercased, e.g. `123456785`.
//! - Display form: `BODY-CHECK`, e.g. `12345678-5`. No thousands separators are inserted.
//!
//! Two RUTs are equal iff their punctuation-stripped, uppercased forms are equal.

mod codec;
mod field;

pub use codec::{
    compute_check_char, format, normalize_for_match, sanitize_input, validate, Rut, MAX_INPUT_LEN,
};
pub use field::{RutField, INVALID_RUT_MESSAGE};

/// Error type for RUT parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RutError {
    /// Fewer than two significant characters were supplied.
    #[error("RUT must contain a body and a check character")]
    TooShort,
    /// The body (everything before the check character) is not purely numeric.
    #[error("RUT body must contain only digits, got: '{0}'")]
    InvalidBody(String),
    /// The asserted check character does not match the computed one.
    #[error("RUT check character mismatch: expected '{expected}', found '{found}'")]
    CheckCharMismatch { expected: char, found: char },
}

/// Result type for RUT operations.
pub type RutResult<T> = Result<T, RutError>;
