use crate::catalog::CatalogKind;
use crate::enrollment::ConfirmationError;

#[derive(Debug, thiserror::Error)]
pub enum PercapitaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid RUT: {0}")]
    InvalidRut(#[from] percapita_rut::RutError),
    #[error("invalid value: {0}")]
    InvalidValue(#[from] percapita_types::TypesError),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("deletion not confirmed: {0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("catalog seed schema mismatch at {path}: {message}")]
    CatalogSchema { path: String, message: String },
    #[error("duplicate catalog entry {kind}: {name}")]
    DuplicateCatalogEntry { kind: CatalogKind, name: String },
    #[error("failed to read catalog seed file: {0}")]
    FileRead(std::io::Error),
}

pub type PercapitaResult<T> = std::result::Result<T, PercapitaError>;
