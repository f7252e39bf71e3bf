//! Constants used throughout the Percapita core crate.
//!
//! Extract reason codes are matched after trim + uppercase, so every marker here is upper-case.

/// Default backend base URL when `PERCAPITA_API_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "PERCAPITA_API_URL";

/// Environment variable holding an optional bearer token.
pub const ENV_API_TOKEN: &str = "PERCAPITA_API_TOKEN";

/// Environment variable toggling the batched validation endpoint.
pub const ENV_USE_BATCH: &str = "PERCAPITA_USE_BATCH";

/// Environment variable holding the runner interval in seconds.
pub const ENV_RUN_INTERVAL_SECS: &str = "PERCAPITA_RUN_INTERVAL_SECS";

/// Reason text marking a deceased person.
pub const DECEASED_MARKER: &str = "FALLECIDO";

/// Accept/reject value marking a rejection.
pub const REJECTED_MARKER: &str = "RECHAZADO";

/// Reason texts that mean the enrollment was not validated.
pub const NON_VALIDATED_REASONS: [&str; 2] = ["TRASLADO NEGATIVO", "RECHAZADO PREVISIONAL"];

/// Accept/reject values that mean the enrollment was accepted.
pub const ACCEPTED_MARKERS: [&str; 2] = ["ACEPTADO", "MANTIENE"];

/// Code used when an enrollment is absent from every extract that should contain it.
pub const MISSING_FROM_EXTRACT_CODE: &str = "NO APARECE EN CORTE";

/// Explanation paired with [`MISSING_FROM_EXTRACT_CODE`].
pub const MISSING_FROM_EXTRACT_REASON: &str =
    "Usuario inscrito pero no aparece en ningún corte FONASA disponible";
