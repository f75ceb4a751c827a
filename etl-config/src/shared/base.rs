use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// The calendar range is empty or inverted.
    #[error("Invalid calendar config: `start_year` ({start_year}) must not exceed `end_year` ({end_year})")]
    InvalidCalendarRange { start_year: i32, end_year: i32 },
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
