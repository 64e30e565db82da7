use thiserror::Error;

/// Failures raised by polynomial generation, Lagrange interpolation and
/// group configuration. A share that fails verification is not an error;
/// the verifier reports it as `false`.
#[derive(Debug, Error)]
pub enum PolynomialError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("arithmetic domain error: {0}")]
    ArithmeticDomain(String),
    #[error("malformed group configuration: {0}")]
    Serialization(#[from] serde_json::Error),
}
