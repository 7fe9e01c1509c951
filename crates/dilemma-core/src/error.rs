use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// An effect names a category the bias profile does not define.
    ///
    /// Distinct from a category whose bias is present but zero.
    #[error("option {option}: category {category:?} has no entry in the bias profile")]
    UnknownCategory { option: String, category: String },

    #[error("exponent base must be greater than one, got {0}")]
    InvalidBase(f64),

    #[error("range divisor must be finite and non-zero, got {0}")]
    InvalidDivisor(f64),

    #[error("invalid effect pattern: {0}")]
    Pattern(#[from] regex::Error),
}
