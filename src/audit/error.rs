use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Day-of-year {series} reference must have 366 entries, got {found}")]
    ReferenceLength { series: &'static str, found: usize },

    #[error("Day-of-year reference has {mean} means but {std} standard deviations")]
    LengthMismatch { mean: usize, std: usize },

    #[error("Standard deviation multiplier must be non-negative and finite, got {0}")]
    InvalidMultiplier(f64),
}
