use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("First month of the hydrological year must be 1..=12, got {0}")]
    InvalidFirstMonth(u32),

    #[error("Series '{series}' has {values} values but {labels} year labels")]
    LengthMismatch {
        series: String,
        values: usize,
        labels: usize,
    },
}
