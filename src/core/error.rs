use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Allocation must sum to 100% (currently {sum:.1}%).")]
    AllocationMismatch { sum: f64 },
    #[error("Portfolio return must be > 0.")]
    NonPositiveReturn,
    #[error("Invalid periodic calculation.")]
    DegenerateAnnuity,
}

impl CalcError {
    pub(crate) fn invalid(msg: &str) -> Self {
        CalcError::InvalidInput(msg.to_string())
    }
}
