use thiserror::Error;

pub type LoanResult<T> = Result<T, LoanError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanError {
    #[error("Invalid term: a loan needs at least one repayment period")]
    InvalidTerm,

    #[error("Invalid payment frequency: periods per year must be greater than zero")]
    InvalidPeriodsPerYear,

    #[error("Unsupported payment frequency: {0} periods per year does not divide a year into whole months")]
    UnsupportedFrequency(u32),

    #[error("Cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
}

impl LoanError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        LoanError::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
