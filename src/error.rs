use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LoanError {
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{field} is outside of Range ({min} to {max}, got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid date: {message}")]
    InvalidDate { message: String },
}

pub type Result<T> = std::result::Result<T, LoanError>;
