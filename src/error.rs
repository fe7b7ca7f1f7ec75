//! Domain errors raised by the ward engine.
//!
//! Every variant is an expected, recoverable outcome that the caller
//! is meant to handle (report and carry on, or skip a record).  File
//! system failures live in [`crate::store::StoreError`] instead.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HospitalError {
    #[error("invalid ward: '{0}' does not exist in the hospital")]
    InvalidWard(String),
    #[error("invalid data: field '{field}' has invalid value '{value}'")]
    InvalidPatientData { field: String, value: String },
    #[error("{ward} ward is full ({occupied}/{total} beds occupied)")]
    NoBedsAvailable {
        ward: String,
        total: usize,
        occupied: usize,
    },
    #[error("patient '{0}' does not exist")]
    PatientNotFound(String),
    #[error("patient '{name}' (ID: {id}) is already discharged")]
    AlreadyDischarged { id: String, name: String },
    #[error("discount must be between 0 and 100, got {0}")]
    InvalidDiscount(f64),
    #[error("ward '{0}' must have at least one bed")]
    InvalidWardCapacity(String),
}

impl HospitalError {
    pub(crate) fn invalid_data(field: &str, value: impl ToString) -> Self {
        HospitalError::InvalidPatientData {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type HospitalResult<T> = std::result::Result<T, HospitalError>;
