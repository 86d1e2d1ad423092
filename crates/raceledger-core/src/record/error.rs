//! Record schema errors

use thiserror::Error;

/// Errors raised while decoding or validating a single record.
///
/// The ledger treats these as "skip this record" when loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Neither a mapping nor a legacy four-item list
    #[error("Record is not a mapping (got {0})")]
    NotAMapping(&'static str),

    /// A field holds a value of the wrong JSON type
    #[error("Field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        /// Field name
        field: &'static str,
        /// Expected type, for the message
        expected: &'static str,
    },

    /// A number does not fit the field
    #[error("Field '{field}' is out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value as text
        value: String,
    },

    /// A required field is absent or blank
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}
