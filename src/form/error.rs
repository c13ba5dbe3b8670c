use thiserror::Error;

/// Rejections of host-initiated structural operations.
///
/// Validation failures and configuration faults are never reported through
/// this type; they land in the error map or the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("no field is addressed by '{0}'")]
    UnknownField(String),

    #[error("'{0}' is not a repeatable field")]
    NotRepeatable(String),

    #[error("'{path}' already holds the maximum of {max} item(s)")]
    ItemLimit { path: String, max: usize },

    #[error("'{path}' must keep at least {min} item(s)")]
    ItemMinimum { path: String, min: usize },

    #[error("'{path}' has no item at index {index}")]
    IndexOutOfRange { path: String, index: usize },
}
