use coffer_storage::StorageError;
use coffer_types::TypesError;
use thiserror::Error;

/// Result alias used throughout the VM and by contract code.
pub type VmResult<T> = Result<T, VmError>;

/// Errors that can occur while executing a contract call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    /// A contract precondition failed; the standard failure signal
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Contract already submitted: {0}")]
    DuplicateContract(String),

    #[error("Function {function} is not exported by {contract}")]
    FunctionNotExported { contract: String, function: String },

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Call depth exceeded: {depth}")]
    CallDepthExceeded { depth: usize },

    #[error("Reentrancy violation: {0}")]
    ReentrancyViolation(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl VmError {
    /// Message of a failed `require!`, if that is what this is.
    pub fn assertion_message(&self) -> Option<&str> {
        match self {
            VmError::Assertion(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, VmError::Assertion(_))
    }
}

impl From<StorageError> for VmError {
    fn from(e: StorageError) -> Self {
        VmError::Storage(e.to_string())
    }
}

impl From<TypesError> for VmError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::AmountOverflow | TypesError::AmountUnderflow => VmError::Overflow,
            TypesError::EmptyAccount
            | TypesError::AccountTooLong { .. }
            | TypesError::InvalidAccountChar { .. } => VmError::InvalidName(e.to_string()),
            other => VmError::InvalidValue(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VmError::Assertion("not approved".to_string());
        assert_eq!(err.to_string(), "Assertion failed: not approved");
        assert_eq!(err.assertion_message(), Some("not approved"));
    }

    #[test]
    fn test_from_types_error() {
        assert_eq!(VmError::from(TypesError::AmountUnderflow), VmError::Overflow);
        assert!(matches!(
            VmError::from(TypesError::EmptyAccount),
            VmError::InvalidName(_)
        ));
    }
}
