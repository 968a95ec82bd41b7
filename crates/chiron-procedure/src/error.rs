//! Procedure construction errors.

use crate::validator::ValidatorRole;
use thiserror::Error;

/// Errors raised while building a procedure.
///
/// These are programmer errors: a procedure that fails to build never
/// becomes callable.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A schema exposes none of the supported validator conventions.
    #[error("no recognized validator interface on {role} validator")]
    UnrecognizedValidator {
        /// The validator that was rejected.
        role: ValidatorRole,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuildError::UnrecognizedValidator {
            role: ValidatorRole::Input,
        };
        assert_eq!(
            err.to_string(),
            "no recognized validator interface on input validator"
        );
    }
}
