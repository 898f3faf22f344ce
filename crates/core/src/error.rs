use crate::calculator::Operation;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Cannot divide by zero")]
    DivisionByZero,

    #[error("Cannot calculate square root of negative number")]
    NegativeSquareRoot,

    #[error("Operation '{0}' requires num2")]
    MissingOperand(Operation),

    #[error("Operation '{0}' produced a non-finite result")]
    NonFiniteResult(Operation),
}
