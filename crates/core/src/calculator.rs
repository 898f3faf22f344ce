//! Calculator operations and evaluation.
//!
//! Requests carry the operation selector as a free-form string so an
//! unrecognised selector becomes a [`CoreError::UnknownOperation`] instead of
//! a deserialization failure. Evaluation works on `f64` and rejects results
//! that are not finite.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    SquareRoot,
}

impl Operation {
    /// Every supported operation, in display order.
    pub const ALL: [Operation; 6] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Power,
        Operation::SquareRoot,
    ];

    /// Wire name of the operation (`"add"`, `"square_root"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Power => "power",
            Operation::SquareRoot => "square_root",
        }
    }

    /// Whether the operation needs `num2`.
    pub fn is_binary(self) -> bool {
        !matches!(self, Operation::SquareRoot)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownOperation(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Incoming calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub operation: String,
    pub num1: f64,
    /// Ignored by unary operations.
    #[serde(default)]
    pub num2: Option<f64>,
}

/// Result of a successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub operation: Operation,
    pub num1: f64,
    pub num2: Option<f64>,
    pub result: f64,
}

impl CalculationRequest {
    /// Parse the selector and evaluate.
    pub fn evaluate(&self) -> Result<CalculationResponse, CoreError> {
        let operation: Operation = self.operation.parse()?;
        let num2 = if operation.is_binary() { self.num2 } else { None };
        let result = evaluate(operation, self.num1, num2)?;

        Ok(CalculationResponse {
            operation,
            num1: self.num1,
            num2,
            result,
        })
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Apply `operation` to the operands.
///
/// `b` must be present for binary operations and is ignored otherwise.
pub fn evaluate(operation: Operation, a: f64, b: Option<f64>) -> Result<f64, CoreError> {
    let operand = || b.ok_or(CoreError::MissingOperand(operation));

    let result = match operation {
        Operation::Add => a + operand()?,
        Operation::Subtract => a - operand()?,
        Operation::Multiply => a * operand()?,
        Operation::Divide => {
            let divisor = operand()?;
            if divisor == 0.0 {
                return Err(CoreError::DivisionByZero);
            }
            a / divisor
        }
        Operation::Power => a.powf(operand()?),
        Operation::SquareRoot => {
            if a < 0.0 {
                return Err(CoreError::NegativeSquareRoot);
            }
            a.sqrt()
        }
    };

    if !result.is_finite() {
        return Err(CoreError::NonFiniteResult(operation));
    }

    Ok(result)
}
