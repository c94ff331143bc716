//! Runtime errors raised by operator dispatch and undefined values

use crate::logging::{codes, Code};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors produced while evaluating operators over dynamic values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("{message}")]
    Undefined { message: String },

    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("bad operand type for unary {op}: '{operand}'")]
    UnsupportedOperand { op: &'static str, operand: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{message}")]
    NotImplemented { message: String },

    #[error("integer overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("{message}")]
    Custom { message: String },
}

impl RuntimeError {
    pub fn undefined(message: impl Into<String>) -> Self {
        Self::Undefined {
            message: message.into(),
        }
    }

    pub fn unsupported_operands(op: &'static str, left: &str, right: &str) -> Self {
        Self::UnsupportedOperands {
            op,
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    pub fn unsupported_operand(op: &'static str, operand: &str) -> Self {
        Self::UnsupportedOperand {
            op,
            operand: operand.to_string(),
        }
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented {
            message: message.into(),
        }
    }

    /// Error raised from a user-supplied capability
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Undefined { .. } => codes::runtime::UNDEFINED_VALUE,
            Self::UnsupportedOperands { .. } | Self::UnsupportedOperand { .. } => {
                codes::runtime::UNSUPPORTED_OPERANDS
            }
            Self::DivisionByZero => codes::runtime::DIVISION_BY_ZERO,
            Self::NotImplemented { .. } => codes::runtime::NOT_IMPLEMENTED,
            Self::Overflow { .. } => codes::runtime::INTEGER_OVERFLOW,
            Self::Custom { .. } => codes::runtime::CAPABILITY_ERROR,
        }
    }
}
