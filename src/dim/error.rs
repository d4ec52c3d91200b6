use thiserror::Error;

use crate::dim::types::Dimensions;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
    #[error("Invalid unit spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },
    #[error("Unit mismatch: '{left}' {left_dims} is not compatible with '{right}' {right_dims}")]
    DimensionMismatch {
        left: String,
        left_dims: Dimensions,
        right: String,
        right_dims: Dimensions,
    },
    #[error("Offset unit '{0}' cannot be combined with other units")]
    OffsetUnit(String),
    #[error("Power must be a unitless integer, got {0}")]
    NonIntegerPower(String),
    #[error("Malformed value: {0}")]
    Malformed(String),
}

impl UnitError {
    pub(crate) fn invalid_spec(spec: &str, reason: impl Into<String>) -> Self {
        UnitError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn exponent_overflow(spec: &str) -> Self {
        Self::invalid_spec(spec, "exponent out of range")
    }
}
