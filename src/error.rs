//! Error types for the PSE.
//!
//! The engine reports a closed taxonomy of failures. Every operation returns
//! `PseResult<T>`; success carries no code of its own and renders as code `0`.
//! Each variant carries a stable numeric code for generated glue code and
//! logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::{DistributionKind, Domain};
use crate::variable::{StorageKind, VariableId};

/// Numeric code reported for a successful operation.
pub const OK_CODE: i32 = 0;

/// The step of a string mutation whose rejection loop gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionStage {
    /// Picking the byte position to mutate.
    Position,
    /// Drawing the replacement byte.
    Byte,
}

impl fmt::Display for RejectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Byte => write!(f, "byte"),
        }
    }
}

/// All failures the engine can report.
#[derive(Debug, Error)]
pub enum PseError {
    #[error("store is already initialized")]
    AlreadyInitialized,

    #[error("store is already finalized")]
    AlreadyFinalized,

    #[error("store is already started")]
    AlreadyStarted,

    #[error("store is not initialized")]
    NotInitialized,

    #[error("store is not started")]
    NotStarted,

    #[error("too many variables: capacity is {capacity}")]
    TooManyVariables {
        capacity: usize,
    },

    #[error("variable {id} is already registered")]
    VariableAlreadyRegistered {
        id: VariableId,
    },

    #[error("unknown variable: {id}")]
    VariableUnknown {
        id: VariableId,
    },

    #[error("variable {id} already has a dependency")]
    DependencyAlreadyExists {
        id: VariableId,
    },

    #[error("variable {id} has no dependency")]
    DependencyUnknown {
        id: VariableId,
    },

    #[error("variable {id} is not world-scoped")]
    DependencyNotWorld {
        id: VariableId,
    },

    #[error("unrecognized type: {name}")]
    TypeUnknown {
        name: String,
    },

    #[error("type mismatch for variable {id}: expected {expected}, found {found}")]
    TypeMismatch {
        id: VariableId,
        expected: StorageKind,
        found: String,
    },

    #[error("index {index} is out of bounds for variable {id} of size {size}")]
    ArrayOutOfBounds {
        id: VariableId,
        index: usize,
        size: usize,
    },

    #[error("variable {id} is not read-and-alter")]
    VariableIsImmutable {
        id: VariableId,
    },

    #[error("rejection sampling for the {stage} draw gave up after {attempts} attempts")]
    RejectionExhausted {
        stage: RejectionStage,
        attempts: usize,
    },

    #[error("invalid parameters for {kind}: {reason}")]
    InvalidParameters {
        kind: DistributionKind,
        reason: String,
    },

    #[error("distribution {kind} cannot produce {domain} values")]
    DistributionMismatch {
        kind: DistributionKind,
        domain: Domain,
    },

    #[error("array size must be at least 1, got {size}")]
    InvalidArraySize {
        size: usize,
    },

    #[error("variable name is {len} bytes, maximum is {max}")]
    NameTooLong {
        len: usize,
        max: usize,
    },

    #[error("string of {len} bytes exceeds the buffer length of {max}")]
    StringTooLong {
        len: usize,
        max: usize,
    },

    #[error("invalid store configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("stochastic string {id} holds non-printable byte 0x{byte:02x} at {position}")]
    TextNotPrintable {
        id: VariableId,
        position: usize,
        byte: u8,
    },
}

impl PseError {
    /// Numeric code of this error.
    ///
    /// Lifecycle, registry and access failures use codes `-1` to `-23`.
    /// Buffer, sampling and configuration failures continue below `-23`.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::AlreadyInitialized => -1,
            Self::AlreadyFinalized => -3,
            Self::AlreadyStarted => -4,
            Self::NotInitialized => -5,
            Self::NotStarted => -6,
            Self::TooManyVariables { .. } => -7,
            Self::VariableAlreadyRegistered { .. } => -9,
            Self::VariableUnknown { .. } => -11,
            Self::DependencyAlreadyExists { .. } => -13,
            Self::DependencyUnknown { .. } => -15,
            Self::DependencyNotWorld { .. } => -16,
            Self::TypeUnknown { .. } => -17,
            Self::TypeMismatch { .. } => -19,
            Self::ArrayOutOfBounds { .. } => -21,
            Self::VariableIsImmutable { .. } => -23,
            Self::RejectionExhausted { .. } => -25,
            Self::InvalidParameters { .. } => -27,
            Self::DistributionMismatch { .. } => -29,
            Self::InvalidArraySize { .. } => -31,
            Self::NameTooLong { .. } => -33,
            Self::StringTooLong { .. } => -35,
            Self::InvalidConfig { .. } => -37,
            Self::TextNotPrintable { .. } => -39,
        }
    }

    /// Fixed diagnostic sentence for this error's code.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "The PSE has already been initialized",
            Self::AlreadyFinalized => "The PSE has already been finalized",
            Self::AlreadyStarted => "The PSE has already been started",
            Self::NotInitialized => "The PSE has not yet been initialized",
            Self::NotStarted => "The PSE has not yet been started",
            Self::TooManyVariables { .. } => {
                "The PSE has too many variables registered in this agent"
            }
            Self::VariableAlreadyRegistered { .. } => "The PSE already contains this variable",
            Self::VariableUnknown { .. } => "The PSE contains no such variable",
            Self::DependencyAlreadyExists { .. } => "The PSE already contains this dependency",
            Self::DependencyUnknown { .. } => "The PSE contains no such dependency",
            Self::DependencyNotWorld { .. } => {
                "The dependency refers to an entity not in the world model"
            }
            Self::TypeUnknown { .. } => "The PSE recognizes no such type",
            Self::TypeMismatch { .. } => "Type mismatch for variable",
            Self::ArrayOutOfBounds { .. } => "Illegal out-of-bounds access of array attempted",
            Self::VariableIsImmutable { .. } => "Illegal attempt to change immutable variable",
            Self::RejectionExhausted { .. } => "Rejection sampling exhausted its attempts",
            Self::InvalidParameters { .. } => "Invalid distribution parameters",
            Self::DistributionMismatch { .. } => {
                "The distribution does not match the variable domain"
            }
            Self::InvalidArraySize { .. } => "Illegal array size",
            Self::NameTooLong { .. } => "The variable name is too long",
            Self::StringTooLong { .. } => "The string exceeds its buffer length",
            Self::InvalidConfig { .. } => "Invalid store configuration",
            Self::TextNotPrintable { .. } => {
                "Stochastic strings may only hold printable ASCII"
            }
        }
    }

    /// Returns true if this error comes from calling an operation in the
    /// wrong lifecycle state.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInitialized
                | Self::AlreadyFinalized
                | Self::AlreadyStarted
                | Self::NotInitialized
                | Self::NotStarted
        )
    }

    /// Returns true if this error was raised by the sampler rather than by
    /// the store's bookkeeping.
    #[must_use]
    pub const fn is_sampling(&self) -> bool {
        matches!(
            self,
            Self::RejectionExhausted { .. }
                | Self::InvalidParameters { .. }
                | Self::DistributionMismatch { .. }
        )
    }

    pub(crate) fn invalid_parameters(kind: DistributionKind, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result type alias for PSE operations.
pub type PseResult<T> = Result<T, PseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_c_runtime() {
        assert_eq!(PseError::AlreadyInitialized.code(), -1);
        assert_eq!(PseError::AlreadyFinalized.code(), -3);
        assert_eq!(PseError::NotStarted.code(), -6);
        assert_eq!(
            PseError::VariableUnknown { id: VariableId::from_raw(3) }.code(),
            -11
        );
        assert_eq!(
            PseError::VariableIsImmutable { id: VariableId::from_raw(0) }.code(),
            -23
        );
    }

    #[test]
    fn test_extended_codes_are_distinct() {
        let errors = [
            PseError::RejectionExhausted {
                stage: RejectionStage::Byte,
                attempts: 10,
            },
            PseError::invalid_parameters(DistributionKind::Normal, "sd"),
            PseError::DistributionMismatch {
                kind: DistributionKind::Poisson,
                domain: Domain::Real,
            },
            PseError::InvalidArraySize { size: 0 },
            PseError::NameTooLong { len: 60, max: 50 },
            PseError::StringTooLong { len: 2000, max: 1000 },
            PseError::InvalidConfig {
                reason: "x".to_string(),
            },
            PseError::TextNotPrintable {
                id: VariableId::from_raw(1),
                position: 0,
                byte: 0x0a,
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(PseError::code).collect();
        assert!(codes.iter().all(|c| *c < -23));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_carries_context() {
        let err = PseError::ArrayOutOfBounds {
            id: VariableId::from_raw(4),
            index: 9,
            size: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 9"));
        assert!(msg.contains("size 5"));

        let err = PseError::RejectionExhausted {
            stage: RejectionStage::Position,
            attempts: 128,
        };
        assert!(err.to_string().contains("position draw"));
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn test_classification() {
        assert!(PseError::NotStarted.is_lifecycle());
        assert!(!PseError::NotStarted.is_sampling());
        let err = PseError::invalid_parameters(DistributionKind::Beta, "alpha must be > 0");
        assert!(err.is_sampling());
        assert!(!err.is_lifecycle());
        assert_eq!(err.summary(), "Invalid distribution parameters");
    }
}
