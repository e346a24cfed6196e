//! Errors raised by the attribute protocol
use thiserror::Error;

use crate::attributes::{AnyAttribute, AttributeFamily};
use crate::functions::ConversionError;
use crate::index::{AnyIndex, NameTarget};

/// Error returned by the protocol accessors
///
/// Every variant identifies what was being accessed. None of them are recovered from inside
/// the protocol, they are handed to the caller as is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The instance has no override for this access
    #[error("{family} {attribute} is not supported by instance of kind {instance}")]
    UnsupportedAccess {
        family: AttributeFamily,
        attribute: String,
        instance: String,
    },
    /// A name lookup didn't match anything
    #[error("no {target} named {name:?} in instance of kind {instance}")]
    NameNotFound {
        target: NameTarget,
        name: String,
        instance: String,
    },
    /// The index was never valid for the instance, or refers to something since deleted
    #[error("{index} does not exist in instance of kind {instance}")]
    IndexNotFound { index: AnyIndex, instance: String },
    /// A stored function couldn't be represented exactly as the requested function type
    #[error("unable to convert {from} into {to}: {source}")]
    ConversionImpossible {
        from: &'static str,
        to: &'static str,
        #[source]
        source: ConversionError,
    },
    /// A result index outside `1..=ResultCount`
    #[error("result index {index} is out of range, the instance has {result_count} results")]
    InvalidResultIndex { index: usize, result_count: usize },
    /// A bulk access was given the wrong number of values or output slots
    #[error("expected {expected} values to match the indices, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// The name is already used by another variable or constraint
    #[error("a {target} named {name:?} already exists")]
    DuplicateName { target: NameTarget, name: String },
    /// The instance answered with a value of the wrong type
    #[error("instance answered {attribute} with a value of the wrong type")]
    ValueTypeMismatch { attribute: String },
    /// The attribute is supported but currently has no value, or the instance reported
    /// success without answering
    #[error("instance of kind {instance} has no value for {attribute}")]
    NoValue { attribute: String, instance: String },
    /// The value is of the right type but the instance can't accept it
    #[error("instance of kind {instance} rejected the value for {attribute}: {reason}")]
    InvalidValue {
        attribute: String,
        reason: String,
        instance: String,
    },
}

impl ProtocolError {
    /// Build the default failure for an attribute the instance doesn't handle
    pub fn unsupported(attribute: &dyn AnyAttribute, instance: &str) -> Self {
        ProtocolError::UnsupportedAccess {
            family: attribute.family(),
            attribute: format!("{:?}", attribute),
            instance: instance.to_string(),
        }
    }

    /// Stable identifier for the kind of error
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::UnsupportedAccess { .. } => "ATTRIBUTE_UNSUPPORTED",
            ProtocolError::NameNotFound { .. } => "NAME_NOT_FOUND",
            ProtocolError::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            ProtocolError::ConversionImpossible { .. } => "CONVERSION_IMPOSSIBLE",
            ProtocolError::InvalidResultIndex { .. } => "RESULT_INDEX_INVALID",
            ProtocolError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            ProtocolError::DuplicateName { .. } => "NAME_DUPLICATE",
            ProtocolError::ValueTypeMismatch { .. } => "VALUE_TYPE_MISMATCH",
            ProtocolError::NoValue { .. } => "NO_VALUE",
            ProtocolError::InvalidValue { .. } => "VALUE_INVALID",
        }
    }

    /// Check if the error means the instance can't serve this access at all
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ProtocolError::UnsupportedAccess { .. })
    }

    /// Check if the error means a name or index didn't resolve
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProtocolError::NameNotFound { .. } | ProtocolError::IndexNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ObjectiveValue;
    use crate::index::VariableIndex;
    use std::error::Error;

    #[test]
    fn unsupported_message_names_family_attribute_and_kind() {
        let err = ProtocolError::unsupported(&ObjectiveValue::new(2), "SomeSolver");
        let message = err.to_string();
        assert!(message.contains("InstanceAttribute"));
        assert!(message.contains("ObjectiveValue"));
        assert!(message.contains("SomeSolver"));
        assert_eq!(err.code(), "ATTRIBUTE_UNSUPPORTED");
        assert!(err.is_unsupported());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_group() {
        let by_name = ProtocolError::NameNotFound {
            target: NameTarget::Variable,
            name: "x".to_string(),
            instance: "MockInstance".to_string(),
        };
        let by_index = ProtocolError::IndexNotFound {
            index: AnyIndex::Variable(VariableIndex::new(4)),
            instance: "MockInstance".to_string(),
        };
        assert!(by_name.is_not_found());
        assert!(by_index.is_not_found());
        assert_eq!(by_name.to_string(), "no variable named \"x\" in instance of kind MockInstance");
        assert!(by_index.to_string().contains("VariableIndex(4)"));
    }

    #[test]
    fn conversion_keeps_source() {
        let err = ProtocolError::ConversionImpossible {
            from: "ScalarQuadraticFunction",
            to: "ScalarAffineFunction",
            source: ConversionError::QuadraticTerms { count: 2 },
        };
        assert!(err.source().is_some());
        assert_eq!(err.code(), "CONVERSION_IMPOSSIBLE");
    }
}
