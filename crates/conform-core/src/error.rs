//! Error types for binding and dispatch

use conform_checker::{Diagnostic, ErrorCode, Mismatch};
use conform_types::{DescriptorError, Fingerprint, TypeRef, Value};

/// A concrete method's own failure, handed back to the caller untouched
pub type MethodError = Box<dyn std::error::Error + Send + Sync>;

/// What a forwarded call returns once the call itself was well-formed
pub type MethodResult = Result<Value, MethodError>;

/// Errors raised while binding an object to an interface
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindError {
    /// No interface with this name has been defined
    #[error("Unknown interface '{name}'")]
    UnknownInterface {
        /// Requested interface name
        name: String,
    },

    /// The object's type has no declared surface
    #[error("No surface declared for type '{name}'")]
    UnknownType {
        /// Rust type name, or the requested concrete name
        name: String,
    },

    /// The type's surface does not cover the interface
    #[error(
        "Type '{concrete}' does not satisfy interface '{interface}': {} unsatisfied method(s)",
        .mismatches.len()
    )]
    IncompatibleType {
        /// Interface name
        interface: String,
        /// Concrete type name
        concrete: String,
        /// Every unsatisfied requirement
        mismatches: Vec<Mismatch>,
    },

    /// The pair is compatible but nobody registered it
    #[error("Binding '{concrete}' to interface '{interface}' is not permitted")]
    BindingNotPermitted {
        /// Interface name
        interface: String,
        /// Concrete type name
        concrete: String,
    },

    /// Requirements satisfied by more than one method, and nothing else wrong
    #[error(
        "Ambiguous overloads binding '{concrete}' to '{interface}': {}",
        .ambiguities.iter().map(|m| m.signature.as_str()).collect::<Vec<_>>().join(", ")
    )]
    AmbiguousOverloadMatch {
        /// Interface name
        interface: String,
        /// Concrete type name
        concrete: String,
        /// Every ambiguous requirement, in interface declaration order
        ambiguities: Vec<Mismatch>,
    },

    /// Malformed descriptor or surface
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl BindError {
    /// Developer-facing diagnostics for this error
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            BindError::UnknownInterface { name } => vec![Diagnostic::error(self.to_string())
                .with_code(ErrorCode("E0201"))
                .with_help(format!("define '{}' before binding to it", name))],
            BindError::UnknownType { .. } => vec![Diagnostic::error(self.to_string())
                .with_code(ErrorCode("E0202"))
                .with_help("declare the type's surface with `Binder::declare`")],
            BindError::IncompatibleType {
                interface,
                concrete,
                mismatches,
            }
            | BindError::AmbiguousOverloadMatch {
                interface,
                concrete,
                ambiguities: mismatches,
            } => mismatches
                .iter()
                .map(|m| Diagnostic::from_mismatch(interface, concrete, m))
                .collect(),
            BindError::BindingNotPermitted {
                interface,
                concrete,
            } => vec![Diagnostic::error(self.to_string())
                .with_code(ErrorCode("E0203"))
                .with_note(format!("'{}' satisfies '{}' structurally", concrete, interface))
                .with_help(format!(
                    "register the pair first: register(\"{}\", \"{}\")",
                    interface, concrete
                ))],
            BindError::Descriptor(error) => vec![Diagnostic::from_descriptor_error(error)],
        }
    }
}

/// Caller misuse detected when dispatching through a delegate
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// The slot was resolved against a different interface
    #[error("Slot belongs to interface {found}, delegate is bound to {expected}")]
    ForeignSlot {
        /// Fingerprint of the delegate's interface
        expected: Fingerprint,
        /// Fingerprint carried by the slot
        found: Fingerprint,
    },

    /// The implementation needs `&mut` and the delegate only holds `&`
    #[error("'{method}' needs exclusive access to its receiver")]
    ReadOnlyReceiver {
        /// Method signature
        method: String,
    },

    /// Too few or too many arguments
    #[error("'{method}' takes {min} to {max} argument(s), got {got}")]
    Arity {
        /// Method signature
        method: String,
        /// Arguments without defaults
        min: usize,
        /// Declared parameters
        max: usize,
        /// Arguments supplied
        got: usize,
    },

    /// An argument does not inhabit its parameter type
    #[error("Argument {index} of '{method}' must be {expected}, got {got}")]
    ArgumentType {
        /// Method signature
        method: String,
        /// Zero-based argument index
        index: usize,
        /// Declared parameter type
        expected: TypeRef,
        /// Type of the supplied value
        got: TypeRef,
    },
}
