//! Descriptor errors

use thiserror::Error;

use crate::signature::MemberKind;

/// Errors raised while defining a descriptor or declaring a type surface
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DescriptorError {
    /// Two signatures share name, parameter types and qualifiers
    #[error("Duplicate signature in {owner}: {signature}")]
    DuplicateSignature {
        /// Interface or type being defined
        owner: String,
        /// The repeated signature
        signature: String,
    },

    /// Interfaces may only list ordinary methods
    #[error("{owner} cannot require {kind} '{name}'")]
    DisallowedMember {
        /// Interface being defined
        owner: String,
        /// Member name
        name: String,
        /// What kind of member was supplied
        kind: MemberKind,
    },

    /// Name is empty or not an identifier
    #[error("Invalid name '{name}' in {owner}")]
    InvalidName {
        /// Interface or type being defined
        owner: String,
        /// Offending name
        name: String,
    },

    /// A default value does not inhabit its parameter's type
    #[error("Default for parameter {index} of {owner}::{method} has type {actual}, expected {expected}")]
    DefaultTypeMismatch {
        /// Interface or type being defined
        owner: String,
        /// Method name
        method: String,
        /// Zero-based parameter index
        index: usize,
        /// Declared parameter type
        expected: String,
        /// Type of the supplied default
        actual: String,
    },

    /// A parameter without a default follows one with a default
    #[error("Parameter {index} of {owner}::{method} needs a default because an earlier parameter has one")]
    NonTrailingDefault {
        /// Interface or type being defined
        owner: String,
        /// Method name
        method: String,
        /// Zero-based parameter index
        index: usize,
    },

    /// The same name was defined twice with different contents
    #[error("{name} is already defined with a different signature set")]
    Redefinition {
        /// Interface or type name
        name: String,
    },

    /// An implementation does not agree with the signature it was declared under
    #[error("Implementation of {owner}::{method} does not match its signature: {reason}")]
    ImplementationMismatch {
        /// Concrete type
        owner: String,
        /// Method name
        method: String,
        /// What disagrees
        reason: String,
    },

    /// A signature given in compact notation does not parse
    #[error("Invalid signature '{text}' in {owner}: {error}")]
    InvalidSignature {
        /// Interface or type being defined
        owner: String,
        /// The notation as written
        text: String,
        /// Parser error
        error: ParseError,
    },
}

/// Errors raised while parsing compact signature notation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// Input ended early
    #[error("Unexpected end of signature, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for
        expected: String,
    },

    /// A token that does not fit the grammar
    #[error("Unexpected '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        /// Source text of the token
        found: String,
        /// Byte offset
        offset: usize,
        /// What the parser was looking for
        expected: String,
    },

    /// A character sequence that is not a token
    #[error("Invalid character sequence '{text}' at offset {offset}")]
    InvalidToken {
        /// Offending text
        text: String,
        /// Byte offset
        offset: usize,
    },
}
