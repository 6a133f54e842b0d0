//! Conform descriptor model
//!
//! Method signatures, interface descriptors and concrete type descriptors,
//! plus the values that flow through bound delegates.

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
mod lexer;
pub mod notation;
pub mod signature;
pub mod ty;
pub mod value;

pub use descriptor::{
    ConcreteTypeDescriptor, Fingerprint, InterfaceDescriptor, MethodKey, MethodSlot,
    OverloadGroup,
};
pub use error::{DescriptorError, ParseError};
pub use notation::{parse_signature, IntoSignature};
pub use signature::{MemberKind, MethodSignature, Param, Qualifiers, SignatureKey};
pub use ty::{PrimitiveType, TypeRef};
pub use value::{Opaque, Value};
