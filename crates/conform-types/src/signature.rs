//! Method signatures and their qualifiers

use serde::{Serialize, Serializer};
use std::fmt;

use crate::ty::TypeRef;
use crate::value::Value;

/// Method qualifier flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Qualifiers(u8);

impl Qualifiers {
    /// No qualifiers
    pub const NONE: Self = Self(0x00);
    /// The method does not mutate its receiver
    pub const READ_ONLY: Self = Self(0x01);
    /// The method may be called on a volatile receiver
    pub const VOLATILE: Self = Self(0x02);
    /// The method never reports an error
    pub const NON_THROWING: Self = Self(0x04);

    /// Flags that must agree exactly between a requirement and a candidate
    const EXACT: Self = Self(0x03);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x07)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if all flags of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// `READ_ONLY` is set
    pub const fn is_read_only(&self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    /// `VOLATILE` is set
    pub const fn is_volatile(&self) -> bool {
        self.contains(Self::VOLATILE)
    }

    /// `NON_THROWING` is set
    pub const fn is_non_throwing(&self) -> bool {
        self.contains(Self::NON_THROWING)
    }

    /// Check if a candidate carrying `self` satisfies a method that requires
    /// `required`.
    ///
    /// Read-only and volatile must match exactly. A non-throwing candidate
    /// satisfies a requirement that allows errors, never the other way round.
    pub const fn satisfies(&self, required: Self) -> bool {
        (self.0 & Self::EXACT.0) == (required.0 & Self::EXACT.0)
            && (!required.is_non_throwing() || self.is_non_throwing())
    }

    /// Parse a single qualifier keyword
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "readonly" | "const" => Some(Self::READ_ONLY),
            "volatile" => Some(Self::VOLATILE),
            "nothrow" | "noexcept" => Some(Self::NON_THROWING),
            _ => None,
        }
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, word) in [
            (Self::READ_ONLY, "readonly"),
            (Self::VOLATILE, "volatile"),
            (Self::NON_THROWING, "nothrow"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(word)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Serialize for Qualifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What kind of member a raw signature describes.
///
/// Only plain methods can appear in an interface; the other kinds exist so a
/// front-end can hand over a type's whole public surface unfiltered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemberKind {
    /// Ordinary named method
    #[default]
    Method,
    /// Constructor
    Constructor,
    /// Destructor
    Destructor,
    /// Operator overload
    Operator,
    /// Data member
    Field,
    /// Method with its own type parameters
    GenericMethod,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::Destructor => "destructor",
            MemberKind::Operator => "operator",
            MemberKind::Field => "data member",
            MemberKind::GenericMethod => "generic method",
        };
        f.write_str(s)
    }
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter type
    pub ty: TypeRef,
    /// Caller-facing default, never consulted by the matcher
    pub default: Option<Value>,
}

/// Identity of a signature within one descriptor: name, parameter types and
/// qualifiers. Return types and defaults do not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    /// Method name
    pub name: String,
    /// Parameter types in order
    pub params: Vec<TypeRef>,
    /// Qualifier flags
    pub qualifiers: Qualifiers,
}

/// A method signature
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Ordered parameters
    pub params: Vec<Param>,
    /// Return type
    pub return_type: TypeRef,
    /// Qualifier flags
    pub qualifiers: Qualifiers,
    /// Member kind
    pub kind: MemberKind,
}

impl MethodSignature {
    /// Create a `void` method with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::VOID,
            qualifiers: Qualifiers::NONE,
            kind: MemberKind::Method,
        }
    }

    /// Append a parameter
    pub fn param(mut self, ty: impl Into<TypeRef>) -> Self {
        self.params.push(Param {
            ty: ty.into(),
            default: None,
        });
        self
    }

    /// Append a parameter with a caller-facing default
    pub fn param_with_default(mut self, ty: impl Into<TypeRef>, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            ty: ty.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: impl Into<TypeRef>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Add qualifier flags
    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = self.qualifiers.union(qualifiers);
        self
    }

    /// Mark read-only
    pub fn read_only(self) -> Self {
        self.with_qualifiers(Qualifiers::READ_ONLY)
    }

    /// Mark volatile
    pub fn volatile(self) -> Self {
        self.with_qualifiers(Qualifiers::VOLATILE)
    }

    /// Mark non-throwing
    pub fn non_throwing(self) -> Self {
        self.with_qualifiers(Qualifiers::NON_THROWING)
    }

    /// Set the member kind
    pub fn with_kind(mut self, kind: MemberKind) -> Self {
        self.kind = kind;
        self
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Number of parameters a caller must supply explicitly
    pub fn required_arity(&self) -> usize {
        self.params.iter().take_while(|p| p.default.is_none()).count()
    }

    /// Parameter types in order
    pub fn param_types(&self) -> impl Iterator<Item = &TypeRef> + '_ {
        self.params.iter().map(|p| &p.ty)
    }

    /// Check whether both signatures take the identical parameter list
    pub fn same_params(&self, other: &MethodSignature) -> bool {
        self.params.len() == other.params.len()
            && self.param_types().zip(other.param_types()).all(|(a, b)| a == b)
    }

    /// Check whether the parameter list is exactly `types`
    pub fn takes(&self, types: &[TypeRef]) -> bool {
        self.params.len() == types.len() && self.param_types().zip(types).all(|(a, b)| a == b)
    }

    /// Identity key
    pub fn key(&self) -> SignatureKey {
        SignatureKey {
            name: self.name.clone(),
            params: self.param_types().cloned().collect(),
            qualifiers: self.qualifiers,
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
            if let Some(default) = &param.default {
                write!(f, " = {}", default)?;
            }
        }
        write!(f, ") -> {}", self.return_type)?;
        if self.qualifiers != Qualifiers::NONE {
            write!(f, " {}", self.qualifiers)?;
        }
        Ok(())
    }
}
