//! Type references used in method signatures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Primitive types understood by the dispatch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// No value (method returns nothing)
    Void,
    /// `bool`
    Bool,
    /// `int` (64-bit signed)
    Int,
    /// `float` (IEEE 754 double precision)
    Float,
    /// `string`
    String,
    /// `bytes`
    Bytes,
}

impl PrimitiveType {
    /// All primitives, in declaration order
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::Void,
        PrimitiveType::Bool,
        PrimitiveType::Int,
        PrimitiveType::Float,
        PrimitiveType::String,
        PrimitiveType::Bytes,
    ];

    /// The spelling of this primitive in signatures
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::String => "string",
            PrimitiveType::Bytes => "bytes",
        }
    }

    /// Look up a primitive by its spelling
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.type_name() == name)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A parameter or return type.
///
/// Types are compared by exact identity: no implicit conversions, no
/// covariance. Named types are opaque to the matcher; `Canvas` and
/// `gfx::Canvas` are different types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A primitive type
    Primitive(PrimitiveType),
    /// A named (user-defined) type
    Named(Arc<str>),
}

impl TypeRef {
    /// `void`
    pub const VOID: TypeRef = TypeRef::Primitive(PrimitiveType::Void);
    /// `bool`
    pub const BOOL: TypeRef = TypeRef::Primitive(PrimitiveType::Bool);
    /// `int`
    pub const INT: TypeRef = TypeRef::Primitive(PrimitiveType::Int);
    /// `float`
    pub const FLOAT: TypeRef = TypeRef::Primitive(PrimitiveType::Float);
    /// `string`
    pub const STRING: TypeRef = TypeRef::Primitive(PrimitiveType::String);
    /// `bytes`
    pub const BYTES: TypeRef = TypeRef::Primitive(PrimitiveType::Bytes);

    /// Create a named type reference
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Check if this is `void`
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveType::Void))
    }

    /// Get the primitive type if this is a primitive
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            TypeRef::Named(_) => None,
        }
    }

    /// Get the name of a named type
    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Primitive(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

impl From<PrimitiveType> for TypeRef {
    fn from(p: PrimitiveType) -> Self {
        TypeRef::Primitive(p)
    }
}

impl FromStr for TypeRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty type name".to_string());
        }
        Ok(match PrimitiveType::from_name(s) {
            Some(p) => TypeRef::Primitive(p),
            None => TypeRef::named(s),
        })
    }
}

impl Serialize for TypeRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_display() {
        assert_eq!(format!("{}", PrimitiveType::Void), "void");
        assert_eq!(format!("{}", PrimitiveType::Int), "int");
        assert_eq!(format!("{}", PrimitiveType::String), "string");
        assert_eq!(format!("{}", TypeRef::BYTES), "bytes");
    }

    #[test]
    fn test_parse_primitive_and_named() {
        assert_eq!("int".parse::<TypeRef>().unwrap(), TypeRef::INT);
        assert_eq!(" float ".parse::<TypeRef>().unwrap(), TypeRef::FLOAT);
        assert_eq!(
            "gfx::Canvas".parse::<TypeRef>().unwrap(),
            TypeRef::named("gfx::Canvas")
        );
        assert!("".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_named_types_are_exact() {
        assert_ne!(TypeRef::named("Canvas"), TypeRef::named("gfx::Canvas"));
        assert_ne!(TypeRef::named("int"), TypeRef::INT);
    }

    #[test]
    fn test_as_methods() {
        assert!(TypeRef::VOID.is_void());
        assert_eq!(TypeRef::BOOL.as_primitive(), Some(PrimitiveType::Bool));
        assert_eq!(TypeRef::named("Canvas").as_named(), Some("Canvas"));
        assert!(TypeRef::INT.as_named().is_none());
    }
}
