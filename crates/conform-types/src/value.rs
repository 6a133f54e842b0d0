//! Runtime values passed through forwarding entries
//!
//! A `Value` is what a delegate call carries across the erased boundary:
//! the arguments going in and the result coming out. Every value inhabits
//! exactly one [`TypeRef`], which the dispatch layer compares against the
//! declared parameter types before forwarding.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ty::{PrimitiveType, TypeRef};

/// Opaque payload of a named type.
///
/// Cloning shares the payload. Two opaque values are equal only if they
/// share the same allocation.
#[derive(Clone)]
pub struct Opaque {
    type_name: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap a payload under a named type
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }

    /// Name of the type this payload inhabits
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The unit value of `void`
    Void,
    /// `bool`
    Bool(bool),
    /// `int`
    Int(i64),
    /// `float`
    Float(f64),
    /// `string`
    Str(Arc<str>),
    /// `bytes`
    Bytes(Arc<[u8]>),
    /// A value of a named type
    Object(Opaque),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a value of a named type
    pub fn object<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, payload: T) -> Self {
        Value::Object(Opaque::new(type_name, payload))
    }

    /// The type this value inhabits
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Value::Void => TypeRef::Primitive(PrimitiveType::Void),
            Value::Bool(_) => TypeRef::Primitive(PrimitiveType::Bool),
            Value::Int(_) => TypeRef::Primitive(PrimitiveType::Int),
            Value::Float(_) => TypeRef::Primitive(PrimitiveType::Float),
            Value::Str(_) => TypeRef::Primitive(PrimitiveType::String),
            Value::Bytes(_) => TypeRef::Primitive(PrimitiveType::Bytes),
            Value::Object(o) => TypeRef::Named(o.type_name.clone()),
        }
    }

    /// Check whether this value inhabits `ty`, without allocating
    pub fn is_of(&self, ty: &TypeRef) -> bool {
        match (self, ty) {
            (Value::Object(o), TypeRef::Named(name)) => *o.type_name == **name,
            (Value::Object(_), TypeRef::Primitive(_)) => false,
            (_, TypeRef::Named(_)) => false,
            (v, TypeRef::Primitive(p)) => v.primitive() == Some(*p),
        }
    }

    fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            Value::Void => Some(PrimitiveType::Void),
            Value::Bool(_) => Some(PrimitiveType::Bool),
            Value::Int(_) => Some(PrimitiveType::Int),
            Value::Float(_) => Some(PrimitiveType::Float),
            Value::Str(_) => Some(PrimitiveType::String),
            Value::Bytes(_) => Some(PrimitiveType::Bytes),
            Value::Object(_) => None,
        }
    }

    /// Get the boolean if this is a `bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer if this is an `int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float if this is a `float`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the string if this is a `string`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the bytes if this is `bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the payload of a named-type value as `T`
    pub fn as_object<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(o) => o.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Object(o) => write!(f, "<{}>", o.type_name),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Arc::from(b))
    }
}
