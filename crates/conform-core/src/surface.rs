//! Type surfaces
//!
//! A surface declares the public methods of a Rust type under a concrete type
//! name, together with the closures that implement them. Building the surface
//! yields the type's descriptor for the matcher and the erased functions a
//! forwarding table points at.
//!
//! ```ignore
//! let surface = TypeSurface::<FileLogger>::new("FileLogger")
//!     .method("log(string) -> void", |this, args| {
//!         this.lines.push(args[0].as_str().unwrap_or_default().to_string());
//!     })
//!     .const_method("level() -> int readonly nothrow", |this, _| this.level);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use conform_types::{
    ConcreteTypeDescriptor, DescriptorError, IntoSignature, MemberKind, MethodSignature, TypeRef,
    Value,
};

use crate::delegate::ObjectHandle;
use crate::error::{MethodError, MethodResult};
use crate::table::Access;

/// Erased forwarding function: receiver handle plus arguments
pub(crate) type ErasedFn = dyn Fn(ObjectHandle, &[Value]) -> MethodResult + Send + Sync;

/// Return types a method implementation may produce
pub trait MethodOutput {
    /// Whether the implementation can report an error
    const FALLIBLE: bool;

    /// Declared type of the produced value, `None` when only known at runtime
    fn return_type() -> Option<TypeRef>;

    /// Convert into the forwarded result
    fn into_result(self) -> MethodResult;
}

macro_rules! impl_method_output {
    ($($ty:ty => $ret:expr),* $(,)?) => {
        $(
            impl MethodOutput for $ty {
                const FALLIBLE: bool = false;

                fn return_type() -> Option<TypeRef> {
                    $ret
                }

                fn into_result(self) -> MethodResult {
                    Ok(Value::from(self))
                }
            }

            impl MethodOutput for Result<$ty, MethodError> {
                const FALLIBLE: bool = true;

                fn return_type() -> Option<TypeRef> {
                    $ret
                }

                fn into_result(self) -> MethodResult {
                    self.map(Value::from)
                }
            }
        )*
    };
}

impl_method_output! {
    Value => None,
    () => Some(TypeRef::VOID),
    bool => Some(TypeRef::BOOL),
    i64 => Some(TypeRef::INT),
    f64 => Some(TypeRef::FLOAT),
    String => Some(TypeRef::STRING),
    Vec<u8> => Some(TypeRef::BYTES),
}

/// One implemented method of a concrete type
#[derive(Clone)]
pub(crate) struct Implementation {
    pub(crate) access: Access,
    pub(crate) call: Arc<ErasedFn>,
}

/// Builder for a Rust type's declared method surface
pub struct TypeSurface<T> {
    name: String,
    methods: Vec<(MethodSignature, Implementation)>,
    error: Option<DescriptorError>,
    _type: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> TypeSurface<T> {
    /// Start a surface for `T` under the concrete type name `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            error: None,
            _type: PhantomData,
        }
    }

    /// Declare a method implemented through `&mut T`.
    ///
    /// Read-only signatures must use [`TypeSurface::const_method`].
    pub fn method<R, F>(mut self, signature: impl IntoSignature, f: F) -> Self
    where
        R: MethodOutput,
        F: Fn(&mut T, &[Value]) -> R + Send + Sync + 'static,
    {
        let Some(sig) = self.accept::<R>(signature) else {
            return self;
        };
        if sig.qualifiers.is_read_only() {
            self.fail(&sig, "read-only methods must take a shared receiver");
            return self;
        }
        let call: Arc<ErasedFn> = Arc::new(move |handle: ObjectHandle, args: &[Value]| {
            // SAFETY: exclusive entries are only reachable through a
            // `DelegateMut`, whose handle came from a `&mut T` of this type.
            let this = unsafe { handle.as_mut::<T>() };
            f(this, args).into_result()
        });
        self.methods.push((
            sig,
            Implementation {
                access: Access::Exclusive,
                call,
            },
        ));
        self
    }

    /// Declare a method implemented through `&T`
    pub fn const_method<R, F>(mut self, signature: impl IntoSignature, f: F) -> Self
    where
        R: MethodOutput,
        F: Fn(&T, &[Value]) -> R + Send + Sync + 'static,
    {
        let Some(sig) = self.accept::<R>(signature) else {
            return self;
        };
        let call: Arc<ErasedFn> = Arc::new(move |handle: ObjectHandle, args: &[Value]| {
            // SAFETY: the binder only pairs tables for `T` with handles whose
            // pointee has `TypeId::of::<T>()`.
            let this = unsafe { handle.as_ref::<T>() };
            f(this, args).into_result()
        });
        self.methods.push((
            sig,
            Implementation {
                access: Access::Shared,
                call,
            },
        ));
        self
    }

    /// Finish the surface
    pub fn build(self) -> Result<ConcreteType, DescriptorError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let (signatures, implementations): (Vec<_>, Vec<_>) = self.methods.into_iter().unzip();
        // The descriptor drops and counts non-method members; drop their
        // implementations the same way so indices stay aligned.
        let implementations = signatures
            .iter()
            .zip(implementations)
            .filter(|(sig, _)| sig.kind == MemberKind::Method)
            .map(|(_, implementation)| implementation)
            .collect();
        let descriptor = ConcreteTypeDescriptor::new(self.name, signatures)?;
        Ok(ConcreteType {
            descriptor,
            type_id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
            implementations,
        })
    }

    /// Parse the signature and check it against what the closure returns.
    /// Only the first problem is kept.
    fn accept<R: MethodOutput>(&mut self, signature: impl IntoSignature) -> Option<MethodSignature> {
        if self.error.is_some() {
            return None;
        }
        let sig = match signature.into_signature(&self.name) {
            Ok(sig) => sig,
            Err(error) => {
                self.error = Some(error);
                return None;
            }
        };
        if let Some(ret) = R::return_type() {
            if ret != sig.return_type {
                let reason = format!("implementation returns {}, signature declares {}", ret, sig.return_type);
                self.fail(&sig, reason);
                return None;
            }
        }
        if R::FALLIBLE && sig.qualifiers.is_non_throwing() {
            self.fail(&sig, "non-throwing methods need an infallible implementation");
            return None;
        }
        Some(sig)
    }

    fn fail(&mut self, sig: &MethodSignature, reason: impl Into<String>) {
        self.error.get_or_insert(DescriptorError::ImplementationMismatch {
            owner: self.name.clone(),
            method: sig.to_string(),
            reason: reason.into(),
        });
    }
}

/// A declared concrete type: its descriptor plus the implementations behind
/// every method, in descriptor order
pub struct ConcreteType {
    descriptor: ConcreteTypeDescriptor,
    type_id: TypeId,
    rust_name: &'static str,
    implementations: Vec<Implementation>,
}

impl ConcreteType {
    /// Concrete type name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Descriptor handed to the matcher
    pub fn descriptor(&self) -> &ConcreteTypeDescriptor {
        &self.descriptor
    }

    /// Identity of the Rust type behind the surface
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name, for messages
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    pub(crate) fn implementation(&self, index: usize) -> Option<&Implementation> {
        self.implementations.get(index)
    }
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("name", &self.descriptor.name())
            .field("rust_name", &self.rust_name)
            .field("methods", &self.descriptor.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        count: i64,
    }

    #[derive(Debug)]
    struct Overflow;

    impl fmt::Display for Overflow {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("overflow")
        }
    }

    impl std::error::Error for Overflow {}

    #[test]
    fn test_build_surface() {
        let ty = TypeSurface::<Counter>::new("Counter")
            .method("bump(int) -> int", |this, args| {
                this.count += args[0].as_int().unwrap_or(0);
                this.count
            })
            .const_method("get() -> int readonly", |this, _| this.count)
            .build()
            .unwrap();

        assert_eq!(ty.name(), "Counter");
        assert_eq!(ty.descriptor().len(), 2);
        assert_eq!(ty.type_id(), TypeId::of::<Counter>());
        assert_eq!(ty.implementation(0).unwrap().access, Access::Exclusive);
        assert_eq!(ty.implementation(1).unwrap().access, Access::Shared);
    }

    #[test]
    fn test_read_only_needs_shared_receiver() {
        let err = TypeSurface::<Counter>::new("Counter")
            .method("get() -> int readonly", |this, _| this.count)
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::ImplementationMismatch { .. }));
    }

    #[test]
    fn test_return_type_must_agree() {
        let err = TypeSurface::<Counter>::new("Counter")
            .const_method("get() -> string readonly", |this, _| this.count)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::ImplementationMismatch { ref reason, .. } if reason.contains("returns int")
        ));
    }

    #[test]
    fn test_fallible_implementation_cannot_be_non_throwing() {
        let err = TypeSurface::<Counter>::new("Counter")
            .method("bump() -> int nothrow", |this, _| -> Result<i64, MethodError> {
                this.count = this.count.checked_add(1).ok_or(Overflow)?;
                Ok(this.count)
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::ImplementationMismatch { .. }));
    }

    #[test]
    fn test_dynamic_value_output_is_accepted() {
        let ty = TypeSurface::<Counter>::new("Counter")
            .const_method("describe() -> string readonly", |this, _| {
                Value::from(format!("count={}", this.count))
            })
            .build();
        assert!(ty.is_ok());
    }

    #[test]
    fn test_non_method_members_are_counted() {
        let size = conform_types::parse_signature("size() -> int readonly")
            .unwrap()
            .with_kind(MemberKind::Field);
        let ty = TypeSurface::<Counter>::new("Counter")
            .const_method(size, |this, _| this.count)
            .method("bump(int) -> int", |this, args| {
                this.count += args[0].as_int().unwrap_or(0);
                this.count
            })
            .build()
            .unwrap();

        assert_eq!(ty.descriptor().len(), 1);
        assert_eq!(ty.descriptor().skipped_members(), 1);
        assert_eq!(ty.implementation(0).unwrap().access, Access::Exclusive);
        assert!(ty.implementation(1).is_none());
    }

    #[test]
    fn test_first_error_wins() {
        let err = TypeSurface::<Counter>::new("Counter")
            .const_method("get(", |this, _| this.count)
            .method("get() -> int readonly", |this, _| this.count)
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidSignature { .. }));
    }
}
