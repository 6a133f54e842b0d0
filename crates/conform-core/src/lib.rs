//! Conform core
//!
//! Structural interface binding: a Rust type declares its method surface,
//! an interface lists the signatures it needs, and once the pair has been
//! registered `bind` hands out a non-owning delegate that forwards calls
//! through a shared, cached function table.
//!
//! # Example
//!
//! ```ignore
//! use conform_core::{Binder, TypeRef, TypeSurface, Value};
//!
//! struct FileLogger { lines: Vec<String>, level: i64 }
//!
//! let binder = Binder::new();
//! binder.define_interface("Logger", ["log(string) -> void", "level() -> int readonly"])?;
//! binder.declare(
//!     TypeSurface::<FileLogger>::new("FileLogger")
//!         .method("log(string) -> void", |this, args| {
//!             this.lines.push(args[0].as_str().unwrap_or_default().to_string());
//!         })
//!         .const_method("level() -> int readonly", |this, _| this.level),
//! )?;
//! binder.register("Logger", "FileLogger");
//!
//! let mut logger = FileLogger { lines: Vec::new(), level: 2 };
//! let mut delegate = binder.bind_mut("Logger", &mut logger)?;
//! let log = delegate.resolve("log", &[TypeRef::STRING]).unwrap();
//! delegate.call(log, &[Value::str("hello")])??;
//! ```

#![warn(missing_docs)]

pub mod binder;
pub mod delegate;
pub mod error;
pub mod registry;
pub mod surface;
pub mod table;

pub use binder::Binder;
pub use delegate::{Delegate, DelegateMut};
pub use error::{BindError, CallError, MethodError, MethodResult};
pub use registry::{BindingKey, BindingRegistry};
pub use surface::{ConcreteType, MethodOutput, TypeSurface};
pub use table::{Access, ForwardEntry, FunctionTable, TableCache, TableKey};

pub use conform_checker::{is_compatible, Compatibility, Mismatch, MismatchReason};
pub use conform_types::{
    parse_signature, InterfaceDescriptor, MethodSignature, MethodSlot, Qualifiers, TypeRef, Value,
};
