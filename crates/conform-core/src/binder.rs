//! Binder
//!
//! Catalogs of interfaces and declared type surfaces, the permission
//! registry and the table cache, tied together by `bind`.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use conform_checker::{is_compatible, Compatibility};
use conform_types::{DescriptorError, InterfaceDescriptor, IntoSignature};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::delegate::{Delegate, DelegateMut};
use crate::error::BindError;
use crate::registry::{BindingKey, BindingRegistry};
use crate::surface::{ConcreteType, TypeSurface};
use crate::table::{FunctionTable, TableCache, TableKey};

static GLOBAL: Lazy<Binder> = Lazy::new(Binder::new);

#[derive(Default)]
struct TypeCatalog {
    by_id: FxHashMap<TypeId, Arc<ConcreteType>>,
    by_name: FxHashMap<String, TypeId>,
}

/// Interface and type catalogs plus binding state
pub struct Binder {
    interfaces: RwLock<FxHashMap<String, Arc<InterfaceDescriptor>>>,
    types: RwLock<TypeCatalog>,
    registry: BindingRegistry,
    tables: TableCache,
}

impl Binder {
    /// Create an empty binder
    pub fn new() -> Self {
        Self {
            interfaces: RwLock::new(FxHashMap::default()),
            types: RwLock::new(TypeCatalog::default()),
            registry: BindingRegistry::new(),
            tables: TableCache::new(),
        }
    }

    /// Process-wide binder
    pub fn global() -> &'static Binder {
        &GLOBAL
    }

    /// Define an interface.
    ///
    /// Defining the same name again with an identical signature set returns
    /// the existing descriptor; a different set is a redefinition error.
    pub fn define_interface<S: IntoSignature>(
        &self,
        name: &str,
        signatures: impl IntoIterator<Item = S>,
    ) -> Result<Arc<InterfaceDescriptor>, DescriptorError> {
        let signatures = signatures
            .into_iter()
            .map(|s| s.into_signature(name))
            .collect::<Result<Vec<_>, _>>()?;
        let descriptor = InterfaceDescriptor::define(name, signatures)?;
        self.insert_interface(descriptor)
    }

    /// Add an already built descriptor, with the same redefinition rules as
    /// [`Binder::define_interface`]
    pub fn insert_interface(
        &self,
        descriptor: InterfaceDescriptor,
    ) -> Result<Arc<InterfaceDescriptor>, DescriptorError> {
        let mut interfaces = self.interfaces.write();
        if let Some(existing) = interfaces.get(descriptor.name()) {
            if existing.fingerprint() == descriptor.fingerprint() {
                return Ok(Arc::clone(existing));
            }
            return Err(DescriptorError::Redefinition {
                name: descriptor.name().to_string(),
            });
        }

        tracing::debug!(
            interface = descriptor.name(),
            methods = descriptor.len(),
            fingerprint = %descriptor.fingerprint(),
            "defined interface"
        );
        let descriptor = Arc::new(descriptor);
        interfaces.insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Look up an interface
    pub fn interface(&self, name: &str) -> Option<Arc<InterfaceDescriptor>> {
        self.interfaces.read().get(name).cloned()
    }

    /// Declare the surface of a Rust type.
    ///
    /// Each Rust type and each concrete type name can be declared once.
    pub fn declare<T: Any + Send + Sync>(
        &self,
        surface: TypeSurface<T>,
    ) -> Result<Arc<ConcreteType>, DescriptorError> {
        let concrete = Arc::new(surface.build()?);
        // Through the `Arc`, `.type_id()` would pick up `Any` for the pointer.
        let type_id = ConcreteType::type_id(&concrete);
        let mut types = self.types.write();
        if types.by_id.contains_key(&type_id)
            || types.by_name.contains_key(concrete.name())
        {
            return Err(DescriptorError::Redefinition {
                name: concrete.name().to_string(),
            });
        }

        tracing::debug!(
            concrete = concrete.name(),
            rust_type = concrete.rust_name(),
            methods = concrete.descriptor().len(),
            "declared type surface"
        );
        types.by_name.insert(concrete.name().to_string(), type_id);
        types.by_id.insert(type_id, Arc::clone(&concrete));
        Ok(concrete)
    }

    /// Look up a declared type by concrete type name
    pub fn concrete(&self, name: &str) -> Option<Arc<ConcreteType>> {
        let types = self.types.read();
        let id = types.by_name.get(name)?;
        types.by_id.get(id).cloned()
    }

    /// Look up the declared surface of `T`
    pub fn concrete_of<T: Any>(&self) -> Option<Arc<ConcreteType>> {
        self.types.read().by_id.get(&TypeId::of::<T>()).cloned()
    }

    /// Permit binding `concrete` to `interface`; `false` if already permitted
    pub fn register(&self, interface: &str, concrete: &str) -> bool {
        self.registry.register(interface, concrete)
    }

    /// Check if the pair has been registered
    pub fn is_permitted(&self, interface: &str, concrete: &str) -> bool {
        self.registry.is_permitted(interface, concrete)
    }

    /// Every registered pair
    pub fn permissions(&self) -> Vec<BindingKey> {
        self.registry.permissions()
    }

    /// Number of synthesized tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Match a defined interface against a declared type by name
    pub fn check(&self, interface: &str, concrete: &str) -> Result<Compatibility, BindError> {
        let iface = self.require_interface(interface)?;
        let ty = self.concrete(concrete).ok_or_else(|| BindError::UnknownType {
            name: concrete.to_string(),
        })?;
        Ok(is_compatible(&iface, ty.descriptor()))
    }

    /// Bind `object` to `interface` for shared access
    #[tracing::instrument(level = "debug", skip(self, object), fields(rust_type = type_name::<T>()))]
    pub fn bind<'a, T: Any>(
        &self,
        interface: &str,
        object: &'a T,
    ) -> Result<Delegate<'a>, BindError> {
        let table = self.table_for::<T>(interface)?;
        Ok(Delegate::new(object, table))
    }

    /// Bind `object` to `interface` for exclusive access
    #[tracing::instrument(level = "debug", skip(self, object), fields(rust_type = type_name::<T>()))]
    pub fn bind_mut<'a, T: Any>(
        &self,
        interface: &str,
        object: &'a mut T,
    ) -> Result<DelegateMut<'a>, BindError> {
        let table = self.table_for::<T>(interface)?;
        Ok(DelegateMut::new(object, table))
    }

    /// Forwarding table for (`interface`, `T`), synthesizing on first use
    pub fn table_for<T: Any>(&self, interface: &str) -> Result<&'static FunctionTable, BindError> {
        let iface = self.require_interface(interface)?;
        let concrete = self
            .concrete_of::<T>()
            .ok_or_else(|| BindError::UnknownType {
                name: type_name::<T>().to_string(),
            })?;

        let key = TableKey::new(iface.fingerprint(), TypeId::of::<T>());
        if let Some(table) = self.tables.get(&key) {
            tracing::trace!(interface, concrete = concrete.name(), "table cache hit");
            return Ok(table);
        }

        let compat = is_compatible(&iface, concrete.descriptor());
        if !compat.compatible() {
            let error = incompatible(compat);
            tracing::warn!(interface, concrete = concrete.name(), %error, "bind rejected");
            return Err(error);
        }
        if !self.registry.is_permitted(iface.name(), concrete.name()) {
            let error = BindError::BindingNotPermitted {
                interface: iface.name().to_string(),
                concrete: concrete.name().to_string(),
            };
            tracing::warn!(interface, concrete = concrete.name(), %error, "bind rejected");
            return Err(error);
        }

        self.tables
            .get_or_synthesize(key, || FunctionTable::synthesize(&iface, &concrete, &compat))
    }

    fn require_interface(&self, name: &str) -> Result<Arc<InterfaceDescriptor>, BindError> {
        self.interface(name).ok_or_else(|| BindError::UnknownInterface {
            name: name.to_string(),
        })
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

/// Ambiguity alone is reported as such; anything else lists every mismatch
fn incompatible(compat: Compatibility) -> BindError {
    if compat.only_ambiguous() {
        return BindError::AmbiguousOverloadMatch {
            interface: compat.interface().to_string(),
            concrete: compat.concrete().to_string(),
            ambiguities: compat.mismatches().to_vec(),
        };
    }
    BindError::IncompatibleType {
        interface: compat.interface().to_string(),
        concrete: compat.concrete().to_string(),
        mismatches: compat.mismatches().to_vec(),
    }
}
