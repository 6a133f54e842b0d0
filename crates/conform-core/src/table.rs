//! Forwarding tables
//!
//! One immutable table per (interface, concrete type) pair, indexed by
//! interface slot. Tables hold no per-instance data, so every delegate for
//! the pair shares the same `&'static` table.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use conform_checker::Compatibility;
use conform_types::{Fingerprint, InterfaceDescriptor, MethodKey, MethodSignature, MethodSlot, Value};
use dashmap::DashMap;

use crate::delegate::ObjectHandle;
use crate::error::{BindError, CallError, MethodResult};
use crate::surface::{ConcreteType, ErasedFn};

/// Receiver access a method implementation needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// `&T`
    Shared,
    /// `&mut T`
    Exclusive,
}

/// One forwarding entry
pub struct ForwardEntry {
    signature: MethodSignature,
    target: usize,
    access: Access,
    call: Arc<ErasedFn>,
}

impl ForwardEntry {
    /// Interface-side signature
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Index of the concrete method this entry forwards to
    pub fn target(&self) -> usize {
        self.target
    }

    /// Receiver access the implementation needs
    pub fn access(&self) -> Access {
        self.access
    }
}

impl fmt::Debug for ForwardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardEntry")
            .field("signature", &self.signature.to_string())
            .field("target", &self.target)
            .field("access", &self.access)
            .finish()
    }
}

/// Immutable mapping from interface slot to forwarding entry
#[derive(Debug)]
pub struct FunctionTable {
    interface: Arc<InterfaceDescriptor>,
    concrete: String,
    type_id: TypeId,
    entries: Box<[ForwardEntry]>,
}

impl FunctionTable {
    /// Build the table for a compatible pair.
    ///
    /// `compat` must come from matching `interface` against `concrete`.
    pub fn synthesize(
        interface: &Arc<InterfaceDescriptor>,
        concrete: &ConcreteType,
        compat: &Compatibility,
    ) -> Result<Self, BindError> {
        let incompatible = || BindError::IncompatibleType {
            interface: interface.name().to_string(),
            concrete: concrete.name().to_string(),
            mismatches: compat.mismatches().to_vec(),
        };
        if !compat.compatible() || compat.resolution().len() != interface.len() {
            return Err(incompatible());
        }

        let mut entries = Vec::with_capacity(interface.len());
        for (slot, signature) in interface.methods().iter().enumerate() {
            let target = compat.resolved(slot).ok_or_else(incompatible)?;
            let implementation = concrete.implementation(target).ok_or_else(incompatible)?;
            entries.push(ForwardEntry {
                signature: signature.clone(),
                target,
                access: implementation.access,
                call: Arc::clone(&implementation.call),
            });
        }

        tracing::debug!(
            interface = interface.name(),
            concrete = concrete.name(),
            entries = entries.len(),
            "synthesized forwarding table"
        );

        Ok(Self {
            interface: Arc::clone(interface),
            concrete: concrete.name().to_string(),
            type_id: concrete.type_id(),
            entries: entries.into_boxed_slice(),
        })
    }

    /// Interface the table implements
    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.interface
    }

    /// Concrete type the table forwards to
    pub fn concrete(&self) -> &str {
        &self.concrete
    }

    /// Rust type behind the concrete type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Entries in slot order
    pub fn entries(&self) -> &[ForwardEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the interface requires nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a slot of this table's interface
    pub fn entry(&self, slot: MethodSlot) -> Option<&ForwardEntry> {
        if slot.interface() != self.interface.fingerprint() {
            return None;
        }
        self.entries.get(slot.index())
    }

    /// Entry addressed by (overload group, member)
    pub fn entry_for_key(&self, key: MethodKey) -> Option<&ForwardEntry> {
        self.interface
            .slot_for_key(key)
            .and_then(|slot| self.entries.get(slot.index()))
    }

    /// Validate a call and forward it.
    ///
    /// # Safety
    ///
    /// `handle` must point at a live value of the type this table was
    /// synthesized for, and `access` may only be `Exclusive` when the handle
    /// came from a unique borrow that is held for the duration of the call.
    pub(crate) unsafe fn dispatch(
        &self,
        handle: ObjectHandle,
        access: Access,
        slot: MethodSlot,
        args: &[Value],
    ) -> Result<MethodResult, CallError> {
        let fingerprint = self.interface.fingerprint();
        if slot.interface() != fingerprint {
            return Err(CallError::ForeignSlot {
                expected: fingerprint,
                found: slot.interface(),
            });
        }
        let Some(entry) = self.entries.get(slot.index()) else {
            return Err(CallError::ForeignSlot {
                expected: fingerprint,
                found: slot.interface(),
            });
        };
        if entry.access == Access::Exclusive && access == Access::Shared {
            return Err(CallError::ReadOnlyReceiver {
                method: entry.signature.to_string(),
            });
        }

        let args = fill_arguments(&entry.signature, args)?;
        Ok((entry.call)(handle, &*args))
    }
}

/// Check arity and argument types, appending interface defaults for omitted
/// trailing arguments. Borrows when nothing needs filling.
fn fill_arguments<'a>(
    signature: &MethodSignature,
    args: &'a [Value],
) -> Result<Cow<'a, [Value]>, CallError> {
    let max = signature.arity();
    let min = signature.required_arity();
    if args.len() < min || args.len() > max {
        return Err(CallError::Arity {
            method: signature.to_string(),
            min,
            max,
            got: args.len(),
        });
    }

    for (index, (value, param)) in args.iter().zip(&signature.params).enumerate() {
        if !value.is_of(&param.ty) {
            return Err(CallError::ArgumentType {
                method: signature.to_string(),
                index,
                expected: param.ty.clone(),
                got: value.type_ref(),
            });
        }
    }

    if args.len() == max {
        return Ok(Cow::Borrowed(args));
    }
    let mut filled = Vec::with_capacity(max);
    filled.extend_from_slice(args);
    filled.extend(
        signature.params[args.len()..]
            .iter()
            .filter_map(|p| p.default.clone()),
    );
    Ok(Cow::Owned(filled))
}

/// Cache key: interface identity plus Rust type identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableKey {
    interface: Fingerprint,
    concrete: TypeId,
}

impl TableKey {
    /// Create a key
    pub fn new(interface: Fingerprint, concrete: TypeId) -> Self {
        Self {
            interface,
            concrete,
        }
    }
}

/// Process-lifetime cache of synthesized tables
pub struct TableCache {
    tables: DashMap<TableKey, &'static FunctionTable>,
}

impl TableCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Cached table for a pair
    pub fn get(&self, key: &TableKey) -> Option<&'static FunctionTable> {
        self.tables.get(key).map(|entry| *entry.value())
    }

    /// Return the cached table or synthesize, leak and cache a new one.
    ///
    /// The shard lock is held while `synth` runs, so concurrent callers for
    /// the same pair all receive the first table.
    pub fn get_or_synthesize<E>(
        &self,
        key: TableKey,
        synth: impl FnOnce() -> Result<FunctionTable, E>,
    ) -> Result<&'static FunctionTable, E> {
        match self.tables.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Ok(*entry.get()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let table: &'static FunctionTable = Box::leak(Box::new(synth()?));
                entry.insert(table);
                Ok(table)
            }
        }
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if nothing has been synthesized yet
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_types::{parse_signature, TypeRef};

    #[test]
    fn test_fill_borrows_complete_arguments() {
        let sig = parse_signature("log(string, int = 3)").unwrap();
        let args = [Value::str("a"), Value::Int(1)];
        assert!(matches!(fill_arguments(&sig, &args).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fill_appends_defaults() {
        let sig = parse_signature("log(string, int = 3, bool = true)").unwrap();
        let args = [Value::str("a")];
        let filled = fill_arguments(&sig, &args).unwrap();
        assert_eq!(
            filled.as_ref(),
            &[Value::str("a"), Value::Int(3), Value::Bool(true)]
        );
    }

    #[test]
    fn test_fill_checks_arity() {
        let sig = parse_signature("log(string, int = 3)").unwrap();
        assert_eq!(
            fill_arguments(&sig, &[]).unwrap_err(),
            CallError::Arity {
                method: sig.to_string(),
                min: 1,
                max: 2,
                got: 0,
            }
        );
        let too_many = [Value::str("a"), Value::Int(1), Value::Int(2)];
        assert!(matches!(
            fill_arguments(&sig, &too_many),
            Err(CallError::Arity { got: 3, .. })
        ));
    }

    #[test]
    fn test_fill_checks_types_exactly() {
        let sig = parse_signature("scale(float)").unwrap();
        assert_eq!(
            fill_arguments(&sig, &[Value::Int(2)]).unwrap_err(),
            CallError::ArgumentType {
                method: sig.to_string(),
                index: 0,
                expected: TypeRef::FLOAT,
                got: TypeRef::INT,
            }
        );
    }

    #[test]
    fn test_cache_keeps_first_table() {
        let cache = TableCache::new();
        let iface = Arc::new(InterfaceDescriptor::define("Marker", Vec::<MethodSignature>::new()).unwrap());
        let key = TableKey::new(iface.fingerprint(), TypeId::of::<u8>());
        let make = || {
            Ok::<_, ()>(FunctionTable {
                interface: Arc::clone(&iface),
                concrete: "Byte".to_string(),
                type_id: TypeId::of::<u8>(),
                entries: Box::new([]),
            })
        };

        let first = cache.get_or_synthesize(key, make).unwrap();
        let second = cache
            .get_or_synthesize(key, || -> Result<FunctionTable, ()> { panic!("synthesized twice") })
            .unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_synthesis_is_not_cached() {
        let cache = TableCache::new();
        let key = TableKey::new(
            InterfaceDescriptor::define("Marker", Vec::<MethodSignature>::new())
                .unwrap()
                .fingerprint(),
            TypeId::of::<u8>(),
        );
        assert!(matches!(cache.get_or_synthesize(key, || Err("no")), Err("no")));
        assert!(cache.is_empty());
    }
}
