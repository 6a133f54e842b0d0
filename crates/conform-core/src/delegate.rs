//! Delegates
//!
//! A delegate pairs a borrowed object with the forwarding table of one
//! interface. It owns nothing: the borrow it was created from bounds its
//! lifetime. `Delegate` comes from `&T`, is `Copy` and can only reach
//! methods implemented through a shared receiver. `DelegateMut` comes from
//! `&mut T` and reaches every method.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use conform_types::{InterfaceDescriptor, MethodSlot, TypeRef, Value};

use crate::error::{CallError, MethodResult};
use crate::table::{Access, FunctionTable};

/// Type-erased pointer to the bound object
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjectHandle(NonNull<()>);

// SAFETY: surfaces only exist for `T: Send + Sync`, and a handle is only
// created for a type with a declared surface.
unsafe impl Send for ObjectHandle {}
unsafe impl Sync for ObjectHandle {}

impl ObjectHandle {
    pub(crate) fn from_ref<T>(object: &T) -> Self {
        Self(NonNull::from(object).cast())
    }

    pub(crate) fn from_mut<T>(object: &mut T) -> Self {
        Self(NonNull::from(object).cast())
    }

    /// # Safety
    ///
    /// The pointee must be a live `T` that is not mutably borrowed elsewhere
    /// for `'a`.
    pub(crate) unsafe fn as_ref<'a, T>(self) -> &'a T {
        self.0.cast::<T>().as_ref()
    }

    /// # Safety
    ///
    /// The handle must come from [`ObjectHandle::from_mut`] on a live `T`
    /// whose unique borrow is held for `'a`.
    pub(crate) unsafe fn as_mut<'a, T>(self) -> &'a mut T {
        self.0.cast::<T>().as_mut()
    }

    fn addr(self) -> *const () {
        self.0.as_ptr()
    }
}

/// Read-only delegate
#[derive(Clone, Copy)]
pub struct Delegate<'a> {
    handle: ObjectHandle,
    table: &'static FunctionTable,
    _object: PhantomData<&'a ()>,
}

impl<'a> Delegate<'a> {
    /// Caller guarantees `table` was synthesized for `T`
    pub(crate) fn new<T>(object: &'a T, table: &'static FunctionTable) -> Self {
        Self {
            handle: ObjectHandle::from_ref(object),
            table,
            _object: PhantomData,
        }
    }

    /// Call the method at `slot`.
    ///
    /// The outer error reports a malformed call; the inner result is exactly
    /// what the concrete method returned.
    pub fn call(&self, slot: MethodSlot, args: &[Value]) -> Result<MethodResult, CallError> {
        // SAFETY: the handle came from a `&'a T` matching the table's type,
        // and shared access never reaches `&mut` implementations.
        unsafe { self.table.dispatch(self.handle, Access::Shared, slot, args) }
    }

    /// Look up an interface slot by name and exact parameter types
    pub fn resolve(&self, name: &str, params: &[TypeRef]) -> Option<MethodSlot> {
        self.table.interface().resolve(name, params)
    }

    /// Always [`Access::Shared`]
    pub fn access(&self) -> Access {
        Access::Shared
    }

    /// Interface this delegate implements
    pub fn interface(&self) -> &'static InterfaceDescriptor {
        self.table.interface()
    }

    /// The shared forwarding table
    pub fn table(&self) -> &'static FunctionTable {
        self.table
    }

    /// Address of the bound object
    pub fn target(&self) -> *const () {
        self.handle.addr()
    }
}

/// Two delegates are equal when they forward to the same object through the
/// same table
impl PartialEq for Delegate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && std::ptr::eq(self.table, other.table)
    }
}

impl Eq for Delegate<'_> {}

impl fmt::Debug for Delegate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("interface", &self.table.interface().name())
            .field("concrete", &self.table.concrete())
            .field("target", &self.target())
            .finish()
    }
}

/// Delegate holding a unique borrow
pub struct DelegateMut<'a> {
    handle: ObjectHandle,
    table: &'static FunctionTable,
    _object: PhantomData<&'a mut ()>,
}

impl<'a> DelegateMut<'a> {
    /// Caller guarantees `table` was synthesized for `T`
    pub(crate) fn new<T>(object: &'a mut T, table: &'static FunctionTable) -> Self {
        Self {
            handle: ObjectHandle::from_mut(object),
            table,
            _object: PhantomData,
        }
    }

    /// Call the method at `slot`
    pub fn call(&mut self, slot: MethodSlot, args: &[Value]) -> Result<MethodResult, CallError> {
        // SAFETY: the handle came from a `&'a mut T` matching the table's
        // type, and `&mut self` keeps this the only live access path.
        unsafe { self.table.dispatch(self.handle, Access::Exclusive, slot, args) }
    }

    /// Look up an interface slot by name and exact parameter types
    pub fn resolve(&self, name: &str, params: &[TypeRef]) -> Option<MethodSlot> {
        self.table.interface().resolve(name, params)
    }

    /// Always [`Access::Exclusive`]
    pub fn access(&self) -> Access {
        Access::Exclusive
    }

    /// Interface this delegate implements
    pub fn interface(&self) -> &'static InterfaceDescriptor {
        self.table.interface()
    }

    /// The shared forwarding table
    pub fn table(&self) -> &'static FunctionTable {
        self.table
    }

    /// Address of the bound object
    pub fn target(&self) -> *const () {
        self.handle.addr()
    }

    /// Shorter-lived delegate over the same object
    pub fn reborrow(&mut self) -> DelegateMut<'_> {
        DelegateMut {
            handle: self.handle,
            table: self.table,
            _object: PhantomData,
        }
    }

    /// Read-only view for as long as `self` is borrowed
    pub fn as_delegate(&self) -> Delegate<'_> {
        Delegate {
            handle: self.handle,
            table: self.table,
            _object: PhantomData,
        }
    }
}

impl fmt::Debug for DelegateMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateMut")
            .field("interface", &self.table.interface().name())
            .field("concrete", &self.table.concrete())
            .field("target", &self.target())
            .finish()
    }
}
