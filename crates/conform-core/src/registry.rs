//! Binding permissions
//!
//! A compatible type may only be bound to an interface after the pair has
//! been registered. Registration is append-only: once permitted, always
//! permitted. Names are accepted before the interface or the type exists.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

/// An (interface, concrete type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    interface: Arc<str>,
    concrete: Arc<str>,
}

impl BindingKey {
    /// Create a key
    pub fn new(interface: &str, concrete: &str) -> Self {
        Self {
            interface: Arc::from(interface),
            concrete: Arc::from(concrete),
        }
    }

    /// Interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Concrete type name
    pub fn concrete(&self) -> &str {
        &self.concrete
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.concrete, self.interface)
    }
}

/// Registry of permitted bindings
#[derive(Debug)]
pub struct BindingRegistry {
    /// interface name -> permitted concrete type names
    permitted: RwLock<FxHashMap<Arc<str>, FxHashSet<Arc<str>>>>,
}

impl BindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            permitted: RwLock::new(FxHashMap::default()),
        }
    }

    /// Permit binding `concrete` to `interface`.
    ///
    /// Returns `false` if the pair was already permitted.
    pub fn register(&self, interface: &str, concrete: &str) -> bool {
        let mut permitted = self.permitted.write();
        let inserted = match permitted.get_mut(interface) {
            Some(types) => {
                if types.contains(concrete) {
                    false
                } else {
                    types.insert(Arc::from(concrete))
                }
            }
            None => {
                let mut types = FxHashSet::default();
                types.insert(Arc::from(concrete));
                permitted.insert(Arc::from(interface), types);
                true
            }
        };
        drop(permitted);

        if inserted {
            tracing::debug!(interface, concrete, "registered binding");
        }
        inserted
    }

    /// Check if the pair has been registered
    pub fn is_permitted(&self, interface: &str, concrete: &str) -> bool {
        self.permitted
            .read()
            .get(interface)
            .is_some_and(|types| types.contains(concrete))
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.permitted.read().values().map(|types| types.len()).sum()
    }

    /// Check if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.permitted.read().is_empty()
    }

    /// Snapshot of every registered pair, sorted
    pub fn permissions(&self) -> Vec<BindingKey> {
        let permitted = self.permitted.read();
        let mut keys: Vec<BindingKey> = permitted
            .iter()
            .flat_map(|(interface, types)| {
                types.iter().map(move |concrete| BindingKey {
                    interface: Arc::clone(interface),
                    concrete: Arc::clone(concrete),
                })
            })
            .collect();
        keys.sort();
        keys
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
