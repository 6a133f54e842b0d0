//! Interface and concrete type descriptors
//!
//! Both descriptors hold an ordered list of signatures grouped into overload
//! sets by name. They are validated once, when built, and never change
//! afterwards; every later operation reads them through shared references.

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::DescriptorError;
use crate::signature::{MemberKind, MethodSignature};

/// Identity of an interface definition: its name plus its signature set,
/// independent of declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Raw hash value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A resolved method position in one specific interface.
///
/// Slots are obtained from the interface once and reused for every call;
/// a slot handed to a delegate of another interface is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodSlot {
    interface: Fingerprint,
    index: u32,
}

impl MethodSlot {
    /// Interface the slot belongs to
    pub const fn interface(&self) -> Fingerprint {
        self.interface
    }

    /// Declaration index within the interface
    pub const fn index(&self) -> usize {
        self.index as usize
    }
}

/// Address of a signature inside its overload group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// Index of the overload group
    pub group: u32,
    /// Position within the group
    pub member: u32,
}

/// Signatures sharing one method name
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadGroup {
    name: String,
    members: Vec<u32>,
}

impl OverloadGroup {
    /// Method name shared by the group
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration indices of the members, in declaration order
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().map(|&i| i as usize)
    }

    /// Number of overloads
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group is empty (never true for a built descriptor)
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Check if `name` is a plain identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check if `name` is an identifier path such as `gfx::Canvas`
pub fn is_type_name(name: &str) -> bool {
    name.split("::").all(is_identifier)
}

/// Validated, grouped signature list shared by both descriptor kinds
#[derive(Debug, Clone)]
struct SignatureSet {
    methods: Vec<MethodSignature>,
    keys: Vec<MethodKey>,
    groups: Vec<OverloadGroup>,
    by_name: FxHashMap<String, u32>,
}

impl SignatureSet {
    fn build(owner: &str, signatures: Vec<MethodSignature>) -> Result<Self, DescriptorError> {
        if !is_type_name(owner) {
            return Err(DescriptorError::InvalidName {
                owner: owner.to_string(),
                name: owner.to_string(),
            });
        }

        let mut seen = FxHashSet::default();
        let mut set = SignatureSet {
            methods: Vec::with_capacity(signatures.len()),
            keys: Vec::with_capacity(signatures.len()),
            groups: Vec::new(),
            by_name: FxHashMap::default(),
        };

        for sig in signatures {
            if !is_identifier(&sig.name) {
                return Err(DescriptorError::InvalidName {
                    owner: owner.to_string(),
                    name: sig.name.clone(),
                });
            }
            check_defaults(owner, &sig)?;
            if !seen.insert(sig.key()) {
                return Err(DescriptorError::DuplicateSignature {
                    owner: owner.to_string(),
                    signature: sig.to_string(),
                });
            }

            let index = set.methods.len() as u32;
            let group = match set.by_name.get(&sig.name) {
                Some(&g) => g,
                None => {
                    let g = set.groups.len() as u32;
                    set.groups.push(OverloadGroup {
                        name: sig.name.clone(),
                        members: Vec::new(),
                    });
                    set.by_name.insert(sig.name.clone(), g);
                    g
                }
            };
            let members = &mut set.groups[group as usize].members;
            set.keys.push(MethodKey {
                group,
                member: members.len() as u32,
            });
            members.push(index);
            set.methods.push(sig);
        }

        Ok(set)
    }

    fn group(&self, name: &str) -> Option<&OverloadGroup> {
        self.by_name.get(name).map(|&g| &self.groups[g as usize])
    }

    fn index_for_key(&self, key: MethodKey) -> Option<usize> {
        self.groups
            .get(key.group as usize)?
            .members
            .get(key.member as usize)
            .map(|&i| i as usize)
    }
}

fn check_defaults(owner: &str, sig: &MethodSignature) -> Result<(), DescriptorError> {
    let mut seen_default = false;
    for (index, param) in sig.params.iter().enumerate() {
        match &param.default {
            Some(default) => {
                if !default.is_of(&param.ty) {
                    return Err(DescriptorError::DefaultTypeMismatch {
                        owner: owner.to_string(),
                        method: sig.name.clone(),
                        index,
                        expected: param.ty.to_string(),
                        actual: default.type_ref().to_string(),
                    });
                }
                seen_default = true;
            }
            None if seen_default => {
                return Err(DescriptorError::NonTrailingDefault {
                    owner: owner.to_string(),
                    method: sig.name.clone(),
                    index,
                });
            }
            None => {}
        }
    }
    Ok(())
}

/// The required method surface of a named interface
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    name: String,
    fingerprint: Fingerprint,
    set: SignatureSet,
}

impl InterfaceDescriptor {
    /// Define an interface.
    ///
    /// Fails on duplicate signatures, on members that are not plain methods
    /// (constructors, destructors, operators, data members, generic methods),
    /// on invalid names and on malformed defaults.
    pub fn define(
        name: impl Into<String>,
        signatures: impl IntoIterator<Item = MethodSignature>,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        let signatures: Vec<MethodSignature> = signatures.into_iter().collect();

        let simple_name = name.rsplit("::").next().unwrap_or(name.as_str());
        for sig in &signatures {
            let kind = if sig.kind != MemberKind::Method {
                Some(sig.kind)
            } else if sig.name == "operator" {
                Some(MemberKind::Operator)
            } else if sig.name == simple_name {
                Some(MemberKind::Constructor)
            } else {
                None
            };
            if let Some(kind) = kind {
                return Err(DescriptorError::DisallowedMember {
                    owner: name.clone(),
                    name: sig.name.clone(),
                    kind,
                });
            }
        }

        let set = SignatureSet::build(&name, signatures)?;
        let fingerprint = fingerprint(&name, &set.methods);
        Ok(Self {
            name,
            fingerprint,
            set,
        })
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of this definition
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Required methods in declaration order
    pub fn methods(&self) -> &[MethodSignature] {
        &self.set.methods
    }

    /// Number of required methods
    pub fn len(&self) -> usize {
        self.set.methods.len()
    }

    /// Check if the interface requires nothing
    pub fn is_empty(&self) -> bool {
        self.set.methods.is_empty()
    }

    /// Overload groups in order of first appearance
    pub fn groups(&self) -> &[OverloadGroup] {
        &self.set.groups
    }

    /// Overload group for a method name
    pub fn group(&self, name: &str) -> Option<&OverloadGroup> {
        self.set.group(name)
    }

    /// Slot of the method at declaration index `index`
    pub fn slot(&self, index: usize) -> Option<MethodSlot> {
        (index < self.set.methods.len()).then(|| MethodSlot {
            interface: self.fingerprint,
            index: index as u32,
        })
    }

    /// All slots in declaration order
    pub fn slots(&self) -> impl Iterator<Item = MethodSlot> + '_ {
        (0..self.set.methods.len()).map(move |i| MethodSlot {
            interface: self.fingerprint,
            index: i as u32,
        })
    }

    /// Signature behind a slot of this interface
    pub fn signature(&self, slot: MethodSlot) -> Option<&MethodSignature> {
        if slot.interface != self.fingerprint {
            return None;
        }
        self.set.methods.get(slot.index())
    }

    /// Group address of a slot
    pub fn method_key(&self, slot: MethodSlot) -> Option<MethodKey> {
        if slot.interface != self.fingerprint {
            return None;
        }
        self.set.keys.get(slot.index()).copied()
    }

    /// Slot for a group address
    pub fn slot_for_key(&self, key: MethodKey) -> Option<MethodSlot> {
        self.set.index_for_key(key).and_then(|i| self.slot(i))
    }

    /// Resolve a method by name and exact parameter types.
    ///
    /// Returns `None` when nothing matches, and also when several overloads
    /// take the same parameters and differ only in qualifiers; use
    /// [`resolve_exact`](Self::resolve_exact) for those.
    pub fn resolve(&self, name: &str, params: &[crate::ty::TypeRef]) -> Option<MethodSlot> {
        let group = self.set.group(name)?;
        let mut found = group
            .members()
            .filter(|&i| self.set.methods[i].takes(params));
        let first = found.next()?;
        if found.next().is_some() {
            return None;
        }
        self.slot(first)
    }

    /// Resolve a method by name, parameter types and qualifiers
    pub fn resolve_exact(
        &self,
        name: &str,
        params: &[crate::ty::TypeRef],
        qualifiers: crate::signature::Qualifiers,
    ) -> Option<MethodSlot> {
        let group = self.set.group(name)?;
        group
            .members()
            .find(|&i| {
                let sig = &self.set.methods[i];
                sig.qualifiers == qualifiers && sig.takes(params)
            })
            .and_then(|i| self.slot(i))
    }
}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface {}", self.name)
    }
}

fn fingerprint(name: &str, methods: &[MethodSignature]) -> Fingerprint {
    let mut member_hashes: Vec<u64> = methods
        .iter()
        .map(|sig| {
            let mut hasher = FxHasher::default();
            sig.key().hash(&mut hasher);
            sig.return_type.hash(&mut hasher);
            hasher.finish()
        })
        .collect();
    member_hashes.sort_unstable();

    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    member_hashes.hash(&mut hasher);
    Fingerprint(hasher.finish())
}

/// The public method surface of a candidate type
#[derive(Debug, Clone)]
pub struct ConcreteTypeDescriptor {
    name: String,
    set: SignatureSet,
    skipped: usize,
}

impl ConcreteTypeDescriptor {
    /// Build a concrete type descriptor.
    ///
    /// Members that are not plain methods are dropped: they exist on the
    /// type but can never satisfy an interface requirement.
    pub fn new(
        name: impl Into<String>,
        signatures: impl IntoIterator<Item = MethodSignature>,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        let mut skipped = 0;
        let methods: Vec<MethodSignature> = signatures
            .into_iter()
            .filter(|sig| {
                let keep = sig.kind == MemberKind::Method;
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .collect();
        let set = SignatureSet::build(&name, methods)?;
        Ok(Self { name, set, skipped })
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods in declaration order
    pub fn methods(&self) -> &[MethodSignature] {
        &self.set.methods
    }

    /// Number of methods
    pub fn len(&self) -> usize {
        self.set.methods.len()
    }

    /// Check if the type exposes no methods
    pub fn is_empty(&self) -> bool {
        self.set.methods.is_empty()
    }

    /// Number of non-method members dropped at construction
    pub fn skipped_members(&self) -> usize {
        self.skipped
    }

    /// Overload groups in order of first appearance
    pub fn groups(&self) -> &[OverloadGroup] {
        &self.set.groups
    }

    /// Overload group for a method name
    pub fn group(&self, name: &str) -> Option<&OverloadGroup> {
        self.set.group(name)
    }

    /// Methods named `name`, with their declaration indices
    pub fn candidates<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = (usize, &'a MethodSignature)> + 'a {
        self.set
            .group(name)
            .into_iter()
            .flat_map(|g| g.members.iter())
            .map(move |&i| (i as usize, &self.set.methods[i as usize]))
    }
}

impl fmt::Display for ConcreteTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)
    }
}
