//! Structural signature matching
//!
//! Decides whether a concrete type's method surface covers every signature an
//! interface requires. Matching is exact: identical parameter lists at full
//! arity, identical return types, equal read-only and volatile flags, and a
//! non-throwing candidate wherever the requirement is non-throwing.

use serde::Serialize;
use std::fmt;

use conform_types::{ConcreteTypeDescriptor, InterfaceDescriptor, MethodSignature, Qualifiers};

/// Why a required signature found no unique match
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchReason {
    /// The type has no method with the required name
    Missing,
    /// A method with the right types exists but its qualifiers do not satisfy
    /// the requirement
    QualifierMismatch {
        /// Qualifiers the interface requires
        required: Qualifiers,
        /// Qualifiers of the closest candidate
        found: Qualifiers,
    },
    /// Methods with the right name exist but none has the required
    /// parameter and return types
    TypeMismatch {
        /// The candidate that came closest
        closest: String,
        /// Where it disagrees
        detail: String,
    },
    /// Several candidates satisfy the requirement equally well
    Ambiguous {
        /// Every satisfying candidate, sorted
        candidates: Vec<String>,
    },
}

impl MismatchReason {
    /// Check if this is an ambiguity rather than a missing or wrong method
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MismatchReason::Ambiguous { .. })
    }
}

fn describe(q: Qualifiers) -> String {
    if q == Qualifiers::NONE {
        "no qualifiers".to_string()
    } else {
        format!("`{}`", q)
    }
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::Missing => write!(f, "no method with this name"),
            MismatchReason::QualifierMismatch { required, found } => write!(
                f,
                "qualifiers differ: requires {}, found {}",
                describe(*required),
                describe(*found)
            ),
            MismatchReason::TypeMismatch { closest, detail } => {
                write!(f, "closest candidate `{}` {}", closest, detail)
            }
            MismatchReason::Ambiguous { candidates } => write!(
                f,
                "{} candidates satisfy it equally: {}",
                candidates.len(),
                candidates.join(", ")
            ),
        }
    }
}

/// One unsatisfied interface signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Declaration index of the requirement in the interface
    pub slot: usize,
    /// Required method name
    pub method_name: String,
    /// Required signature in compact notation
    pub signature: String,
    /// Why it is unsatisfied
    pub reason: MismatchReason,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.signature, self.reason)
    }
}

/// Result of matching one interface against one concrete type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compatibility {
    interface: String,
    concrete: String,
    compatible: bool,
    mismatches: Vec<Mismatch>,
    resolution: Vec<Option<usize>>,
}

impl Compatibility {
    /// Interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Concrete type name
    pub fn concrete(&self) -> &str {
        &self.concrete
    }

    /// Every required signature resolved to exactly one method
    pub fn compatible(&self) -> bool {
        self.compatible
    }

    /// Unsatisfied requirements in interface declaration order
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// For each interface slot, the index of the concrete method that
    /// satisfies it
    pub fn resolution(&self) -> &[Option<usize>] {
        &self.resolution
    }

    /// Concrete method index resolved for one interface slot
    pub fn resolved(&self, slot: usize) -> Option<usize> {
        self.resolution.get(slot).copied().flatten()
    }

    /// Check whether ambiguity is the only thing standing in the way
    pub fn only_ambiguous(&self) -> bool {
        !self.mismatches.is_empty() && self.mismatches.iter().all(|m| m.reason.is_ambiguous())
    }
}

/// Check whether `concrete` structurally satisfies `interface`.
///
/// The verdict and the set of mismatches do not depend on the order in which
/// the concrete type lists its methods.
pub fn is_compatible(
    interface: &InterfaceDescriptor,
    concrete: &ConcreteTypeDescriptor,
) -> Compatibility {
    let mut mismatches = Vec::new();
    let mut resolution = Vec::with_capacity(interface.len());

    for (slot, required) in interface.methods().iter().enumerate() {
        match match_signature(required, concrete) {
            Ok(index) => resolution.push(Some(index)),
            Err(reason) => {
                resolution.push(None);
                mismatches.push(Mismatch {
                    slot,
                    method_name: required.name.clone(),
                    signature: required.to_string(),
                    reason,
                });
            }
        }
    }

    tracing::trace!(
        interface = interface.name(),
        concrete = concrete.name(),
        mismatches = mismatches.len(),
        "matched surfaces"
    );

    Compatibility {
        interface: interface.name().to_string(),
        concrete: concrete.name().to_string(),
        compatible: mismatches.is_empty(),
        mismatches,
        resolution,
    }
}

/// Check if `candidate` satisfies `required` on its own
pub fn satisfies(candidate: &MethodSignature, required: &MethodSignature) -> bool {
    candidate.name == required.name
        && candidate.same_params(required)
        && candidate.return_type == required.return_type
        && candidate.qualifiers.satisfies(required.qualifiers)
}

fn match_signature(
    required: &MethodSignature,
    concrete: &ConcreteTypeDescriptor,
) -> Result<usize, MismatchReason> {
    let candidates: Vec<(usize, &MethodSignature)> = concrete.candidates(&required.name).collect();
    if candidates.is_empty() {
        return Err(MismatchReason::Missing);
    }

    let satisfying: Vec<&(usize, &MethodSignature)> = candidates
        .iter()
        .filter(|(_, candidate)| satisfies(candidate, required))
        .collect();
    match satisfying.as_slice() {
        [(index, _)] => return Ok(*index),
        [] => {}
        many => {
            let mut names: Vec<String> = many.iter().map(|(_, c)| c.to_string()).collect();
            names.sort();
            return Err(MismatchReason::Ambiguous { candidates: names });
        }
    }

    // Right types, wrong qualifiers. Several such candidates can only differ
    // in qualifiers, so report the lowest bit pattern for a stable message.
    let same_types = candidates
        .iter()
        .map(|(_, c)| *c)
        .filter(|c| c.same_params(required) && c.return_type == required.return_type)
        .min_by_key(|c| c.qualifiers.bits());
    if let Some(candidate) = same_types {
        return Err(MismatchReason::QualifierMismatch {
            required: required.qualifiers,
            found: candidate.qualifiers,
        });
    }

    let closest = candidates
        .iter()
        .map(|(_, c)| (*c, c.to_string()))
        .max_by(|(a, a_text), (b, b_text)| {
            closeness(a, required)
                .cmp(&closeness(b, required))
                .then_with(|| b_text.cmp(a_text))
        });
    match closest {
        Some((candidate, text)) => Err(MismatchReason::TypeMismatch {
            closest: text,
            detail: type_disagreement(candidate, required),
        }),
        None => Err(MismatchReason::Missing),
    }
}

/// Ordering key: same arity first, then most positional parameter matches,
/// then matching return type
fn closeness(candidate: &MethodSignature, required: &MethodSignature) -> (bool, usize, bool) {
    let positional = candidate
        .param_types()
        .zip(required.param_types())
        .filter(|(a, b)| a == b)
        .count();
    (
        candidate.arity() == required.arity(),
        positional,
        candidate.return_type == required.return_type,
    )
}

fn type_disagreement(candidate: &MethodSignature, required: &MethodSignature) -> String {
    if candidate.arity() != required.arity() {
        return format!(
            "takes {} parameter{}, expected {}",
            candidate.arity(),
            if candidate.arity() == 1 { "" } else { "s" },
            required.arity()
        );
    }
    let differing = candidate
        .param_types()
        .zip(required.param_types())
        .enumerate()
        .find(|(_, (a, b))| a != b);
    if let Some((index, (found, expected))) = differing {
        return format!("has parameter {} of type `{}`, expected `{}`", index, found, expected);
    }
    format!(
        "returns `{}`, expected `{}`",
        candidate.return_type, required.return_type
    )
}
