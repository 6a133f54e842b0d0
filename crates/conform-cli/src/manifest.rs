//! Conformance manifest parsing (conform.toml)
//!
//! A manifest lists interfaces, concrete type surfaces and the permitted
//! pairings between them:
//!
//! ```toml
//! [[interface]]
//! name = "Logger"
//! methods = ["log(string) -> void", "level() -> int readonly"]
//!
//! [[type]]
//! name = "FileLogger"
//! methods = ["log(string) -> void", "level() -> int readonly nothrow"]
//!
//! [[permit]]
//! interface = "Logger"
//! type = "FileLogger"
//! ```

use conform_core::BindingRegistry;
use conform_types::{ConcreteTypeDescriptor, DescriptorError, InterfaceDescriptor, IntoSignature};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// An interface or type could not be built
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Validation error
    #[error("Invalid manifest: {0}")]
    ValidationError(String),
}

/// Raw manifest contents
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Interface definitions
    #[serde(default, rename = "interface")]
    pub interfaces: Vec<SurfaceEntry>,

    /// Concrete type surfaces
    #[serde(default, rename = "type")]
    pub types: Vec<SurfaceEntry>,

    /// Permitted (interface, type) pairs
    #[serde(default, rename = "permit")]
    pub permits: Vec<PermitEntry>,
}

/// A named list of signatures in compact notation
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SurfaceEntry {
    /// Interface or type name
    pub name: String,

    /// Signatures, e.g. `"log(string, int = 0) -> void"`
    #[serde(default)]
    pub methods: Vec<String>,
}

/// One binding permission
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PermitEntry {
    /// Interface name
    pub interface: String,

    /// Concrete type name
    #[serde(rename = "type")]
    pub concrete: String,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse manifest from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Build descriptors and the permission registry
    pub fn build(&self) -> Result<Catalog, ManifestError> {
        let mut interfaces: Vec<InterfaceDescriptor> = Vec::with_capacity(self.interfaces.len());
        for entry in &self.interfaces {
            if interfaces.iter().any(|i| i.name() == entry.name) {
                return Err(DescriptorError::Redefinition {
                    name: entry.name.clone(),
                }
                .into());
            }
            let signatures = parse_all(&entry.name, &entry.methods)?;
            interfaces.push(InterfaceDescriptor::define(entry.name.as_str(), signatures)?);
        }

        let mut types: Vec<ConcreteTypeDescriptor> = Vec::with_capacity(self.types.len());
        for entry in &self.types {
            if types.iter().any(|t| t.name() == entry.name) {
                return Err(DescriptorError::Redefinition {
                    name: entry.name.clone(),
                }
                .into());
            }
            let signatures = parse_all(&entry.name, &entry.methods)?;
            types.push(ConcreteTypeDescriptor::new(entry.name.as_str(), signatures)?);
        }

        let registry = BindingRegistry::new();
        for permit in &self.permits {
            if !interfaces.iter().any(|i| i.name() == permit.interface) {
                return Err(ManifestError::ValidationError(format!(
                    "permit names undefined interface '{}'",
                    permit.interface
                )));
            }
            if !types.iter().any(|t| t.name() == permit.concrete) {
                return Err(ManifestError::ValidationError(format!(
                    "permit names undefined type '{}'",
                    permit.concrete
                )));
            }
            if !registry.register(&permit.interface, &permit.concrete) {
                tracing::warn!(
                    interface = %permit.interface,
                    concrete = %permit.concrete,
                    "duplicate permit"
                );
            }
        }

        tracing::debug!(
            interfaces = interfaces.len(),
            types = types.len(),
            permits = registry.len(),
            "loaded manifest"
        );
        Ok(Catalog {
            interfaces,
            types,
            registry,
        })
    }
}

fn parse_all(
    owner: &str,
    methods: &[String],
) -> Result<Vec<conform_types::MethodSignature>, DescriptorError> {
    methods.iter().map(|m| m.into_signature(owner)).collect()
}

/// Descriptors built from a manifest
#[derive(Debug)]
pub struct Catalog {
    interfaces: Vec<InterfaceDescriptor>,
    types: Vec<ConcreteTypeDescriptor>,
    registry: BindingRegistry,
}

impl Catalog {
    /// Load and build a manifest in one step
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        Manifest::from_file(path)?.build()
    }

    /// Interfaces in manifest order
    pub fn interfaces(&self) -> &[InterfaceDescriptor] {
        &self.interfaces
    }

    /// Types in manifest order
    pub fn types(&self) -> &[ConcreteTypeDescriptor] {
        &self.types
    }

    /// Look up an interface
    pub fn interface(&self, name: &str) -> Option<&InterfaceDescriptor> {
        self.interfaces.iter().find(|i| i.name() == name)
    }

    /// Look up a type
    pub fn concrete(&self, name: &str) -> Option<&ConcreteTypeDescriptor> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Permission registry holding every `[[permit]]`
    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGGER: &str = r#"
[[interface]]
name = "Logger"
methods = ["log(string) -> void", "level() -> int readonly"]

[[type]]
name = "FileLogger"
methods = ["log(string) -> void", "level() -> int readonly nothrow", "flush()"]

[[permit]]
interface = "Logger"
type = "FileLogger"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_str(LOGGER).unwrap();
        assert_eq!(manifest.interfaces.len(), 1);
        assert_eq!(manifest.types[0].methods.len(), 3);
        assert_eq!(
            manifest.permits,
            vec![PermitEntry {
                interface: "Logger".to_string(),
                concrete: "FileLogger".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_manifest() {
        let catalog = Manifest::from_str("").unwrap().build().unwrap();
        assert!(catalog.interfaces().is_empty());
        assert!(catalog.types().is_empty());
        assert!(catalog.registry().is_empty());
    }

    #[test]
    fn test_build_catalog() {
        let catalog = Manifest::from_str(LOGGER).unwrap().build().unwrap();
        assert_eq!(catalog.interface("Logger").unwrap().len(), 2);
        assert_eq!(catalog.concrete("FileLogger").unwrap().len(), 3);
        assert!(catalog.registry().is_permitted("Logger", "FileLogger"));
        assert!(!catalog.registry().is_permitted("Logger", "Other"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Manifest::from_str("[[interface]]\nname = \"A\"\nmethod = []\n").unwrap_err();
        assert!(matches!(err, ManifestError::ParseError(_)));
    }

    #[test]
    fn test_bad_signature_names_owner() {
        let source = "[[interface]]\nname = \"Logger\"\nmethods = [\"log(string\"]\n";
        let err = Manifest::from_str(source).unwrap().build().unwrap_err();
        match err {
            ManifestError::Descriptor(DescriptorError::InvalidSignature { owner, text, .. }) => {
                assert_eq!(owner, "Logger");
                assert_eq!(text, "log(string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_interface_rejected() {
        let source = "[[interface]]\nname = \"A\"\n[[interface]]\nname = \"A\"\n";
        let err = Manifest::from_str(source).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Descriptor(DescriptorError::Redefinition { .. })
        ));
    }

    #[test]
    fn test_permit_for_undefined_type() {
        let source = "[[interface]]\nname = \"A\"\n[[permit]]\ninterface = \"A\"\ntype = \"B\"\n";
        let err = Manifest::from_str(source).unwrap().build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid manifest: permit names undefined type 'B'"
        );
    }
}
