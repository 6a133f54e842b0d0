//! `conform check`: match every interface against every type.

use anyhow::Context;
use codespan_reporting::files::SimpleFiles;
use conform_checker::{create_files, is_compatible, Compatibility, Diagnostic, JsonDiagnostic, Mismatch};
use conform_types::DescriptorError;
use serde::Serialize;
use std::path::Path;
use termcolor::ColorChoice;

use crate::manifest::{Catalog, ManifestError};
use crate::output::StyledOutput;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Colored text with rendered diagnostics
    Pretty,
    /// One JSON document on stdout
    Json,
}

/// Selection and presentation for a check run
pub struct CheckOptions<'a> {
    pub interface: Option<&'a str>,
    pub concrete: Option<&'a str>,
    pub format: Format,
    pub color: ColorChoice,
}

struct Verdict {
    compat: Compatibility,
    permitted: bool,
}

impl Verdict {
    /// Registered for binding yet would be rejected
    fn failing(&self) -> bool {
        self.permitted && !self.compat.compatible()
    }
}

/// Returns `Ok(false)` when the manifest is invalid or a permitted pair is
/// incompatible.
pub fn execute(manifest: &Path, options: CheckOptions<'_>) -> anyhow::Result<bool> {
    let catalog = match Catalog::load(manifest) {
        Ok(catalog) => catalog,
        Err(ManifestError::Descriptor(error)) => {
            report_invalid(manifest, &error, &options)?;
            return Ok(false);
        }
        Err(error) => {
            return Err(error).with_context(|| format!("cannot load {}", manifest.display()));
        }
    };

    let verdicts = check_pairs(&catalog, options.interface, options.concrete)?;
    let failing = verdicts.iter().filter(|v| v.failing()).count();
    tracing::debug!(pairs = verdicts.len(), failing, "check finished");

    match options.format {
        Format::Pretty => {
            let narrowed = options.interface.is_some() || options.concrete.is_some();
            print_pretty(manifest, &verdicts, narrowed, options.color);
        }
        Format::Json => print_json(manifest, &verdicts, Vec::new())?,
    }
    Ok(failing == 0)
}

fn check_pairs(
    catalog: &Catalog,
    interface: Option<&str>,
    concrete: Option<&str>,
) -> anyhow::Result<Vec<Verdict>> {
    if let Some(name) = interface {
        if catalog.interface(name).is_none() {
            anyhow::bail!("no interface named '{}' in manifest", name);
        }
    }
    if let Some(name) = concrete {
        if catalog.concrete(name).is_none() {
            anyhow::bail!("no type named '{}' in manifest", name);
        }
    }

    let mut verdicts = Vec::new();
    for iface in catalog.interfaces() {
        if interface.is_some_and(|name| name != iface.name()) {
            continue;
        }
        for ty in catalog.types() {
            if concrete.is_some_and(|name| name != ty.name()) {
                continue;
            }
            verdicts.push(Verdict {
                compat: is_compatible(iface, ty),
                permitted: catalog.registry().is_permitted(iface.name(), ty.name()),
            });
        }
    }
    Ok(verdicts)
}

fn print_pretty(manifest: &Path, verdicts: &[Verdict], narrowed: bool, color: ColorChoice) {
    let mut out = StyledOutput::new(color);
    let files = SimpleFiles::new();

    out.info("Checking ");
    out.plain(&manifest.display().to_string());
    out.newline();
    out.newline();

    for verdict in verdicts {
        let compatible = verdict.compat.compatible();
        if compatible {
            out.pass_badge();
        } else if verdict.permitted {
            out.fail_badge();
        } else {
            out.skip_badge();
        }
        out.plain(" ");
        out.bold(&format!(
            "{} as {}",
            verdict.compat.concrete(),
            verdict.compat.interface()
        ));
        if verdict.permitted {
            out.dim("  (permitted)");
        }
        out.newline();

        // Unpermitted pairs are usually unrelated; only explain them on request.
        if !compatible && (verdict.permitted || narrowed) {
            for diag in Diagnostic::from_compatibility(&verdict.compat) {
                out.diagnostic(&diag, &files);
            }
        }
    }

    let compatible = verdicts.iter().filter(|v| v.compat.compatible()).count();
    let failing = verdicts.iter().filter(|v| v.failing()).count();
    out.newline();
    out.plain(&format!(
        "{} pair(s) checked: {} compatible, {} incompatible. ",
        verdicts.len(),
        compatible,
        verdicts.len() - compatible
    ));
    if failing == 0 {
        out.success("ok");
    } else {
        out.error(&format!("{} permitted pair(s) incompatible", failing));
    }
    out.newline();
    out.flush();
}

#[derive(Serialize)]
struct JsonReport<'a> {
    manifest: String,
    ok: bool,
    pairs: Vec<JsonPair<'a>>,
    errors: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
struct JsonPair<'a> {
    interface: &'a str,
    #[serde(rename = "type")]
    concrete: &'a str,
    compatible: bool,
    permitted: bool,
    mismatches: &'a [Mismatch],
}

fn print_json(
    manifest: &Path,
    verdicts: &[Verdict],
    errors: Vec<JsonDiagnostic>,
) -> anyhow::Result<()> {
    let report = JsonReport {
        manifest: manifest.display().to_string(),
        ok: errors.is_empty() && !verdicts.iter().any(Verdict::failing),
        pairs: verdicts
            .iter()
            .map(|v| JsonPair {
                interface: v.compat.interface(),
                concrete: v.compat.concrete(),
                compatible: v.compat.compatible(),
                permitted: v.permitted,
                mismatches: v.compat.mismatches(),
            })
            .collect(),
        errors,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Render a descriptor error. Notation errors point into the offending
/// signature text.
fn report_invalid(
    manifest: &Path,
    error: &DescriptorError,
    options: &CheckOptions<'_>,
) -> anyhow::Result<()> {
    let (diag, files) = match error {
        DescriptorError::InvalidSignature { owner, text, error } => (
            Diagnostic::from_parse_error(error, 0, text)
                .with_note(format!("in '{}' of {}", owner, manifest.display())),
            create_files(format!("{} signature", owner), text.as_str()),
        ),
        other => (Diagnostic::from_descriptor_error(other), SimpleFiles::new()),
    };

    match options.format {
        Format::Pretty => {
            let mut out = StyledOutput::new(options.color);
            out.diagnostic(&diag, &files);
            out.flush();
        }
        Format::Json => {
            print_json(manifest, &[], vec![JsonDiagnostic::from_diagnostic(&diag, &files)])?;
        }
    }
    Ok(())
}
