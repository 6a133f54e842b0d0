//! `conform inspect`: print descriptors the way the matcher sees them.

use anyhow::Context;
use conform_types::OverloadGroup;
use std::path::Path;
use termcolor::ColorChoice;

use crate::manifest::Catalog;
use crate::output::StyledOutput;

pub fn execute(manifest: &Path, color: ColorChoice) -> anyhow::Result<()> {
    let catalog =
        Catalog::load(manifest).with_context(|| format!("cannot load {}", manifest.display()))?;
    let mut out = StyledOutput::new(color);

    for iface in catalog.interfaces() {
        out.bold(&format!("interface {}", iface.name()));
        out.dim(&format!("  fingerprint {}", iface.fingerprint()));
        out.newline();
        for group in iface.groups() {
            print_group(&mut out, group);
            for slot in group.members().filter_map(|i| iface.slot(i)) {
                if let Some(signature) = iface.signature(slot) {
                    out.plain(&format!("    #{:<3} {}", slot.index(), signature));
                    out.newline();
                }
            }
        }
        out.newline();
    }

    for ty in catalog.types() {
        out.bold(&format!("type {}", ty.name()));
        if ty.skipped_members() > 0 {
            out.dim(&format!("  {} non-method member(s) skipped", ty.skipped_members()));
        }
        out.newline();
        for group in ty.groups() {
            print_group(&mut out, group);
            for signature in group.members().filter_map(|i| ty.methods().get(i)) {
                out.plain(&format!("         {}", signature));
                out.newline();
            }
        }
        out.newline();
    }

    let permits = catalog.registry().permissions();
    if !permits.is_empty() {
        out.bold("permits");
        out.newline();
        for key in permits {
            out.plain(&format!("  {}", key));
            out.newline();
        }
    }
    out.flush();
    Ok(())
}

fn print_group(out: &mut StyledOutput, group: &OverloadGroup) {
    out.info(&format!("  {}", group.name()));
    if group.len() > 1 {
        out.dim(&format!("  ({} overloads)", group.len()));
    }
    out.newline();
}
