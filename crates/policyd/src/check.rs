//! `policyd check-policy` — offline validation of a policy file.

use std::path::Path;

use anyhow::{Context, bail};

use policygrid_core::{PolicyDocument, validate};

pub fn run(file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let policy = PolicyDocument::from_json(&content)
        .with_context(|| format!("parsing {}", file.display()))?;

    match validate(&policy) {
        Ok(()) => {
            println!("{}: ok", file.display());
            Ok(())
        }
        Err(e) => {
            for violation in &e.errors {
                println!("{}: {violation}", file.display());
            }
            bail!("{} violation(s) in {}", e.errors.len(), file.display())
        }
    }
}
