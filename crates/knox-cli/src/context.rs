//! Linked context — the `.knox.toml` binding between a directory and its
//! org, project, and default environment.
//!
//! `knox link` writes the file; `set` and `get` read it to fill in flags
//! the user left out. Parsing is a minimal line scan: the file is always
//! machine-written, and only the `[context]` section matters.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

/// Context file name, looked up in the current directory.
pub const CONTEXT_FILE: &str = ".knox.toml";

/// Parsed `[context]` section of `.knox.toml`.
#[derive(Debug, Default)]
pub struct LinkedContext {
    pub org: String,
    pub project: String,
    pub default_environment: String,
}

/// Read the linked context, or `None` when the directory has none.
pub fn load() -> Result<Option<LinkedContext>> {
    let path = Path::new(CONTEXT_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {CONTEXT_FILE}"))?;

    let mut ctx = LinkedContext::default();
    let mut in_context_section = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_context_section = trimmed == "[context]";
            continue;
        }
        if !in_context_section {
            continue;
        }
        if let Some((key, val)) = trimmed.split_once('=') {
            let val = val.trim().trim_matches('"');
            match key.trim() {
                "org" => val.clone_into(&mut ctx.org),
                "project" => val.clone_into(&mut ctx.project),
                "default_environment" => val.clone_into(&mut ctx.default_environment),
                _ => {}
            }
        }
    }

    Ok(Some(ctx))
}

/// Write (or replace) the context file linking this directory.
pub fn write(org: &str, project: &str, default_environment: &str) -> Result<()> {
    let content = format!(
        "[context]\norg = \"{org}\"\nproject = \"{project}\"\ndefault_environment = \"{default_environment}\"\n"
    );
    fs::write(CONTEXT_FILE, content).with_context(|| format!("failed to write {CONTEXT_FILE}"))?;
    Ok(())
}
