//! Gitignore management
//!
//! Appends generated instruction files to an ignore list so the links and
//! copies stay out of version control. Existing lines are never rewritten or
//! reordered; only missing entries are appended.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Ignore file maintained at the project root
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Add `entries` to `<project_root>/.gitignore`
pub fn update_gitignore(
    project_root: &Path,
    entries: &[String],
    dry_run: bool,
) -> Result<Vec<String>> {
    update_ignore_file(&project_root.join(GITIGNORE_FILE_NAME), entries, dry_run)
}

/// Ensure every entry appears exactly once in the ignore file at `path`.
///
/// Returns the entries that were appended (or, with `dry_run`, would be).
/// The file is created if it does not exist yet.
pub fn update_ignore_file(path: &Path, entries: &[String], dry_run: bool) -> Result<Vec<String>> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read ignore file: {}", path.display()));
        }
    };

    let missing = missing_entries(existing.as_deref().unwrap_or_default(), entries);
    if missing.is_empty() || dry_run {
        return Ok(missing);
    }

    let mut addition = String::new();
    if let Some(content) = &existing
        && !content.is_empty()
        && !content.ends_with('\n')
    {
        addition.push('\n');
    }
    for entry in &missing {
        addition.push_str(entry);
        addition.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open ignore file: {}", path.display()))?;
    file.write_all(addition.as_bytes())
        .with_context(|| format!("Failed to write ignore file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), added = missing.len(), "Updated ignore file");
    Ok(missing)
}

/// Requested entries not yet present as a line of `content`, in request order
fn missing_entries(content: &str, entries: &[String]) -> Vec<String> {
    let mut present: HashSet<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut missing = Vec::new();
    for entry in entries {
        if entry.trim().is_empty() {
            continue;
        }
        if present.insert(entry.as_str()) {
            missing.push(entry.clone());
        }
    }
    missing
}
