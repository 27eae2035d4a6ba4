//! Target path resolution
//!
//! Maps a platform descriptor to the path, relative to the project root,
//! where that assistant expects its instructions file.

use std::path::{Component, Path, PathBuf};

use crate::config::PlatformDescriptor;

/// Resolve the relative target path for `platform`.
///
/// Platforms using the source file name get `dir_path/<source_filename>`.
/// Everything else gets its explicit `target_path`, or `<ID>.MD` at the
/// project root when none is configured.
pub fn resolve_target(platform: &PlatformDescriptor, source_filename: &str) -> PathBuf {
    if platform.use_source_filename {
        return Path::new(&platform.dir_path).join(source_filename);
    }

    match platform.target_path.as_deref() {
        Some(target) if !target.is_empty() => PathBuf::from(target),
        _ => PathBuf::from(format!("{}.MD", platform.id.to_uppercase())),
    }
}

/// Render a relative path as an ignore-file line (always `/`-separated).
pub fn ignore_entry(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
