//! Instruction file linking
//!
//! Places the canonical instructions document at every selected platform's
//! target path. Hard links are preferred so edits to the source show up
//! everywhere without re-syncing; copies are used when a link is impossible.

use anyhow::Context;
use futures_util::stream::{self, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::{
    CONFIG_FILE_NAME, ConfigError, DEFAULT_SOURCE_PATH, PlatformConfig, PlatformDescriptor,
};
use crate::target::{ignore_entry, resolve_target};

/// Maximum number of platforms synced at the same time
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Errors that abort a whole run before any target is touched
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Source is not a regular file: {}", .0.display())]
    SourceNotFile(PathBuf),

    #[error("Failed to inspect source file {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Options for the sync operation
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Resolve and report targets without touching the filesystem
    pub dry_run: bool,
    /// Restrict the run to these selected platform ids
    pub only: Option<Vec<String>>,
    /// Source document, relative to the project root
    pub source: Option<PathBuf>,
    /// Upper bound on concurrently processed platforms
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            only: None,
            source: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// How a platform's artifact ended up on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Hard link to the source document
    Linked,
    /// Byte copy, used when a hard link was not possible
    Copied,
    /// Another platform with the same target created it during this run
    Shared,
    /// Dry run, nothing was written
    Planned,
    Failed { error: String },
}

/// Result of syncing a single platform
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub id: String,
    pub name: String,
    /// Target path relative to the project root
    pub target: PathBuf,
    pub status: OutcomeStatus,
}

impl SyncOutcome {
    pub fn ok(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// Outcomes of a run, in config order
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok()).count()
    }

    pub fn is_dry_run(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == OutcomeStatus::Planned)
    }

    /// Ignore-file entries for every target that now exists (or would, in a
    /// dry run), deduplicated in config order.
    pub fn synced_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for outcome in self.outcomes.iter().filter(|o| o.ok()) {
            let entry = ignore_entry(&outcome.target);
            if !paths.contains(&entry) {
                paths.push(entry);
            }
        }
        paths
    }
}

/// What `link_or_copy` actually created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Linked,
    Copied,
}

/// Performs the synchronization of the instructions document
pub struct Linker {
    config: PlatformConfig,
    project_root: PathBuf,
}

impl Linker {
    pub fn new(project_root: impl Into<PathBuf>, config: PlatformConfig) -> Self {
        Self {
            config,
            project_root: project_root.into(),
        }
    }

    /// Load the platform config (default `ai-config.json`) under `project_root`
    pub fn load(project_root: &Path, config_path: Option<&Path>) -> Result<Self, SyncError> {
        let config_path = match config_path {
            Some(p) => project_root.join(p),
            None => project_root.join(CONFIG_FILE_NAME),
        };
        let config = PlatformConfig::load(&config_path)?;
        Ok(Self::new(project_root, config))
    }

    /// Get the project root path
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the config
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Absolute path of the source document for these options
    pub fn source_path(&self, options: &SyncOptions) -> PathBuf {
        match &options.source {
            Some(source) => self.project_root.join(source),
            None => self.project_root.join(DEFAULT_SOURCE_PATH),
        }
    }

    /// Selected platforms, narrowed by `options.only`, in config order
    pub fn selected(&self, options: &SyncOptions) -> Vec<&PlatformDescriptor> {
        self.config
            .enabled()
            .filter(|platform| match &options.only {
                Some(only) => only.iter().any(|id| id.eq_ignore_ascii_case(&platform.id)),
                None => true,
            })
            .collect()
    }

    /// Perform the sync operation.
    ///
    /// Returns an empty report, without any filesystem access, when no
    /// platform is selected. Fails before touching any target when the source
    /// document is missing. Per-platform problems are reported as
    /// [`OutcomeStatus::Failed`] and never abort the run.
    pub async fn sync(&self, options: &SyncOptions) -> Result<SyncReport, SyncError> {
        let selected = self.selected(options);
        if selected.is_empty() {
            tracing::debug!("No platforms selected");
            return Ok(SyncReport::default());
        }

        let source = self.source_path(options);
        check_source(&source).await?;

        let source_filename = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcomes: Vec<SyncOutcome> = stream::iter(selected)
            .map(|platform| {
                self.sync_platform(platform, &source, &source_filename, options.dry_run)
            })
            .buffered(options.concurrency.max(1))
            .collect()
            .await;

        Ok(SyncReport { outcomes })
    }

    async fn sync_platform(
        &self,
        platform: &PlatformDescriptor,
        source: &Path,
        source_filename: &str,
        dry_run: bool,
    ) -> SyncOutcome {
        let target = resolve_target(platform, source_filename);

        let status = if dry_run {
            tracing::debug!(platform = %platform.id, target = %target.display(), "Would sync");
            OutcomeStatus::Planned
        } else {
            match self.place(platform, source, &target).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(platform = %platform.id, error = %e, "Failed to sync platform");
                    OutcomeStatus::Failed {
                        error: format!("{e:#}"),
                    }
                }
            }
        };

        SyncOutcome {
            id: platform.id.clone(),
            name: platform.name.clone(),
            target,
            status,
        }
    }

    /// Replace whatever is at `target` with a link or copy of `source`
    async fn place(
        &self,
        platform: &PlatformDescriptor,
        source: &Path,
        target: &Path,
    ) -> anyhow::Result<OutcomeStatus> {
        let dest = self.project_root.join(target);
        let aliased = {
            let (dest, source) = (dest.clone(), source.to_path_buf());
            tokio::task::spawn_blocking(move || is_source_entry(&dest, &source))
                .await
                .context("Source identity check panicked")?
                .with_context(|| format!("Failed to compare {} with the source", target.display()))?
        };
        if aliased {
            anyhow::bail!("Target {} is the source document itself", target.display());
        }

        remove_existing(&dest)
            .await
            .with_context(|| format!("Failed to remove existing {}", target.display()))?;

        if !platform.dir_path.is_empty() {
            let dir = self.project_root.join(&platform.dir_path);
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", platform.dir_path))?;
        }
        if let Some(parent) = dest.parent()
            && parent != self.project_root
        {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let status = placement_status(link_or_copy(source, &dest).await)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        tracing::debug!(platform = %platform.id, target = %target.display(), ?status, "Placed");
        Ok(status)
    }
}

/// Map a placement attempt to the platform's outcome.
///
/// The stale artifact was removed just before, so `AlreadyExists` means a
/// platform sharing this target placed it concurrently.
fn placement_status(placed: io::Result<Placement>) -> io::Result<OutcomeStatus> {
    match placed {
        Ok(Placement::Linked) => Ok(OutcomeStatus::Linked),
        Ok(Placement::Copied) => Ok(OutcomeStatus::Copied),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(OutcomeStatus::Shared),
        Err(e) => Err(e),
    }
}

/// Whether `dest` names the same directory entry as `source`, even through a
/// symlinked directory or a case-insensitive filesystem.
///
/// A hard link to the source elsewhere is a different entry and is not
/// matched, so previously synced targets can still be replaced.
fn is_source_entry(dest: &Path, source: &Path) -> io::Result<bool> {
    let (Some(dest_name), Some(source_name)) = (dest.file_name(), source.file_name()) else {
        return Ok(false);
    };
    let dest_dir = parent_or_current(dest);
    let source_dir = parent_or_current(source);

    if !dest_dir.is_dir() || !same_file::is_same_file(dest_dir, source_dir)? {
        return Ok(false);
    }
    if dest_name == source_name {
        return Ok(true);
    }

    let case_alias =
        dest_name.to_string_lossy().to_lowercase() == source_name.to_string_lossy().to_lowercase();
    Ok(case_alias && same_file::is_same_file(dest, source).unwrap_or(false))
}

fn parent_or_current(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

async fn check_source(source: &Path) -> Result<(), SyncError> {
    match fs::metadata(source).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(SyncError::SourceNotFile(source.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(SyncError::SourceMissing(source.to_path_buf()))
        }
        Err(e) => Err(SyncError::SourceUnreadable {
            path: source.to_path_buf(),
            source: e,
        }),
    }
}

/// Remove a stale file or symlink (dangling ones included) at `dest`
async fn remove_existing(dest: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dest).await {
        Ok(_) => match fs::remove_file(dest).await {
            Err(e) if is_absent(&e) => Ok(()),
            other => other,
        },
        Err(e) if is_absent(&e) => Ok(()),
        Err(e) => Err(e),
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Hard link `source` to `dest`, copying instead when the filesystem refuses
/// the link.
///
/// Both steps create `dest` exclusively and fail with
/// [`io::ErrorKind::AlreadyExists`] if something is already there.
pub async fn link_or_copy(source: &Path, dest: &Path) -> io::Result<Placement> {
    let linked = fs::hard_link(source, dest).await;
    copy_if_link_refused(linked, source, dest).await
}

async fn copy_if_link_refused(
    linked: io::Result<()>,
    source: &Path,
    dest: &Path,
) -> io::Result<Placement> {
    match linked {
        Ok(()) => Ok(Placement::Linked),
        Err(e) if should_fall_back_to_copy(&e) => {
            tracing::debug!(
                dest = %dest.display(),
                error = %e,
                "Hard link not possible, copying instead"
            );
            copy_new(source, dest).await?;
            Ok(Placement::Copied)
        }
        Err(e) => Err(e),
    }
}

/// Link failures that mean "links are not possible here" rather than a real error
pub fn should_fall_back_to_copy(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::CrossesDevices | io::ErrorKind::PermissionDenied
    )
}

async fn copy_new(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = fs::File::open(source).await?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await?;

    let bytes = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;
    Ok(bytes)
}
