//! Platform configuration
//!
//! Handles the JSON document listing every supported AI coding assistant
//! and which of them are currently selected for syncing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, relative to the project root
pub const CONFIG_FILE_NAME: &str = "ai-config.json";

/// Default location of the canonical instructions, relative to the project root
pub const DEFAULT_SOURCE_PATH: &str = "prompts/instructions.md";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse platform config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Platform at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Duplicate platform id: {0}")]
    DuplicateId(String),

    #[error("Platform '{id}' has {field} '{value}' which escapes the project root")]
    UnsafePath {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One supported assistant and where it expects its instructions file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescriptor {
    /// Unique lowercase token
    pub id: String,

    /// Human-readable label, only used for reporting
    pub name: String,

    /// Directory the artifact is placed in (empty means project root)
    #[serde(default)]
    pub dir_path: String,

    /// Reuse the source document's file name inside `dir_path`
    #[serde(default)]
    pub use_source_filename: bool,

    /// Explicit relative target, used when `use_source_filename` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,

    /// Whether this platform is enabled for syncing
    #[serde(default)]
    pub selected: bool,
}

/// Ordered list of platform descriptors, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformConfig {
    pub platforms: Vec<PlatformDescriptor>,
}

impl PlatformConfig {
    pub fn new(platforms: Vec<PlatformDescriptor>) -> Result<Self, ConfigError> {
        let config = Self { platforms };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate a configuration document
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: PlatformConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration back to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');

        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Platforms currently selected, in document order
    pub fn enabled(&self) -> impl Iterator<Item = &PlatformDescriptor> {
        self.platforms.iter().filter(|p| p.selected)
    }

    pub fn selected_ids(&self) -> Vec<&str> {
        self.enabled().map(|p| p.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&PlatformDescriptor> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Replace the current selection with `ids`.
    ///
    /// Every platform whose id is listed becomes selected and all others are
    /// deselected. Ids that match no platform are returned.
    pub fn select<S: AsRef<str>>(&mut self, ids: &[S]) -> Vec<String> {
        let wanted: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();

        for platform in &mut self.platforms {
            platform.selected = wanted.contains(platform.id.as_str());
        }

        ids.iter()
            .map(AsRef::as_ref)
            .filter(|id| self.get(id).is_none())
            .map(str::to_string)
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for (index, platform) in self.platforms.iter().enumerate() {
            if platform.id.trim().is_empty() {
                return Err(ConfigError::EmptyId { index });
            }
            if !seen.insert(platform.id.as_str()) {
                return Err(ConfigError::DuplicateId(platform.id.clone()));
            }

            check_relative(&platform.id, "dirPath", &platform.dir_path)?;
            if let Some(target) = &platform.target_path {
                check_relative(&platform.id, "targetPath", target)?;
            }
        }

        Ok(())
    }
}

fn check_relative(id: &str, field: &'static str, value: &str) -> Result<(), ConfigError> {
    let escapes = Path::new(value).components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });

    if escapes {
        return Err(ConfigError::UnsafePath {
            id: id.to_string(),
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
        { "id": "claude", "name": "Claude Code", "dirPath": "", "useSourceFilename": false, "targetPath": "CLAUDE.MD", "selected": true },
        { "id": "cursor", "name": "Cursor", "dirPath": ".cursor/rules", "useSourceFilename": true, "selected": false },
        { "id": "aider", "name": "Aider", "dirPath": "", "useSourceFilename": false, "selected": true }
    ]"#;

    #[test]
    fn test_parse_platform_list() {
        let config = PlatformConfig::from_json(SAMPLE).unwrap();

        assert_eq!(config.platforms.len(), 3);
        let cursor = config.get("cursor").unwrap();
        assert_eq!(cursor.dir_path, ".cursor/rules");
        assert!(cursor.use_source_filename);
        assert_eq!(cursor.target_path, None);
        assert_eq!(
            config.get("claude").unwrap().target_path.as_deref(),
            Some("CLAUDE.MD")
        );
    }

    #[test]
    fn test_optional_fields_default() {
        let config =
            PlatformConfig::from_json(r#"[{ "id": "test", "name": "Test Platform" }]"#).unwrap();
        let test = &config.platforms[0];

        assert_eq!(test.dir_path, "");
        assert!(!test.use_source_filename);
        assert!(!test.selected);
    }

    #[test]
    fn test_enabled_keeps_document_order() {
        let config = PlatformConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.selected_ids(), vec!["claude", "aider"]);
    }

    #[test]
    fn test_select_replaces_selection() {
        let mut config = PlatformConfig::from_json(SAMPLE).unwrap();

        let unknown = config.select(&["cursor", "windsurf"]);

        assert_eq!(unknown, vec!["windsurf".to_string()]);
        assert_eq!(config.selected_ids(), vec!["cursor"]);
        assert!(!config.get("claude").unwrap().selected);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = r#"[
            { "id": "claude", "name": "A" },
            { "id": "claude", "name": "B" }
        ]"#;

        let err = PlatformConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId(id) if id == "claude"));
    }

    #[test]
    fn test_new_validates_platforms() {
        let platform = PlatformDescriptor {
            id: "claude".to_string(),
            name: "Claude Code".to_string(),
            dir_path: String::new(),
            use_source_filename: false,
            target_path: Some("CLAUDE.MD".to_string()),
            selected: true,
        };

        assert!(PlatformConfig::new(vec![platform.clone()]).is_ok());
        assert!(matches!(
            PlatformConfig::new(vec![platform.clone(), platform]),
            Err(ConfigError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = PlatformConfig::from_json(r#"[{ "id": " ", "name": "Blank" }]"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyId { index: 0 }));
    }

    #[test]
    fn test_paths_escaping_root_rejected() {
        let parent = r#"[{ "id": "x", "name": "X", "dirPath": "../outside" }]"#;
        assert!(matches!(
            PlatformConfig::from_json(parent).unwrap_err(),
            ConfigError::UnsafePath { field: "dirPath", .. }
        ));

        let absolute = r#"[{ "id": "x", "name": "X", "targetPath": "/etc/X.MD" }]"#;
        assert!(matches!(
            PlatformConfig::from_json(absolute).unwrap_err(),
            ConfigError::UnsafePath {
                field: "targetPath",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = PlatformConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = PlatformConfig::load(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_save_then_load_preserves_selection() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut config = PlatformConfig::from_json(SAMPLE).unwrap();
        config.select(&["cursor"]);
        config.save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"useSourceFilename\": true"));
        assert!(written.ends_with('\n'));

        let reloaded = PlatformConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }
}
