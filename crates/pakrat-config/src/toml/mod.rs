//! Config file parsing and validation
//!
//! ```toml
//! default_profile = "custom"
//!
//! [registry]
//! url = "https://aur.archlinux.org"
//!
//! [profile.custom]
//! repo = "/srv/repo/custom.db.tar.gz"
//! backup = true
//! ignore_upgrades = ["linux-git"]
//! mirror_repos = ["core", "extra"]
//! ```

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use pakrat_core::error::PakratError;
use serde::Deserialize;

use crate::ConfigResult;

/// Complete pakrat config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PakratToml {
    /// Profile used when none is selected explicitly
    pub default_profile: Option<String>,

    /// Registry connection settings
    #[serde(default)]
    pub registry: RegistrySection,

    /// Named repository profiles
    #[serde(default, rename = "profile")]
    pub profiles: BTreeMap<String, ProfileSection>,
}

/// Registry connection settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    /// Registry base URL
    pub url: Option<String>,
    /// Names sent in a single info request
    pub max_names_per_request: Option<usize>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// One repository profile
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    /// Absolute path of the compiled index, e.g. `/srv/repo/custom.db.tar.gz`
    pub repo: Option<Utf8PathBuf>,

    /// Extra parameters for the index add tool
    #[serde(default)]
    pub add_params: Vec<String>,

    /// Extra parameters for the index remove tool
    #[serde(default)]
    pub rm_params: Vec<String>,

    /// Move obsolete archives to `backup_dir` instead of deleting them
    #[serde(default)]
    pub backup: bool,

    /// Backup directory, relative paths are taken from the repository directory
    pub backup_dir: Option<Utf8PathBuf>,

    /// Packages never reported as upgradeable
    #[serde(default)]
    pub ignore_upgrades: Vec<String>,

    /// Sync databases whose packages count as available
    #[serde(default)]
    pub mirror_repos: Vec<String>,

    /// Root of the pacman database
    pub pacman_db: Option<Utf8PathBuf>,

    /// Leave installed packages out of dependency resolution
    #[serde(default)]
    pub skip_installed: bool,
    /// Treat requested packages that a mirror provides as leaves
    /// Never expand mirror-provided dependencies
    #[serde(default)]
    pub truncate_at_mirror: bool,
}

/// Parse a config file
pub fn parse_pakrat_toml(content: &str) -> ConfigResult<PakratToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| toml_error(content, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: PakratToml =
        toml::from_str(content).map_err(|e| toml_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration completeness
pub fn validate_config(config: &PakratToml) -> ConfigResult<()> {
    if let Some(default) = &config.default_profile {
        if !config.profiles.contains_key(default) {
            return Err(invalid(
                "default_profile",
                format!("profile '{}' is not defined", default),
            ));
        }
    }

    if let Some(url) = &config.registry.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(
                "registry.url",
                format!("'{}' is not an http(s) URL", url),
            ));
        }
    }

    if config.registry.max_names_per_request == Some(0) {
        return Err(invalid(
            "registry.max_names_per_request",
            "must be at least 1".to_string(),
        ));
    }

    for (name, profile) in &config.profiles {
        if let Some(repo) = &profile.repo {
            validate_repo_path(&format!("profile.{}.repo", name), repo)?;
        }
        if profile.backup_dir.is_some() && !profile.backup {
            tracing::debug!("profile {}: backup_dir set but backup is disabled", name);
        }
    }

    Ok(())
}

/// Check that a repository path names an index file by absolute path
pub fn validate_repo_path(field: &str, repo: &Utf8Path) -> ConfigResult<()> {
    if !repo.is_absolute() {
        return Err(invalid(field, format!("'{}' must be an absolute path", repo)));
    }
    let is_index = repo
        .file_name()
        .map_or(false, |name| name.contains(".db") && !name.starts_with(".db"));
    if !is_index {
        return Err(invalid(
            field,
            format!("'{}' does not name a repository index such as custom.db.tar.gz", repo),
        ));
    }
    Ok(())
}

/// Load and parse a config file
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<PakratToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PakratError::io(format!("Failed to read {}", path), e))?;

    parse_pakrat_toml(&content).map_err(|e| match e {
        PakratError::TomlParse {
            message,
            line,
            column,
        } => PakratError::TomlParse {
            message: format!("in file {}: {}", path, message),
            line,
            column,
        },
        PakratError::ConfigValidation { field, reason } => PakratError::ConfigValidation {
            field,
            reason: format!("{} (in file {})", reason, path),
        },
        other => other,
    })
}

fn invalid(field: &str, reason: String) -> PakratError {
    PakratError::ConfigValidation {
        field: field.to_string(),
        reason,
    }
}

fn toml_error(content: &str, message: &str, span: Option<std::ops::Range<usize>>) -> PakratError {
    let (line, column) = span.map_or((0, 0), |span| line_column(content, span.start));
    PakratError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}
