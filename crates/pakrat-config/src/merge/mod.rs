//! Config file discovery, profile selection and overrides

use std::collections::HashMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use pakrat_core::error::PakratError;
use tracing::debug;

use crate::toml::{validate_repo_path, PakratToml, ProfileSection};
use crate::ConfigResult;

/// Config file named explicitly through the environment
pub const CONFIG_ENV: &str = "PAKRAT_CONFIG";
/// Profile selected through the environment
pub const PROFILE_ENV: &str = "PAKRAT_PROFILE";
/// Repository index path override
pub const REPO_ENV: &str = "PAKRAT_REPO";
/// Registry base URL override
pub const REGISTRY_URL_ENV: &str = "PAKRAT_REGISTRY_URL";

const ENV_PREFIX: &str = "PAKRAT_";
const BACKUP_DIR: &str = "backup";

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// `--config` flag
    CommandLine(Utf8PathBuf),
    /// `$PAKRAT_CONFIG`
    Environment(Utf8PathBuf),
    /// `<config dir>/pakrat/config.toml`
    UserConfig(Utf8PathBuf),
    /// No config file, built-in defaults only
    Defaults,
}

/// Locates and loads the config file
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Path given with `--config`
    explicit: Option<Utf8PathBuf>,
    /// Environment snapshot, `PAKRAT_*` variables only
    env: HashMap<String, String>,
    /// User config directory
    config_dir: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader over the process environment
    pub fn new() -> Self {
        let config_dir = dirs::config_dir().and_then(|dir| Utf8PathBuf::try_from(dir).ok());
        Self {
            explicit: None,
            env: ConfigLayering::collect_env_overrides(),
            config_dir,
        }
    }

    pub fn with_config_file(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_config_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Find the config file to load. Explicit paths are returned even when
    /// they do not exist; the default location only when it does.
    pub fn resolve_config_path(&self) -> Option<(Utf8PathBuf, ConfigSource)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigSource::CommandLine(path.clone())));
        }

        if let Some(path) = self.env.get(CONFIG_ENV).filter(|p| !p.is_empty()) {
            let path = Utf8PathBuf::from(path);
            return Some((path.clone(), ConfigSource::Environment(path)));
        }

        let path = self.config_dir.as_ref()?.join("pakrat").join("config.toml");
        if path.exists() {
            Some((path.clone(), ConfigSource::UserConfig(path)))
        } else {
            None
        }
    }

    /// Load the config file, or defaults when there is none
    pub async fn load(&self) -> ConfigResult<(PakratToml, ConfigSource)> {
        match self.resolve_config_path() {
            Some((path, source)) => {
                debug!("loading config from {}", path);
                let config = crate::toml::load_from_file(&path).await?;
                Ok((config, source))
            },
            None => {
                debug!("no config file found, using defaults");
                Ok((PakratToml::default(), ConfigSource::Defaults))
            },
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub profile: Option<String>,
    pub repo: Option<Utf8PathBuf>,
    pub registry_url: Option<String>,
}

/// The fully layered settings of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    /// Selected profile, `None` when the config defines none
    pub name: Option<String>,
    /// Absolute path of the compiled index
    pub repo: Utf8PathBuf,
    /// Directory holding the index and the archives
    pub root: Utf8PathBuf,
    pub add_params: Vec<String>,
    pub rm_params: Vec<String>,
    /// Where obsolete archives go, `None` to delete them
    pub backup_dir: Option<Utf8PathBuf>,
    pub ignore_upgrades: Vec<String>,
    pub mirror_repos: Vec<String>,
    pub pacman_db: Option<Utf8PathBuf>,
    pub skip_installed: bool,
    pub truncate_at_mirror: bool,
    pub registry_url: Option<String>,
    pub max_names_per_request: Option<usize>,
    pub timeout: Option<Duration>,
}

/// Layers environment and command-line values over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigLayering {
    /// Environment overrides
    env: HashMap<String, String>,
    /// CLI flag overrides
    cli: Overrides,
}

impl ConfigLayering {
    pub fn new(env: HashMap<String, String>, cli: Overrides) -> Self {
        Self { env, cli }
    }

    /// Layer over the process environment
    pub fn from_env(cli: Overrides) -> Self {
        Self::new(Self::collect_env_overrides(), cli)
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Pick the active profile: `--profile`, then `$PAKRAT_PROFILE`, then
    /// `default_profile`, then the only profile when exactly one exists.
    pub fn select_profile<'c>(
        &self,
        config: &'c PakratToml,
    ) -> ConfigResult<Option<(&'c str, &'c ProfileSection)>> {
        let requested = self
            .cli
            .profile
            .as_deref()
            .or_else(|| self.env_value(PROFILE_ENV))
            .or(config.default_profile.as_deref());

        if let Some(name) = requested {
            return config
                .profiles
                .get_key_value(name)
                .map(|(name, profile)| Some((name.as_str(), profile)))
                .ok_or_else(|| PakratError::ConfigValidation {
                    field: "profile".to_string(),
                    reason: format!(
                        "profile '{}' is not defined; available: {}",
                        name,
                        available(config)
                    ),
                });
        }

        match config.profiles.len() {
            0 => Ok(None),
            1 => Ok(config
                .profiles
                .iter()
                .next()
                .map(|(name, profile)| (name.as_str(), profile))),
            _ => Err(PakratError::ConfigValidation {
                field: "profile".to_string(),
                reason: format!(
                    "several profiles are defined and none is selected; pick one of {} with --profile or set default_profile",
                    available(config)
                ),
            }),
        }
    }

    /// Merge the config file, environment and command line into the
    /// settings of one invocation. Command-line values win over
    /// environment values, which win over the file.
    pub fn resolve(&self, config: &PakratToml) -> ConfigResult<ResolvedProfile> {
        let selected = self.select_profile(config)?;
        let default_profile = ProfileSection::default();
        let (name, profile) = match selected {
            Some((name, profile)) => (Some(name.to_string()), profile),
            None => (None, &default_profile),
        };

        let (repo, field) = if let Some(repo) = &self.cli.repo {
            (repo.clone(), "--repo")
        } else if let Some(repo) = self.env_value(REPO_ENV) {
            (Utf8PathBuf::from(repo), REPO_ENV)
        } else if let Some(repo) = &profile.repo {
            (repo.clone(), "repo")
        } else {
            return Err(PakratError::ConfigValidation {
                field: "repo".to_string(),
                reason: format!(
                    "no repository configured; set repo in a profile, {} or --repo",
                    REPO_ENV
                ),
            });
        };
        validate_repo_path(field, &repo)?;

        let root = repo
            .parent()
            .map(Utf8Path::to_path_buf)
            .ok_or_else(|| PakratError::ConfigValidation {
                field: field.to_string(),
                reason: format!("'{}' has no parent directory", repo),
            })?;

        let backup_dir = profile.backup.then(|| match &profile.backup_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join(BACKUP_DIR),
        });

        let registry_url = self
            .cli
            .registry_url
            .clone()
            .or_else(|| self.env_value(REGISTRY_URL_ENV).map(str::to_string))
            .or_else(|| config.registry.url.clone());

        Ok(ResolvedProfile {
            name,
            repo,
            root,
            add_params: profile.add_params.clone(),
            rm_params: profile.rm_params.clone(),
            backup_dir,
            ignore_upgrades: profile.ignore_upgrades.clone(),
            mirror_repos: profile.mirror_repos.clone(),
            pacman_db: profile.pacman_db.clone(),
            skip_installed: profile.skip_installed,
            truncate_at_mirror: profile.truncate_at_mirror,
            registry_url,
            max_names_per_request: config.registry.max_names_per_request,
            timeout: config.registry.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl ResolvedProfile {
    /// Check whether upgrades of a package are ignored
    pub fn ignores_upgrade(&self, name: &str) -> bool {
        self.ignore_upgrades.iter().any(|ignored| ignored == name)
    }
}

fn available(config: &PakratToml) -> String {
    if config.profiles.is_empty() {
        return "(none)".to_string();
    }
    config
        .profiles
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
