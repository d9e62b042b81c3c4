//! Package record types.
//!
//! A [`Package`] looks the same whether it was read from an archive on disk,
//! the compiled repository index, the local pacman database or the remote
//! registry. Where it came from is recorded in its [`Origin`].

use super::{dependency_name, DependencyKind, Version};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Package metadata from any source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: Version,
    pub base: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub licenses: Vec<String>,
    pub arch: Option<String>,
    pub depends: Vec<String>,
    pub make_depends: Vec<String>,
    pub opt_depends: Vec<String>,
    pub origin: Origin,
}

/// Where a package record was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Origin {
    /// An archive in the repository directory
    File { path: PathBuf },
    /// An entry of the compiled repository index
    Database { filename: String },
    /// The local installed-package database
    LocalInstall,
    /// The remote registry
    Registry(RegistryMeta),
    Unknown,
}

/// Registry-only metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistryMeta {
    pub votes: u64,
    pub popularity: f64,
    /// Unix timestamp in seconds
    pub last_modified: i64,
    /// Unix timestamp in seconds when flagged out of date
    pub out_of_date: Option<i64>,
    /// Path of the source snapshot relative to the registry base URL
    pub url_path: Option<String>,
}

/// What makes two records "the same package build"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity<'a> {
    pub name: &'a str,
    pub version: &'a Version,
    pub filename: Option<&'a str>,
}

impl Package {
    /// Create a package with only the required fields
    pub fn new(name: impl Into<String>, version: impl Into<Version>, origin: Origin) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            base: None,
            description: None,
            url: None,
            licenses: Vec::new(),
            arch: None,
            depends: Vec::new(),
            make_depends: Vec::new(),
            opt_depends: Vec::new(),
            origin,
        }
    }

    /// Set the runtime dependencies
    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Set the build dependencies
    pub fn with_make_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.make_depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the base package this record was built from
    pub fn base_name(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.name)
    }

    /// Path of the archive for file-origin records
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File { path } => Some(path),
            _ => None,
        }
    }

    /// Archive file name, known for file and database records
    pub fn filename(&self) -> Option<&str> {
        match &self.origin {
            Origin::File { path } => path.file_name().and_then(|n| n.to_str()),
            Origin::Database { filename } => Some(filename),
            _ => None,
        }
    }

    pub fn identity(&self) -> PackageIdentity<'_> {
        PackageIdentity {
            name: &self.name,
            version: &self.version,
            filename: self.filename(),
        }
    }

    pub fn registry_meta(&self) -> Option<&RegistryMeta> {
        match &self.origin {
            Origin::Registry(meta) => Some(meta),
            _ => None,
        }
    }

    /// Declared dependency strings of one kind
    pub fn dependencies(&self, kind: DependencyKind) -> &[String] {
        match kind {
            DependencyKind::Runtime => &self.depends,
            DependencyKind::Build => &self.make_depends,
            DependencyKind::Optional => &self.opt_depends,
        }
    }

    /// Names of everything needed to build this package, runtime first,
    /// without duplicates
    pub fn build_requirement_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for spec in self.depends.iter().chain(self.make_depends.iter()) {
            let name = dependency_name(spec);
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Check if this is a valid package name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'))
    }
}

impl Origin {
    pub fn is_file(&self) -> bool {
        matches!(self, Origin::File { .. })
    }

    pub fn is_registry(&self) -> bool {
        matches!(self, Origin::Registry(_))
    }

    /// Short label used in logs and listings
    pub fn label(&self) -> &'static str {
        match self {
            Origin::File { .. } => "file",
            Origin::Database { .. } => "database",
            Origin::LocalInstall => "local",
            Origin::Registry(_) => "registry",
            Origin::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_creation() {
        let pkg = Package::new("yay", "12.3.5-1", Origin::Unknown);

        assert_eq!(pkg.name, "yay");
        assert_eq!(pkg.version.as_str(), "12.3.5-1");
        assert_eq!(pkg.base_name(), "yay");
        assert!(pkg.path().is_none());
        assert!(pkg.filename().is_none());
        assert_eq!(pkg.origin.label(), "unknown");
    }

    #[test]
    fn test_file_and_database_identity_match() {
        let file = Package::new(
            "foo",
            "1.0-1",
            Origin::File {
                path: PathBuf::from("/srv/repo/foo-1.0-1-any.pkg.tar.zst"),
            },
        );
        let db = Package::new(
            "foo",
            "1.0-1",
            Origin::Database {
                filename: "foo-1.0-1-any.pkg.tar.zst".to_string(),
            },
        );

        assert_eq!(file.identity(), db.identity());
        assert!(file.origin.is_file());
        assert!(!db.origin.is_file());
    }

    #[test]
    fn test_build_requirement_names() {
        let pkg = Package::new("foo", "1.0-1", Origin::Unknown)
            .with_depends(["glibc>=2.38", "zlib"])
            .with_make_depends(["cmake", "zlib"]);

        assert_eq!(pkg.build_requirement_names(), vec!["glibc", "zlib", "cmake"]);
        assert_eq!(pkg.dependencies(DependencyKind::Build), &["cmake", "zlib"]);
    }

    #[test]
    fn test_valid_package_names() {
        assert!(Package::is_valid_name("my-package"));
        assert!(Package::is_valid_name("lib32-glibc"));
        assert!(Package::is_valid_name("gtk+"));
        assert!(Package::is_valid_name("python3.12"));

        assert!(!Package::is_valid_name(""));
        assert!(!Package::is_valid_name("-invalid"));
        assert!(!Package::is_valid_name(".hidden"));
        assert!(!Package::is_valid_name("invalid name"));
    }
}
