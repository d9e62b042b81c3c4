//! Repository archive file names.
//!
//! Archives are named `<name>-<version>-<release>-<arch>.pkg.tar[.<compression>]`.
//! The version may carry an epoch (`1:2.0`), so only the last three dashes are
//! structural.

use super::Version;
use std::fmt;

const PACKAGE_MARKER: &str = ".pkg.tar";

/// The fields encoded in a package archive file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFilename {
    pub name: String,
    /// `version-release`, with epoch when present
    pub version: Version,
    pub arch: String,
    /// Compression suffix (`zst`, `xz`, `gz`), `None` for a plain tar
    pub compression: Option<String>,
}

impl PackageFilename {
    /// Parse an archive file name. Returns `None` for anything that is not a
    /// package archive, including detached signatures.
    pub fn parse(filename: &str) -> Option<Self> {
        let (stem, suffix) = filename.rsplit_once(PACKAGE_MARKER)?;

        let compression = match suffix {
            "" => None,
            s => {
                let ext = s.strip_prefix('.')?;
                if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return None;
                }
                Some(ext.to_string())
            },
        };

        let mut fields = stem.rsplitn(4, '-');
        let arch = fields.next()?;
        let release = fields.next()?;
        let version = fields.next()?;
        let name = fields.next()?;

        if [name, version, release, arch].iter().any(|f| f.is_empty()) {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            version: Version::new(format!("{}-{}", version, release)),
            arch: arch.to_string(),
            compression,
        })
    }

    /// Check whether a file name looks like a package archive
    pub fn is_package_file(filename: &str) -> bool {
        Self::parse(filename).is_some()
    }
}

impl fmt::Display for PackageFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}{}", self.name, self.version, self.arch, PACKAGE_MARKER)?;
        if let Some(compression) = &self.compression {
            write!(f, ".{}", compression)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zst() {
        let parsed = PackageFilename::parse("yay-bin-12.3.5-1-x86_64.pkg.tar.zst").unwrap();
        assert_eq!(parsed.name, "yay-bin");
        assert_eq!(parsed.version.as_str(), "12.3.5-1");
        assert_eq!(parsed.arch, "x86_64");
        assert_eq!(parsed.compression.as_deref(), Some("zst"));
        assert_eq!(parsed.to_string(), "yay-bin-12.3.5-1-x86_64.pkg.tar.zst");
    }

    #[test]
    fn test_parse_epoch_and_plain_tar() {
        let parsed = PackageFilename::parse("foo-2:1.0-3-any.pkg.tar").unwrap();
        assert_eq!(parsed.name, "foo");
        assert_eq!(parsed.version.as_str(), "2:1.0-3");
        assert_eq!(parsed.compression, None);
    }

    #[test]
    fn test_rejects_non_packages() {
        assert!(PackageFilename::parse("foo-1.0-1-any.pkg.tar.zst.sig").is_none());
        assert!(PackageFilename::parse("custom.db.tar.gz").is_none());
        assert!(PackageFilename::parse("foo-1.0-any.pkg.tar.zst").is_none());
        assert!(PackageFilename::parse("README.md").is_none());
        assert!(!PackageFilename::is_package_file("-1.0-1-any.pkg.tar.xz"));
    }
}
