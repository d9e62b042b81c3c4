//! Name to version listings.

use super::{Package, Version};
use std::collections::BTreeMap;

/// A set of package names with one version each.
///
/// Used for the local installed-package database and for mirror/sync
/// snapshots, where only presence and version matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    packages: BTreeMap<String, Version>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, replacing any version already recorded for it
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<Version>) {
        self.packages.insert(name.into(), version.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn version(&self, name: &str) -> Option<&Version> {
        self.packages.get(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Version)> {
        self.packages.iter().map(|(name, version)| (name.as_str(), version))
    }

    /// Merge another set into this one. Entries already present win, so the
    /// first configured mirror takes precedence.
    pub fn extend_missing(&mut self, other: PackageSet) {
        for (name, version) in other.packages {
            self.packages.entry(name).or_insert(version);
        }
    }
}

impl FromIterator<(String, Version)> for PackageSet {
    fn from_iter<I: IntoIterator<Item = (String, Version)>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        iter.into_iter().map(|pkg| (pkg.name, pkg.version)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    #[test]
    fn test_insert_and_lookup() {
        let mut set = PackageSet::new();
        assert!(set.is_empty());

        set.insert("glibc", "2.39-1");
        set.insert("zlib", "1:1.3.1-1");

        assert_eq!(set.len(), 2);
        assert!(set.contains("glibc"));
        assert!(!set.contains("yay"));
        assert_eq!(set.version("zlib").map(Version::as_str), Some("1:1.3.1-1"));
    }

    #[test]
    fn test_extend_missing_keeps_first() {
        let mut core: PackageSet = [Package::new("bash", "5.2-1", Origin::Unknown)]
            .into_iter()
            .collect();
        let mut extra = PackageSet::new();
        extra.insert("bash", "5.1-1");
        extra.insert("vim", "9.1-1");

        core.extend_missing(extra);

        assert_eq!(core.version("bash").map(Version::as_str), Some("5.2-1"));
        assert!(core.contains("vim"));
        assert_eq!(
            core.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["bash", "vim"]
        );
    }
}
