//! `%KEY%` block files used by index databases and the local package
//! database.
//!
//! ```text
//! %NAME%
//! foo
//!
//! %DEPENDS%
//! glibc
//! zlib>=1.3
//! ```

use pakrat_core::types::{Origin, Package, Version};
use std::collections::HashMap;

/// Fields of one database entry, merged from its `desc` and `depends` files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescRecord {
    fields: HashMap<String, Vec<String>>,
}

impl DescRecord {
    pub fn parse(content: &str) -> Self {
        let mut record = Self::default();
        record.merge(content);
        record
    }

    /// Add the blocks of another file of the same entry
    pub fn merge(&mut self, content: &str) {
        let mut current: Option<&str> = None;

        for line in content.lines() {
            let line = line.trim_end();
            if let Some(key) = line
                .strip_prefix('%')
                .and_then(|rest| rest.strip_suffix('%'))
                .filter(|key| !key.is_empty())
            {
                self.fields.entry(key.to_string()).or_default();
                current = Some(key);
            } else if line.is_empty() {
                current = None;
            } else if let Some(values) = current.and_then(|key| self.fields.get_mut(key)) {
                values.push(line.to_string());
            }
        }
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.value("NAME")
    }

    pub fn version(&self) -> Option<&str> {
        self.value("VERSION")
    }

    /// Convert into a package record, `None` without name and version
    pub fn into_package(self, origin: Origin) -> Option<Package> {
        let name = self.name()?.to_string();
        let version = Version::new(self.version()?);

        let list = |key: &str| self.values(key).to_vec();
        let mut make_depends = list("MAKEDEPENDS");
        make_depends.extend(list("CHECKDEPENDS"));

        Some(Package {
            base: self.value("BASE").map(str::to_string),
            description: self.value("DESC").map(str::to_string),
            url: self.value("URL").map(str::to_string),
            licenses: list("LICENSE"),
            arch: self.value("ARCH").map(str::to_string),
            depends: list("DEPENDS"),
            make_depends,
            opt_depends: list("OPTDEPENDS"),
            ..Package::new(name, version, origin)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: &str = "%FILENAME%
foo-1.0-1-x86_64.pkg.tar.zst

%NAME%
foo

%BASE%
foo-base

%VERSION%
1.0-1

%DESC%
A test package

%LICENSE%
MIT
Apache-2.0

%ARCH%
x86_64
";

    const DEPENDS: &str = "%DEPENDS%
glibc
zlib>=1.3

%MAKEDEPENDS%
cmake

%OPTDEPENDS%
git: for VCS sources
";

    #[test]
    fn test_parse_blocks() {
        let record = DescRecord::parse(DESC);
        assert_eq!(record.name(), Some("foo"));
        assert_eq!(record.version(), Some("1.0-1"));
        assert_eq!(record.value("FILENAME"), Some("foo-1.0-1-x86_64.pkg.tar.zst"));
        assert_eq!(record.values("LICENSE"), &["MIT", "Apache-2.0"]);
        assert!(record.values("DEPENDS").is_empty());
    }

    #[test]
    fn test_merge_depends_file() {
        let mut record = DescRecord::parse(DESC);
        record.merge(DEPENDS);

        let pkg = record.into_package(Origin::LocalInstall).unwrap();
        assert_eq!(pkg.name, "foo");
        assert_eq!(pkg.base_name(), "foo-base");
        assert_eq!(pkg.description.as_deref(), Some("A test package"));
        assert_eq!(pkg.depends, vec!["glibc", "zlib>=1.3"]);
        assert_eq!(pkg.make_depends, vec!["cmake"]);
        assert_eq!(pkg.opt_depends, vec!["git: for VCS sources"]);
    }

    #[test]
    fn test_incomplete_record() {
        assert!(DescRecord::parse("%NAME%\nfoo\n")
            .into_package(Origin::Unknown)
            .is_none());
        assert!(DescRecord::parse("garbage\n%%\n")
            .into_package(Origin::Unknown)
            .is_none());
    }
}
