//! `.PKGINFO` parsing

use pakrat_core::types::{Origin, Package, Version};

/// Parse `.PKGINFO` content (`key = value` lines) into a package record.
///
/// Unknown keys are ignored. `checkdepend` entries are folded into the build
/// dependencies.
pub fn parse_pkginfo(content: &str, origin: Origin) -> Result<Package, String> {
    let mut name = None;
    let mut version = None;
    let mut pkg = Package::new("", "", origin);

    for line in content.lines() {
        let line = line.trim();

        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();

        match key.trim() {
            "pkgname" => name = Some(value),
            "pkgver" => version = Some(value),
            "pkgbase" => pkg.base = Some(value),
            "pkgdesc" => pkg.description = Some(value),
            "url" => pkg.url = Some(value),
            "arch" => pkg.arch = Some(value),
            "license" => pkg.licenses.push(value),
            "depend" => pkg.depends.push(value),
            "makedepend" | "checkdepend" => pkg.make_depends.push(value),
            "optdepend" => pkg.opt_depends.push(value),
            _ => {},
        }
    }

    pkg.name = name.filter(|n| !n.is_empty()).ok_or("pkgname missing from .PKGINFO")?;
    pkg.version = version
        .filter(|v| !v.is_empty())
        .map(Version::new)
        .ok_or("pkgver missing from .PKGINFO")?;
    Ok(pkg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Generated by makepkg 6.1.0
pkgname = yay-bin
pkgbase = yay-bin
pkgver = 12.3.5-1
pkgdesc = Yet another yogurt. Pacman wrapper = AUR helper
url = https://github.com/Jguer/yay
builddate = 1700000000
arch = x86_64
license = GPL-3.0-or-later
depend = pacman>6.1
depend = git
optdepend = sudo: privilege elevation
makedepend = go
checkdepend = gotestsum
";

    #[test]
    fn test_parse_sample() {
        let pkg = parse_pkginfo(SAMPLE, Origin::Unknown).unwrap();

        assert_eq!(pkg.name, "yay-bin");
        assert_eq!(pkg.base_name(), "yay-bin");
        assert_eq!(pkg.version.as_str(), "12.3.5-1");
        assert_eq!(
            pkg.description.as_deref(),
            Some("Yet another yogurt. Pacman wrapper = AUR helper")
        );
        assert_eq!(pkg.arch.as_deref(), Some("x86_64"));
        assert_eq!(pkg.licenses, vec!["GPL-3.0-or-later"]);
        assert_eq!(pkg.depends, vec!["pacman>6.1", "git"]);
        assert_eq!(pkg.make_depends, vec!["go", "gotestsum"]);
        assert_eq!(pkg.opt_depends, vec!["sudo: privilege elevation"]);
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(parse_pkginfo("pkgver = 1.0-1\n", Origin::Unknown).is_err());
        assert!(parse_pkginfo("pkgname = foo\n", Origin::Unknown).is_err());
        assert!(parse_pkginfo("pkgname =\npkgver = 1\n", Origin::Unknown).is_err());
    }
}
