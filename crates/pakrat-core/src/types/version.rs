//! Package version ordering.
//!
//! Versions follow the `[epoch:]version[-release]` grammar used by binary
//! package repositories. Comparison is lenient: malformed epochs and releases
//! degrade to zero and comparing two strings never fails.
//!
//! Ordering rules, in priority order:
//! - a higher epoch always wins;
//! - the upstream version is split on `.`, `_` and `+` into segments, each of
//!   which is made of alternating digit and lowercase-letter runs. A numeric
//!   run beats an alphabetic run, and a segment with leftover runs loses
//!   (`1.0rc1 < 1.0`). When every shared segment is equal, more segments win;
//! - releases are compared only when both sides carry one, so a constraint on
//!   `1.5` matches `1.5-1`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const SEGMENT_SEPARATORS: [char; 3] = ['.', '_', '+'];

/// Compare two version strings.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if a.is_empty() {
        return Ordering::Less;
    }
    if b.is_empty() {
        return Ordering::Greater;
    }

    let left = VersionParts::parse(a);
    let right = VersionParts::parse(b);

    left.epoch
        .cmp(&right.epoch)
        .then_with(|| compare_upstream(left.version, right.version))
        .then_with(|| match (left.release, right.release) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => Ordering::Equal,
        })
}

/// Compare like [`vercmp`], but a missing release counts as release 0.
///
/// Release elision makes `vercmp` intransitive once versions with and
/// without a release are mixed (`1.5-2 == 1.5 == 1.5-1`). This ordering is
/// total, so it is the one to sort with.
pub fn vercmp_total(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (a.is_empty(), b.is_empty()) {
        (true, _) => return Ordering::Less,
        (_, true) => return Ordering::Greater,
        _ => {},
    }

    let left = VersionParts::parse(a);
    let right = VersionParts::parse(b);

    left.epoch
        .cmp(&right.epoch)
        .then_with(|| compare_upstream(left.version, right.version))
        .then_with(|| left.release.unwrap_or(0).cmp(&right.release.unwrap_or(0)))
}

/// Parsed view of a version string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionParts<'a> {
    pub epoch: u64,
    pub version: &'a str,
    pub release: Option<u64>,
}

impl<'a> VersionParts<'a> {
    /// Split a version string into epoch, upstream version and release.
    ///
    /// Never fails: an epoch or release that is not a number counts as 0.
    pub fn parse(input: &'a str) -> Self {
        let (epoch, rest) = match input.split_once(':') {
            Some((epoch, rest)) => (leading_number(epoch), rest),
            None => (0, input),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((version, release)) => (version, Some(leading_number(release))),
            None => (rest, None),
        };

        Self {
            epoch,
            version,
            release,
        }
    }
}

/// Parse the leading run of ASCII digits, 0 when absent or out of range
fn leading_number(s: &str) -> u64 {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

fn compare_upstream(a: &str, b: &str) -> Ordering {
    let mut left = a.split(SEGMENT_SEPARATORS);
    let mut right = b.split(SEGMENT_SEPARATORS);

    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => match compare_segment(l, r) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);

    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => match l.cmp(&r) {
                Ordering::Equal => continue,
                other => return other,
            },
            // Leftover runs make a segment older: 1.0rc1 < 1.0
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// A maximal run of digits or lowercase letters inside a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Alpha(&'a str),
    Numeric(&'a str),
}

impl Ord for Run<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Run::Numeric(a), Run::Numeric(b)) => compare_numeric(a, b),
            (Run::Alpha(a), Run::Alpha(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Run::Numeric(_), Run::Alpha(_)) => Ordering::Greater,
            (Run::Alpha(_), Run::Numeric(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Run<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare digit strings as integers of arbitrary length
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

struct Runs<'a> {
    segment: &'a str,
    pos: usize,
}

impl<'a> Runs<'a> {
    fn new(segment: &'a str) -> Self {
        Self { segment, pos: 0 }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.segment.as_bytes();

        // Anything that is neither a digit nor a lowercase letter ends a run
        while self.pos < bytes.len()
            && !bytes[self.pos].is_ascii_digit()
            && !bytes[self.pos].is_ascii_lowercase()
        {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let numeric = bytes[start].is_ascii_digit();
        while self.pos < bytes.len()
            && (if numeric {
                bytes[self.pos].is_ascii_digit()
            } else {
                bytes[self.pos].is_ascii_lowercase()
            })
        {
            self.pos += 1;
        }

        let run = &self.segment[start..self.pos];
        Some(if numeric {
            Run::Numeric(run)
        } else {
            Run::Alpha(run)
        })
    }
}

/// A package version string.
///
/// Equality is string identity, which is what record identity needs. Use
/// [`Version::compare`] for ordering: release elision makes the ordering
/// coarser than equality, so `Version` deliberately does not implement `Ord`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Create a new version
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed epoch, upstream version and release
    pub fn parts(&self) -> VersionParts<'_> {
        VersionParts::parse(&self.0)
    }

    /// Compare using package version ordering
    pub fn compare(&self, other: &Version) -> Ordering {
        vercmp(&self.0, &other.0)
    }

    /// Total ordering for sorting, see [`vercmp_total`]
    pub fn total_cmp(&self, other: &Version) -> Ordering {
        vercmp_total(&self.0, &other.0)
    }

    /// Check whether this version is strictly newer than `other`
    pub fn is_newer_than(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl FromStr for Version {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn vercmp_is_reflexive(a in "[0-9a-zA-Z.:_+~-]{0,16}") {
            prop_assert_eq!(vercmp(&a, &a), Ordering::Equal);
        }

        #[test]
        fn vercmp_is_antisymmetric(
            a in "[0-9a-z.:_+-]{0,16}",
            b in "[0-9a-z.:_+-]{0,16}",
        ) {
            prop_assert_eq!(vercmp(&a, &b), vercmp(&b, &a).reverse());
        }

        #[test]
        fn epoch_always_dominates(
            low in 0u64..50,
            bump in 1u64..50,
            a in "[0-9]{1,3}(\\.[0-9a-z]{1,3}){0,3}",
            b in "[0-9]{1,3}(\\.[0-9a-z]{1,3}){0,3}",
        ) {
            let older = format!("{}:{}", low, a);
            let newer = format!("{}:{}", low + bump, b);
            prop_assert_eq!(vercmp(&newer, &older), Ordering::Greater);
        }

        #[test]
        fn total_order_is_transitive(
            a in "[0-9]{1,2}(\\.[0-9a-z]{1,2}){0,2}(-[0-9]{1,2})?",
            b in "[0-9]{1,2}(\\.[0-9a-z]{1,2}){0,2}(-[0-9]{1,2})?",
            c in "[0-9]{1,2}(\\.[0-9a-z]{1,2}){0,2}(-[0-9]{1,2})?",
        ) {
            prop_assert_eq!(vercmp_total(&a, &b), vercmp_total(&b, &a).reverse());
            if vercmp_total(&a, &b) != Ordering::Greater && vercmp_total(&b, &c) != Ordering::Greater {
                prop_assert_ne!(vercmp_total(&a, &c), Ordering::Greater);
            }
        }

        #[test]
        fn total_order_refines_vercmp(
            a in "[0-9]{1,2}(\\.[0-9a-z]{1,2}){0,2}(-[0-9]{1,2})?",
            b in "[0-9]{1,2}(\\.[0-9a-z]{1,2}){0,2}(-[0-9]{1,2})?",
        ) {
            let loose = vercmp(&a, &b);
            if loose != Ordering::Equal {
                prop_assert_eq!(vercmp_total(&a, &b), loose);
            }
        }

        #[test]
        fn release_is_ignored_when_one_side_lacks_it(
            v in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}",
            rel in 1u64..100,
        ) {
            let with_release = format!("{}-{}", v, rel);
            prop_assert_eq!(vercmp(&with_release, &v), Ordering::Equal);
        }
    }
}
