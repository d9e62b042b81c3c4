//! Dependency specification types.
//!
//! Package metadata declares dependencies as strings such as `glibc`,
//! `python>=3.11` or, for optional dependencies, `git: for VCS sources`.
//! Records only keep these strings; resolution always looks names up.

use super::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed dependency declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: Option<Constraint>,
    /// Free-form reason, only present on optional dependencies
    pub description: Option<String>,
}

/// Version constraint attached to a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub op: Op,
    pub version: Version,
}

/// Comparison operator for version constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Equal,     // =1.0
    Greater,   // >1.0
    GreaterEq, // >=1.0
    Less,      // <1.0
    LessEq,    // <=1.0
}

/// Which list a dependency was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Needed at runtime
    Runtime,
    /// Needed to build (or check) the package
    Build,
    /// Optional runtime extension
    Optional,
}

impl Dependency {
    /// Parse a dependency declaration. Never fails; a string without any
    /// operator is a bare name.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        let (spec, description) = match spec.split_once(": ") {
            Some((spec, desc)) => (spec.trim(), Some(desc.trim().to_string())),
            None => (spec.trim_end_matches(':'), None),
        };

        let Some(op_start) = spec.find(['<', '>', '=']) else {
            return Self {
                name: spec.to_string(),
                constraint: None,
                description,
            };
        };

        let (name, rest) = spec.split_at(op_start);
        let (op, version) = if let Some(v) = rest.strip_prefix(">=") {
            (Op::GreaterEq, v)
        } else if let Some(v) = rest.strip_prefix("<=") {
            (Op::LessEq, v)
        } else if let Some(v) = rest.strip_prefix('>') {
            (Op::Greater, v)
        } else if let Some(v) = rest.strip_prefix('<') {
            (Op::Less, v)
        } else {
            (Op::Equal, rest.trim_start_matches('='))
        };

        Self {
            name: name.trim().to_string(),
            constraint: Some(Constraint {
                op,
                version: Version::new(version.trim()),
            }),
            description,
        }
    }

    /// Check whether a concrete version satisfies this dependency
    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.constraint
            .as_ref()
            .map_or(true, |constraint| constraint.matches(version))
    }
}

impl Constraint {
    /// Check a version against this constraint. A constraint without a
    /// release matches any release of the same upstream version.
    pub fn matches(&self, version: &Version) -> bool {
        let ord = version.compare(&self.version);
        match self.op {
            Op::Equal => ord == Ordering::Equal,
            Op::Greater => ord == Ordering::Greater,
            Op::GreaterEq => ord != Ordering::Less,
            Op::Less => ord == Ordering::Less,
            Op::LessEq => ord != Ordering::Greater,
        }
    }
}

/// Strip the constraint and description from a dependency declaration
pub fn dependency_name(spec: &str) -> &str {
    let spec = spec.trim();
    let spec = spec.split_once(':').map_or(spec, |(name, _)| name);
    let end = spec.find(['<', '>', '=']).unwrap_or(spec.len());
    spec[..end].trim()
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::Equal => "=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(constraint) = &self.constraint {
            write!(f, "{}{}", constraint.op, constraint.version)?;
        }
        Ok(())
    }
}

impl DependencyKind {
    /// Check if this dependency has to be present to build the package
    pub fn is_required_for_build(&self) -> bool {
        matches!(self, DependencyKind::Runtime | DependencyKind::Build)
    }
}
