//! Registry RPC response types

use pakrat_core::types::{Origin, Package, RegistryMeta, Version};
use serde::{Deserialize, Deserializer, Serialize};

/// Envelope of every RPC response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcResponse {
    /// RPC interface version
    pub version: Option<u32>,
    /// `multiinfo`, `search` or `error`
    #[serde(rename = "type")]
    pub response_type: String,
    #[serde(default)]
    pub resultcount: usize,
    #[serde(default)]
    pub results: Vec<RegistryPackage>,
    /// Error message when `type` is `error`
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn is_error(&self) -> bool {
        self.response_type == "error"
    }
}

/// One package as described by the registry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistryPackage {
    pub name: String,
    pub version: String,
    pub package_base: Option<String>,
    pub description: Option<String>,
    /// Upstream project URL
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub license: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub depends: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub make_depends: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub check_depends: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub opt_depends: Vec<String>,
    #[serde(default)]
    pub num_votes: u64,
    #[serde(default)]
    pub popularity: f64,
    /// Unix timestamp
    #[serde(default)]
    pub last_modified: i64,
    /// Unix timestamp when flagged, `null` otherwise
    pub out_of_date: Option<i64>,
    /// Source snapshot path relative to the registry base URL
    #[serde(rename = "URLPath")]
    pub url_path: Option<String>,
}

impl RegistryPackage {
    /// Convert into a registry-origin package record. Check dependencies are
    /// folded into the build dependencies.
    pub fn into_package(self) -> Package {
        let mut make_depends = self.make_depends;
        make_depends.extend(self.check_depends);

        Package {
            name: self.name,
            version: Version::new(self.version),
            base: self.package_base,
            description: self.description,
            url: self.url,
            licenses: self.license,
            arch: None,
            depends: self.depends,
            make_depends,
            opt_depends: self.opt_depends,
            origin: Origin::Registry(RegistryMeta {
                votes: self.num_votes,
                popularity: self.popularity,
                last_modified: self.last_modified,
                out_of_date: self.out_of_date,
                url_path: self.url_path,
            }),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_response() {
        let body = serde_json::json!({
            "version": 5,
            "type": "multiinfo",
            "resultcount": 1,
            "results": [{
                "ID": 1,
                "Name": "yay",
                "PackageBase": "yay",
                "Version": "12.3.5-1",
                "Description": "Yet another yogurt",
                "URL": "https://github.com/Jguer/yay",
                "NumVotes": 2000,
                "Popularity": 25.5,
                "OutOfDate": null,
                "LastModified": 1700000000,
                "URLPath": "/cgit/aur.git/snapshot/yay.tar.gz",
                "Depends": ["pacman>6.1", "git"],
                "MakeDepends": ["go>=1.21"],
                "CheckDepends": ["gotestsum"],
                "License": ["GPL-3.0-or-later"]
            }]
        });

        let response: RpcResponse = serde_json::from_value(body).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.resultcount, 1);

        let pkg = response.results.into_iter().next().unwrap().into_package();
        assert_eq!(pkg.name, "yay");
        assert_eq!(pkg.version.as_str(), "12.3.5-1");
        assert_eq!(pkg.depends, vec!["pacman>6.1", "git"]);
        assert_eq!(pkg.make_depends, vec!["go>=1.21", "gotestsum"]);
        assert!(pkg.opt_depends.is_empty());

        let meta = pkg.registry_meta().unwrap();
        assert_eq!(meta.votes, 2000);
        assert_eq!(meta.last_modified, 1_700_000_000);
        assert_eq!(meta.out_of_date, None);
        assert_eq!(meta.url_path.as_deref(), Some("/cgit/aur.git/snapshot/yay.tar.gz"));
    }

    #[test]
    fn test_parse_error_response() {
        let body = serde_json::json!({
            "version": 5,
            "type": "error",
            "resultcount": 0,
            "results": [],
            "error": "Too many package results."
        });

        let response: RpcResponse = serde_json::from_value(body).unwrap();
        assert!(response.is_error());
        assert_eq!(response.error.as_deref(), Some("Too many package results."));
    }

    #[test]
    fn test_null_lists_are_empty() {
        let body = serde_json::json!({
            "Name": "foo",
            "Version": "1.0-1",
            "License": null
        });

        let pkg: RegistryPackage = serde_json::from_value(body).unwrap();
        assert!(pkg.license.is_empty());
        assert!(pkg.depends.is_empty());
    }
}
