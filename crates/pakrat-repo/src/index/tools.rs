//! External index mutation tools (`repo-add`, `repo-remove`)

use pakrat_core::error::PakratError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::ensure_unlocked;
use crate::RepoResult;

/// Commands used to add entries to and remove entries from an index
#[derive(Debug, Clone)]
pub struct IndexTools {
    pub add_command: String,
    pub remove_command: String,
    /// Extra parameters passed before the database path
    pub add_params: Vec<String>,
    pub remove_params: Vec<String>,
}

impl Default for IndexTools {
    fn default() -> Self {
        Self {
            add_command: "repo-add".to_string(),
            remove_command: "repo-remove".to_string(),
            add_params: Vec::new(),
            remove_params: Vec::new(),
        }
    }
}

impl IndexTools {
    pub fn with_params(mut self, add_params: Vec<String>, remove_params: Vec<String>) -> Self {
        self.add_params = add_params;
        self.remove_params = remove_params;
        self
    }

    /// Merge archives into the index. No-op for an empty list.
    pub fn add(&self, db_path: &Path, files: &[PathBuf]) -> RepoResult<()> {
        if files.is_empty() {
            return Ok(());
        }
        info!(count = files.len(), db = %db_path.display(), "adding packages to index");
        let args: Vec<&std::ffi::OsStr> = files.iter().map(|f| f.as_os_str()).collect();
        self.run(&self.add_command, &self.add_params, db_path, &args)
    }

    /// Purge names from the index. No-op for an empty list.
    pub fn remove(&self, db_path: &Path, names: &[String]) -> RepoResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        info!(count = names.len(), db = %db_path.display(), "removing packages from index");
        let args: Vec<&std::ffi::OsStr> = names.iter().map(|n| n.as_ref()).collect();
        self.run(&self.remove_command, &self.remove_params, db_path, &args)
    }

    fn run(
        &self,
        command: &str,
        params: &[String],
        db_path: &Path,
        args: &[&std::ffi::OsStr],
    ) -> RepoResult<()> {
        ensure_unlocked(db_path)?;

        debug!(command, ?params, "running index tool");
        let output = Command::new(command)
            .args(params)
            .arg(db_path)
            .args(args)
            .output()
            .map_err(|e| PakratError::io(format!("Failed to run {}", command), e))?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(PakratError::IndexCommand {
                command: command.to_string(),
                output: combined.trim_end().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tools(add: &str, remove: &str) -> IndexTools {
        IndexTools {
            add_command: add.to_string(),
            remove_command: remove.to_string(),
            ..IndexTools::default()
        }
    }

    #[test]
    fn test_defaults() {
        let tools = IndexTools::default().with_params(vec!["--sign".to_string()], vec![]);
        assert_eq!(tools.add_command, "repo-add");
        assert_eq!(tools.remove_command, "repo-remove");
        assert_eq!(tools.add_params, vec!["--sign"]);
    }

    #[test]
    fn test_empty_lists_do_not_run() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db.tar.gz");
        let tools = tools("/nonexistent/repo-add", "/nonexistent/repo-remove");

        assert!(tools.add(&db, &[]).is_ok());
        assert!(tools.remove(&db, &[]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_success_and_failure() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db.tar.gz");

        let ok = tools("true", "true");
        assert!(ok.add(&db, &[dir.path().join("foo-1.0-1-any.pkg.tar.zst")]).is_ok());
        assert!(ok.remove(&db, &["foo".to_string()]).is_ok());

        let failing = tools("false", "false");
        match failing.remove(&db, &["foo".to_string()]) {
            Err(PakratError::IndexCommand { command, .. }) => assert_eq!(command, "false"),
            other => panic!("expected IndexCommand, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_is_reported() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db.tar.gz");

        let tools = IndexTools {
            add_command: "sh".to_string(),
            add_params: vec![
                "-c".to_string(),
                "echo out; echo err >&2; exit 1".to_string(),
            ],
            ..IndexTools::default()
        };

        match tools.add(&db, &[dir.path().join("foo-1.0-1-any.pkg.tar.zst")]) {
            Err(PakratError::IndexCommand { output, .. }) => {
                assert!(output.contains("out"));
                assert!(output.contains("err"));
            },
            other => panic!("expected IndexCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_locked_index_fails_fast() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db.tar.gz");
        std::fs::write(dir.path().join("custom.db.lck"), b"").unwrap();

        let tools = tools("true", "true");
        assert!(matches!(
            tools.remove(&db, &["foo".to_string()]),
            Err(PakratError::IndexLocked { .. })
        ));
    }
}
