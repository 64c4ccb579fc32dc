//! Environment identification.
//!
//! Each target script gets its own environment, named after the script and
//! a SHA-256 of its canonical path so two `main.py` files in different
//! directories never share packages.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{EnvyError, Result};

/// Longest script-stem prefix kept in an identifier.
const MAX_STEM_LEN: usize = 32;

/// Stable identifier for the environment of one target script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentId {
    /// `<stem>-<16 hex chars>`.
    id: String,
    /// Canonical path of the script this identifier was derived from.
    script: PathBuf,
}

impl EnvironmentId {
    /// Derive the identifier for `script`.
    ///
    /// # Errors
    ///
    /// Returns a scan error if the path cannot be canonicalized (e.g., doesn't exist).
    pub fn for_script(script: &Path) -> Result<Self> {
        let canonical = script.canonicalize().map_err(|e| EnvyError::Scan {
            path: script.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_canonical(canonical))
    }

    /// Derive the identifier from an already canonical path.
    pub fn from_canonical(script: PathBuf) -> Self {
        let id = format!("{}-{}", sanitized_stem(&script), compute_hash(&script));
        Self { id, script }
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Canonical script path.
    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

fn sanitized_stem(script: &Path) -> String {
    let stem: String = script
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect();
    if stem.is_empty() {
        "app".to_string()
    } else {
        stem
    }
}

fn compute_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8]) // First 8 bytes (16 hex chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn id_combines_stem_and_hash() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("Photo Viewer.py");
        fs::write(&script, "").unwrap();

        let id = EnvironmentId::for_script(&script).unwrap();
        let (stem, hash) = id.as_str().rsplit_once('-').unwrap();

        assert_eq!(stem, "photo_viewer");
        assert_eq!(hash.len(), 16);
        assert!(id.script().is_absolute());
    }

    #[test]
    fn same_script_same_id() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("app.py");
        fs::write(&script, "").unwrap();

        let first = EnvironmentId::for_script(&script).unwrap();
        let second = EnvironmentId::for_script(&script).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn same_name_in_different_directories_differs() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        fs::write(one.path().join("main.py"), "").unwrap();
        fs::write(two.path().join("main.py"), "").unwrap();

        let first = EnvironmentId::for_script(&one.path().join("main.py")).unwrap();
        let second = EnvironmentId::for_script(&two.path().join("main.py")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn nonexistent_script_fails() {
        let result = EnvironmentId::for_script(Path::new("/nonexistent/app.py"));
        assert!(matches!(result, Err(EnvyError::Scan { .. })));
    }

    #[test]
    fn long_stems_are_truncated() {
        let id = EnvironmentId::from_canonical(PathBuf::from(format!("/{}.py", "x".repeat(80))));
        let (stem, _) = id.as_str().rsplit_once('-').unwrap();
        assert_eq!(stem.len(), MAX_STEM_LEN);
    }
}
