//! Executable lookup on PATH.

use std::path::{Path, PathBuf};

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable. Does NOT use
/// the `which` command, whose behavior varies across systems.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        for name in candidate_names(tool) {
            let candidate = dir.join(&name);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Resolve the first of `tools` found on the system PATH.
pub fn find_first_on_path(tools: &[&str]) -> Option<PathBuf> {
    let entries = parse_system_path();
    tools
        .iter()
        .find_map(|tool| resolve_tool_path(tool, &entries))
}

#[cfg(windows)]
fn candidate_names(tool: &str) -> Vec<String> {
    vec![format!("{}.exe", tool), tool.to_string()]
}

#[cfg(not(windows))]
fn candidate_names(tool: &str) -> Vec<String> {
    vec![tool.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn resolves_first_executable_match() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        make_executable(&second.path().join("python3"));

        let entries = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = resolve_tool_path("python3", &entries).unwrap();

        assert_eq!(found, second.path().join("python3"));
    }

    #[cfg(unix)]
    #[test]
    fn skips_non_executable_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("python3"), "not a binary").unwrap();

        let entries = vec![dir.path().to_path_buf()];
        assert!(resolve_tool_path("python3", &entries).is_none());
    }

    #[test]
    fn missing_tool_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let entries = vec![dir.path().to_path_buf()];
        assert!(resolve_tool_path("envy-no-such-tool", &entries).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn directories_are_not_executable() {
        let dir = TempDir::new().unwrap();
        assert!(!is_executable(dir.path()));
    }
}
