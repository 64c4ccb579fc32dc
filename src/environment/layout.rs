//! On-disk layout of a virtual environment.

use std::path::{Path, PathBuf};

/// Well-known paths inside a virtual environment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Environment root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the interpreter and console scripts.
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    /// The environment's Python interpreter.
    pub fn interpreter(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    /// `pyvenv.cfg`, written by the venv module.
    pub fn pyvenv_cfg(&self) -> PathBuf {
        self.root.join("pyvenv.cfg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn unix_interpreter_lives_in_bin() {
        let layout = VenvLayout::new("/venvs/app");
        assert_eq!(layout.interpreter(), PathBuf::from("/venvs/app/bin/python"));
    }

    #[test]
    fn pyvenv_cfg_is_at_root() {
        let layout = VenvLayout::new("/venvs/app");
        assert_eq!(layout.pyvenv_cfg(), PathBuf::from("/venvs/app/pyvenv.cfg"));
        assert_eq!(layout.root(), Path::new("/venvs/app"));
    }
}
