//! Static import scanning.
//!
//! [`ImportScanner`] reads a target script and the local modules it pulls in
//! (same-directory modules and packages, plus relative imports), and returns
//! the [`RequirementSet`] of third-party distributions it needs. Standard
//! library names are dropped and the rest go through the [`AliasTable`].
//!
//! # Example
//!
//! ```
//! use envy::scanner::{AliasTable, ImportScanner};
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let script = temp.path().join("app.py");
//! fs::write(&script, "import os\nimport requests\nfrom PIL import Image\n").unwrap();
//!
//! let scanner = ImportScanner::new(AliasTable::builtin());
//! let requirements = scanner.scan(&script).unwrap();
//! let specs: Vec<&str> = requirements.iter().map(|r| r.spec()).collect();
//! assert_eq!(specs, vec!["requests", "Pillow"]);
//! ```
//!
//! Only imports visible in the source text are found; anything loaded through
//! `importlib` or `__import__` has to be declared with `--requirements`.

pub mod aliases;
pub mod parse;
pub mod requirements;
pub mod stdlib;

pub use aliases::AliasTable;
pub use parse::{parse_imports, ImportStatement};
pub use requirements::{
    load_requirements_file, normalize_name, parse_requirements, Requirement, RequirementSet,
};
pub use stdlib::is_stdlib;

use crate::error::{EnvyError, Result};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Optional second opinion on a script's requirements.
///
/// Results are advisory: they can add requirements the static scan missed,
/// and a failure never aborts a scan.
pub trait RequirementsGenerator {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce requirements for `script`, given the local files it uses.
    fn generate(&self, script: &Path, local_files: &[PathBuf]) -> Result<RequirementSet>;
}

/// Everything a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Installable requirements, in discovery order.
    pub requirements: RequirementSet,
    /// Python files visited, starting with the entry script.
    pub local_files: Vec<PathBuf>,
    /// Third-party top-level import names before alias mapping.
    pub third_party_imports: Vec<String>,
}

/// Scans scripts for third-party imports.
pub struct ImportScanner {
    aliases: AliasTable,
    generator: Option<Box<dyn RequirementsGenerator>>,
}

impl ImportScanner {
    /// Create a scanner using `aliases` for import-to-distribution mapping.
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            aliases,
            generator: None,
        }
    }

    /// Consult `generator` after the static scan.
    pub fn with_generator(mut self, generator: Box<dyn RequirementsGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// The alias table in use.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Scan `script` and return its requirement set.
    pub fn scan(&self, script: &Path) -> Result<RequirementSet> {
        Ok(self.scan_report(script)?.requirements)
    }

    /// Scan `script` and return the full report.
    pub fn scan_report(&self, script: &Path) -> Result<ScanReport> {
        if !script.is_file() {
            return Err(EnvyError::Scan {
                path: script.to_path_buf(),
                message: "script does not exist or is not a file".to_string(),
            });
        }
        let root = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut report = ScanReport::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::from([script.to_path_buf()]);
        let mut seen_imports: HashSet<String> = HashSet::new();

        while let Some(file) = queue.pop_front() {
            if !visited.insert(file.clone()) {
                continue;
            }
            let source = std::fs::read_to_string(&file).map_err(|e| EnvyError::Scan {
                path: file.clone(),
                message: e.to_string(),
            })?;
            tracing::debug!("Scanning {}", file.display());
            report.local_files.push(file.clone());

            let dir = file.parent().unwrap_or(&root);
            for import in parse_imports(&source) {
                if import.is_relative() {
                    let base = ancestor(dir, import.level - 1);
                    queue.extend(local_targets(&base, &import));
                    continue;
                }

                let Some(top) = import.top_level() else {
                    continue;
                };
                if is_stdlib(top) {
                    continue;
                }
                if is_local_module(&root, top) {
                    queue.extend(local_targets(&root, &import));
                    continue;
                }

                if seen_imports.insert(top.to_string()) {
                    report.third_party_imports.push(top.to_string());
                }
                let distribution = self.aliases.resolve(&import.module);
                if report.requirements.insert(Requirement::from_name(&distribution)) {
                    tracing::debug!("{} requires {}", import.module, distribution);
                }
            }
        }

        if let Some(generator) = &self.generator {
            consult(generator.as_ref(), script, &mut report);
        }

        Ok(report)
    }
}

fn consult(generator: &dyn RequirementsGenerator, script: &Path, report: &mut ScanReport) {
    match generator.generate(script, &report.local_files) {
        Ok(extra) => {
            for requirement in extra.iter() {
                if report.requirements.insert(requirement.clone()) {
                    tracing::info!(
                        "{} suggested additional requirement {}",
                        generator.name(),
                        requirement
                    );
                }
            }
        }
        Err(e) => {
            tracing::warn!("{} failed, continuing with static scan: {}", generator.name(), e);
        }
    }
}

/// Whether `name` is a module or package living next to the entry script.
pub fn is_local_module(root: &Path, name: &str) -> bool {
    root.join(format!("{}.py", name)).is_file() || root.join(name).join("__init__.py").is_file()
}

fn ancestor(dir: &Path, levels: usize) -> PathBuf {
    let mut base = dir.to_path_buf();
    for _ in 0..levels {
        if let Some(parent) = base.parent() {
            base = parent.to_path_buf();
        }
    }
    base
}

/// Files an import pulls in from `base`: every package `__init__.py` along
/// the dotted path, the module itself, and any imported names that are
/// submodules.
fn local_targets(base: &Path, import: &ImportStatement) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    let mut dir = base.to_path_buf();

    if !import.module.is_empty() {
        let parts: Vec<&str> = import.module.split('.').collect();
        for (idx, part) in parts.iter().enumerate() {
            let module_file = dir.join(format!("{}.py", part));
            let package = dir.join(part);
            let init = package.join("__init__.py");
            if init.is_file() {
                targets.push(init);
            }
            if idx == parts.len() - 1 && module_file.is_file() {
                targets.push(module_file);
                return targets;
            }
            if !package.is_dir() {
                return targets;
            }
            dir = package;
        }
    }

    for name in &import.names {
        let module_file = dir.join(format!("{}.py", name));
        let init = dir.join(name).join("__init__.py");
        if module_file.is_file() {
            targets.push(module_file);
        } else if init.is_file() {
            targets.push(init);
        }
    }
    targets
}
