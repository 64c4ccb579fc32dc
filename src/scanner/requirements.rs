//! Requirement names and the ordered, de-duplicated requirement set.

use crate::error::{EnvyError, Result};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Leading distribution name of a requirement specifier.
static REQUIREMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)").expect("REQUIREMENT_NAME must compile")
});

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("SEPARATOR_RUN must compile"));

/// Normalize a distribution name: lowercase, with runs of `-`, `_` and `.`
/// collapsed to a single `-`. `Qt_Material` and `qt-material` compare equal.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RUN
        .replace_all(name.trim(), "-")
        .to_lowercase()
}

/// One required distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    spec: String,
}

impl Requirement {
    /// Requirement for a bare distribution name.
    pub fn from_name(distribution: &str) -> Self {
        Self {
            name: normalize_name(distribution),
            spec: distribution.trim().to_string(),
        }
    }

    /// Parse a specifier such as `numpy>=1.26` or `requests[socks]`.
    ///
    /// Returns `None` when the text does not start with a distribution name.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let name = REQUIREMENT_NAME.captures(spec)?.get(1)?.as_str();
        Some(Self {
            name: normalize_name(name),
            spec: spec.to_string(),
        })
    }

    /// Normalized name used for comparisons.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument handed to the installer.
    pub fn spec(&self) -> &str {
        &self.spec
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Requirements in first-seen order, unique by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    items: Vec<Requirement>,
    seen: HashSet<String>,
}

impl RequirementSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a requirement. Returns false if the name was already present.
    pub fn insert(&mut self, requirement: Requirement) -> bool {
        if self.seen.contains(requirement.name()) {
            return false;
        }
        self.seen.insert(requirement.name().to_string());
        self.items.push(requirement);
        true
    }

    /// Whether a requirement with this (unnormalized) name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(&normalize_name(name))
    }

    /// Look up a requirement by (unnormalized) name.
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        let name = normalize_name(name);
        self.items.iter().find(|r| r.name() == name)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.items.iter()
    }

    /// Normalized names as a sorted set.
    pub fn names(&self) -> BTreeSet<String> {
        self.seen.iter().cloned().collect()
    }

    /// Number of requirements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Extend<Requirement> for RequirementSet {
    fn extend<T: IntoIterator<Item = Requirement>>(&mut self, iter: T) {
        for requirement in iter {
            self.insert(requirement);
        }
    }
}

impl FromIterator<Requirement> for RequirementSet {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a RequirementSet {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Parse the contents of a `requirements.txt` file.
///
/// Comments, blank lines and option lines (`-r`, `-e`, `--index-url`) are
/// skipped; everything else keeps its full specifier.
pub fn parse_requirements(content: &str) -> RequirementSet {
    content
        .lines()
        .map(|line| match line.find(" #") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(Requirement::parse)
        .collect()
}

/// Read and parse a requirements file.
pub fn load_requirements_file(path: &Path) -> Result<RequirementSet> {
    let content = std::fs::read_to_string(path).map_err(|e| EnvyError::Scan {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parse_requirements(&content))
}
