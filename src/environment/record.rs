//! Snapshot of one environment's state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::probe::{EnvState, ProbeReport};

/// Installed distributions: normalized name to version.
pub type InstalledPackages = BTreeMap<String, String>;

/// What is known about an environment after probing or reconciling it.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentRecord {
    /// Environment root directory.
    pub root: PathBuf,
    /// Probe classification.
    pub state: EnvState,
    /// Installed packages.
    pub installed: InstalledPackages,
    /// When the reconciler last brought this environment to ready.
    pub last_reconciled: Option<DateTime<Utc>>,
}

impl EnvironmentRecord {
    /// Build a record from a probe report.
    pub fn from_report(root: PathBuf, report: ProbeReport) -> Self {
        Self {
            root,
            state: report.state,
            installed: report.installed,
            last_reconciled: None,
        }
    }

    /// Stamp the record as reconciled now.
    pub fn mark_reconciled(&mut self) {
        self.last_reconciled = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_copies_report_and_starts_unreconciled() {
        let report = ProbeReport {
            state: EnvState::PresentPopulated,
            interpreter: Some(PathBuf::from("/v/bin/python")),
            installed: BTreeMap::from([("numpy".to_string(), "1.26.4".to_string())]),
            reason: None,
        };
        let mut record = EnvironmentRecord::from_report(PathBuf::from("/v"), report);

        assert_eq!(record.state, EnvState::PresentPopulated);
        assert!(record.last_reconciled.is_none());
        assert!(record.installed.contains_key("numpy"));

        record.mark_reconciled();
        assert!(record.last_reconciled.is_some());
    }
}
