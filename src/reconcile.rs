//! Environment reconciliation.
//!
//! [`Reconciler`] drives one environment to a runnable state:
//!
//! ```text
//!   NeedsRepair ──► NeedsCreate ──► NeedsSync ──► Ready
//!        ▲              │  ▲            │
//!        └──────────────┘  └── probe ◄──┘
//!                      (failures end in Failed)
//! ```
//!
//! Every transition re-probes the filesystem, so an interrupted run is
//! picked up from whatever state it left behind. Creation is retried once
//! after wiping the root, and a sync is retried once as a full re-sync;
//! a second failure of either is fatal. The attempt counters span the whole
//! run: a second sync that leaves anything but `Ready` fails, and a third
//! creation is never started.

use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;

use serde::Serialize;

use crate::environment::{
    base_packages, EnvState, EnvironmentProbe, EnvironmentRecord, ProbeReport, VenvLayout,
};
use crate::error::{EnvyError, Result};
use crate::plan::{ActionPlan, DependencyDiffer, DiffMode};
use crate::scanner::RequirementSet;
use crate::tooling::{EnvironmentCreator, PackageManager, PackageOperation};
use crate::ui::UserInterface;

/// Attempts allowed for creation and for sync.
const MAX_ATTEMPTS: usize = 2;

/// Reconciler states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileState {
    NeedsCreate,
    NeedsRepair,
    NeedsSync,
    Ready,
    Failed,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReconcileState::NeedsCreate => "needs create",
            ReconcileState::NeedsRepair => "needs repair",
            ReconcileState::NeedsSync => "needs sync",
            ReconcileState::Ready => "ready",
            ReconcileState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Per-invocation reconciliation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Whether packages that are not required are removed.
    pub mode: DiffMode,
    /// Wipe and rebuild the environment even if it looks healthy.
    pub force_recreate: bool,
}

/// What a successful reconciliation did.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// States visited, in order, ending with [`ReconcileState::Ready`].
    pub states: Vec<ReconcileState>,
    /// Number of install/uninstall calls made.
    pub installer_calls: usize,
    /// Number of environment creations.
    pub creations: usize,
    /// Final environment state.
    pub record: EnvironmentRecord,
}

impl ReconcileOutcome {
    /// True when nothing had to change.
    pub fn was_noop(&self) -> bool {
        self.installer_calls == 0 && self.creations == 0
    }
}

/// Drives an environment to [`ReconcileState::Ready`].
pub struct Reconciler<'a> {
    creator: &'a dyn EnvironmentCreator,
    packages: &'a dyn PackageManager,
    differ: DependencyDiffer,
    base_packages: BTreeSet<String>,
}

/// Mutable bookkeeping for one run.
#[derive(Default)]
struct Run {
    states: Vec<ReconcileState>,
    installer_calls: usize,
    creations: usize,
    create_attempts: usize,
    sync_attempts: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(creator: &'a dyn EnvironmentCreator, packages: &'a dyn PackageManager) -> Self {
        Self {
            creator,
            packages,
            differ: DependencyDiffer::default(),
            base_packages: base_packages(),
        }
    }

    /// Use `differ` (and its protected set) for planning.
    pub fn with_differ(mut self, differ: DependencyDiffer) -> Self {
        self.differ = differ;
        self
    }

    /// Classify the environment without changing it.
    pub fn probe(&self, layout: &VenvLayout) -> Result<ProbeReport> {
        EnvironmentProbe::new(self.packages, &self.base_packages).probe(layout)
    }

    /// Actions a sync would take against `report`.
    pub fn plan(&self, report: &ProbeReport, required: &RequirementSet, mode: DiffMode) -> ActionPlan {
        let installed: BTreeSet<String> = report.installed.keys().cloned().collect();
        self.differ.diff(required, &installed, mode)
    }

    /// State the reconciler would enter for `report`.
    pub fn classify(
        &self,
        report: &ProbeReport,
        required: &RequirementSet,
        mode: DiffMode,
    ) -> ReconcileState {
        match report.state {
            EnvState::Absent => ReconcileState::NeedsCreate,
            EnvState::PresentEmpty if !report.has_interpreter() => ReconcileState::NeedsCreate,
            EnvState::Corrupt => ReconcileState::NeedsRepair,
            EnvState::PresentEmpty | EnvState::PresentPopulated => {
                if self.plan(report, required, mode).is_empty() {
                    ReconcileState::Ready
                } else {
                    ReconcileState::NeedsSync
                }
            }
        }
    }

    /// Bring the environment at `layout` to a state satisfying `required`.
    pub fn reconcile(
        &self,
        layout: &VenvLayout,
        required: &RequirementSet,
        options: ReconcileOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<ReconcileOutcome> {
        let mut run = Run::default();
        let mut report = self.probe(layout)?;
        tracing::debug!("Initial state of {}: {}", layout.root().display(), report.state);

        let mut state = if options.force_recreate {
            ReconcileState::NeedsRepair
        } else {
            self.classify(&report, required, options.mode)
        };

        loop {
            run.states.push(state);
            tracing::debug!("Reconciler: {}", state);

            state = match state {
                ReconcileState::NeedsRepair => {
                    if let Some(reason) = &report.reason {
                        ui.warning(&format!("Environment is damaged ({}); rebuilding", reason));
                    }
                    remove_root(layout)?;
                    ReconcileState::NeedsCreate
                }
                ReconcileState::NeedsCreate => {
                    if run.create_attempts >= MAX_ATTEMPTS {
                        run.states.push(ReconcileState::Failed);
                        return Err(EnvyError::ReconcileFailed {
                            path: layout.root().to_path_buf(),
                            pending: describe_pending(&report, "recreate environment"),
                        });
                    }
                    run.create_attempts += 1;
                    match self.create(layout, ui).and_then(|_| self.probe(layout)) {
                        Ok(created) if created.has_interpreter() => {
                            run.creations += 1;
                            report = created;
                            self.classify(&report, required, options.mode)
                        }
                        outcome => {
                            let err = match outcome {
                                Err(e) => e,
                                Ok(created) => EnvyError::Create {
                                    path: layout.root().to_path_buf(),
                                    message: format!(
                                        "environment is {} after creation",
                                        created.state
                                    ),
                                },
                            };
                            if run.create_attempts >= MAX_ATTEMPTS {
                                run.states.push(ReconcileState::Failed);
                                return Err(err);
                            }
                            tracing::warn!("Environment creation failed, retrying: {}", err);
                            report = ProbeReport {
                                reason: None,
                                ..self.probe(layout)?
                            };
                            ReconcileState::NeedsRepair
                        }
                    }
                }
                ReconcileState::NeedsSync => {
                    run.sync_attempts += 1;
                    let plan = self.plan(&report, required, options.mode);
                    let applied = self.apply(layout, &plan, ui, &mut run);
                    report = self.probe(layout)?;
                    let next = self.classify(&report, required, options.mode);

                    match applied {
                        Err(e) if run.sync_attempts >= MAX_ATTEMPTS => {
                            run.states.push(ReconcileState::Failed);
                            return Err(e);
                        }
                        Err(e) => {
                            tracing::warn!("Sync failed, retrying: {}", e);
                            next
                        }
                        Ok(()) if next != ReconcileState::Ready
                            && run.sync_attempts >= MAX_ATTEMPTS =>
                        {
                            run.states.push(ReconcileState::Failed);
                            let pending = match next {
                                ReconcileState::NeedsSync => {
                                    self.plan(&report, required, options.mode).to_string()
                                }
                                _ => describe_pending(&report, "repair environment"),
                            };
                            return Err(EnvyError::ReconcileFailed {
                                path: layout.root().to_path_buf(),
                                pending,
                            });
                        }
                        Ok(()) => next,
                    }
                }
                ReconcileState::Ready => {
                    let mut record =
                        EnvironmentRecord::from_report(layout.root().to_path_buf(), report);
                    record.mark_reconciled();
                    return Ok(ReconcileOutcome {
                        states: run.states,
                        installer_calls: run.installer_calls,
                        creations: run.creations,
                        record,
                    });
                }
                ReconcileState::Failed => {
                    return Err(EnvyError::ReconcileFailed {
                        path: layout.root().to_path_buf(),
                        pending: String::new(),
                    });
                }
            };
        }
    }

    fn create(&self, layout: &VenvLayout, ui: &mut dyn UserInterface) -> Result<()> {
        let mut spinner = ui.start_spinner("Creating virtual environment");
        match self.creator.create(layout) {
            Ok(()) => {
                spinner.finish_success(&format!("Created {}", layout.root().display()));
                Ok(())
            }
            Err(e) => {
                spinner.finish_error("Environment creation failed");
                Err(e)
            }
        }
    }

    fn apply(
        &self,
        layout: &VenvLayout,
        plan: &ActionPlan,
        ui: &mut dyn UserInterface,
        run: &mut Run,
    ) -> Result<()> {
        let steps = [
            (PackageOperation::Install, plan.install_args()),
            (PackageOperation::Uninstall, plan.uninstall_args()),
        ];
        for (operation, packages) in steps {
            if packages.is_empty() {
                continue;
            }
            let label = format!("{} {}", operation, packages.join(", "));
            let mut spinner = ui.start_spinner(&capitalize(&label));
            run.installer_calls += 1;
            match self.packages.apply(layout, operation, &packages) {
                Ok(()) => spinner.finish_success(&capitalize(&label)),
                Err(e) => {
                    spinner.finish_error(&format!("Failed to {}", label));
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Delete an environment root, whatever is there.
pub fn remove_root(layout: &VenvLayout) -> Result<()> {
    let root = layout.root();
    let removal = match std::fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(root),
        Ok(_) => std::fs::remove_file(root),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    removal.map_err(|e| EnvyError::Create {
        path: root.to_path_buf(),
        message: format!("cannot remove existing environment: {}", e),
    })?;
    tracing::info!("Removed environment at {}", root.display());
    Ok(())
}

/// Pending work for an environment that is not syncable, with the probe's
/// reason when it has one.
fn describe_pending(report: &ProbeReport, action: &str) -> String {
    match &report.reason {
        Some(reason) => format!("{} ({})", action, reason),
        None => format!("{} ({})", action, report.state),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
