//! Package management through `python -m pip`.

use serde::Deserialize;

use super::{PackageManager, PackageOperation};
use crate::environment::{InstalledPackages, VenvLayout};
use crate::error::{EnvyError, Result};
use crate::scanner::normalize_name;
use crate::shell::{run_captured, CapturedOutput};

/// Runs pip with the environment's own interpreter.
#[derive(Debug, Clone, Default)]
pub struct Pip;

#[derive(Debug, Deserialize)]
struct ListedPackage {
    name: String,
    version: String,
}

impl Pip {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, layout: &VenvLayout, args: &[&str]) -> Result<CapturedOutput> {
        let mut argv = vec!["-m", "pip", "--disable-pip-version-check"];
        argv.extend_from_slice(args);
        run_captured(layout.interpreter(), &argv)
    }

    fn run_sync(
        &self,
        layout: &VenvLayout,
        operation: PackageOperation,
        args: &[&str],
        packages: &[String],
    ) -> Result<()> {
        let mut argv: Vec<&str> = args.to_vec();
        argv.extend(packages.iter().map(String::as_str));
        let sync_error = |message: String| EnvyError::Sync {
            operation: operation.to_string(),
            packages: packages.join(", "),
            message,
        };
        let result = self.run(layout, &argv).map_err(|e| sync_error(e.to_string()))?;
        if result.succeeded() {
            Ok(())
        } else {
            Err(sync_error(result.failure_message()))
        }
    }
}

impl PackageManager for Pip {
    fn apply(
        &self,
        layout: &VenvLayout,
        operation: PackageOperation,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let args: &[&str] = match operation {
            PackageOperation::Install => &["install"],
            PackageOperation::Uninstall => &["uninstall", "-y"],
        };
        self.run_sync(layout, operation, args, packages)
    }

    fn list_installed(&self, layout: &VenvLayout) -> Result<InstalledPackages> {
        let result = self.run(layout, &["list", "--format=json"])?;
        if !result.succeeded() {
            return Err(EnvyError::CommandFailed {
                command: "pip list".to_string(),
                code: result.exit_code,
            });
        }
        parse_pip_list(&result.stdout)
    }

    fn upgrade_all(&self, layout: &VenvLayout) -> Result<usize> {
        self.run_sync(
            layout,
            PackageOperation::Install,
            &["install", "--upgrade"],
            &["pip".to_string()],
        )?;

        let frozen = self.run(layout, &["freeze"])?;
        if !frozen.succeeded() {
            return Err(EnvyError::CommandFailed {
                command: "pip freeze".to_string(),
                code: frozen.exit_code,
            });
        }
        let packages = parse_freeze(&frozen.stdout);
        if packages.is_empty() {
            return Ok(0);
        }
        self.run_sync(
            layout,
            PackageOperation::Install,
            &["install", "--upgrade"],
            &packages,
        )?;
        Ok(packages.len())
    }
}

/// Parse `pip list --format=json` output.
pub fn parse_pip_list(json: &str) -> Result<InstalledPackages> {
    let listed: Vec<ListedPackage> = serde_json::from_str(json.trim())
        .map_err(|e| anyhow::anyhow!("Unreadable pip list output: {}", e))?;
    Ok(listed
        .into_iter()
        .map(|p| (normalize_name(&p.name), p.version))
        .collect())
}

/// Distribution names from `pip freeze` output.
///
/// Editable installs and direct references are skipped; they cannot be
/// upgraded by name.
pub fn parse_freeze(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter(|line| !line.contains(" @ "))
        .filter_map(|line| line.split("==").next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
