//! Integration tests for the envy binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An `envy` command isolated from the caller's home, config and guard.
fn envy(home: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("envy"));
    cmd.env("HOME", home)
        .env("ENVY_HOME", home.join("venvs"))
        .env_remove("ENVY_CONFIG")
        .env_remove("ENVY_MANAGED_ENV")
        .env_remove("RUST_LOG");
    cmd
}

fn write_script(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-reconciling virtual environments"))
        .stdout(predicate::str::contains("recreate"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_without_script_is_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No script given"));
    Ok(())
}

#[test]
fn cli_missing_script_uses_reserved_exit_code() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .args(["run", "/nonexistent/dir/tool.py"])
        .assert()
        .code(125)
        .stderr(predicate::str::contains("tool.py"));
    Ok(())
}

#[test]
fn cli_bare_script_form_is_run() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .args(["/nonexistent/dir/tool.py", "--flag"])
        .assert()
        .code(125);
    Ok(())
}

#[test]
fn cli_status_missing_script_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .args(["status", "/nonexistent/dir/tool.py"])
        .assert()
        .code(125);
    Ok(())
}

#[test]
fn cli_missing_config_file_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let script = write_script(temp.path(), "tool.py", "import os\n");
    envy(temp.path())
        .arg("--config")
        .arg(temp.path().join("missing.yml"))
        .arg("status")
        .arg(&script)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
    Ok(())
}

#[test]
fn cli_invalid_app_config_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let script = write_script(temp.path(), "tool.py", "import os\n");
    fs::write(temp.path().join(".envy.yml"), "no_such_key: 1\n")?;
    envy(temp.path())
        .arg("status")
        .arg(&script)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no_such_key"));
    Ok(())
}

#[test]
fn cli_update_requires_target() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path()).arg("update").assert().code(2);
    Ok(())
}

#[test]
fn cli_completions_bash() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("envy"));
    Ok(())
}

#[test]
fn cli_delete_missing_environment_warns() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    envy(temp.path())
        .args(["delete", "--yes", "--venv"])
        .arg(temp.path().join("never"))
        .assert()
        .success()
        .stderr(predicate::str::contains("No environment"));
    Ok(())
}

#[test]
fn cli_delete_needs_yes_when_not_interactive() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let env = temp.path().join("env");
    fs::create_dir_all(env.join("bin"))?;

    envy(temp.path())
        .env_remove("ENVY_PROMPT_CONFIRM_DELETE")
        .args(["delete", "--venv"])
        .arg(&env)
        .assert()
        .code(1);
    assert!(env.exists());

    envy(temp.path())
        .env("ENVY_PROMPT_CONFIRM_DELETE", "yes")
        .args(["delete", "--venv"])
        .arg(&env)
        .assert()
        .success();
    assert!(!env.exists());
    Ok(())
}

#[cfg(unix)]
mod with_fake_python {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in for `python3 -m venv ROOT` whose environments answer
    /// `pip list` with nothing and otherwise echo their arguments.
    const FAKE_PYTHON: &str = r#"#!/bin/sh
root="$3"
mkdir -p "$root/bin"
cat > "$root/bin/python" <<'PY'
#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "pip" ]; then
  case "$*" in *list*) echo '[]' ;; esac
  exit 0
fi
shift
echo "ran $* guard=$ENVY_MANAGED_ENV"
exit 7
PY
chmod +x "$root/bin/python"
touch "$root/pyvenv.cfg"
"#;

    fn executable(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn app(temp: &TempDir) -> PathBuf {
        let python = temp.path().join("fake-python3");
        executable(&python, FAKE_PYTHON);
        let app_dir = temp.path().join("app");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(
            app_dir.join(".envy.yml"),
            format!("python: {}\n", python.display()),
        )
        .unwrap();
        write_script(&app_dir, "tool.py", "import os\nimport sys\n")
    }

    #[test]
    fn run_creates_environment_and_propagates_exit_code() -> Result<(), Box<dyn std::error::Error>>
    {
        let temp = TempDir::new()?;
        let script = app(&temp);
        let id = envy::environment::EnvironmentId::for_script(&script)?;

        envy(temp.path())
            .arg("run")
            .arg(&script)
            .args(["first", "--second"])
            .assert()
            .code(7)
            .stdout(predicate::str::contains("ran first --second"))
            .stdout(predicate::str::contains(format!("guard={}", id)));

        assert!(temp.path().join("venvs").join(id.as_str()).join("pyvenv.cfg").exists());
        Ok(())
    }

    #[test]
    fn status_reports_ready_after_sync() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let script = app(&temp);

        envy(temp.path()).arg("sync").arg(&script).assert().success();

        envy(temp.path())
            .args(["status", "--json"])
            .arg(&script)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"next\": \"ready\""))
            .stdout(predicate::str::contains("\"state\": \"present_empty\""));
        Ok(())
    }

    #[test]
    fn reentry_skips_reconciliation() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let script = app(&temp);
        let id = envy::environment::EnvironmentId::for_script(&script)?;

        // Under its own guard the script runs directly, so nothing is created.
        envy(temp.path())
            .env("ENVY_MANAGED_ENV", id.as_str())
            .arg(&script)
            .assert()
            .failure();
        assert!(!temp.path().join("venvs").join(id.as_str()).exists());
        Ok(())
    }
}
