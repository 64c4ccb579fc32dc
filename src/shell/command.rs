//! Captured subprocess execution.
//!
//! Every collaborator (venv creation, pip, pipreqs) runs through
//! [`run_captured`] with an explicit argument vector. Nothing goes through a
//! shell, so package names and paths are never re-interpreted.

use crate::error::{EnvyError, Result};
use std::ffi::OsStr;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// What a finished tool printed and how it exited.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// `None` when killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CapturedOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last `lines` non-blank lines of stderr.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let kept: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        kept[kept.len().saturating_sub(lines)..].join("\n")
    }

    /// One-line failure description, with pip's or venv's last complaint.
    pub fn failure_message(&self) -> String {
        let how = match self.exit_code {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        };
        let tail = self.stderr_tail(5);
        if tail.is_empty() {
            how
        } else {
            format!("{}: {}", how, tail)
        }
    }
}

/// `program arg1 arg2`, for logs and error messages.
pub fn display_command<P, S>(program: P, args: &[S]) -> String
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    std::iter::once(program.as_ref())
        .chain(args.iter().map(AsRef::as_ref))
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `program` to completion with stdin closed and both output streams
/// captured.
///
/// A non-zero exit is an `Ok` with [`CapturedOutput::succeeded`] false; only
/// failing to start the process is an `Err`.
pub fn run_captured<P, S>(program: P, args: &[S]) -> Result<CapturedOutput>
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    let rendered = display_command(&program, args);
    tracing::debug!("Executing: {}", rendered);
    let started = Instant::now();

    let output = Command::new(program.as_ref())
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            tracing::debug!("Failed to start {}: {}", rendered, e);
            EnvyError::CommandFailed {
                command: rendered.clone(),
                code: None,
            }
        })?;

    let captured = CapturedOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: started.elapsed(),
    };
    tracing::debug!(
        "{} finished with {:?} in {:?}",
        rendered,
        captured.exit_code,
        captured.duration
    );
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_code() {
        let ok = run_captured("sh", &["-c", "echo hello"]).unwrap();
        assert!(ok.succeeded());
        assert_eq!(ok.stdout.trim(), "hello");

        let failed = run_captured("sh", &["-c", "echo oops >&2; exit 3"]).unwrap();
        assert!(!failed.succeeded());
        assert_eq!(failed.exit_code, Some(3));
        assert_eq!(failed.failure_message(), "exited with code 3: oops");
    }

    #[cfg(unix)]
    #[test]
    fn arguments_are_not_shell_expanded() {
        let result = run_captured("echo", &["$HOME", "a;b"]).unwrap();
        assert_eq!(result.stdout.trim(), "$HOME a;b");
    }

    #[test]
    fn missing_program_is_an_error() {
        let result = run_captured("envy-definitely-not-a-real-program", &["--version"]);
        assert!(matches!(result, Err(EnvyError::CommandFailed { .. })));
    }

    #[test]
    fn stderr_tail_skips_blank_lines() {
        let output = CapturedOutput {
            exit_code: None,
            stdout: String::new(),
            stderr: "first\n\nERROR: No matching distribution found for ghost\n".to_string(),
            duration: Duration::from_millis(5),
        };
        assert_eq!(
            output.stderr_tail(1),
            "ERROR: No matching distribution found for ghost"
        );
        assert!(output.failure_message().starts_with("terminated by signal: first"));
    }

    #[test]
    fn display_command_joins_arguments() {
        assert_eq!(
            display_command("python3", &["-m", "venv", "/tmp/env"]),
            "python3 -m venv /tmp/env"
        );
    }
}
