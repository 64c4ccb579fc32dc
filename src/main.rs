//! envy CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use envy::cli::{Cli, CommandDispatcher};
use envy::guard::InvocationContext;
use envy::shell::is_ci;
use envy::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr; stdout belongs to the launched script.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("envy=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("envy=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Clamp an exit code into the range a process can report.
fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("envy starting with args: {:?}", cli);

    // Read once; nothing below looks at the guard variable again.
    let context = InvocationContext::from_process_env();

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    // Disable styling in-process so NO_COLOR never leaks into the script.
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let mut ui = create_ui(!is_ci(), output_mode);
    let dispatcher = CommandDispatcher::new(context, cli.config.clone());

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => to_exit_code(result.exit_code),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            to_exit_code(e.exit_code())
        }
    }
}
