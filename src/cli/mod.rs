//! The `envy` command line: clap definitions in [`args`], one [`Command`]
//! per subcommand in [`commands`].

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, DeleteArgs, PackagesArgs, ReconcileArgs, RecreateArgs, RunArgs, StatusArgs,
    SyncArgs, TargetArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
