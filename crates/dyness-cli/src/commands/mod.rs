//! Command dispatch: bridges CLI args -> poller calls -> output formatting.

pub mod config_cmd;
pub mod readings;
pub mod snapshot;
pub mod verify;
pub mod watch;

use dyness_core::Poller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, poller: &Poller, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Verify => verify::handle(poller, global).await,
        Command::Snapshot => snapshot::handle(poller, global).await,
        Command::Watch(_) => watch::handle(poller, global).await,
        // Handled before dispatch
        Command::Readings | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
