//! Readings command: list the registry without touching the network.

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let rows = output::registry_rows();
    output::print_output(&output::render_list(global.output, &rows));
    Ok(())
}
