//! Snapshot command: run one refresh cycle and print the result.

use dyness_core::{CoreError, Poller};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(poller: &Poller, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = poller.refresh().await;

    if let Some(err) = poller.last_error() {
        return Err(cycle_error(&err));
    }

    match global.output {
        OutputFormat::Json => output::print_output(&output::render_json(snap.as_ref())),
        OutputFormat::Table => {
            let rows = output::reading_rows(&snap);
            output::print_output(&output::render_list(OutputFormat::Table, &rows));
            if let Some(module) = poller.module_sn() {
                eprintln!("Module serial: {module}");
            }
        }
    }
    Ok(())
}

/// Map an all-fetches-failed cycle to a CLI error, keeping API
/// rejections distinct from connection faults.
fn cycle_error(err: &CoreError) -> CliError {
    match err {
        CoreError::Api { path, code, message } => CliError::ApiRejected {
            path: path.clone(),
            code: code.clone(),
            message: message.clone(),
        },
        other => CliError::ConnectionFailed {
            reason: other.to_string(),
        },
    }
}
