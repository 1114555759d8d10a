//! Watch command: fixed-interval polling until Ctrl-C.

use chrono::Local;
use dyness_core::Poller;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// The --interval override is folded into the poller config before
// construction; by the time we get here the config is authoritative.
pub async fn handle(poller: &Poller, global: &GlobalOpts) -> Result<(), CliError> {
    let interval = poller.config().refresh_interval;
    if interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let mut rx = poller.subscribe();
    poller.start().await?;

    eprintln!("Polling every {}s -- Ctrl-C to stop", interval.as_secs());

    loop {
        // `changed` also fires for the initial snapshot published by start().
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                if let Some(snap) = snap {
                    print_cycle(poller, &snap, global);
                }
            }
        }
    }

    poller.shutdown().await;
    eprintln!("Stopped.");
    Ok(())
}

fn print_cycle(poller: &Poller, snap: &dyness_core::Snapshot, global: &GlobalOpts) {
    if let Some(err) = poller.last_error() {
        eprintln!("[{}] cycle failed: {err}", Local::now().format("%H:%M:%S"));
        return;
    }

    match global.output {
        OutputFormat::Json => output::print_output(&output::render_json(snap)),
        OutputFormat::Table => {
            println!("── {} ──", snap.fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"));
            let rows = output::reading_rows(snap);
            output::print_output(&output::render_list(OutputFormat::Table, &rows));
        }
    }
}
