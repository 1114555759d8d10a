//! Verify command: one authenticated call, no failure isolation.

use dyness_core::Poller;
use serde_json::Value;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(poller: &Poller, global: &GlobalOpts) -> Result<(), CliError> {
    let detail = poller.verify().await?;

    let out = output::render_single(global.output, &detail, |d| {
        let field = |key: &str| {
            d.get(key)
                .and_then(Value::as_str)
                .unwrap_or("-")
                .to_owned()
        };
        format!(
            "Credentials OK ({})\n  Device:        {}\n  Communication: {}\n  Firmware:      {}\n  Last update:   {}",
            poller.config().region.key(),
            field("deviceName"),
            field("deviceCommunicationStatus"),
            field("firmwareVersion"),
            field("dataUpdateTime"),
        )
    });
    output::print_output(&out);
    Ok(())
}
