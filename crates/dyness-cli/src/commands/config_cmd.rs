//! Config subcommand handlers.

use std::io::{BufRead, IsTerminal, Write};

use crate::cli::{ConfigAction, ConfigArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Path => {
            println!("{}", dyness_config::config_path().display());
            Ok(())
        }

        ConfigAction::Show => {
            let mut cfg = dyness_config::load_config_or_default();
            // Never print stored secrets
            for profile in cfg.profiles.values_mut() {
                if profile.api_secret.is_some() {
                    profile.api_secret = Some("<redacted>".into());
                }
            }
            let out = output::render_single(global.output, &cfg, |c| format!("{c:#?}"));
            output::print_output(&out);
            Ok(())
        }

        ConfigAction::SetSecret => {
            let cfg = dyness_config::load_config_or_default();
            let profile_name =
                dyness_config::active_profile_name(global.profile.as_deref(), &cfg);

            let secret = read_secret_line()?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "api-secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            dyness_config::store_api_secret(&profile_name, &secret)?;
            eprintln!("Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Read one line from stdin, prompting when interactive.
fn read_secret_line() -> Result<String, CliError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("API secret: ");
        let _ = std::io::stderr().flush();
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
