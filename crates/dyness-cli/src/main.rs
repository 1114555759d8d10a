mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use dyness_core::{Credentials, Poller, PollerConfig, Region};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands: no credentials required
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Readings => commands::readings::handle(&cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "dyness", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the cloud API
        cmd => {
            let mut config = build_poller_config(&cli.global)?;
            if let Command::Watch(ref args) = cmd {
                if let Some(secs) = args.interval {
                    config.refresh_interval = std::time::Duration::from_secs(secs);
                }
            }
            let poller = Poller::new(config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &poller, &cli.global).await
        }
    }
}

/// Build a `PollerConfig` from the config file, profile, and CLI overrides.
fn build_poller_config(global: &GlobalOpts) -> Result<PollerConfig, CliError> {
    let cfg = dyness_config::load_config_or_default();
    let profile_name = dyness_config::active_profile_name(global.profile.as_deref(), &cfg);

    let mut config = if let Some(profile) = cfg.profiles.get(&profile_name) {
        dyness_config::profile_to_poller_config(profile, &profile_name)?
    } else {
        // No profile -- build from CLI flags / env vars alone
        config_from_flags(global, &profile_name)?
    };

    // CLI flags win over profile values
    if let Some(ref api_id) = global.api_id {
        config.credentials.api_id = api_id.clone();
    }
    if let Some(ref secret) = global.api_secret {
        config.credentials.api_secret = SecretString::from(secret.clone());
    }
    if let Some(ref sn) = global.sn_bms {
        config.sn_bms = sn.clone();
    }
    if let Some(ref sn) = global.sn_dongle {
        config.sn_dongle = sn.clone();
    }
    if let Some(ref sn) = global.sn_module {
        config.sn_module = Some(sn.clone());
    }
    if let Some(ref region) = global.region {
        config.region = Region::from_key(region);
    }

    Ok(config)
}

fn config_from_flags(global: &GlobalOpts, profile_name: &str) -> Result<PollerConfig, CliError> {
    let require = |value: &Option<String>, field: &str| {
        value.clone().ok_or_else(|| CliError::MissingSetting {
            field: field.to_owned(),
        })
    };

    let api_id = require(&global.api_id, "api-id")?;
    let sn_bms = require(&global.sn_bms, "sn-bms")?;
    let sn_dongle = require(&global.sn_dongle, "sn-dongle")?;
    let api_secret = global
        .api_secret
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;

    let credentials = Credentials {
        api_id,
        api_secret: SecretString::from(api_secret),
    };
    Ok(PollerConfig::new(credentials, &sn_bms, &sn_dongle))
}
