mod cli;
mod commands;

use std::io::{self, Write};
use std::process::ExitCode;

use bridgeview_common::{BridgeviewError, ConfigError};
use bridgeview_config::BridgeviewConfig;
use tracing_subscriber::EnvFilter;

use cli::Command;

/// The config the subcommands run with. A broken config never stops the
/// tool; `check-config` reports it instead.
fn load_config(args: &cli::Args) -> (BridgeviewConfig, Option<ConfigError>) {
    let loaded = match &args.config {
        Some(path) => bridgeview_config::toml_loader::load_from_path(path),
        None => bridgeview_config::toml_loader::load_default(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (BridgeviewConfig::default(), Some(e)),
    }
}

fn log_directive(args: &cli::Args, config: &BridgeviewConfig) -> String {
    match args.log_level.as_deref() {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("bridgeview={level}"),
        None => format!("bridgeview={}", config.logging.level.as_filter()),
    }
}

fn run(args: &cli::Args, config: &BridgeviewConfig) -> Result<(), BridgeviewError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        Command::Classify { urls, whitelist } => commands::classify_urls(urls, whitelist, &mut out)?,
        Command::Inject {
            input,
            script,
            charset,
        } => commands::inject_file(
            input,
            script,
            charset.as_deref(),
            config.interception.head_search_window as usize,
            &mut out,
        )?,
        Command::Fetch {
            url,
            script,
            user_agent,
        } => commands::fetch_url(
            config,
            url,
            script.as_deref(),
            user_agent.as_deref(),
            &mut out,
        )?,
        Command::CheckConfig => commands::check_config(args.config.as_ref(), &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = cli::parse();
    let (config, config_error) = load_config(&args);

    let directive = log_directive(&args, &config);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "bridgeview=info".parse().expect("static directive")),
            ),
        )
        .init();

    tracing::debug!("bridgeview v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("bridgeview: {e}");
            ExitCode::FAILURE
        }
    }
}
