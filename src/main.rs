use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use scopewise::commands::{self, Cli};
use scopewise::settings::Settings;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<ExitCode> {
    // logging goes to stderr; stdout carries command output
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::debug!(?settings, "Loaded configuration");

    let mut stdout = std::io::stdout().lock();
    let code = commands::run(cli, &settings, &mut stdout)?;
    Ok(ExitCode::from(code))
}
