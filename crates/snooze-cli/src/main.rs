//! `alert-snooze` binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use snooze_filter::{AlertFilter, FilterConfig};

use snooze_cli::cli::Cli;
use snooze_cli::commands::SnoozeCommand;
use snooze_cli::output::OutputFormat;
use snooze_cli::{CliError, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.log_format) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn filter_config(cli: &Cli) -> FilterConfig {
    let mut config = FilterConfig::default()
        .with_backend(cli.backend.into())
        .with_reaper_interval(Duration::from_secs(cli.reaper_interval_secs));
    if let Some(url) = &cli.redis_url {
        config = config.with_redis_url(url.clone());
    }
    config
}

async fn run(cli: Cli) -> Result<(), CliError> {
    cli.validate()?;
    let format = OutputFormat::new(cli.format);
    let filter = AlertFilter::from_config(&filter_config(&cli)).await?;

    let result = {
        let mut stdout = io::stdout().lock();
        SnoozeCommand::new(&filter)
            .execute(&mut stdout, &format, &cli.command)
            .await
    };

    filter.shutdown().await;
    result
}
