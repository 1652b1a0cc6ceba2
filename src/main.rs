//! cfg-flesh CLI entry point.

use clap::Parser;
use std::process;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

use cfg_flesher::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(
        format!("cfg_flesher={log_level}")
            .parse()
            .unwrap_or_else(|_| Level::WARN.into()),
    );

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run() {
        error!("campaign failed: {e}");

        let mut cause = std::error::Error::source(&e);
        while let Some(err) = cause {
            error!("  caused by: {err}");
            cause = err.source();
        }

        process::exit(1);
    }
}
