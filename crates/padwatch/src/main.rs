mod cli;
mod commands;
mod config;
mod error;
mod lock;
mod output;
mod status;

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_tracing(&cli.global);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Log file directory: `--log-dir`, else the active profile's `log_dir`.
fn log_dir(global: &GlobalOpts) -> Option<PathBuf> {
    if let Some(ref dir) = global.log_dir {
        return Some(dir.clone());
    }
    let cfg = config::load(global).ok()?;
    let (_, profile) = cfg.profile(global.profile.as_deref()).ok()?;
    profile.log_dir.clone()
}

fn init_tracing(global: &GlobalOpts) -> Option<WorkerGuard> {
    let level = match global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        );

    let (file_layer, guard) = match log_dir(global) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "padwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                // Files keep at least info so unattended runs leave a trail.
                .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    EnvFilter::new(if global.verbose == 0 { "info" } else { level })
                }));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    tracing::debug!(command = ?cli.command, "dispatching command");

    match cli.command {
        Command::Check(args) => commands::check::handle(args, global).await,
        Command::State(args) => commands::state::handle(args, global),
        Command::Serials(args) => commands::serials::handle(args, global),
        Command::Config(args) => commands::config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "padwatch", &mut std::io::stdout());
            Ok(())
        }
    }
}
