use anyhow::{Context, Result};
use clap::Parser;
use multitray::config::{self, Config};
use multitray::{pipe, tray};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "multitray", version, about = "Manage system tray icons through a named pipe")]
struct Cli {
    /// Verbosity. May be specified multiple times (-vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to put the named pipe in
    #[arg(short = 'p', long = "pipepath", value_name = "PIPEPATH")]
    pipepath: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = config::log_level(cli.verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();

    restore_default_sigint();

    let config = Config::default().with_pipe_path(cli.pipepath);
    if let Err(e) = run(config).await {
        log::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    log::info!("Starting multitray...");

    pipe::create_fifo(&config.pipe_path)?;
    let (sender, lines) = pipe::channel();

    let reader = tokio::spawn(pipe::read_lines(
        config.pipe_path.clone(),
        config.poll_interval,
        sender,
    ));
    let ui = tray::platform::spawn_ui(config, lines)?;

    log::info!("multitray started");

    tokio::select! {
        result = reader => match result {
            Ok(Ok(())) => anyhow::bail!("Pipe reader stopped"),
            Ok(Err(e)) => Err(e.context("Pipe reader failed")),
            Err(e) => Err(e).context("Pipe reader task panicked"),
        },
        result = ui => match result {
            Ok(result) => result.context("Tray event loop stopped"),
            Err(_) => anyhow::bail!("Tray event loop thread exited unexpectedly"),
        },
    }
}

/// Ctrl-C kills the process outright instead of being swallowed by the
/// UI event loop.
fn restore_default_sigint() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}
