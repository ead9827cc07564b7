//! pomodoro - Terminal interval timer
//!
//! Usage:
//!   pomodoro            Run work/break cycles until interrupted

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pomodoro::{
    Alerter, CancelToken, Config, LinePrompt, Sequencer, StatusRenderer, Stopped, SystemClock,
    Timer,
};

/// Pomodoro - work/break interval timer for the terminal
#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Terminal pomodoro timer with a live countdown and progress bar")]
#[command(version)]
#[command(after_help = r#"CYCLE:
    WORK 25 min -> SHORT BREAK 5 min -> press enter -> WORK ...
    Every 4th break is a LONG BREAK of 15 min, followed directly by WORK.

ENVIRONMENT:
    POMODORO_BELL   off | tone | ascii | auto (default: tone on Windows, ascii elsewhere)
    NO_COLOR        Disable colored output
    RUST_LOG        Diagnostics on stderr, e.g. RUST_LOG=pomodoro=debug

Press Ctrl-C to stop.
"#)]
struct Cli {}

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is the countdown display)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let _cli = Cli::parse();

    let config = Config::from_env();
    debug!(
        config = %serde_json::to_string(&config).context("Failed to serialize config")?,
        "Effective configuration"
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_armed() {
            handler_token.cancel();
        } else {
            // Nothing is polling the token, e.g. while blocked on the prompt
            println!("\nInterrupted by user.");
            std::process::exit(0);
        }
    })
    .context("Failed to install Ctrl-C handler")?;

    let renderer = StatusRenderer::new(config.color, config.bar_width);
    let alerter = Alerter::select(config.bell);
    let mut timer = Timer::new(SystemClock::new(), io::stdout(), renderer, alerter, cancel);
    let mut prompt = LinePrompt::new(io::stdin().lock(), io::stdout(), config.color);

    let mut sequencer = Sequencer::new(config);
    match sequencer
        .run(&mut timer, &mut prompt)
        .context("Timer stopped unexpectedly")?
    {
        Stopped::Interrupted => {
            info!(completed = sequencer.completed(), "Stopped by user");
        }
    }

    Ok(())
}
