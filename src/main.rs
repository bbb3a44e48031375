//! Landfall -- an interactive move planner driven over a line protocol.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Logs go to stderr, filtered by `LANDFALL_LOG` (default `warn`).

use std::io::{self, BufRead, Write};

use tracing::error;
use tracing_subscriber::EnvFilter;

use landfall::engine::Engine;
use landfall::protocol::{parse_command, Command};

fn init_logging() {
    let filter = EnvFilter::try_from_env("LANDFALL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Dispatches one command. `Ok(false)` ends the session.
fn dispatch<W: Write>(engine: &mut Engine, cmd: Command, out: &mut W) -> io::Result<bool> {
    match cmd {
        Command::IsReady => engine.handle_isready(out)?,
        Command::Load { path } => engine.handle_load(&path, out)?,
        Command::SetPlayer { name } => engine.handle_setplayer(&name, out)?,
        Command::SetOption { name, value } => {
            engine.handle_setoption(&name, value.as_deref(), out)?
        }
        Command::Click(args) => engine.handle_click(&args, out)?,
        Command::Hover { territory } => engine.handle_hover(&territory, out)?,
        Command::Choose(answer) => engine.queue_choice(answer),
        Command::Cancel => engine.handle_cancel(out)?,
        Command::Status => engine.handle_status(out)?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Runs the main protocol loop, reading commands from stdin
/// and writing responses to stdout.
fn main() {
    init_logging();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match dispatch(&mut engine, cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!(error = %e, "cannot write response");
                break;
            }
        }
    }
}
