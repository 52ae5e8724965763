//! Gatherly CLI - browse events and places, manage saved items,
//! recommendation preferences and profile history from the terminal.

mod commands;
mod config;
mod render;

use std::io;
use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gatherly_core::{Gatherly, Notice, Notifier, Session};

use commands::Command;
use config::Config;

/// Capacity of the notification channel drained after each command
const NOTICE_CHANNEL_SIZE: usize = 32;

/// Log file name in the data directory
const LOG_FILE: &str = "gatherly.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by RUST_LOG (default "warn"). With
/// `log_file` enabled they are also written to the data directory; the
/// returned guard flushes that writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn print_notices(rx: &mut mpsc::Receiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        eprintln!("{}", render::notice(&notice));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load()?;
    let data_dir = config.data_dir()?;
    if config.log_file {
        std::fs::create_dir_all(&data_dir)?;
    }
    let _log_guard = init_tracing(config.log_file.then_some(data_dir.as_path()));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    debug!(?command, "Parsed command");

    let (notifier, mut notices) = Notifier::channel(NOTICE_CHANNEL_SIZE);
    let app = Gatherly::new(config.client_options(), notifier)?;

    let mut session = Session::new(data_dir);
    if session.load()? {
        if let Some(data) = session.data.clone() {
            info!(user_id = data.user_id, "Restored session");
            app.sign_in(data);
        }
    }

    let default_user = app.session().user_id().or(config.last_user_id);
    let result = commands::run(&app, &mut session, command, default_user).await;
    print_notices(&mut notices);

    let output = result?;
    println!("{}", output);

    let current_user = app.session().user_id();
    if current_user != config.last_user_id {
        config.last_user_id = current_user;
        config.save()?;
    }
    Ok(())
}
