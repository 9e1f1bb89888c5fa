//! kabuta: presents Delve to a GDB/MI-speaking IDE.
//!
//! stdin/stdout carry the GDB/MI protocol; all diagnostics go to the log file.

mod breakpoint;
mod dispatch;
mod error;
mod frontend;
mod handlers;
mod options;
mod parser;
mod request;
mod response;
mod scan;
mod session;

#[cfg(test)]
mod test_support;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use kabuta_core::{supervisor, Config};

use crate::dispatch::Dispatcher;
use crate::handlers::gdb::GDB_VERSION_BANNER;
use crate::scan::GoMainScanner;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args == ["--version"] {
        print!("{GDB_VERSION_BANNER}");
        return Ok(());
    }

    let config = Config::load().context("Cannot load configuration")?;
    init_logging(&config.log_file)?;
    tracing::info!("Starting kabuta with {:?}", config);

    let version = supervisor::check_version(&config.dlv_path)
        .await
        .with_context(|| format!("Cannot run dlv version at \"{}\"", config.dlv_path))?;
    tracing::info!("dlv version:\n{}", version.trim_end());

    let session = Session::new(&config);
    let dispatcher = Dispatcher::new(Box::new(GoMainScanner));
    let shutdown = frontend::run(session, dispatcher).await?;

    tracing::info!("Stopping: {:?}", shutdown);
    // The stdin reader may still be parked in a blocking read.
    std::process::exit(0);
}

fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Cannot open log file {}", log_file.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
