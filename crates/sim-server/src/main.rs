mod config;
mod wiring;

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use runtime::live_runner::wall_clock_ms;
use runtime::logging::TracingRunLogWriter;
use runtime::replay::JournalCsvWriter;
use runtime::{spawn_session, DriverOptions, Session, SessionClock};
use tokio::net::TcpListener;
use tracing::{info, warn};

type Journal = JournalCsvWriter<Box<dyn Write + Send>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = config::Config::from_env()?;
    let now = wall_clock_ms();
    let mut journal = initialize_journal_output(&config.journal_output_path, now)?;

    let seed = config
        .seed
        .unwrap_or_else(|| u64::try_from(now).unwrap_or_default());
    let (session, started) = Session::start(config.session_config(), &config.asset, now, seed)?;
    journal.append_events(&[started])?;

    let options = DriverOptions {
        clock: SessionClock::starting_at(now),
        journal: Some(journal),
        run_log: Box::new(TracingRunLogWriter),
    };
    let (handle, driver) = spawn_session(session, options);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(
        addr = %config.listen_addr,
        asset = %config.asset,
        seed,
        journal = %config.journal_output_path,
        "sim server listening"
    );
    axum::serve(listener, wiring::build_app(handle.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    handle.stop().await?;
    driver.await?;
    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn initialize_journal_output(path: &str, now_ms: i64) -> Result<Journal, std::io::Error> {
    let journal_path = Path::new(path);

    if let Some(parent) = journal_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }

    let journal_file: Box<dyn Write + Send> = Box::new(BufWriter::new(File::create(journal_path)?));
    let mut journal = JournalCsvWriter::new(journal_file);
    journal.write_header_and_log(now_ms, &mut TracingRunLogWriter)?;
    Ok(journal)
}
