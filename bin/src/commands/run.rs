//! Run command implementation.
//!
//! Reads newline-delimited JSON ticks, feeds them to the engine, and shuts
//! down cleanly on end of input or Ctrl-C.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tickbar_lib::prelude::*;
use tickbar_lib::DEFAULT_LATE_THRESHOLD_MS;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::display::{SinkKind, print_report};

/// Arguments for `tickbar run`.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// NDJSON tick file (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Reject ticks this many ms after their window closed
    #[arg(long, env = "TICKBAR_LATE_THRESHOLD_MS", default_value_t = DEFAULT_LATE_THRESHOLD_MS)]
    late_threshold_ms: i64,

    /// Flush scheduler period in ms
    #[arg(long, env = "TICKBAR_FLUSH_INTERVAL_MS", default_value = "1000")]
    flush_interval_ms: u64,

    /// Maximum concurrent worker jobs
    #[arg(long, env = "TICKBAR_WORKERS", default_value = "4")]
    workers: usize,

    /// IANA timezone for local window labels and start alignment
    #[arg(long, env = "TICKBAR_TIMEZONE", default_value = "Asia/Kolkata")]
    timezone: String,

    /// Bar destination
    #[arg(long, value_enum, env = "TICKBAR_SINK", default_value = "ndjson")]
    sink: SinkKind,

    /// Output directory for the NDJSON sink
    #[arg(short, long, env = "TICKBAR_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Collection (file stem or remote collection name)
    #[arg(long, env = "TICKBAR_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Base URL of the HTTP document store
    #[arg(long, env = "TICKBAR_STORE_URL", default_value = "http://127.0.0.1:8080")]
    store_url: String,

    /// Print the shutdown summary as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig::default()
            .with_late_threshold_ms(self.late_threshold_ms)
            .with_flush_interval(Duration::from_millis(self.flush_interval_ms))
            .with_workers(self.workers)
            .with_timezone_name(&self.timezone)?)
    }

    fn build_sink(&self) -> Result<Arc<dyn BarSink>> {
        let sink: Arc<dyn BarSink> = match self.sink {
            SinkKind::Ndjson => {
                let dir = self.out_dir.clone().unwrap_or_else(NdjsonSink::default_dir);
                Arc::new(NdjsonSink::new(dir, &self.collection))
            }
            SinkKind::Http => Arc::new(HttpSink::new(HttpSinkConfig {
                base_url: self.store_url.clone(),
                collection: self.collection.clone(),
                ..HttpSinkConfig::default()
            })?),
        };
        Ok(sink)
    }

    async fn open_input(&self) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
        match &self.input {
            Some(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        }
    }
}

/// Run the engine over an NDJSON tick stream.
pub(crate) async fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let config = args.engine_config()?;
    let sink = args.build_sink()?;
    let input = args.open_input().await?;

    let (engine, ticks) = Engine::start(config, sink)
        .await
        .context("Failed to start engine")?;

    let mut lines = input.lines();
    let mut input_errors = 0u64;
    let mut line_no = 0u64;
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupt received");
                interrupted = true;
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read tick input")? else {
                    info!(lines = line_no, "End of tick input");
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Tick>(&line) {
                    Ok(tick) => {
                        ticks.submit(tick);
                    }
                    Err(e) => {
                        input_errors += 1;
                        warn!(line = line_no, error = %e, "Skipping unparseable tick");
                    }
                }
            }
        }
    }

    if !interrupted {
        wait_until_applied(&engine).await?;
    }
    drop(ticks);

    let report = engine.shutdown().await?;
    if !quiet {
        print_report(&report, input_errors, args.json)?;
    }
    Ok(())
}

/// Wait for the coordinator to work through every submitted tick.
///
/// Ctrl-C stops waiting; whatever is still queued is counted as dropped.
async fn wait_until_applied(engine: &Engine) -> Result<()> {
    let mut poll = tokio::time::interval(Duration::from_millis(10));
    loop {
        let stats = engine.stats();
        if stats.processed() >= stats.submitted {
            return Ok(());
        }
        tokio::select! {
            biased;
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupt received while draining queue");
                return Ok(());
            }
            _ = poll.tick() => {}
        }
    }
}
