//! Display utilities and output formatting for the tickbar CLI.

use anyhow::Result;
use clap::ValueEnum;
use tickbar_lib::prelude::*;

/// Where finished bars are written.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum SinkKind {
    /// Append to `<out-dir>/<collection>.ndjson`
    Ndjson,
    /// POST to a document store over HTTP
    Http,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ndjson => write!(f, "ndjson"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Print the shutdown summary, either as a table or as JSON.
pub(crate) fn print_report(report: &ShutdownReport, input_errors: u64, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("{:<24} {:>12}", "Ticks submitted", stats.submitted);
    println!("{:<24} {:>12}", "Unparseable lines", input_errors);
    println!("{:<24} {:>12}", "Ticks accepted", stats.accepted);
    println!("{:<24} {:>12}", "Rejected (late)", stats.rejected_late);
    println!("{:<24} {:>12}", "Rejected (pre-start)", stats.rejected_before_start);
    println!("{:<24} {:>12}", "Malformed", stats.malformed);
    println!("{:<24} {:>12}", "Apply failures", stats.apply_failures);
    println!("{:<24} {:>12}", "Dropped at shutdown", report.dropped_ticks);
    println!("{}", "-".repeat(37));
    println!("{:<24} {:>12}", "Bars flushed", stats.bars_flushed);
    println!("{:<24} {:>12}", "Bars persisted", stats.bars_persisted);
    println!("{:<24} {:>12}", "Drained on shutdown", report.drained_bars);
    println!("{:<24} {:>12}", "Failed writes", stats.write_failures);
    println!("{:<24} {:>12}", "Failed flush cycles", stats.flush_failures);
    Ok(())
}
