//! Align command implementation.

use anyhow::Result;
use tickbar_lib::prelude::*;
use tickbar_lib::align_service_start;

/// Print the current time and the aligned service start.
pub(crate) fn show_alignment(timezone: &str) -> Result<()> {
    let tz = EngineConfig::default().with_timezone_name(timezone)?.timezone;
    let now = chrono::Utc::now();
    let start = align_service_start(now, tz)?;

    println!("Timezone:      {tz}");
    println!("Local now:     {}", now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S%.3f"));
    println!("Service start: {}", start.local.format("%Y-%m-%d %H:%M:%S %Z"));
    println!("Start (ms):    {}", start.utc_ms);
    println!(
        "Wait:          {:.3}s",
        (start.utc_ms - now.timestamp_millis()) as f64 / 1000.0
    );
    Ok(())
}
