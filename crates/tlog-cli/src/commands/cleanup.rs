//! Cleanup command - enforce the retention window.

use anyhow::{Context, Result};
use tlog_store::LogDir;
use tlog_types::LogDate;

pub fn cmd_cleanup(dir: &LogDir, keep: u16, today: LogDate, quiet: bool) -> Result<()> {
    if keep == 0 {
        if !quiet {
            println!("Retention disabled (--keep 0), nothing removed.");
        }
        return Ok(());
    }

    let removed = dir
        .cleanup(today, keep)
        .with_context(|| format!("Failed to clean up {}", dir.root().display()))?;

    if !quiet {
        if removed.is_empty() {
            println!("Nothing older than {} day(s) before {}.", keep, today);
        }
        for date in &removed {
            println!("Removed {}", date.filename());
        }
    }
    Ok(())
}
