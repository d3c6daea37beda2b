//! Implementation of the `ft report` command.
//!
//! Prints a day's activity blocks to stdout, human-readable by default or as
//! a JSON array with `--json`.

use std::io::{BufWriter, Write, stdout};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ft_db::Database;

/// Run the report command.
pub fn run(db: &Database, day: NaiveDate, json: bool) -> Result<()> {
    let blocks = db
        .blocks_for_day(day)
        .with_context(|| format!("failed to load blocks for {day}"))?;

    let stdout = stdout();
    let mut writer = BufWriter::new(stdout.lock());

    if json {
        serde_json::to_writer_pretty(&mut writer, &blocks).context("failed to serialize blocks")?;
        writeln!(writer)?;
        return Ok(());
    }

    if blocks.is_empty() {
        writeln!(writer, "no activity recorded for {day}")?;
        return Ok(());
    }

    writeln!(writer, "Activity for {day}")?;
    for block in &blocks {
        writeln!(writer, "{} - {}  {}", block.start, block.end, block.label)?;
    }
    Ok(())
}
