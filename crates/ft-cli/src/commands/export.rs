//! Implementation of the `ft export` command.
//!
//! Writes a day's blocks as `start,end,title` CSV rows or as an iCalendar
//! file with one event per block.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ft_core::parse_timestamp;
use ft_db::{BlockRecord, Database};

use crate::cli::ExportFormat;

/// Run the export command. Returns the path written.
pub fn run(
    db: &Database,
    day: NaiveDate,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let blocks = db
        .blocks_for_day(day)
        .with_context(|| format!("failed to load blocks for {day}"))?;

    let path = output.unwrap_or_else(|| default_output(day, format));
    let file = File::create(&path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(&mut writer, &blocks)?,
        ExportFormat::Ical => write_ical(&mut writer, day, &blocks)?,
    }
    writer.flush().context("failed to flush export file")?;

    tracing::info!(path = %path.display(), count = blocks.len(), "exported blocks");
    Ok(path)
}

fn default_output(day: NaiveDate, format: ExportFormat) -> PathBuf {
    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Ical => "ics",
    };
    PathBuf::from(format!("activity-{day}.{extension}"))
}

fn write_csv(writer: &mut impl Write, blocks: &[BlockRecord]) -> Result<()> {
    writeln!(writer, "start,end,title")?;
    for block in blocks {
        writeln!(
            writer,
            "{},{},{}",
            block.start,
            block.end,
            csv_field(&block.label)
        )?;
    }
    Ok(())
}

/// Quotes a CSV field when it contains separators or quotes.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_ical(writer: &mut impl Write, day: NaiveDate, blocks: &[BlockRecord]) -> Result<()> {
    writeln!(writer, "BEGIN:VCALENDAR")?;
    writeln!(writer, "VERSION:2.0")?;
    writeln!(writer, "PRODID:-//ft//activity//EN")?;
    for (index, block) in blocks.iter().enumerate() {
        // Rows with malformed timestamps cannot become calendar events;
        // skip them rather than failing the whole export.
        let (Some(start), Some(end)) = (parse_timestamp(&block.start), parse_timestamp(&block.end))
        else {
            tracing::warn!(start = %block.start, label = %block.label, "skipping malformed block in export");
            continue;
        };
        writeln!(writer, "BEGIN:VEVENT")?;
        writeln!(writer, "UID:ft-{day}-{index}")?;
        writeln!(writer, "DTSTART:{}", start.format("%Y%m%dT%H%M%S"))?;
        writeln!(writer, "DTEND:{}", end.format("%Y%m%dT%H%M%S"))?;
        writeln!(writer, "SUMMARY:{}", ical_text(&block.label))?;
        writeln!(writer, "END:VEVENT")?;
    }
    writeln!(writer, "END:VCALENDAR")?;
    Ok(())
}

/// Escapes text per RFC 5545 (backslash, separators, newlines).
fn ical_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> Database {
        let mut db = Database::open_in_memory(5).unwrap();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:05:00", "Editor")
            .unwrap();
        db.insert_block(
            "2025-03-14T09:10:00",
            "2025-03-14T09:15:00",
            "Docs, part 2 - https://example.test",
        )
        .unwrap();
        db
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let db = sample_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let written = run(&db, day(), ExportFormat::Csv, Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("start,end,title"));
        assert_eq!(
            lines.next(),
            Some("2025-03-14T09:00:00,2025-03-14T09:05:00,Editor")
        );
        // The comma-bearing label is quoted.
        assert!(lines.next().unwrap().contains("\"Docs, part 2"));
    }

    #[test]
    fn ical_export_wraps_events_in_a_calendar() {
        let db = sample_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ics");

        run(&db, day(), ExportFormat::Ical, Some(path.clone())).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("BEGIN:VCALENDAR"));
        assert!(content.trim_end().ends_with("END:VCALENDAR"));
        assert_eq!(content.matches("BEGIN:VEVENT").count(), 2);
        assert!(content.contains("DTSTART:20250314T090000"));
        assert!(content.contains("SUMMARY:Docs\\, part 2 - https://example.test"));
    }

    #[test]
    fn ical_export_skips_malformed_rows() {
        let mut db = sample_db();
        db.insert_block("2025-03-14Tbroken", "2025-03-14Tbroken", "Odd")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ics");

        run(&db, day(), ExportFormat::Ical, Some(path.clone())).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("BEGIN:VEVENT").count(), 2);
    }

    #[test]
    fn default_output_names_carry_the_day() {
        assert_eq!(
            default_output(day(), ExportFormat::Csv),
            PathBuf::from("activity-2025-03-14.csv")
        );
        assert_eq!(
            default_output(day(), ExportFormat::Ical),
            PathBuf::from("activity-2025-03-14.ics")
        );
    }
}
