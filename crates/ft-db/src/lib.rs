//! Storage layer for the focus tracker.
//!
//! Persists activity blocks using `rusqlite`, coalescing adjacent same-label
//! intervals at write time.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization - use a
//! `Mutex<Database>` (the tracker and the HTTP surface share one).
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in naive local ISO 8601 format
//! (e.g. `2025-03-14T09:26:53.589793`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - A day-prefix match on `start` selects a calendar day
//!
//! # Merge invariant
//!
//! Within the stored sequence, no two adjacent rows share a label with a gap
//! of at most the configured merge gap - [`Database::insert_block`] prevents
//! this by extending the tail row instead of appending. Merging only ever
//! inspects the single most-recently-inserted row (by rowid), so callers must
//! insert in non-decreasing `start` order; an out-of-order insert will never
//! coalesce with an older row buried deeper in the sequence.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use thiserror::Error;

use ft_core::{format_timestamp, parse_timestamp};

/// Merge gap applied when none is configured.
pub const DEFAULT_MERGE_GAP_SECONDS: i64 = 5;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The configured merge gap is invalid.
    #[error("invalid merge gap seconds: {0}")]
    InvalidMergeGap(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety and merge
/// semantics.
pub struct Database {
    conn: Connection,
    merge_gap: Duration,
}

/// A persisted activity block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub id: i64,
    pub start: String,
    pub end: String,
    pub label: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path, merge_gap_seconds: i64) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, merge_gap_seconds)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory(merge_gap_seconds: i64) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, merge_gap_seconds)
    }

    fn with_connection(conn: Connection, merge_gap_seconds: i64) -> Result<Self, DbError> {
        if merge_gap_seconds < 0 {
            return Err(DbError::InvalidMergeGap(merge_gap_seconds));
        }
        let db = Self {
            conn,
            merge_gap: Duration::seconds(merge_gap_seconds),
        };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Blocks table: merged activity intervals
            -- start/end: naive local ISO 8601 text
            -- label: activity label; tab blocks embed the URL as a suffix
            CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY,
                start TEXT NOT NULL,
                end TEXT NOT NULL,
                label TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_blocks_start ON blocks(start);
            ",
        )?;
        Ok(())
    }

    /// Inserts a block, or merges it into the most recent block when the
    /// labels match and the intervals touch, overlap, or are within the
    /// merge gap.
    ///
    /// The merge path extends the tail row's `end` to the max of the two
    /// ends; it never shrinks an interval. Timestamps that fail to parse
    /// disable merging for this write and the raw strings are appended as
    /// given.
    pub fn insert_block(&mut self, start: &str, end: &str, label: &str) -> Result<(), DbError> {
        let start_parsed = parse_timestamp(start);
        let end_parsed = parse_timestamp(end);

        // Read-last / compare / update-or-insert is one critical section;
        // two writers must not both observe the same tail row.
        let tx = self.conn.transaction()?;

        if let (Some(start_dt), Some(end_dt)) = (start_parsed, end_parsed) {
            let last: Option<(i64, String, String)> = tx
                .query_row(
                    "SELECT id, end, label FROM blocks ORDER BY id DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            if let Some((last_id, last_end, last_label)) = last {
                if last_label == label {
                    if let Some(last_end_dt) = parse_timestamp(&last_end) {
                        // Negative when the new interval overlaps the tail.
                        let gap = start_dt.signed_duration_since(last_end_dt);
                        if gap <= self.merge_gap {
                            let new_end = last_end_dt.max(end_dt);
                            tx.execute(
                                "UPDATE blocks SET end = ? WHERE id = ?",
                                params![format_timestamp(new_end), last_id],
                            )?;
                            tx.commit()?;
                            tracing::debug!(
                                id = last_id,
                                label,
                                new_end = %format_timestamp(new_end),
                                gap_seconds = gap.num_seconds(),
                                "merged into tail block"
                            );
                            return Ok(());
                        }
                    }
                }
            }
        }

        tx.execute(
            "INSERT INTO blocks (start, end, label) VALUES (?, ?, ?)",
            params![start, end, label],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!(id, label, start, end, "inserted block");
        Ok(())
    }

    /// Records a tab sighting as a zero-duration block labeled
    /// `"{title} - {url}"`.
    ///
    /// Repeated sightings of the same tab coalesce through the regular
    /// tail-merge rule.
    pub fn insert_tab_block(&mut self, timestamp: &str, title: &str, url: &str) -> Result<(), DbError> {
        let label = format!("{title} - {url}");
        self.insert_block(timestamp, timestamp, &label)
    }

    /// Returns all blocks whose `start` falls on the given calendar day,
    /// ordered ascending by `start`.
    pub fn blocks_for_day(&self, day: NaiveDate) -> Result<Vec<BlockRecord>, DbError> {
        let prefix = format!("{}%", day.format("%Y-%m-%d"));
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start, end, label
            FROM blocks
            WHERE start LIKE ?
            ORDER BY start ASC
            ",
        )?;
        let rows = stmt.query_map([prefix], |row| {
            Ok(BlockRecord {
                id: row.get(0)?,
                start: row.get(1)?,
                end: row.get(2)?,
                label: row.get(3)?,
            })
        })?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?);
        }
        Ok(blocks)
    }

    /// Deletes all of the day's blocks strictly before the first block whose
    /// label contains `substring` (case-insensitive).
    ///
    /// Returns the number of deleted rows; `0` and no deletion when no block
    /// matches.
    pub fn delete_until_first_label_contains(
        &mut self,
        day: NaiveDate,
        substring: &str,
    ) -> Result<usize, DbError> {
        let blocks = self.blocks_for_day(day)?;
        let needle = substring.to_lowercase();
        let Some(cutoff) = blocks
            .iter()
            .find(|block| block.label.to_lowercase().contains(&needle))
            .map(|block| block.start.clone())
        else {
            return Ok(0);
        };

        let prefix = format!("{}%", day.format("%Y-%m-%d"));
        let deleted = self.conn.execute(
            "DELETE FROM blocks WHERE start LIKE ? AND start < ?",
            params![prefix, cutoff],
        )?;
        tracing::info!(deleted, substring, day = %day, "trimmed blocks before first match");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Database {
        Database::open_in_memory(DEFAULT_MERGE_GAP_SECONDS).expect("open in-memory db")
    }

    fn all_rows(db: &Database) -> Vec<BlockRecord> {
        let mut stmt = db
            .conn
            .prepare("SELECT id, start, end, label FROM blocks ORDER BY id ASC")
            .expect("prepare");
        let rows = stmt
            .query_map([], |row| {
                Ok(BlockRecord {
                    id: row.get(0)?,
                    start: row.get(1)?,
                    end: row.get(2)?,
                    label: row.get(3)?,
                })
            })
            .expect("query");
        rows.map(|row| row.expect("row")).collect()
    }

    #[test]
    fn schema_matches_data_model() {
        let db = open();
        let mut stmt = db
            .conn
            .prepare("PRAGMA table_info(blocks)")
            .expect("prepare table_info");
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info")
            .map(|row| row.expect("table_info row"))
            .collect();
        assert_eq!(columns, vec!["id", "start", "end", "label"]);
    }

    #[test]
    fn negative_merge_gap_is_rejected() {
        assert!(matches!(
            Database::open_in_memory(-1),
            Err(DbError::InvalidMergeGap(-1))
        ));
    }

    #[test]
    fn open_on_disk_initializes_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ft.db");
        let mut db = Database::open(&path, DEFAULT_MERGE_GAP_SECONDS).expect("open db");
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:05:00", "Editor")
            .expect("insert");
        drop(db);

        let db = Database::open(&path, DEFAULT_MERGE_GAP_SECONDS).expect("reopen db");
        assert_eq!(all_rows(&db).len(), 1);
    }

    #[test]
    fn adjacent_same_label_blocks_merge() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:10", "2025-03-14T09:00:20", "Editor")
            .expect("insert");

        let rows = all_rows(&db);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].start, "2025-03-14T09:00:00");
        assert_eq!(rows[0].end, "2025-03-14T09:00:20");
    }

    #[test]
    fn gap_at_exact_threshold_merges() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        // start == previous end + merge gap
        db.insert_block("2025-03-14T09:00:15", "2025-03-14T09:00:25", "Editor")
            .expect("insert");
        assert_eq!(all_rows(&db).len(), 1);
    }

    #[test]
    fn gap_beyond_threshold_does_not_merge() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:16", "2025-03-14T09:00:26", "Editor")
            .expect("insert");
        assert_eq!(all_rows(&db).len(), 2);
    }

    #[test]
    fn different_labels_do_not_merge() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:10", "2025-03-14T09:00:20", "Browser")
            .expect("insert");
        assert_eq!(all_rows(&db).len(), 2);
    }

    #[test]
    fn merge_extends_but_never_shrinks() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:20", "Editor")
            .expect("insert");
        // Overlapping interval contained in the tail: gap is negative
        db.insert_block("2025-03-14T09:00:05", "2025-03-14T09:00:10", "Editor")
            .expect("insert");

        let rows = all_rows(&db);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].end, "2025-03-14T09:00:20");
    }

    #[test]
    fn intervening_label_prevents_coalescing() {
        let mut db = open();
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:10", "2025-03-14T09:00:20", "Browser")
            .expect("insert");
        // Same label as the first row, adjacent in time, but the tail row
        // differs: no retroactive merge.
        db.insert_block("2025-03-14T09:00:20", "2025-03-14T09:00:30", "Editor")
            .expect("insert");
        assert_eq!(all_rows(&db).len(), 3);
    }

    #[test]
    fn unparsable_timestamps_degrade_to_plain_append() {
        let mut db = open();
        db.insert_block("not-a-time", "also-not", "Editor")
            .expect("insert");
        db.insert_block("not-a-time", "also-not", "Editor")
            .expect("insert");

        let rows = all_rows(&db);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, "not-a-time");
    }

    #[test]
    fn unparsable_tail_end_disables_merge() {
        let mut db = open();
        db.insert_block("broken", "broken", "Editor").expect("insert");
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:00:10", "Editor")
            .expect("insert");
        assert_eq!(all_rows(&db).len(), 2);
    }

    #[test]
    fn tab_block_is_zero_duration_with_composite_label() {
        let mut db = open();
        db.insert_tab_block("2025-03-14T09:00:00", "Rust docs", "https://doc.rust-lang.org")
            .expect("insert");

        let rows = all_rows(&db);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "Rust docs - https://doc.rust-lang.org");
        assert_eq!(rows[0].start, rows[0].end);
    }

    #[test]
    fn repeated_tab_pings_coalesce_into_one_block() {
        let mut db = open();
        db.insert_tab_block("2025-03-14T09:00:00", "Rust docs", "https://doc.rust-lang.org")
            .expect("insert");
        db.insert_tab_block("2025-03-14T09:00:03", "Rust docs", "https://doc.rust-lang.org")
            .expect("insert");

        let rows = all_rows(&db);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].start, "2025-03-14T09:00:00");
        assert_eq!(rows[0].end, "2025-03-14T09:00:03");
    }

    #[test]
    fn blocks_for_day_filters_and_orders() {
        let mut db = open();
        db.insert_block("2025-03-15T08:00:00", "2025-03-15T08:05:00", "Other day")
            .expect("insert");
        db.insert_block("2025-03-14T10:00:00", "2025-03-14T10:05:00", "Later")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:05:00", "Earlier")
            .expect("insert");

        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let blocks = db.blocks_for_day(day).expect("query");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label, "Earlier");
        assert_eq!(blocks[1].label, "Later");
    }

    #[test]
    fn trim_deletes_rows_strictly_before_first_match() {
        let mut db = open();
        db.insert_block("2025-03-14T08:00:00", "2025-03-14T08:05:00", "Breakfast")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:05:00", "Mozilla Firefox")
            .expect("insert");
        db.insert_block("2025-03-14T10:00:00", "2025-03-14T10:05:00", "Editor")
            .expect("insert");

        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let deleted = db
            .delete_until_first_label_contains(day, "FIREFOX")
            .expect("trim");
        assert_eq!(deleted, 1);

        let blocks = db.blocks_for_day(day).expect("query");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label, "Mozilla Firefox");
    }

    #[test]
    fn trim_without_match_is_a_no_op() {
        let mut db = open();
        db.insert_block("2025-03-14T08:00:00", "2025-03-14T08:05:00", "Editor")
            .expect("insert");

        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let deleted = db
            .delete_until_first_label_contains(day, "firefox")
            .expect("trim");
        assert_eq!(deleted, 0);
        assert_eq!(db.blocks_for_day(day).expect("query").len(), 1);
    }

    #[test]
    fn trim_leaves_other_days_untouched() {
        let mut db = open();
        db.insert_block("2025-03-13T08:00:00", "2025-03-13T08:05:00", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T08:00:00", "2025-03-14T08:05:00", "Editor")
            .expect("insert");
        db.insert_block("2025-03-14T09:00:00", "2025-03-14T09:05:00", "firefox")
            .expect("insert");

        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let deleted = db
            .delete_until_first_label_contains(day, "firefox")
            .expect("trim");
        assert_eq!(deleted, 1);

        let prev = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();
        assert_eq!(db.blocks_for_day(prev).expect("query").len(), 1);
    }
}
