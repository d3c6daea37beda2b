//! Implementation of the `ft trim` command.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ft_db::Database;

/// Run the trim command: delete the day's blocks before the first label
/// containing `substring`.
pub fn run(db: &mut Database, day: NaiveDate, substring: &str) -> Result<()> {
    let deleted = db
        .delete_until_first_label_contains(day, substring)
        .with_context(|| format!("failed to trim blocks for {day}"))?;

    if deleted == 0 {
        println!("no block matching '{substring}' on {day}; nothing deleted");
    } else {
        println!("deleted {deleted} blocks before the first '{substring}' match on {day}");
    }
    Ok(())
}
