//! Fixed-window vote accumulation.
//!
//! A [`Bucket`] tallies label occurrences over one wall-clock window and
//! elects a single winning label when the window rolls over. Windows are
//! anchored to the top of the hour via [`bucket_start`], never to process
//! start time.

use chrono::{NaiveDateTime, Timelike};

/// Accumulator over one fixed wall-clock window.
///
/// Counts are kept in first-seen order so that [`Bucket::winner`] breaks ties
/// deterministically: among labels sharing the maximum count, the one added
/// first wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    start: NaiveDateTime,
    counts: Vec<(String, u32)>,
}

impl Bucket {
    /// Creates an empty bucket for the window beginning at `start`.
    #[must_use]
    pub const fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            counts: Vec::new(),
        }
    }

    /// The window lower bound (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Records one occurrence of `label`. Empty labels are never counted.
    pub fn add(&mut self, label: &str) {
        if label.is_empty() {
            return;
        }
        if let Some((_, count)) = self.counts.iter_mut().find(|(l, _)| l == label) {
            *count += 1;
        } else {
            self.counts.push((label.to_string(), 1));
        }
    }

    /// Returns the label with the maximum count, or `None` if no votes were
    /// cast.
    ///
    /// Ties are broken by insertion order: the strictly-greater comparison
    /// keeps the first-seen label when counts are equal.
    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for (label, count) in &self.counts {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((label, *count)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// True when no votes have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Returns the start of the window containing `now`.
///
/// The minute is floored to the largest multiple of `window_minutes` not
/// exceeding it; seconds and sub-seconds are zeroed. With a 5-minute window,
/// boundaries are always `:00, :05, :10, ...` within the hour.
#[must_use]
pub fn bucket_start(now: NaiveDateTime, window_minutes: u32) -> NaiveDateTime {
    let window = window_minutes.max(1);
    let minute = now.minute() / window * window;
    // minute < 60 by construction, so reconstruction cannot fail
    now.date()
        .and_hms_opt(now.hour(), minute, 0)
        .unwrap_or(now)
}
