//! The polling tracker loop and its rollover state machine.
//!
//! Each tick the tracker computes the current window boundary, finalizes the
//! open bucket when the boundary has advanced, and records at most one signal
//! for the tick: pending tab observations when a tab-reporting browser is
//! frontmost, otherwise a single vote for the foreground window while the
//! user is active.
//!
//! Rollover is detected lazily at tick time. A bucket can run arbitrarily
//! past its nominal end if ticks are delayed; the persisted duration is
//! always the nominal window, not wall-clock drift. On process termination
//! the final open bucket is never flushed - at most one partial window is
//! lost.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use ft_core::{Bucket, PendingTabs, bucket_start, format_timestamp, is_tab_browser};
use ft_db::Database;

use crate::config::Config;
use crate::sensors::{ForegroundResolver, InputActivity};

/// The rollover state machine.
///
/// Owns the single live [`Bucket`]; there is no module-level current-bucket
/// state, so independent trackers can coexist (and tests drive ticks
/// directly).
pub struct Tracker {
    bucket: Option<Bucket>,
    db: Arc<Mutex<Database>>,
    pending: Arc<Mutex<PendingTabs>>,
    foreground: Arc<dyn ForegroundResolver>,
    input: Box<dyn InputActivity>,
    bucket_minutes: u32,
    idle_threshold: Duration,
    tab_browsers: Vec<String>,
}

impl Tracker {
    /// Creates a tracker with no open bucket.
    pub fn new(
        config: &Config,
        db: Arc<Mutex<Database>>,
        pending: Arc<Mutex<PendingTabs>>,
        foreground: Arc<dyn ForegroundResolver>,
        input: Box<dyn InputActivity>,
    ) -> Self {
        Self {
            bucket: None,
            db,
            pending,
            foreground,
            input,
            bucket_minutes: config.bucket_minutes,
            idle_threshold: Duration::from_secs(config.idle_threshold_seconds),
            tab_browsers: config.tab_browsers.clone(),
        }
    }

    /// Runs the loop forever at a fixed interval.
    ///
    /// There is no backpressure: slow persistence simply delays the next
    /// tick.
    pub async fn run(mut self, interval: Duration) {
        tracing::info!(
            interval_seconds = interval.as_secs(),
            bucket_minutes = self.bucket_minutes,
            "tracker loop started"
        );
        loop {
            self.tick(Local::now().naive_local());
            tokio::time::sleep(interval).await;
        }
    }

    /// Processes one tick at `now`.
    pub fn tick(&mut self, now: NaiveDateTime) {
        let window_start = bucket_start(now, self.bucket_minutes);
        if self
            .bucket
            .as_ref()
            .is_none_or(|bucket| bucket.start() != window_start)
        {
            self.rollover(window_start);
        }
        let Some(bucket) = self.bucket.as_mut() else {
            return;
        };

        let foreground = self
            .foreground
            .foreground_label()
            .unwrap_or_default();

        let observations = if is_tab_browser(&foreground, &self.tab_browsers) {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain()
        } else {
            Vec::new()
        };

        if observations.is_empty() {
            if self.input.active_within(self.idle_threshold) && !foreground.is_empty() {
                bucket.add(&foreground);
            }
            return;
        }

        let mut db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        for observation in &observations {
            if let Err(error) = db.insert_tab_block(
                &format_timestamp(observation.seen_at),
                &observation.title,
                &observation.url,
            ) {
                tracing::warn!(%error, url = %observation.url, "failed to persist tab block");
            }
            // The bucket votes on the bare title; the persisted block label
            // carries the URL suffix.
            bucket.add(&observation.title);
        }
    }

    /// Finalizes the open bucket (if any) and opens a fresh one.
    fn rollover(&mut self, window_start: NaiveDateTime) {
        if let Some(old) = self.bucket.take() {
            self.finalize(&old);
        }
        tracing::debug!(start = %format_timestamp(window_start), "opened bucket");
        self.bucket = Some(Bucket::new(window_start));
    }

    /// Persists the bucket's winner as a block spanning the nominal window.
    ///
    /// A bucket with no votes writes nothing.
    fn finalize(&self, bucket: &Bucket) {
        let Some(winner) = bucket.winner() else {
            return;
        };
        let start = bucket.start();
        let end = start + chrono::Duration::minutes(i64::from(self.bucket_minutes));
        let mut db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        match db.insert_block(&format_timestamp(start), &format_timestamp(end), winner) {
            Ok(()) => {
                tracing::debug!(winner, start = %format_timestamp(start), "finalized bucket");
            }
            Err(error) => {
                tracing::warn!(%error, winner, "failed to persist bucket winner");
            }
        }
    }
}
