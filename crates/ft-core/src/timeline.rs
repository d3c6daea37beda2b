//! Projection of stored blocks onto a bounded display window.
//!
//! Stored blocks are converted to epoch-millisecond events, a display window
//! is chosen for the requested day, and each event is clipped to the window
//! with its position expressed as percentage offsets. Malformed timestamps
//! degrade per-row to raw passthrough rather than failing the projection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::timestamp::{epoch_millis, parse_timestamp};

/// Padding applied around the observed min/max interval in auto-fit mode.
pub const AUTO_FIT_PAD_MS: i64 = 5 * 60 * 1000;

const WORK_HOURS_START: (u32, u32, u32) = (8, 0, 0);
const WORK_HOURS_END: (u32, u32, u32) = (20, 0, 0);

/// An event boundary: epoch milliseconds when the stored timestamp parsed,
/// otherwise the raw stored text passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Millis(i64),
    Raw(String),
}

/// A stored block prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub start: EventTime,
    pub end: EventTime,
    pub title: String,
}

impl TimelineEvent {
    /// Builds an event from stored row text.
    ///
    /// Both timestamps must parse for the event to get numeric bounds; a
    /// malformed value on either side falls back to raw passthrough of both,
    /// keeping the pair interpretable together.
    #[must_use]
    pub fn from_row(start: &str, end: &str, title: &str) -> Self {
        match (parse_timestamp(start), parse_timestamp(end)) {
            (Some(s), Some(e)) => Self {
                start: EventTime::Millis(epoch_millis(s)),
                end: EventTime::Millis(epoch_millis(e)),
                title: title.to_string(),
            },
            _ => Self {
                start: EventTime::Raw(start.to_string()),
                end: EventTime::Raw(end.to_string()),
                title: title.to_string(),
            },
        }
    }

    /// Numeric bounds, when both sides parsed.
    #[must_use]
    pub fn bounds_ms(&self) -> Option<(i64, i64)> {
        match (&self.start, &self.end) {
            (EventTime::Millis(s), EventTime::Millis(e)) => Some((*s, *e)),
            _ => None,
        }
    }
}

/// Display window selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Auto-fit to the observed intervals padded by [`AUTO_FIT_PAD_MS`],
    /// clamped to the day; falls back to work hours (08:00-20:00) when no
    /// event has numeric bounds.
    Focus,
    /// The whole day, 00:00:00 through 23:59:59.
    FullDay,
}

/// A resolved display window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DisplayWindow {
    #[must_use]
    pub const fn span_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// A clipped, percentage-positioned display segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub top_pct: f64,
    pub height_pct: f64,
}

/// Resolves the display window for `day` under `mode`.
#[must_use]
pub fn display_window(day: NaiveDate, mode: WindowMode, events: &[TimelineEvent]) -> DisplayWindow {
    let day_start = day_millis(day, (0, 0, 0));
    let day_end = day_millis(day, (23, 59, 59));

    match mode {
        WindowMode::FullDay => DisplayWindow {
            start_ms: day_start,
            end_ms: day_end,
        },
        WindowMode::Focus => {
            let bounds: Vec<(i64, i64)> = events.iter().filter_map(TimelineEvent::bounds_ms).collect();
            let min_start = bounds.iter().map(|(s, _)| *s).min();
            let max_end = bounds.iter().map(|(_, e)| *e).max();
            match (min_start, max_end) {
                (Some(min_start), Some(max_end)) => DisplayWindow {
                    start_ms: day_start.max(min_start - AUTO_FIT_PAD_MS),
                    end_ms: day_end.min(max_end + AUTO_FIT_PAD_MS),
                },
                _ => DisplayWindow {
                    start_ms: day_millis(day, WORK_HOURS_START),
                    end_ms: day_millis(day, WORK_HOURS_END),
                },
            }
        }
    }
}

/// Clips events to `window` and computes percentage positions.
///
/// Events without numeric bounds and events fully outside the window produce
/// no segment. Input order is preserved.
#[must_use]
pub fn project(events: &[TimelineEvent], window: DisplayWindow) -> Vec<Segment> {
    let span = window.span_ms();
    if span <= 0 {
        return Vec::new();
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond spans are far below 2^52"
    )]
    let span_f = span as f64;

    let mut segments = Vec::new();
    for event in events {
        let Some((start, end)) = event.bounds_ms() else {
            continue;
        };
        if end <= window.start_ms || start >= window.end_ms {
            continue;
        }
        let clipped_start = start.max(window.start_ms);
        let clipped_end = end.min(window.end_ms);
        #[expect(
            clippy::cast_precision_loss,
            reason = "offsets are bounded by the window span"
        )]
        segments.push(Segment {
            title: event.title.clone(),
            start_ms: clipped_start,
            end_ms: clipped_end,
            top_pct: (clipped_start - window.start_ms) as f64 / span_f * 100.0,
            height_pct: (clipped_end - clipped_start) as f64 / span_f * 100.0,
        });
    }
    segments
}

fn day_millis(day: NaiveDate, (hour, minute, second): (u32, u32, u32)) -> i64 {
    // hour/minute/second come from in-range constants
    day.and_hms_opt(hour, minute, second)
        .map(epoch_millis)
        .unwrap_or_default()
}
