//! Core domain logic for the focus tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Bucketing: aggregating focus samples into fixed time windows
//! - Tab observations: deduplicated browser-tab sightings pending consumption
//! - Timeline windowing: projecting stored blocks onto a display window

pub mod bucket;
pub mod observation;
pub mod timeline;
pub mod timestamp;

pub use bucket::{Bucket, bucket_start};
pub use observation::{PendingTabs, TabObservation, is_tab_browser};
pub use timeline::{
    DisplayWindow, EventTime, Segment, TimelineEvent, WindowMode, display_window, project,
};
pub use timestamp::{epoch_millis, format_timestamp, parse_timestamp};
