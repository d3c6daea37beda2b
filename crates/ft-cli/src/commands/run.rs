//! Implementation of the `ft run` command.
//!
//! Starts the tracker loop as a background task and serves the HTTP surface
//! on the configured address until interrupted. Both sides share the pending
//! tab observations and the database behind mutexes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use ft_core::PendingTabs;
use ft_db::Database;

use crate::config::Config;
use crate::sensors::{ForegroundResolver, SystemForeground, SystemInput};
use crate::server::{self, AppState};
use crate::tracker::Tracker;

/// Run the tracker service.
pub async fn run(config: Config, db: Database) -> Result<()> {
    let db = Arc::new(Mutex::new(db));
    let pending = Arc::new(Mutex::new(PendingTabs::new()));
    let foreground: Arc<dyn ForegroundResolver> = Arc::new(SystemForeground);

    let tracker = Tracker::new(
        &config,
        Arc::clone(&db),
        Arc::clone(&pending),
        Arc::clone(&foreground),
        Box::new(SystemInput),
    );
    let tracker_task = tokio::spawn(tracker.run(Duration::from_secs(config.track_interval_seconds)));

    let state = AppState {
        db,
        pending,
        foreground,
        tab_browsers: Arc::new(config.tab_browsers.clone()),
    };
    let served = server::serve(state, config.listen_addr).await;

    // The loop holds no state worth flushing: at most one partial window is
    // lost on shutdown.
    tracker_task.abort();
    served
}
