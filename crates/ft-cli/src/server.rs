//! HTTP surface: tab ingestion plus the read-side debugging endpoints.
//!
//! Runs alongside the tracker loop and shares the pending-observation map
//! and the database with it. Ingestion is gated on a tab-reporting browser
//! being frontmost; pings arriving outside that context are acknowledged
//! with a structured "ignored" result, not an error.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use ft_core::{
    PendingTabs, Segment, TabObservation, TimelineEvent, WindowMode, display_window,
    is_tab_browser, project,
};
use ft_db::Database;

use crate::sensors::ForegroundResolver;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub pending: Arc<Mutex<PendingTabs>>,
    pub foreground: Arc<dyn ForegroundResolver>,
    pub tab_browsers: Arc<Vec<String>>,
}

/// A tab ping from the browser extension.
#[derive(Debug, Deserialize)]
pub struct TabPing {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

/// Result of a tab ping.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TabReceipt {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl TabReceipt {
    const fn ok() -> Self {
        Self {
            status: "ok",
            reason: None,
        }
    }

    const fn ignored(reason: &'static str) -> Self {
        Self {
            status: "ignored",
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub day: Option<NaiveDate>,
    /// `0` shows the full day; anything else focuses/auto-fits.
    #[serde(default = "default_focus")]
    pub focus: u8,
}

#[derive(Debug, Deserialize)]
pub struct TrimQuery {
    pub day: Option<NaiveDate>,
    #[serde(default = "default_trim_substring")]
    pub substring: String,
}

const fn default_focus() -> u8 {
    1
}

fn default_trim_substring() -> String {
    "firefox".to_string()
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tab", post(receive_tab))
        .route("/health", get(health))
        .route("/events", get(day_events))
        .route("/positions", get(day_positions))
        .route("/admin/trim", post(trim_day))
        .with_state(state)
}

/// Binds and serves until ctrl-c.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http surface listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

/// `POST /tab` - upserts a pending observation when a tab-reporting browser
/// is frontmost.
pub async fn receive_tab(State(state): State<AppState>, Json(ping): Json<TabPing>) -> Json<TabReceipt> {
    let foreground = state.foreground.foreground_label().unwrap_or_default();
    if !is_tab_browser(&foreground, &state.tab_browsers) {
        tracing::debug!(url = %ping.url, foreground, "ignored tab ping");
        return Json(TabReceipt::ignored("browser_not_active"));
    }

    let observation = TabObservation {
        url: ping.url,
        title: ping.title,
        seen_at: Local::now().naive_local(),
    };
    state
        .pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .upsert(observation);
    Json(TabReceipt::ok())
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
pub struct DayEvents {
    pub day: NaiveDate,
    pub events: Vec<TimelineEvent>,
}

/// `GET /events?day=` - the day's blocks with epoch-ms bounds; malformed
/// rows pass their stored text through unchanged.
pub async fn day_events(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayEvents>, (StatusCode, String)> {
    let day = query.day.unwrap_or_else(today);
    let events = load_events(&state, day)?;
    tracing::debug!(%day, count = events.len(), "served day events");
    Ok(Json(DayEvents { day, events }))
}

#[derive(Debug, Serialize)]
pub struct DayPositions {
    pub day: NaiveDate,
    pub win_start_ms: i64,
    pub win_end_ms: i64,
    pub positions: Vec<Segment>,
}

/// `GET /positions?day=&focus=` - windowed, clipped display segments.
pub async fn day_positions(
    State(state): State<AppState>,
    Query(query): Query<PositionsQuery>,
) -> Result<Json<DayPositions>, (StatusCode, String)> {
    let day = query.day.unwrap_or_else(today);
    let mode = if query.focus == 0 {
        WindowMode::FullDay
    } else {
        WindowMode::Focus
    };
    let events = load_events(&state, day)?;
    let window = display_window(day, mode, &events);
    let positions = project(&events, window);
    Ok(Json(DayPositions {
        day,
        win_start_ms: window.start_ms,
        win_end_ms: window.end_ms,
        positions,
    }))
}

#[derive(Debug, Serialize)]
pub struct TrimResult {
    pub deleted: usize,
}

/// `POST /admin/trim?day=&substring=` - deletes the day's blocks before the
/// first label match.
pub async fn trim_day(
    State(state): State<AppState>,
    Query(query): Query<TrimQuery>,
) -> Result<Json<TrimResult>, (StatusCode, String)> {
    let day = query.day.unwrap_or_else(today);
    let deleted = state
        .db
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .delete_until_first_label_contains(day, &query.substring)
        .map_err(internal_error)?;
    Ok(Json(TrimResult { deleted }))
}

fn load_events(state: &AppState, day: NaiveDate) -> Result<Vec<TimelineEvent>, (StatusCode, String)> {
    let blocks = state
        .db
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .blocks_for_day(day)
        .map_err(internal_error)?;
    Ok(blocks
        .iter()
        .map(|block| TimelineEvent::from_row(&block.start, &block.end, &block.label))
        .collect())
}

fn internal_error(error: ft_db::DbError) -> (StatusCode, String) {
    tracing::error!(%error, "database error");
    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
