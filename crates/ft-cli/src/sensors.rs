//! Foreground-window and input-activity collaborators.
//!
//! Both capabilities are best-effort: the backing OS facilities may be
//! missing, fail, or return nothing, and callers treat every such case
//! uniformly as "no signal" - never as an error.

use std::process::Command;
use std::time::Duration;

/// Resolves the frontmost application/window to a human-readable label.
pub trait ForegroundResolver: Send + Sync {
    /// The current foreground label, or `None` when it cannot be determined.
    fn foreground_label(&self) -> Option<String>;
}

/// Probes for recent user input.
pub trait InputActivity: Send + Sync {
    /// True if an input event occurred within `threshold`.
    ///
    /// Failures report `false`: an unknown idle state suppresses the vote
    /// for this tick rather than fabricating activity.
    fn active_within(&self, threshold: Duration) -> bool;
}

/// OS-backed foreground resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemForeground;

impl ForegroundResolver for SystemForeground {
    fn foreground_label(&self) -> Option<String> {
        system_foreground_label()
    }
}

/// OS-backed input probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInput;

impl InputActivity for SystemInput {
    fn active_within(&self, threshold: Duration) -> bool {
        system_idle_time().is_some_and(|idle| idle < threshold)
    }
}

/// Runs a command and returns trimmed, non-empty stdout on success.
fn run_capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(target_os = "macos")]
fn system_foreground_label() -> Option<String> {
    let app = run_capture(
        "osascript",
        &[
            "-e",
            "tell application \"System Events\" to get name of first process whose frontmost is true",
        ],
    )?;
    let window = run_capture(
        "osascript",
        &[
            "-e",
            &format!("tell application \"{app}\" to get name of front window"),
        ],
    );
    match window {
        Some(window) => Some(format!("{app} - {window}")),
        None => Some(app),
    }
}

#[cfg(target_os = "linux")]
fn system_foreground_label() -> Option<String> {
    run_capture("xdotool", &["getactivewindow", "getwindowname"])
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn system_foreground_label() -> Option<String> {
    None
}

#[cfg(target_os = "macos")]
fn system_idle_time() -> Option<Duration> {
    // HIDIdleTime is reported in nanoseconds.
    let output = run_capture("ioreg", &["-c", "IOHIDSystem", "-d", "4"])?;
    let line = output.lines().find(|line| line.contains("HIDIdleTime"))?;
    let nanos: u64 = line.split('=').next_back()?.trim().parse().ok()?;
    Some(Duration::from_nanos(nanos))
}

#[cfg(target_os = "linux")]
fn system_idle_time() -> Option<Duration> {
    let millis: u64 = run_capture("xprintidle", &[])?.parse().ok()?;
    Some(Duration::from_millis(millis))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn system_idle_time() -> Option<Duration> {
    None
}
