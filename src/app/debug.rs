use std::fmt::Write as _;

use super::guard::{GuardStats, SeekGuard};

/// Development-only console commands. The console is only constructed when
/// the dev configuration is enabled; nothing here is a stable interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DebugCommand {
    EmergencyStopAllSeeking,
    ResetSeekingStats,
    GetSeekingStats,
}

impl DebugCommand {
    pub(crate) fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "emergency-stop-all-seeking" | "stop" => Some(Self::EmergencyStopAllSeeking),
            "reset-seeking-stats" | "reset" => Some(Self::ResetSeekingStats),
            "get-seeking-stats" | "stats" => Some(Self::GetSeekingStats),
            _ => None,
        }
    }
}

pub(crate) struct DebugConsole;

impl DebugConsole {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn execute(&self, guard: &mut SeekGuard, input: &str) -> Result<String, String> {
        match DebugCommand::parse(input) {
            Some(DebugCommand::EmergencyStopAllSeeking) => {
                guard.emergency_stop_all();
                Ok("Emergency stop engaged: all records cleared, players detached.".to_string())
            }
            Some(DebugCommand::ResetSeekingStats) => {
                guard.reset_all();
                Ok("Seek stats reset; players rewound to start.".to_string())
            }
            Some(DebugCommand::GetSeekingStats) => Ok(format_stats(&guard.stats())),
            None => Err(format!(
                "Unknown debug command: {}. Try stats, reset or stop.",
                input.trim()
            )),
        }
    }
}

pub(crate) fn format_stats(stats: &GuardStats) -> String {
    let mut out = format!(
        "Session started {}\nTotal seeks: {}   Rate-limit hits: {}   Emergency stops: {}",
        stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        stats.total_seeks,
        stats.rate_limit_hits,
        stats.emergency_stops,
    );
    if stats.videos.is_empty() {
        out.push_str("\nNo per-video records.");
        return out;
    }
    for video in &stats.videos {
        let _ = write!(
            out,
            "\n{}  seeks={}  last10s={}  last30s={}  last_seek_ms={}{}",
            video.video_id,
            video.seek_count,
            video.recent_10s,
            video.recent_30s,
            video.last_seek_ms,
            if video.emergency_triggered {
                "  EMERGENCY"
            } else {
                ""
            },
        );
    }
    out
}
