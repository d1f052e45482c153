mod breaker;
mod limiter;
mod tracker;

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

#[cfg(test)]
pub(crate) use breaker::teardown_matching;
#[cfg(test)]
pub(crate) use tracker::seek_percentage;

use super::media::PlayerHandle;

pub(crate) const CRITICAL_WINDOW_MS: u64 = 10_000;
pub(crate) const MODERATE_WINDOW_MS: u64 = 30_000;
pub(crate) const CRITICAL_THRESHOLD: usize = 3;
pub(crate) const MODERATE_THRESHOLD: usize = 5;
pub(crate) const MIN_SEEK_INTERVAL_MS: u64 = 2_000;
pub(crate) const TEARDOWN_DELAY_MS: u64 = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SeekEvent {
    pub(crate) at_ms: u64,
    pub(crate) position_secs: f64,
    pub(crate) percent_of_duration: f64,
}

/// Per-video seek history. Events are kept for a trailing 30s window only;
/// `seek_count` keeps counting for the whole session.
#[derive(Debug, Default)]
pub(crate) struct VideoRecord {
    pub(crate) events: Vec<SeekEvent>,
    pub(crate) seek_count: u64,
    pub(crate) last_seek_ms: u64,
    pub(crate) emergency_triggered: bool,
}

impl VideoRecord {
    pub(crate) fn recent_events(&self, window_ms: u64, now_ms: u64) -> usize {
        self.events
            .iter()
            .filter(|event| now_ms.saturating_sub(event.at_ms) <= window_ms)
            .count()
    }

    pub(crate) fn prune(&mut self, now_ms: u64) {
        self.events
            .retain(|event| now_ms.saturating_sub(event.at_ms) <= MODERATE_WINDOW_MS);
    }
}

/// Classification of a tracked seek. Variants are mutually exclusive and
/// escalating; `Critical` is only returned on the call that trips the
/// emergency flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekVerdict {
    Normal,
    Throttled,
    Moderate,
    Critical,
}

impl SeekVerdict {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Throttled => "throttled",
            Self::Moderate => "moderate",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DenyReason {
    EmergencyMode,
    RateLimit2s,
    TooManyRecentSeeks,
}

impl DenyReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::EmergencyMode => "emergency_mode",
            Self::RateLimit2s => "rate_limit_2s",
            Self::TooManyRecentSeeks => "too_many_recent_seeks",
        }
    }
}

/// Advisory admission result. A denied decision means the caller must skip
/// the seek; it is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekDecision {
    Allowed,
    Denied {
        reason: DenyReason,
        wait_ms: Option<u64>,
    },
}

impl SeekDecision {
    pub(crate) fn reason(self) -> &'static str {
        match self {
            Self::Allowed => "normal",
            Self::Denied { reason, .. } => reason.as_str(),
        }
    }
}

/// Session-scoped seek guard: owns all per-video records, the lifetime
/// counters, and the player handles the breaker acts on. Constructed by the
/// caller and passed to player components; there is no global instance.
pub(crate) struct SeekGuard {
    records: HashMap<String, VideoRecord>,
    total_seeks: u64,
    rate_limit_hits: u64,
    emergency_stops: u64,
    started_at: DateTime<Utc>,
    players: Vec<PlayerHandle>,
    teardown_delay: Duration,
}

impl SeekGuard {
    pub(crate) fn new() -> Self {
        Self::with_teardown_delay(Duration::from_millis(TEARDOWN_DELAY_MS))
    }

    pub(crate) fn with_teardown_delay(teardown_delay: Duration) -> Self {
        Self {
            records: HashMap::new(),
            total_seeks: 0,
            rate_limit_hits: 0,
            emergency_stops: 0,
            started_at: Utc::now(),
            players: Vec::new(),
            teardown_delay,
        }
    }

    pub(crate) fn register_player(&mut self, handle: PlayerHandle) {
        self.players.push(handle);
    }

    pub(crate) fn record(&self, video_id: &str) -> Option<&VideoRecord> {
        self.records.get(video_id)
    }

    pub(crate) fn last_seek_ms(&self, video_id: &str) -> Option<u64> {
        self.records
            .get(video_id)
            .filter(|record| record.seek_count > 0)
            .map(|record| record.last_seek_ms)
    }

    pub(crate) fn stats(&self) -> GuardStats {
        self.stats_at(unix_now_ms())
    }

    pub(crate) fn stats_at(&self, now_ms: u64) -> GuardStats {
        let mut videos: Vec<VideoStats> = self
            .records
            .iter()
            .map(|(video_id, record)| VideoStats {
                video_id: video_id.clone(),
                seek_count: record.seek_count,
                recent_10s: record.recent_events(CRITICAL_WINDOW_MS, now_ms),
                recent_30s: record.recent_events(MODERATE_WINDOW_MS, now_ms),
                emergency_triggered: record.emergency_triggered,
                last_seek_ms: record.last_seek_ms,
            })
            .collect();
        videos.sort_by(|a, b| a.video_id.cmp(&b.video_id));

        GuardStats {
            total_seeks: self.total_seeks,
            rate_limit_hits: self.rate_limit_hits,
            emergency_stops: self.emergency_stops,
            started_at: self.started_at,
            videos,
        }
    }

    #[cfg(test)]
    pub(crate) fn clear_emergency_flag(&mut self, video_id: &str) {
        if let Some(record) = self.records.get_mut(video_id) {
            record.emergency_triggered = false;
        }
    }
}

/// Read-only snapshot for the stats panel and the debug console.
#[derive(Debug, Clone)]
pub(crate) struct GuardStats {
    pub(crate) total_seeks: u64,
    pub(crate) rate_limit_hits: u64,
    pub(crate) emergency_stops: u64,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) videos: Vec<VideoStats>,
}

#[derive(Debug, Clone)]
pub(crate) struct VideoStats {
    pub(crate) video_id: String,
    pub(crate) seek_count: u64,
    pub(crate) recent_10s: usize,
    pub(crate) recent_30s: usize,
    pub(crate) emergency_triggered: bool,
    pub(crate) last_seek_ms: u64,
}

pub(crate) fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
