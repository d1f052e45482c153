use log::debug;

use super::{
    CRITICAL_THRESHOLD, CRITICAL_WINDOW_MS, DenyReason, MIN_SEEK_INTERVAL_MS, SeekDecision,
    SeekGuard, unix_now_ms,
};

impl SeekGuard {
    pub(crate) fn check_seek(&mut self, video_id: &str, last_seek_ms: Option<u64>) -> SeekDecision {
        self.check_seek_at(video_id, last_seek_ms, unix_now_ms())
    }

    /// Admission check the player must consult before moving the playback
    /// position. Advisory only: the guard never blocks the actual seek call.
    ///
    /// The emergency flag wins over the interval rule, so a flagged video
    /// reports `emergency_mode` even while inside the 2s window.
    pub(crate) fn check_seek_at(
        &mut self,
        video_id: &str,
        last_seek_ms: Option<u64>,
        now_ms: u64,
    ) -> SeekDecision {
        if self
            .records
            .get(video_id)
            .is_some_and(|record| record.emergency_triggered)
        {
            return SeekDecision::Denied {
                reason: DenyReason::EmergencyMode,
                wait_ms: None,
            };
        }

        if let Some(last_ms) = last_seek_ms {
            let elapsed = now_ms.saturating_sub(last_ms);
            if elapsed < MIN_SEEK_INTERVAL_MS {
                self.rate_limit_hits += 1;
                debug!("rate limit hit on {video_id}: {elapsed}ms since last seek");
                return SeekDecision::Denied {
                    reason: DenyReason::RateLimit2s,
                    wait_ms: Some(MIN_SEEK_INTERVAL_MS - elapsed),
                };
            }
        }

        // Unreachable through track() alone (three events in-window trip the
        // emergency flag first), but an administrative flag clear must not
        // reopen a still-crowded window.
        if self
            .records
            .get(video_id)
            .is_some_and(|record| record.recent_events(CRITICAL_WINDOW_MS, now_ms) >= CRITICAL_THRESHOLD)
        {
            return SeekDecision::Denied {
                reason: DenyReason::TooManyRecentSeeks,
                wait_ms: None,
            };
        }

        SeekDecision::Allowed
    }
}
