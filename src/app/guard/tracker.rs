use log::{debug, error};

use super::breaker::schedule_teardown;
use super::{
    CRITICAL_THRESHOLD, CRITICAL_WINDOW_MS, MODERATE_THRESHOLD, MODERATE_WINDOW_MS, SeekEvent,
    SeekGuard, SeekVerdict, unix_now_ms,
};

impl SeekGuard {
    pub(crate) fn track(
        &mut self,
        video_id: &str,
        position_secs: f64,
        duration_secs: f64,
    ) -> SeekVerdict {
        self.track_at(video_id, position_secs, duration_secs, unix_now_ms())
    }

    /// Records one seek and classifies its severity. Never fails: malformed
    /// positions and missing durations coerce to zero instead of erroring.
    pub(crate) fn track_at(
        &mut self,
        video_id: &str,
        position_secs: f64,
        duration_secs: f64,
        now_ms: u64,
    ) -> SeekVerdict {
        let position_secs = coerce_non_negative(position_secs);
        let percent_of_duration = seek_percentage(position_secs, duration_secs);

        let record = self.records.entry(video_id.to_string()).or_default();
        record.events.push(SeekEvent {
            at_ms: now_ms,
            position_secs,
            percent_of_duration,
        });
        record.seek_count += 1;
        record.last_seek_ms = now_ms;
        record.prune(now_ms);
        self.total_seeks += 1;

        let recent_critical = record.recent_events(CRITICAL_WINDOW_MS, now_ms);
        let recent_moderate = record.recent_events(MODERATE_WINDOW_MS, now_ms);

        if recent_critical >= CRITICAL_THRESHOLD && !record.emergency_triggered {
            record.emergency_triggered = true;
            error!(
                "seek storm on {video_id}: {recent_critical} seeks inside 10s, disabling playback"
            );
            // Deferred so this verdict reaches the caller before the source
            // is dropped.
            schedule_teardown(self.players.clone(), video_id.to_string(), self.teardown_delay);
            return SeekVerdict::Critical;
        }

        let verdict = if recent_moderate >= MODERATE_THRESHOLD {
            SeekVerdict::Moderate
        } else if recent_critical >= CRITICAL_THRESHOLD {
            SeekVerdict::Throttled
        } else {
            SeekVerdict::Normal
        };
        debug!(
            "seek on {video_id}: verdict={} recent10s={recent_critical} recent30s={recent_moderate}",
            verdict.label()
        );
        verdict
    }
}

fn coerce_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

pub(crate) fn seek_percentage(position_secs: f64, duration_secs: f64) -> f64 {
    let duration = coerce_non_negative(duration_secs);
    if duration == 0.0 {
        return 0.0;
    }
    (coerce_non_negative(position_secs) / duration * 100.0).clamp(0.0, 100.0)
}
