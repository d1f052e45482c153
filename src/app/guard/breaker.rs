use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use super::SeekGuard;
use crate::app::media::PlayerHandle;

impl SeekGuard {
    /// Hard stop: clears every per-video record and detaches every
    /// registered player. Best effort by design; a handle that cannot be
    /// locked is skipped, never an error.
    pub(crate) fn emergency_stop_all(&mut self) {
        self.emergency_stops += 1;
        self.records.clear();
        for handle in &self.players {
            let Ok(mut media) = handle.lock() else {
                continue;
            };
            let source = media
                .source_url()
                .unwrap_or_else(|| "<no source>".to_string());
            media.pause();
            media.clear_source();
            warn!("emergency stop: detached player for {source}");
        }
        error!(
            "emergency stop engaged for all players ({} this session)",
            self.emergency_stops
        );
    }

    /// Recovery path for a triggered emergency: wipes records and all
    /// counters, and rewinds every registered player to the start.
    pub(crate) fn reset_all(&mut self) {
        self.records.clear();
        self.total_seeks = 0;
        self.rate_limit_hits = 0;
        self.emergency_stops = 0;
        for handle in &self.players {
            let Ok(mut media) = handle.lock() else {
                continue;
            };
            media.set_current_time(0.0);
        }
        info!("seek stats reset; players rewound to start");
    }
}

/// Fire-and-forget teardown used when the tracker trips the emergency flag:
/// waits out the delay, then pauses and drops the source of every handle
/// playing the flagged video. No cancellation, no retry.
pub(super) fn schedule_teardown(players: Vec<PlayerHandle>, video_id: String, delay: Duration) {
    thread::spawn(move || {
        thread::sleep(delay);
        teardown_matching(&players, &video_id);
    });
}

pub(crate) fn teardown_matching(players: &[PlayerHandle], video_id: &str) {
    for handle in players {
        let Ok(mut media) = handle.lock() else {
            continue;
        };
        if media.source_url().as_deref() != Some(video_id) {
            continue;
        }
        media.pause();
        media.clear_source();
        warn!("playback torn down for {video_id}");
    }
}
