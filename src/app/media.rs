use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Seam between the guard/player and an actual playback backend. The
/// breaker's deferred teardown runs on another thread, so implementations
/// are shared behind a `PlayerHandle`.
pub(crate) trait MediaElement {
    fn source_url(&self) -> Option<String>;
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    fn duration(&self) -> f64;
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn buffered_ahead(&self) -> f64;
    fn clear_source(&mut self);
}

pub(crate) type PlayerHandle = Arc<Mutex<dyn MediaElement + Send>>;

pub(crate) fn player_handle(media: impl MediaElement + Send + 'static) -> PlayerHandle {
    Arc::new(Mutex::new(media))
}

pub(crate) const BUFFER_WINDOW_SECS: f64 = 15.0;

/// In-process media element: the position advances with the wall clock
/// while playing. Starts paused at zero.
pub(crate) struct LocalMedia {
    source: Option<String>,
    duration_secs: f64,
    base_position: f64,
    resumed_at: Option<Instant>,
    volume: f64,
}

impl LocalMedia {
    pub(crate) fn new(source: &str, duration_secs: f64) -> Self {
        Self {
            source: Some(source.to_string()),
            duration_secs: duration_secs.max(0.0),
            base_position: 0.0,
            resumed_at: None,
            volume: 1.0,
        }
    }
}

impl MediaElement for LocalMedia {
    fn source_url(&self) -> Option<String> {
        self.source.clone()
    }

    fn play(&mut self) {
        if self.source.is_some() && self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_position = self.current_time();
        self.resumed_at = None;
    }

    fn is_paused(&self) -> bool {
        self.resumed_at.is_none()
    }

    fn current_time(&self) -> f64 {
        let elapsed = self
            .resumed_at
            .map(|resumed| resumed.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + elapsed).min(self.duration_secs)
    }

    fn set_current_time(&mut self, secs: f64) {
        let playing = self.resumed_at.is_some();
        self.base_position = if secs.is_finite() {
            secs.clamp(0.0, self.duration_secs)
        } else {
            0.0
        };
        self.resumed_at = playing.then(Instant::now);
    }

    fn duration(&self) -> f64 {
        self.duration_secs
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.volume
        };
    }

    fn buffered_ahead(&self) -> f64 {
        if self.source.is_none() {
            return 0.0;
        }
        (self.duration_secs - self.current_time()).clamp(0.0, BUFFER_WINDOW_SECS)
    }

    fn clear_source(&mut self) {
        self.source = None;
        self.resumed_at = None;
        self.base_position = 0.0;
    }
}
