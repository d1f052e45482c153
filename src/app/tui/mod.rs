mod render;
mod session;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::debug;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::debug::DebugConsole;
use super::guard::{
    CRITICAL_WINDOW_MS, DenyReason, MODERATE_WINDOW_MS, SeekDecision, SeekGuard, SeekVerdict,
    unix_now_ms,
};
use super::media::PlayerHandle;

use self::render::draw_player;
use self::session::TermSession;

pub(crate) const SEEK_STEP_SECS: f64 = 10.0;
const VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekRequest {
    Back,
    Forward,
    Rewind,
}

impl SeekRequest {
    pub(crate) fn target(self, position: f64, duration: f64) -> f64 {
        match self {
            Self::Back => (position - SEEK_STEP_SECS).max(0.0),
            Self::Forward => (position + SEEK_STEP_SECS).min(duration.max(0.0)),
            Self::Rewind => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct PlayerNotice {
    pub(super) title: &'static str,
    pub(super) message: String,
}

#[derive(Debug, Clone, Default)]
pub(super) struct PlayerView {
    pub(super) source: Option<String>,
    pub(super) position: f64,
    pub(super) duration: f64,
    pub(super) paused: bool,
    pub(super) volume: f64,
    pub(super) buffered_ahead: f64,
    pub(super) seek_count: u64,
    pub(super) recent_10s: usize,
    pub(super) recent_30s: usize,
    pub(super) emergency: bool,
    pub(super) total_seeks: u64,
    pub(super) rate_limit_hits: u64,
    pub(super) dev_mode: bool,
}

pub(crate) fn run_player(
    seek_guard: &mut SeekGuard,
    handle: &PlayerHandle,
    dev_mode: bool,
) -> Result<()> {
    // The guard keys records by source URL; remember it before any teardown
    // can drop it from the element.
    let video_id = handle
        .lock()
        .map_err(|_| anyhow!("player handle unavailable"))?
        .source_url()
        .ok_or_else(|| anyhow!("player has no source attached"))?;

    let mut session = TermSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let console = dev_mode.then(DebugConsole::new);
    let mut status = status_info(if dev_mode {
        "Ready. Press : for the debug console."
    } else {
        "Ready."
    });
    let mut notice = None::<PlayerNotice>;
    let mut console_input = None::<String>;

    loop {
        finish_if_ended(handle, &mut status);
        let view = capture_view(seek_guard, handle, &video_id, dev_mode);
        terminal.draw(|frame| {
            draw_player(
                frame,
                &view,
                &status,
                notice.as_ref(),
                console_input.as_deref(),
            )
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(input) = console_input.as_mut() {
            match key.code {
                KeyCode::Esc => console_input = None,
                KeyCode::Enter => {
                    let line = input.clone();
                    console_input = None;
                    if let Some(console) = console.as_ref() {
                        match console.execute(seek_guard, &line) {
                            Ok(report) => {
                                notice = Some(PlayerNotice {
                                    title: "Debug",
                                    message: report,
                                });
                            }
                            Err(message) => status = status_error(&message),
                        }
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(ch) => input.push(ch),
                _ => {}
            }
            continue;
        }

        if notice.is_some() {
            notice = None;
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Char(':') if console.is_some() => console_input = Some(String::new()),
            KeyCode::Char(' ') => toggle_playback(handle, &mut status),
            KeyCode::Left => attempt_seek(
                seek_guard,
                handle,
                &video_id,
                SeekRequest::Back,
                &mut status,
                &mut notice,
            ),
            KeyCode::Right => attempt_seek(
                seek_guard,
                handle,
                &video_id,
                SeekRequest::Forward,
                &mut status,
                &mut notice,
            ),
            KeyCode::Char('0') => attempt_seek(
                seek_guard,
                handle,
                &video_id,
                SeekRequest::Rewind,
                &mut status,
                &mut notice,
            ),
            KeyCode::Up => adjust_volume(handle, VOLUME_STEP, &mut status),
            KeyCode::Down => adjust_volume(handle, -VOLUME_STEP, &mut status),
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}

/// User scrubs are the only position changes that consult the guard;
/// natural playback advance never counts toward rate limiting.
fn attempt_seek(
    seek_guard: &mut SeekGuard,
    handle: &PlayerHandle,
    video_id: &str,
    request: SeekRequest,
    status: &mut String,
    notice: &mut Option<PlayerNotice>,
) {
    let Ok(mut media) = handle.lock() else {
        *status = status_error("Player handle unavailable.");
        return;
    };
    if media.source_url().is_none() {
        *status = status_error("No source attached; playback was stopped.");
        return;
    }

    let last_seek_ms = seek_guard.last_seek_ms(video_id);
    let decision = seek_guard.check_seek(video_id, last_seek_ms);
    debug!("seek decision for {video_id}: {}", decision.reason());

    match decision {
        SeekDecision::Allowed => {
            let target = request.target(media.current_time(), media.duration());
            media.set_current_time(target);
            match seek_guard.track(video_id, target, media.duration()) {
                SeekVerdict::Normal => {
                    *status = status_info(&format!("Seeked to {}.", format_clock(target)));
                }
                SeekVerdict::Throttled => {
                    *status = status_error("Seeking fast; slow down.");
                }
                SeekVerdict::Moderate => {
                    *status = status_error("Heavy seeking over the last 30s; easing off now.");
                }
                SeekVerdict::Critical => {
                    *notice = Some(PlayerNotice {
                        title: "Emergency Stop",
                        message: "Too many seeks in a short span.\n\nSeeking is disabled for \
                                  this video and playback will stop.\n\nReset the session \
                                  stats to recover."
                            .to_string(),
                    });
                    *status = status_error("Emergency stop triggered.");
                }
            }
        }
        SeekDecision::Denied { reason, wait_ms } => match reason {
            DenyReason::RateLimit2s => {
                let wait_secs = wait_ms.unwrap_or(0) as f64 / 1000.0;
                *status =
                    status_error(&format!("Seek blocked: wait {wait_secs:.1}s between seeks."));
            }
            DenyReason::TooManyRecentSeeks => {
                *status = status_error("Seek blocked: too many recent seeks.");
            }
            DenyReason::EmergencyMode => {
                *notice = Some(PlayerNotice {
                    title: "Emergency Stop",
                    message: "Seeking stays disabled for this video until the session stats \
                              are reset."
                        .to_string(),
                });
                *status = status_error("Seek blocked: emergency mode.");
            }
        },
    }
}

fn toggle_playback(handle: &PlayerHandle, status: &mut String) {
    let Ok(mut media) = handle.lock() else {
        *status = status_error("Player handle unavailable.");
        return;
    };
    if media.source_url().is_none() {
        *status = status_error("No source attached; playback was stopped.");
        return;
    }
    if media.is_paused() {
        media.play();
        *status = status_info("Playing.");
    } else {
        media.pause();
        *status = status_info("Paused.");
    }
}

fn adjust_volume(handle: &PlayerHandle, delta: f64, status: &mut String) {
    let Ok(mut media) = handle.lock() else {
        *status = status_error("Player handle unavailable.");
        return;
    };
    let volume = media.volume() + delta;
    media.set_volume(volume);
    *status = status_info(&format!("Volume {:.0}%.", media.volume() * 100.0));
}

fn finish_if_ended(handle: &PlayerHandle, status: &mut String) {
    let Ok(mut media) = handle.lock() else {
        return;
    };
    if !media.is_paused() && media.duration() > 0.0 && media.current_time() >= media.duration() {
        media.pause();
        *status = status_info("Playback finished.");
    }
}

fn capture_view(
    seek_guard: &SeekGuard,
    handle: &PlayerHandle,
    video_id: &str,
    dev_mode: bool,
) -> PlayerView {
    let mut view = PlayerView {
        dev_mode,
        ..PlayerView::default()
    };
    if let Ok(media) = handle.lock() {
        view.source = media.source_url();
        view.position = media.current_time();
        view.duration = media.duration();
        view.paused = media.is_paused();
        view.volume = media.volume();
        view.buffered_ahead = media.buffered_ahead();
    }
    let now_ms = unix_now_ms();
    let stats = seek_guard.stats_at(now_ms);
    view.total_seeks = stats.total_seeks;
    view.rate_limit_hits = stats.rate_limit_hits;
    if let Some(record) = seek_guard.record(video_id) {
        view.seek_count = record.seek_count;
        view.recent_10s = record.recent_events(CRITICAL_WINDOW_MS, now_ms);
        view.recent_30s = record.recent_events(MODERATE_WINDOW_MS, now_ms);
        view.emergency = record.emergency_triggered;
    }
    view
}

pub(crate) fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.round() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub(crate) fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let cut: String = raw.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}
