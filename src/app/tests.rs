use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::debug::{DebugCommand, DebugConsole, format_stats};
use super::guard::{
    DenyReason, SeekDecision, SeekGuard, SeekVerdict, seek_percentage, teardown_matching,
};
use super::media::{LocalMedia, MediaElement, player_handle};
use super::tui::{SEEK_STEP_SECS, SeekRequest, format_clock, truncate};

fn guard() -> SeekGuard {
    SeekGuard::with_teardown_delay(Duration::ZERO)
}

#[test]
fn spaced_seeks_stay_normal() {
    let mut guard = guard();
    assert_eq!(guard.track_at("clip", 10.0, 100.0, 0), SeekVerdict::Normal);
    assert_eq!(
        guard.track_at("clip", 20.0, 100.0, 15_000),
        SeekVerdict::Normal
    );
    assert_eq!(
        guard.track_at("clip", 30.0, 100.0, 45_000),
        SeekVerdict::Normal
    );
    let record = guard.record("clip").expect("record should exist");
    assert!(!record.emergency_triggered);
    assert_eq!(record.seek_count, 3);
}

#[test]
fn two_seeks_per_ten_seconds_never_trigger_emergency() {
    let mut guard = guard();
    // Never more than two events inside any 10s span.
    for (i, at_ms) in [0_u64, 5_000, 10_001, 15_002, 20_003].iter().enumerate() {
        let verdict = guard.track_at("clip", i as f64 * 10.0, 100.0, *at_ms);
        assert_ne!(verdict, SeekVerdict::Critical, "call {i} at {at_ms}ms");
    }
    assert!(!guard.record("clip").expect("record").emergency_triggered);
}

#[test]
fn third_seek_in_ten_seconds_is_critical_and_sticky() {
    let mut guard = guard();
    assert_eq!(guard.track_at("clip", 10.0, 100.0, 0), SeekVerdict::Normal);
    assert_eq!(
        guard.track_at("clip", 20.0, 100.0, 1_000),
        SeekVerdict::Normal
    );
    assert_eq!(
        guard.track_at("clip", 30.0, 100.0, 2_000),
        SeekVerdict::Critical
    );
    assert!(guard.record("clip").expect("record").emergency_triggered);

    // Flag survives the events aging out of the trailing window.
    let verdict = guard.track_at("clip", 40.0, 100.0, 120_000);
    assert_ne!(verdict, SeekVerdict::Critical);
    assert!(guard.record("clip").expect("record").emergency_triggered);
    assert!(matches!(
        guard.check_seek_at("clip", Some(120_000), 200_000),
        SeekDecision::Denied {
            reason: DenyReason::EmergencyMode,
            ..
        }
    ));
}

#[test]
fn emergency_denial_wins_over_interval_rule() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    assert_eq!(
        guard.track_at("clip", 30.0, 100.0, 2_000),
        SeekVerdict::Critical
    );

    // 100ms after the last seek: inside the 2s window, but the emergency
    // flag decides the reason.
    let decision = guard.check_seek_at("clip", Some(2_000), 2_100);
    assert_eq!(decision.reason(), "emergency_mode");
    let stats = guard.stats_at(2_100);
    assert_eq!(stats.rate_limit_hits, 0);
}

#[test]
fn emergency_denial_lifts_after_reset_all() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    guard.track_at("clip", 30.0, 100.0, 2_000);
    assert!(!matches!(
        guard.check_seek_at("clip", None, 10_000),
        SeekDecision::Allowed
    ));

    guard.reset_all();
    assert!(matches!(
        guard.check_seek_at("clip", None, 10_000),
        SeekDecision::Allowed
    ));
}

#[test]
fn interval_rule_denies_and_reports_remaining_wait() {
    let mut guard = guard();
    let decision = guard.check_seek_at("clip", Some(10_000), 10_500);
    assert_eq!(
        decision,
        SeekDecision::Denied {
            reason: DenyReason::RateLimit2s,
            wait_ms: Some(1_500),
        }
    );
    assert_eq!(guard.stats_at(10_500).rate_limit_hits, 1);

    // Exactly at the boundary the seek is allowed again.
    assert!(matches!(
        guard.check_seek_at("clip", Some(10_000), 12_000),
        SeekDecision::Allowed
    ));
    assert_eq!(guard.stats_at(12_000).rate_limit_hits, 1);
}

#[test]
fn first_seek_skips_the_interval_rule() {
    let mut guard = guard();
    assert!(matches!(
        guard.check_seek_at("clip", None, 5),
        SeekDecision::Allowed
    ));
}

#[test]
fn crowded_window_still_denies_after_flag_clear() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    guard.track_at("clip", 30.0, 100.0, 2_000);
    guard.clear_emergency_flag("clip");

    // Interval rule satisfied, emergency flag gone, but three events still
    // sit inside the 10s window.
    let decision = guard.check_seek_at("clip", Some(2_000), 4_500);
    assert_eq!(decision.reason(), "too_many_recent_seeks");
}

#[test]
fn verdicts_escalate_through_throttled_to_moderate() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    assert_eq!(
        guard.track_at("clip", 30.0, 100.0, 2_000),
        SeekVerdict::Critical
    );
    // Already flagged: a fourth call inside 10s is only a throttle warning.
    assert_eq!(
        guard.track_at("clip", 40.0, 100.0, 3_000),
        SeekVerdict::Throttled
    );
    // Fifth event within 30s crosses the moderate threshold.
    assert_eq!(
        guard.track_at("clip", 50.0, 100.0, 4_000),
        SeekVerdict::Moderate
    );
}

#[test]
fn events_older_than_thirty_seconds_are_pruned() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    guard.track_at("clip", 30.0, 100.0, 40_000);

    let record = guard.record("clip").expect("record");
    assert_eq!(record.events.len(), 1);
    assert_eq!(record.seek_count, 3);

    let stats = guard.stats_at(40_000);
    let video = &stats.videos[0];
    assert_eq!(video.recent_10s, 1);
    assert_eq!(video.recent_30s, 1);
    assert_eq!(video.seek_count, 3);
}

#[test]
fn missing_duration_records_event_with_zero_percentage() {
    let mut guard = guard();
    assert_eq!(guard.track_at("clip", 42.0, 0.0, 0), SeekVerdict::Normal);
    let record = guard.record("clip").expect("record");
    assert_eq!(record.events.len(), 1);
    assert_eq!(record.events[0].position_secs, 42.0);
    assert_eq!(record.events[0].percent_of_duration, 0.0);
}

#[test]
fn seek_percentage_clamps_and_tolerates_garbage() {
    assert_eq!(seek_percentage(30.0, 120.0), 25.0);
    assert_eq!(seek_percentage(150.0, 120.0), 100.0);
    assert_eq!(seek_percentage(-5.0, 120.0), 0.0);
    assert_eq!(seek_percentage(30.0, -1.0), 0.0);
    assert_eq!(seek_percentage(f64::NAN, 120.0), 0.0);
    assert_eq!(seek_percentage(30.0, f64::NAN), 0.0);
}

#[test]
fn total_seeks_accumulates_across_videos() {
    let mut guard = guard();
    guard.track_at("clip-a", 10.0, 100.0, 0);
    guard.track_at("clip-b", 10.0, 100.0, 20_000);
    guard.track_at("clip-a", 20.0, 100.0, 40_000);

    let stats = guard.stats_at(40_000);
    assert_eq!(stats.total_seeks, 3);
    assert_eq!(stats.videos.len(), 2);
    // Snapshot is sorted by id for stable display.
    assert_eq!(stats.videos[0].video_id, "clip-a");
    assert_eq!(stats.videos[0].seek_count, 2);
    assert_eq!(stats.videos[1].video_id, "clip-b");
    assert_eq!(stats.videos[1].seek_count, 1);
}

#[test]
fn last_seek_ms_tracks_the_most_recent_event() {
    let mut guard = guard();
    assert_eq!(guard.last_seek_ms("clip"), None);
    guard.track_at("clip", 10.0, 100.0, 7_000);
    assert_eq!(guard.last_seek_ms("clip"), Some(7_000));
    guard.track_at("clip", 20.0, 100.0, 9_500);
    assert_eq!(guard.last_seek_ms("clip"), Some(9_500));
}

#[test]
fn reset_all_clears_counters_records_and_rewinds_players() {
    let mut guard = guard();
    let handle = player_handle(LocalMedia::new("clip", 100.0));
    guard.register_player(Arc::clone(&handle));

    guard.track_at("clip", 10.0, 100.0, 0);
    guard.check_seek_at("clip", Some(0), 500);
    guard.emergency_stop_all();
    handle
        .lock()
        .expect("lock media")
        .set_current_time(50.0);

    guard.reset_all();
    let stats = guard.stats_at(1_000);
    assert_eq!(stats.total_seeks, 0);
    assert_eq!(stats.rate_limit_hits, 0);
    assert_eq!(stats.emergency_stops, 0);
    assert!(stats.videos.is_empty());
    assert_eq!(handle.lock().expect("lock media").current_time(), 0.0);
}

#[test]
fn emergency_stop_all_detaches_every_player_and_counts_calls() {
    let mut guard = guard();
    let first = player_handle(LocalMedia::new("clip-a", 100.0));
    let second = player_handle(LocalMedia::new("clip-b", 100.0));
    guard.register_player(Arc::clone(&first));
    guard.register_player(Arc::clone(&second));
    first.lock().expect("lock media").play();
    guard.track_at("clip-a", 10.0, 100.0, 0);

    guard.emergency_stop_all();
    assert_eq!(guard.stats_at(0).emergency_stops, 1);
    assert!(guard.record("clip-a").is_none());
    for handle in [&first, &second] {
        let media = handle.lock().expect("lock media");
        assert!(media.is_paused());
        assert!(media.source_url().is_none());
    }

    guard.emergency_stop_all();
    assert_eq!(guard.stats_at(0).emergency_stops, 2);
}

#[test]
fn teardown_only_touches_handles_playing_the_flagged_video() {
    let flagged = player_handle(LocalMedia::new("clip-a", 100.0));
    let other = player_handle(LocalMedia::new("clip-b", 100.0));
    other.lock().expect("lock media").play();
    let players = vec![Arc::clone(&flagged), Arc::clone(&other)];

    teardown_matching(&players, "clip-a");

    assert!(flagged.lock().expect("lock media").source_url().is_none());
    let untouched = other.lock().expect("lock media");
    assert_eq!(untouched.source_url().as_deref(), Some("clip-b"));
    assert!(!untouched.is_paused());
}

#[test]
fn critical_verdict_schedules_deferred_teardown() {
    let mut guard = guard();
    let handle = player_handle(LocalMedia::new("clip", 100.0));
    guard.register_player(Arc::clone(&handle));
    handle.lock().expect("lock media").play();

    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    assert_eq!(
        guard.track_at("clip", 30.0, 100.0, 2_000),
        SeekVerdict::Critical
    );
    // Verdict returned synchronously; the detach happens on the teardown
    // thread shortly after.
    thread::sleep(Duration::from_millis(150));
    let media = handle.lock().expect("lock media");
    assert!(media.is_paused());
    assert!(media.source_url().is_none());
}

#[test]
fn decision_and_verdict_labels_are_stable() {
    assert_eq!(SeekDecision::Allowed.reason(), "normal");
    assert_eq!(DenyReason::EmergencyMode.as_str(), "emergency_mode");
    assert_eq!(DenyReason::RateLimit2s.as_str(), "rate_limit_2s");
    assert_eq!(
        DenyReason::TooManyRecentSeeks.as_str(),
        "too_many_recent_seeks"
    );
    assert_eq!(SeekVerdict::Normal.label(), "normal");
    assert_eq!(SeekVerdict::Throttled.label(), "throttled");
    assert_eq!(SeekVerdict::Moderate.label(), "moderate");
    assert_eq!(SeekVerdict::Critical.label(), "critical");
}

#[test]
fn debug_command_parse_accepts_full_names_and_aliases() {
    assert_eq!(
        DebugCommand::parse("emergency-stop-all-seeking"),
        Some(DebugCommand::EmergencyStopAllSeeking)
    );
    assert_eq!(
        DebugCommand::parse("  STOP "),
        Some(DebugCommand::EmergencyStopAllSeeking)
    );
    assert_eq!(
        DebugCommand::parse("reset-seeking-stats"),
        Some(DebugCommand::ResetSeekingStats)
    );
    assert_eq!(
        DebugCommand::parse("stats"),
        Some(DebugCommand::GetSeekingStats)
    );
    assert_eq!(DebugCommand::parse("frobnicate"), None);
}

#[test]
fn debug_console_runs_commands_against_the_guard() {
    let console = DebugConsole::new();
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);

    let report = console
        .execute(&mut guard, "stats")
        .expect("stats should succeed");
    assert!(report.contains("Total seeks: 1"));
    assert!(report.contains("clip"));

    console
        .execute(&mut guard, "stop")
        .expect("stop should succeed");
    assert_eq!(guard.stats_at(0).emergency_stops, 1);

    console
        .execute(&mut guard, "reset")
        .expect("reset should succeed");
    assert_eq!(guard.stats_at(0).total_seeks, 0);

    let err = console
        .execute(&mut guard, "frobnicate")
        .expect_err("unknown command should fail");
    assert!(err.contains("frobnicate"));
}

#[test]
fn stats_report_marks_flagged_videos() {
    let mut guard = guard();
    guard.track_at("clip", 10.0, 100.0, 0);
    guard.track_at("clip", 20.0, 100.0, 1_000);
    guard.track_at("clip", 30.0, 100.0, 2_000);

    let report = format_stats(&guard.stats_at(2_000));
    assert!(report.contains("EMERGENCY"));
    assert!(report.contains("seeks=3"));

    guard.reset_all();
    let report = format_stats(&guard.stats_at(2_000));
    assert!(report.contains("No per-video records."));
}

#[test]
fn seek_requests_clamp_to_the_playable_range() {
    assert_eq!(SeekRequest::Forward.target(50.0, 100.0), 50.0 + SEEK_STEP_SECS);
    assert_eq!(SeekRequest::Forward.target(95.0, 100.0), 100.0);
    assert_eq!(SeekRequest::Back.target(50.0, 100.0), 50.0 - SEEK_STEP_SECS);
    assert_eq!(SeekRequest::Back.target(4.0, 100.0), 0.0);
    assert_eq!(SeekRequest::Rewind.target(73.0, 100.0), 0.0);
}

#[test]
fn clock_formatting_covers_minutes_and_hours() {
    assert_eq!(format_clock(0.0), "0:00");
    assert_eq!(format_clock(61.0), "1:01");
    assert_eq!(format_clock(3_661.0), "1:01:01");
    assert_eq!(format_clock(-5.0), "0:00");
    assert_eq!(format_clock(f64::NAN), "0:00");
}

#[test]
fn truncate_keeps_short_strings_intact() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a-much-longer-string", 10), "a-much-...");
}
