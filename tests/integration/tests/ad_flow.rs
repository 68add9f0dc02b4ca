//! Integration tests for complete ad breaks
//!
//! These tests drive the controller the way a host and an ad integration
//! would and verify:
//! - Preroll, midroll and postroll breaks
//! - Content restore on a recycled surface
//! - Live stream handling
//! - Outbound events and redispatch tagging

use adsequencer::surface::{Marker, TrackMode};
use adsequencer::{AdEvent, AdState, AdsConfig, AdsError, AdsEvent, MediaSurface, Scenario};
use adsequencer_integration_tests::{controller, playing_content, Ads, TestFixture};
use anyhow::Result;
use std::time::Duration;

/// Run an ad that swaps the surface source, then end it
fn play_recycling_ad(ads: &mut Ads) {
    ads.start_linear_ad_mode();
    assert_eq!(ads.state(), AdState::AdPlayback);

    ads.surface_mut().set_source("ad.mp4", "video/mp4");
    ads.handle_event(AdEvent::LoadStart);
    assert!(ads.video_element_recycled().unwrap());

    ads.end_linear_ad_mode();
    assert_eq!(ads.state(), AdState::ContentResuming);
}

#[test]
fn test_preroll_outbound_events() {
    let (mut ads, _recorder) = controller(AdsConfig::default());
    let rx = ads.subscribe();

    ads.handle_event(AdEvent::AdsReady);
    ads.handle_event(AdEvent::Play);
    assert_eq!(ads.state(), AdState::PrerollPending);
    assert!(ads.surface().has_marker(Marker::AdLoading));

    ads.start_linear_ad_mode();
    assert!(ads.is_ad_playing());
    assert!(!ads.surface().has_marker(Marker::AdLoading));
    assert!(ads.surface().has_marker(Marker::AdPlaying));

    ads.end_linear_ad_mode();
    ads.handle_event(AdEvent::Playing);
    assert_eq!(ads.state(), AdState::ContentPlayback);
    assert!(!ads.surface().has_marker(Marker::AdPlaying));

    let outbound: Vec<AdsEvent> = rx
        .try_iter()
        .filter(|e| {
            !matches!(
                e,
                AdsEvent::StateChanged { .. } | AdsEvent::Redispatched { .. }
            )
        })
        .collect();
    assert_eq!(
        outbound,
        vec![AdsEvent::ReadyForPreroll, AdsEvent::AdStart, AdsEvent::AdEnd]
    );
}

#[test]
fn test_recycled_surface_restores_on_canplay() {
    let (mut ads, recorder) = playing_content(AdsConfig::default(), 30.0);
    let track = ads.surface_mut().add_text_track(TrackMode::Showing);

    play_recycling_ad(&mut ads);
    assert!(ads.is_restoring());
    assert_eq!(ads.surface().current_src, "content.mp4");
    assert_eq!(ads.surface().load_calls, 1);
    assert_eq!(ads.surface().track_mode(track), Some(TrackMode::Disabled));

    // Reloading the content source is not a content change
    ads.handle_event(AdEvent::LoadStart);
    assert_eq!(ads.state(), AdState::ContentResuming);

    ads.surface_mut().finish_loading();
    ads.handle_event(AdEvent::LoadedMetadata);
    assert_eq!(ads.surface().track_mode(track), Some(TrackMode::Showing));
    assert!(ads.surface().seeks.is_empty());

    ads.handle_event(AdEvent::CanPlay);
    assert_eq!(ads.surface().seeks, vec![30.0]);
    assert!(!ads.surface().paused);
    assert!(!ads.is_restoring());

    ads.handle_event(AdEvent::Playing);
    assert_eq!(ads.state(), AdState::ContentPlayback);

    assert_eq!(
        recorder.integration_events(),
        vec![AdsEvent::AdStart, AdsEvent::AdEnd]
    );
    let redispatched = recorder.redispatched();
    assert!(redispatched.contains(&"adloadstart".to_string()));
    assert!(redispatched.contains(&"contentloadstart".to_string()));
    assert!(redispatched.contains(&"contentcanplay".to_string()));
}

#[test]
fn test_recycled_surface_polls_until_seekable() {
    let (mut ads, _recorder) = playing_content(AdsConfig::default(), 30.0);
    play_recycling_ad(&mut ads);

    // canplay never arrives; the fallback starts polling
    ads.advance(Duration::from_millis(2000));
    assert!(ads.surface().seeks.is_empty());
    assert!(ads.is_restoring());

    ads.surface_mut().finish_loading();
    ads.advance(Duration::from_millis(50));
    assert_eq!(ads.surface().seeks, vec![30.0]);
    assert!(!ads.is_restoring());
}

#[test]
fn test_recycled_surface_resumes_after_polls_run_out() {
    let (mut ads, _recorder) = playing_content(AdsConfig::default(), 30.0);
    let track = ads.surface_mut().add_text_track(TrackMode::Hidden);
    play_recycling_ad(&mut ads);
    ads.surface_mut().paused = true;

    // 2000ms fallback plus twenty 50ms polls
    ads.advance(Duration::from_millis(2950));
    assert!(ads.surface().seeks.is_empty());

    ads.advance(Duration::from_millis(50));
    assert_eq!(ads.surface().seeks, vec![30.0]);
    assert!(!ads.surface().paused);

    // Tracks still wait for metadata
    assert!(ads.is_restoring());
    assert_eq!(ads.surface().track_mode(track), Some(TrackMode::Disabled));

    ads.handle_event(AdEvent::LoadedMetadata);
    assert_eq!(ads.surface().track_mode(track), Some(TrackMode::Hidden));
    assert!(!ads.is_restoring());
}

#[test]
fn test_disabled_restore_leaves_ad_source() {
    let (mut ads, recorder) = playing_content(AdsConfig::default(), 30.0);
    ads.start_linear_ad_mode();
    ads.surface_mut().set_source("next.mp4", "video/mp4");
    ads.disable_next_snapshot_restore();

    ads.end_linear_ad_mode();
    assert!(!ads.is_restoring());
    assert_eq!(ads.surface().load_calls, 0);
    assert_eq!(ads.surface().current_src, "next.mp4");

    // The host now reports the new source loading
    ads.handle_event(AdEvent::LoadStart);
    assert_eq!(ads.state(), AdState::ContentSet);
    assert_eq!(ads.content_src(), "next.mp4");
    assert!(recorder.integration_events().contains(&AdsEvent::ContentUpdate {
        old_value: "content.mp4".to_string(),
        new_value: "next.mp4".to_string(),
    }));
}

#[test]
fn test_live_offset_resume_tracks_the_edge() {
    let config = AdsConfig {
        live_offset_tracking: true,
        ..AdsConfig::default()
    };
    let (mut ads, _recorder) = controller(config);
    ads.surface_mut().duration = f64::INFINITY;
    ads.surface_mut().seekable_end = Some(100.0);
    ads.handle_event(AdEvent::AdsError);
    ads.surface_mut().current_time = 95.0;
    ads.surface_mut().paused = false;

    assert!(!ads.should_play_content_behind_ad());
    play_recycling_ad(&mut ads);
    assert_eq!(ads.snapshot().map(|s| s.current_time), Some(-5.0));

    // The live edge moved on during the ad
    let surface = ads.surface_mut();
    surface.seekable_end = Some(130.0);
    surface.ready_state = adsequencer::surface::ReadyState::HaveEnoughData;
    ads.handle_event(AdEvent::CanPlay);

    assert_eq!(ads.surface().seeks, vec![125.0]);
    assert!(!ads.is_restoring());
}

#[test]
fn test_live_ad_plays_over_muted_content() {
    let (mut ads, _recorder) = playing_content(AdsConfig::default(), 0.0);
    ads.surface_mut().duration = f64::INFINITY;
    ads.surface_mut().volume = 0.8;

    ads.start_linear_ad_mode();
    assert!(ads.snapshot().is_none());
    assert_eq!(ads.surface().volume(), 0.0);
    assert!(!ads.surface().paused);
    assert!(!ads.video_element_recycled().unwrap());

    ads.end_linear_ad_mode();
    assert_eq!(ads.surface().volume(), 0.8);
    assert!(!ads.is_restoring());

    ads.handle_event(AdEvent::Playing);
    assert_eq!(ads.state(), AdState::ContentPlayback);
}

#[test]
fn test_recycled_check_without_snapshot_is_an_error() {
    let (ads, _recorder) = controller(AdsConfig::default());
    assert!(matches!(
        ads.video_element_recycled(),
        Err(AdsError::NoSnapshot)
    ));
}

#[test]
fn test_postroll_after_ended_content_synthesizes_ended() {
    let (mut ads, recorder) = playing_content(AdsConfig::default(), 0.0);
    ads.surface_mut().run_to_end();
    ads.handle_event(AdEvent::Ended);
    assert_eq!(ads.state(), AdState::PostrollPending);

    ads.start_linear_ad_mode();
    let play_calls = ads.surface().play_calls;
    ads.end_linear_ad_mode();
    assert_eq!(ads.state(), AdState::ContentResuming);
    assert_eq!(ads.surface().play_calls, play_calls);

    ads.advance(Duration::from_millis(999));
    assert_eq!(ads.state(), AdState::ContentResuming);

    ads.advance(Duration::from_millis(1));
    assert_eq!(ads.state(), AdState::ContentPlayback);
    assert!(!ads.has_deadline_armed());

    // The postroll for this content is done
    ads.handle_event(AdEvent::ContentEnded);
    assert_eq!(ads.state(), AdState::ContentPlayback);

    let redispatched = recorder.redispatched();
    assert_eq!(redispatched.first().map(String::as_str), Some("ended"));
    assert!(redispatched.contains(&"contentended".to_string()));
}

#[test]
fn test_postroll_timeout_returns_to_content() {
    let (mut ads, _recorder) = playing_content(AdsConfig::default(), 0.0);
    ads.handle_event(AdEvent::ContentEnded);
    assert_eq!(ads.state(), AdState::PostrollPending);
    assert!(ads.is_in_ad_mode());

    ads.advance(Duration::from_millis(100));
    assert_eq!(ads.state(), AdState::ContentResuming);
    assert!(ads.is_content_resuming());

    ads.advance(Duration::from_millis(1));
    assert_eq!(ads.state(), AdState::ContentPlayback);
}

#[test]
fn test_stitched_ad_events_stay_untagged() {
    let stitched = AdsConfig {
        stitched_ads: true,
        ..AdsConfig::default()
    };
    let (mut ads, recorder) = playing_content(stitched, 10.0);
    ads.start_linear_ad_mode();
    ads.handle_event(AdEvent::Playing);
    assert_eq!(recorder.redispatched(), vec!["playing".to_string()]);

    let (mut ads, recorder) = playing_content(AdsConfig::default(), 10.0);
    ads.start_linear_ad_mode();
    ads.handle_event(AdEvent::Playing);
    assert_eq!(recorder.redispatched(), vec!["adplaying".to_string()]);
}

#[test]
fn test_placeholder_hides_surface_until_ad_decision() {
    let config = AdsConfig {
        hide_surface_during_guard: true,
        ..AdsConfig::default()
    };
    let (mut ads, _recorder) = controller(config);
    ads.surface_mut().paused = false;

    ads.handle_event(AdEvent::Play);
    assert!(ads.surface().placeholder_visible);

    ads.advance(Duration::from_millis(1));
    assert!(ads.surface().paused);
    assert!(ads.cancelled_play());

    ads.handle_event(AdEvent::AdsReady);
    ads.start_linear_ad_mode();
    assert!(!ads.surface().placeholder_visible);
}

#[test]
fn test_scenario_file_replays_a_break() -> Result<()> {
    let fixture = TestFixture::new()?;
    let path = fixture.write(
        "midroll.toml",
        r#"
[surface]
paused = false
current_time = 42.0

[[steps]]
action = "event"
event = { type = "adserror" }

[[steps]]
action = "start_linear_ad_mode"

[[steps]]
action = "surface"
current_src = "ad.mp4"

[[steps]]
action = "end_linear_ad_mode"

[[steps]]
action = "advance"
ms = 2000

[[steps]]
action = "finish_loading"

[[steps]]
action = "advance"
ms = 50

[[steps]]
action = "event"
event = { type = "playing" }

[[steps]]
action = "expect"
state = "content-playback"
"#,
    )?;

    let scenario = Scenario::from_file(&path)?;
    let mut ads = scenario.controller(AdsConfig::default());
    scenario.run(&mut ads)?;

    assert_eq!(ads.surface().current_src, "content.mp4");
    assert_eq!(ads.surface().seeks, vec![42.0]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_realtime_scenario_waits_on_tokio_clock() -> Result<()> {
    let scenario = Scenario::from_json(
        r#"{ "steps": [
            { "action": "event", "event": { "type": "play" } },
            { "action": "advance", "ms": 5000 },
            { "action": "expect", "state": "content-playback" }
        ] }"#,
    )?;
    let mut ads = scenario.controller(AdsConfig::default());

    let started = tokio::time::Instant::now();
    scenario.run_realtime(&mut ads).await?;
    assert!(started.elapsed() >= Duration::from_millis(5000));
    Ok(())
}
