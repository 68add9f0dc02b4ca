//! Integration test utilities for adsequencer
//!
//! This module provides common utilities for integration testing including:
//! - A recording outbound event handler
//! - Controller builders over the simulated surface
//! - Temporary scenario and config files

use adsequencer::ads::TICK;
use adsequencer::{AdEvent, AdState, AdsConfig, AdsController, AdsEvent, AdsEventHandler, SimulatedSurface};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub type Ads = AdsController<SimulatedSurface>;

/// Outbound event handler that keeps everything it sees
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<AdsEvent>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<AdsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Outbound events other than state changes and redispatches
    pub fn integration_events(&self) -> Vec<AdsEvent> {
        self.events()
            .into_iter()
            .filter(|e| {
                !matches!(
                    e,
                    AdsEvent::StateChanged { .. } | AdsEvent::Redispatched { .. }
                )
            })
            .collect()
    }

    /// Names of redispatched surface events, with their context prefix
    pub fn redispatched(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AdsEvent::Redispatched { context, event } => Some(context.prefixed(event)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl AdsEventHandler for Recorder {
    fn handle_event(&mut self, event: AdsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Build a controller over a fresh simulated surface and let the startup
/// source check run
pub fn controller(config: AdsConfig) -> (Ads, Recorder) {
    let surface = SimulatedSurface::new("content.mp4", "video/mp4");
    let mut ads = AdsController::new(surface, config);
    let recorder = Recorder::default();
    ads.add_event_handler(Box::new(recorder.clone()));
    ads.advance(TICK);
    (ads, recorder)
}

/// Controller already playing content at `position` seconds
pub fn playing_content(config: AdsConfig, position: f64) -> (Ads, Recorder) {
    let (mut ads, recorder) = controller(config);
    ads.handle_event(AdEvent::AdsReady);
    ads.handle_event(AdEvent::Play);
    ads.skip_linear_ad_mode();
    ads.handle_event(AdEvent::Playing);
    assert_eq!(ads.state(), AdState::ContentPlayback);

    let surface = ads.surface_mut();
    surface.paused = false;
    surface.current_time = position;
    recorder.clear();
    (ads, recorder)
}

/// Test fixture for file based tests
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file into the fixture directory
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
