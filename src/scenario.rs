//! Scripted scenarios for the ads controller
//!
//! A scenario sets up a [`SimulatedSurface`] and then plays a list of steps
//! against an [`AdsController`]: deliver events, let time pass, poke the
//! surface, call the linear-ad API and check the resulting state. Scripts
//! are JSON or TOML.

use crate::ads::{AdEvent, AdState, AdsController};
use crate::surface::{ReadyState, SimulatedSurface, TrackMode};
use crate::utils::config::AdsConfig;
use crate::utils::error::{AdsError, IntoAdsError, Result};
use log::info;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Surface settings, applied at setup or by a `surface` step
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SurfacePatch {
    pub src: Option<String>,
    pub current_src: Option<String>,
    pub mime_type: Option<String>,
    pub paused: Option<bool>,
    pub ended: Option<bool>,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
    pub live: Option<bool>,
    pub seekable_end: Option<f64>,
    pub ready_state: Option<ReadyState>,
    pub volume: Option<f64>,
    pub poster: Option<String>,

    /// Text tracks to add, by initial mode
    pub text_tracks: Vec<TrackMode>,
}

impl SurfacePatch {
    /// Reject values no media element could report
    pub fn validate(&self) -> Result<()> {
        if let Some(volume) = self.volume {
            if !(0.0..=1.0).contains(&volume) {
                return Err(AdsError::InvalidInput(format!(
                    "volume {} is outside 0.0..=1.0",
                    volume
                )));
            }
        }

        for (name, value) in [
            ("current_time", self.current_time),
            ("duration", self.duration),
            ("seekable_end", self.seekable_end),
        ] {
            if value.is_some_and(|v| v.is_nan() || v < 0.0) {
                return Err(AdsError::InvalidInput(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn apply(&self, surface: &mut SimulatedSurface) {
        if let Some(src) = &self.src {
            surface.src = src.clone();
            surface.current_src = src.clone();
        }
        if let Some(current_src) = &self.current_src {
            surface.current_src = current_src.clone();
        }
        if let Some(mime_type) = &self.mime_type {
            surface.current_type = mime_type.clone();
        }
        if let Some(paused) = self.paused {
            surface.paused = paused;
        }
        if let Some(ended) = self.ended {
            surface.ended = ended;
        }
        if let Some(current_time) = self.current_time {
            surface.current_time = current_time;
        }
        if let Some(duration) = self.duration {
            surface.duration = duration;
        }
        match self.live {
            Some(true) => surface.duration = f64::INFINITY,
            Some(false) if surface.duration.is_infinite() => surface.duration = 60.0,
            _ => {}
        }
        if let Some(end) = self.seekable_end {
            surface.seekable_end = Some(end);
        }
        if let Some(ready_state) = self.ready_state {
            surface.ready_state = ready_state;
        }
        if let Some(volume) = self.volume {
            surface.volume = volume;
        }
        if let Some(poster) = &self.poster {
            if let Some(tech) = surface.tech.as_mut() {
                tech.poster = Some(poster.clone());
            }
        }
        for mode in &self.text_tracks {
            surface.add_text_track(*mode);
        }
    }
}

/// One scripted step
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Deliver an event to the controller
    Event { event: AdEvent },

    /// Let virtual time pass
    Advance { ms: u64 },

    /// Change the simulated surface
    Surface(SurfacePatch),

    /// The current source finished loading
    FinishLoading,

    /// Content played to its end
    RunToEnd,

    StartLinearAdMode,
    EndLinearAdMode,
    SkipLinearAdMode,

    /// Fail unless the controller is in `state`
    Expect { state: AdState },
}

/// A scenario script
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub surface: SurfacePatch,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load a scenario, parsed as JSON for `.json` and TOML otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&contents)
        } else {
            let scenario: Self =
                toml::from_str(&contents).scenario_err("Failed to parse scenario")?;
            scenario.validate()?;
            Ok(scenario)
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let scenario: Self =
            serde_json::from_str(contents).scenario_err("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the setup and every surface step
    pub fn validate(&self) -> Result<()> {
        self.surface.validate()?;
        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Surface(patch) = step {
                patch
                    .validate()
                    .map_err(|e| AdsError::Scenario(format!("step {}: {}", index, e)))?;
            }
        }
        Ok(())
    }

    /// Build a controller over a surface prepared from the scenario setup
    pub fn controller(&self, config: AdsConfig) -> AdsController<SimulatedSurface> {
        let mut surface = SimulatedSurface::new("content.mp4", "video/mp4");
        self.surface.apply(&mut surface);
        AdsController::new(surface, config)
    }

    /// Run every step on the virtual clock
    pub fn run(&self, ads: &mut AdsController<SimulatedSurface>) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if let Some(elapsed) = apply_step(ads, index, step)? {
                ads.advance(elapsed);
            }
        }
        Ok(())
    }

    /// Run every step, sleeping through `advance` steps on the tokio clock
    pub async fn run_realtime(&self, ads: &mut AdsController<SimulatedSurface>) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            let Some(mut remaining) = apply_step(ads, index, step)? else {
                continue;
            };

            // Wake for every timer so side effects land on time
            while !remaining.is_zero() {
                let slice = ads
                    .time_until_next_timer()
                    .map_or(remaining, |next| next.min(remaining));
                tokio::time::sleep(slice).await;
                ads.advance(slice);
                remaining -= slice;
            }
        }
        Ok(())
    }
}

/// Apply one step; returns how much time it asks to pass
fn apply_step(
    ads: &mut AdsController<SimulatedSurface>,
    index: usize,
    step: &Step,
) -> Result<Option<Duration>> {
    match step {
        Step::Event { event } => {
            info!("step {}: deliver {}", index, event.name());
            ads.handle_event(event.clone());
        }
        Step::Advance { ms } => return Ok(Some(Duration::from_millis(*ms))),
        Step::Surface(patch) => patch.apply(ads.surface_mut()),
        Step::FinishLoading => ads.surface_mut().finish_loading(),
        Step::RunToEnd => ads.surface_mut().run_to_end(),
        Step::StartLinearAdMode => ads.start_linear_ad_mode(),
        Step::EndLinearAdMode => ads.end_linear_ad_mode(),
        Step::SkipLinearAdMode => ads.skip_linear_ad_mode(),
        Step::Expect { state } => {
            if ads.state() != *state {
                return Err(AdsError::Scenario(format!(
                    "step {}: expected state {} but was {}",
                    index,
                    state,
                    ads.state()
                )));
            }
        }
    }
    Ok(None)
}
