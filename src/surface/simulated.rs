//! In-memory playback surface
//!
//! Behaves like a media element that never emits events on its own: the
//! host (a test, or the scenario runner) decides when `playing`, `canplay`
//! and friends are delivered. Every primitive call is recorded so callers
//! can assert on the side effects of a transition.

use crate::surface::{
    MediaSurface, Marker, ReadyState, TechAttributes, TextTrack, TrackId, TrackMode,
};
use std::collections::HashSet;

/// Simulated media element
#[derive(Debug, Clone)]
pub struct SimulatedSurface {
    pub paused: bool,
    pub ended: bool,
    pub current_time: f64,
    pub duration: f64,
    pub seekable_end: Option<f64>,
    pub ready_state: ReadyState,
    pub volume: f64,
    pub src: String,
    pub current_src: String,
    pub current_type: String,
    pub tracks: Vec<TextTrack>,

    /// `None` models an element that cannot be reached
    pub tech: Option<TechAttributes>,
    pub markers: HashSet<Marker>,
    pub placeholder_visible: bool,

    // Call log
    pub play_calls: usize,
    pub pause_calls: usize,
    pub load_calls: usize,
    pub seeks: Vec<f64>,
}

impl SimulatedSurface {
    /// Create a surface with a loaded, seekable, paused source
    pub fn new(src: &str, mime_type: &str) -> Self {
        Self {
            paused: true,
            ended: false,
            current_time: 0.0,
            duration: 60.0,
            seekable_end: Some(60.0),
            ready_state: ReadyState::HaveEnoughData,
            volume: 1.0,
            src: src.to_string(),
            current_src: src.to_string(),
            current_type: mime_type.to_string(),
            tracks: Vec::new(),
            tech: Some(TechAttributes::default()),
            markers: HashSet::new(),
            placeholder_visible: false,
            play_calls: 0,
            pause_calls: 0,
            load_calls: 0,
            seeks: Vec::new(),
        }
    }

    /// Add an out-of-band text track and return its id
    pub fn add_text_track(&mut self, mode: TrackMode) -> TrackId {
        let id = TrackId(self.tracks.len() as u32);
        self.tracks.push(TextTrack { id, mode });
        id
    }

    /// Mode of a text track, if it exists
    pub fn track_mode(&self, id: TrackId) -> Option<TrackMode> {
        self.tracks.iter().find(|t| t.id == id).map(|t| t.mode)
    }

    /// Whether a marker is currently set
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// Pretend the current source finished loading
    pub fn finish_loading(&mut self) {
        self.ready_state = ReadyState::HaveEnoughData;
        self.seekable_end = Some(if self.duration.is_finite() {
            self.duration
        } else {
            self.current_time
        });
    }

    /// Pretend playback ran to the end of the media
    pub fn run_to_end(&mut self) {
        self.current_time = self.duration;
        self.ended = true;
        self.paused = true;
    }
}

impl MediaSurface for SimulatedSurface {
    fn play(&mut self) {
        self.play_calls += 1;
        self.paused = false;
        self.ended = false;
    }

    fn pause(&mut self) {
        self.pause_calls += 1;
        self.paused = true;
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn ended(&self) -> bool {
        self.ended
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn seek(&mut self, time: f64) {
        self.seeks.push(time);
        self.current_time = time;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn seekable_end(&self) -> Option<f64> {
        self.seekable_end
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn src(&self) -> String {
        self.src.clone()
    }

    fn current_src(&self) -> String {
        self.current_src.clone()
    }

    fn current_type(&self) -> String {
        self.current_type.clone()
    }

    fn set_source(&mut self, src: &str, mime_type: &str) {
        self.src = src.to_string();
        self.current_src = src.to_string();
        self.current_type = mime_type.to_string();
        self.ready_state = ReadyState::HaveNothing;
        self.seekable_end = None;
        self.current_time = 0.0;
        self.ended = false;
    }

    fn load(&mut self) {
        self.load_calls += 1;
    }

    fn text_tracks(&self) -> Vec<TextTrack> {
        self.tracks.clone()
    }

    fn set_text_track_mode(&mut self, id: TrackId, mode: TrackMode) {
        if let Some(track) = self.tracks.iter_mut().find(|t| t.id == id) {
            track.mode = mode;
        }
    }

    fn tech_attributes(&self) -> Option<TechAttributes> {
        self.tech.clone()
    }

    fn set_native_poster(&mut self, poster: &str) {
        if let Some(tech) = self.tech.as_mut() {
            tech.poster = Some(poster.to_string());
        }
    }

    fn remove_native_poster(&mut self) {
        if let Some(tech) = self.tech.as_mut() {
            tech.poster = None;
        }
    }

    fn set_style(&mut self, style: &str) {
        if let Some(tech) = self.tech.as_mut() {
            tech.style = Some(style.to_string());
        }
    }

    fn set_marker(&mut self, marker: Marker, on: bool) {
        if on {
            self.markers.insert(marker);
        } else {
            self.markers.remove(&marker);
        }
    }

    fn set_placeholder(&mut self, visible: bool) {
        self.placeholder_visible = visible;
    }
}
