//! Playback surface module for adsequencer
//!
//! The playback surface is the single media element shared by content and
//! ads. The ad sequencer only drives it through the [`MediaSurface`] trait,
//! so hosts can plug in a real player while tests and the CLI use
//! [`SimulatedSurface`].

mod simulated;

pub use simulated::SimulatedSurface;

use serde::{Deserialize, Serialize};

/// Identifier of an out-of-band text track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

/// Text track display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    /// Track is not loaded or rendered
    Disabled,

    /// Track is loaded but cues are not rendered
    Hidden,

    /// Track cues are rendered
    Showing,
}

/// An out-of-band text track as seen on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrack {
    pub id: TrackId,
    pub mode: TrackMode,
}

/// How much media data the surface has
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Presentation attributes of the underlying media element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechAttributes {
    /// Native poster attribute
    pub poster: Option<String>,

    /// Inline style attribute
    pub style: Option<String>,
}

/// Visual state markers toggled on the surface container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Waiting to find out whether an ad plays
    AdLoading,

    /// An ad is playing
    AdPlaying,
}

impl Marker {
    /// Class name a DOM-backed host would toggle
    pub fn class_name(&self) -> &'static str {
        match self {
            Marker::AdLoading => "vjs-ad-loading",
            Marker::AdPlaying => "vjs-ad-playing",
        }
    }
}

/// Host playback surface primitives used by the ad sequencer
pub trait MediaSurface {
    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Whether playback is paused
    fn paused(&self) -> bool;

    /// Whether playback reached the end of the media
    fn ended(&self) -> bool;

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Seek to a position
    ///
    /// # Arguments
    ///
    /// * `time` - Target position in seconds
    fn seek(&mut self, time: f64);

    /// Media duration in seconds, infinite for live streams
    fn duration(&self) -> f64;

    /// Whether the current media is a live stream
    fn is_live(&self) -> bool {
        self.duration().is_infinite()
    }

    /// End of the first seekable range, `None` when nothing is seekable
    fn seekable_end(&self) -> Option<f64>;

    /// Current ready state of the media element
    fn ready_state(&self) -> ReadyState;

    /// Volume level (0.0 to 1.0)
    fn volume(&self) -> f64;

    /// Set volume
    ///
    /// # Arguments
    ///
    /// * `volume` - Volume level (0.0 to 1.0)
    fn set_volume(&mut self, volume: f64);

    /// Source attribute of the media element
    fn src(&self) -> String;

    /// Resolved source the element is actually playing
    fn current_src(&self) -> String;

    /// MIME type of the current source
    fn current_type(&self) -> String;

    /// Replace the source attribute
    ///
    /// # Arguments
    ///
    /// * `src` - Source URL
    /// * `mime_type` - MIME type of the source
    fn set_source(&mut self, src: &str, mime_type: &str);

    /// Force the element to pick up a changed source
    fn load(&mut self);

    /// Out-of-band text tracks in index order
    fn text_tracks(&self) -> Vec<TextTrack>;

    /// Change a text track's mode
    fn set_text_track_mode(&mut self, id: TrackId, mode: TrackMode);

    /// Presentation attributes, `None` when the element is not reachable
    fn tech_attributes(&self) -> Option<TechAttributes>;

    /// Set the native poster attribute
    fn set_native_poster(&mut self, poster: &str);

    /// Strip the native poster attribute
    fn remove_native_poster(&mut self);

    /// Set the inline style attribute
    fn set_style(&mut self, style: &str);

    /// Toggle a visual state marker
    fn set_marker(&mut self, marker: Marker, on: bool);

    /// Hide the surface behind a same-sized opaque placeholder, or undo it
    fn set_placeholder(&mut self, visible: bool);
}
