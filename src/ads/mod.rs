//! Ad sequencing module for adsequencer
//!
//! This module decides, for a playback surface shared by content and ads,
//! whether the viewer is watching content, waiting on an ad decision or
//! watching an ad, and performs the side effects each transition requires
//! (pausing, muting, snapshot capture and restore, source swaps).
//!
//! Events are processed one at a time by [`AdsController::handle_event`]:
//! the current state's handler picks the next state, then the old state's
//! exit action runs, then the new state's entry action. Anything a handler
//! wants to raise as a consequence is either queued behind the current
//! event or scheduled for the next tick on the controller's virtual clock.

mod controller;
mod guard;
mod redispatch;
mod snapshot;
mod source;
mod states;
mod timers;

pub use controller::AdsController;
pub use redispatch::EventContext;
pub use snapshot::{PlayerSnapshot, SuppressedTrack};
pub use timers::{Scheduler, TimerAction, TimerId, TICK};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ad playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdState {
    /// Content source is set, nothing has happened yet
    #[serde(rename = "content-set")]
    ContentSet,

    /// Ad integration is ready, content has not been played
    #[serde(rename = "ads-ready")]
    AdsReady,

    /// Waiting for the integration to start a preroll
    #[serde(rename = "preroll?")]
    PrerollPending,

    /// Play was requested before the integration reported ready
    #[serde(rename = "ads-ready?")]
    AdsReadyPending,

    /// A linear ad is playing on the surface
    #[serde(rename = "ad-playback")]
    AdPlayback,

    /// An ad ended, content is being put back
    #[serde(rename = "content-resuming")]
    ContentResuming,

    /// Content ended, waiting for the integration to start a postroll
    #[serde(rename = "postroll?")]
    PostrollPending,

    /// Content is playing
    #[serde(rename = "content-playback")]
    ContentPlayback,
}

impl AdState {
    /// Every state, in declaration order
    pub const ALL: [AdState; 8] = [
        AdState::ContentSet,
        AdState::AdsReady,
        AdState::PrerollPending,
        AdState::AdsReadyPending,
        AdState::AdPlayback,
        AdState::ContentResuming,
        AdState::PostrollPending,
        AdState::ContentPlayback,
    ];

    /// Wire name of the state
    pub fn name(&self) -> &'static str {
        match self {
            AdState::ContentSet => "content-set",
            AdState::AdsReady => "ads-ready",
            AdState::PrerollPending => "preroll?",
            AdState::AdsReadyPending => "ads-ready?",
            AdState::AdPlayback => "ad-playback",
            AdState::ContentResuming => "content-resuming",
            AdState::PostrollPending => "postroll?",
            AdState::ContentPlayback => "content-playback",
        }
    }

    /// Whether the player is in ad mode in this state
    pub fn is_ad_mode(&self) -> bool {
        matches!(
            self,
            AdState::AdsReadyPending
                | AdState::PrerollPending
                | AdState::AdPlayback
                | AdState::PostrollPending
                | AdState::ContentResuming
        )
    }
}

impl fmt::Display for AdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inbound event consumed by the sequencer
///
/// The first group comes from the playback surface, the second from ad
/// integrations or is synthesized internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdEvent {
    Play,
    Pause,
    Ended,
    LoadStart,
    Playing,
    LoadedMetadata,
    CanPlay,
    FullscreenChange,

    AdsReady,
    AdsError,
    AdsCanceled,
    AdStart,
    AdEnd,
    AdSkip,
    AdTimeout,
    NoPreroll,
    NoPostroll,
    ContentUpdate {
        #[serde(rename = "oldValue")]
        old_value: String,
        #[serde(rename = "newValue")]
        new_value: String,
    },
    ContentEnded,
    ContentResumed,
}

impl AdEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            AdEvent::Play => "play",
            AdEvent::Pause => "pause",
            AdEvent::Ended => "ended",
            AdEvent::LoadStart => "loadstart",
            AdEvent::Playing => "playing",
            AdEvent::LoadedMetadata => "loadedmetadata",
            AdEvent::CanPlay => "canplay",
            AdEvent::FullscreenChange => "fullscreenchange",
            AdEvent::AdsReady => "adsready",
            AdEvent::AdsError => "adserror",
            AdEvent::AdsCanceled => "adscanceled",
            AdEvent::AdStart => "adstart",
            AdEvent::AdEnd => "adend",
            AdEvent::AdSkip => "adskip",
            AdEvent::AdTimeout => "adtimeout",
            AdEvent::NoPreroll => "nopreroll",
            AdEvent::NoPostroll => "nopostroll",
            AdEvent::ContentUpdate { .. } => "contentupdate",
            AdEvent::ContentEnded => "contentended",
            AdEvent::ContentResumed => "contentresumed",
        }
    }

    /// Whether the event originates from the playback surface
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            AdEvent::Play
                | AdEvent::Pause
                | AdEvent::Ended
                | AdEvent::LoadStart
                | AdEvent::Playing
                | AdEvent::LoadedMetadata
                | AdEvent::CanPlay
                | AdEvent::FullscreenChange
        )
    }
}

/// Outbound event for collaborators observing the sequencer
#[derive(Debug, Clone, PartialEq)]
pub enum AdsEvent {
    /// The integration may start a preroll now
    ReadyForPreroll,

    /// Linear ad mode started
    AdStart,

    /// Linear ad mode ended
    AdEnd,

    /// Ad break skipped
    AdSkip,

    /// The content source changed outside the sequencer's control
    ContentUpdate { old_value: String, new_value: String },

    /// A transition completed
    StateChanged {
        from: AdState,
        to: AdState,
        event: &'static str,
    },

    /// A surface event re-emitted with its playback context
    Redispatched {
        context: EventContext,
        event: &'static str,
    },
}

/// Handler for outbound sequencer events
pub trait AdsEventHandler: Send {
    /// Handle an outbound event
    ///
    /// # Arguments
    ///
    /// * `event` - Outbound event
    fn handle_event(&mut self, event: AdsEvent);
}
