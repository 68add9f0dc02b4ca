//! Playback context tagging for surface events
//!
//! The surface plays both ads and content, so its native events are
//! ambiguous. Collaborators get each one re-emitted with the context it
//! happened in.

use crate::ads::AdState;

/// Playback context of a re-emitted surface event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventContext {
    /// Happened while an ad owned the surface
    Ad,

    /// Happened while content was being restored after an ad
    Content,

    /// Ordinary content playback
    Plain,
}

impl EventContext {
    /// Context of a surface event observed in `state`
    ///
    /// Stitched ads play inside the content stream, so their surface events
    /// are indistinguishable from content and stay untagged.
    pub fn for_state(state: AdState, stitched_ads: bool) -> Self {
        match state {
            AdState::AdPlayback if !stitched_ads => EventContext::Ad,
            AdState::ContentResuming => EventContext::Content,
            _ => EventContext::Plain,
        }
    }

    /// Event name as seen by collaborators, e.g. `adplaying`
    pub fn prefixed(&self, event: &str) -> String {
        match self {
            EventContext::Ad => format!("ad{}", event),
            EventContext::Content => format!("content{}", event),
            EventContext::Plain => event.to_string(),
        }
    }
}
