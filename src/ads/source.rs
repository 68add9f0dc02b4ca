//! Content source change detection
//!
//! Raises a normalized `contentupdate` whenever the surface starts loading a
//! source other than the tracked content source, except while an ad owns
//! the surface. This is the only writer of the tracked source after setup.

use crate::ads::{AdEvent, AdState, AdsController, AdsEvent};
use crate::surface::MediaSurface;
use log::info;

#[derive(Debug)]
pub(crate) struct SourceChangeDetector {
    content_src: String,
}

impl SourceChangeDetector {
    pub(crate) fn new(content_src: String) -> Self {
        Self { content_src }
    }

    pub(crate) fn content_src(&self) -> &str {
        &self.content_src
    }

    /// Compare `current_src` against the tracked source
    pub(crate) fn check(&mut self, state: AdState, current_src: String) -> Option<AdEvent> {
        if state == AdState::AdPlayback || current_src == self.content_src {
            return None;
        }

        let old_value = std::mem::replace(&mut self.content_src, current_src.clone());
        Some(AdEvent::ContentUpdate {
            old_value,
            new_value: current_src,
        })
    }
}

impl<S: MediaSurface> AdsController<S> {
    /// Run on `loadstart` and once shortly after startup
    pub(super) fn check_source(&mut self) {
        let current = self.surface.current_src();
        if let Some(event) = self.source.check(self.state, current) {
            if let AdEvent::ContentUpdate { old_value, new_value } = &event {
                info!("Content source changed: {:?} -> {:?}", old_value, new_value);
                self.emit(AdsEvent::ContentUpdate {
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                });
            }
            self.handle_event(event);
        }
    }
}
