//! Content-play guard
//!
//! While the sequencer is still deciding whether an ad plays, a `play` on
//! the surface must not turn into visible or audible content. The guard
//! pauses the surface one tick after the request and remembers that it did,
//! so `content-playback` can resume later. At most one guard is in flight;
//! extra requests while one is pending are dropped.

use crate::ads::{AdEvent, AdsController, Scheduler, TimerAction, TimerId, TICK};
use crate::surface::MediaSurface;
use log::debug;

#[derive(Debug, Default)]
pub(crate) struct ContentPlayGuard {
    /// Armed guard timer; its presence means a guard is in flight
    pending: Option<TimerId>,

    /// A guarded pause actually happened
    cancelled_play: bool,

    /// The surface is hidden behind a placeholder
    placeholder: bool,
}

impl ContentPlayGuard {
    /// Arm the guard, returning false when one is already pending
    pub(crate) fn arm<S: MediaSurface + ?Sized>(
        &mut self,
        scheduler: &mut Scheduler,
        surface: &mut S,
        hide_surface: bool,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }

        if hide_surface && !self.placeholder {
            surface.set_placeholder(true);
            self.placeholder = true;
        }

        self.pending = Some(scheduler.set(TICK, TimerAction::CancelContentPlay));
        true
    }

    /// Guard timer fired
    pub(crate) fn fire<S: MediaSurface + ?Sized>(&mut self, surface: &mut S) {
        // Cleared first so a later play can arm again
        self.pending = None;

        if !surface.paused() {
            surface.pause();
        }
        self.cancelled_play = true;
    }

    /// Disarm a pending guard without pausing
    pub(crate) fn disarm(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.clear(id);
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn cancelled_play(&self) -> bool {
        self.cancelled_play
    }

    /// Consume the record of a guarded pause
    pub(crate) fn take_cancelled_play(&mut self) -> bool {
        std::mem::take(&mut self.cancelled_play)
    }

    /// Unhide the surface once an ad decision has been made
    pub(crate) fn observe<S: MediaSurface + ?Sized>(&mut self, event: &AdEvent, surface: &mut S) {
        if !self.placeholder {
            return;
        }

        let decided = matches!(
            event,
            AdEvent::AdStart
                | AdEvent::AdTimeout
                | AdEvent::AdsError
                | AdEvent::AdsCanceled
                | AdEvent::AdSkip
                | AdEvent::Playing
                | AdEvent::FullscreenChange
        );

        if decided {
            debug!("Removing content placeholder after {}", event.name());
            surface.set_placeholder(false);
            self.placeholder = false;
        }
    }
}

impl<S: MediaSurface> AdsController<S> {
    /// Prevent a content `play` from taking effect while ads are undecided
    pub(super) fn cancel_content_play(&mut self) {
        let hide = self.config.hide_surface_during_guard;
        if self.guard.arm(&mut self.scheduler, &mut self.surface, hide) {
            debug!("Content play guard armed");
        }
    }
}
