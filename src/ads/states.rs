//! Transition table and entry/exit actions
//!
//! `handle` is the only place that assigns a new state. Events a state does
//! not list are ignored. Every state that waits on an ad decision has an
//! error and timeout edge back to content, and every deadline it arms is
//! disarmed on exit.

use crate::ads::{AdEvent, AdState, AdsController, AdsEvent, TimerAction, TICK};
use crate::surface::{Marker, MediaSurface};
use log::debug;
use std::time::Duration;

/// How long `content-resuming` waits for the surface to report `ended`
/// after a postroll before synthesizing one
pub const ENDED_FALLBACK: Duration = Duration::from_millis(1000);

impl<S: MediaSurface> AdsController<S> {
    /// Run the current state's handler for `event`
    pub(super) fn handle(&mut self, event: &AdEvent) {
        use AdEvent as E;
        use AdState::*;

        match (self.state, event) {
            (ContentSet, E::AdsCanceled | E::AdsError | E::AdSkip) => {
                self.state = ContentPlayback;
            }
            (ContentSet, E::AdsReady) => self.state = AdsReady,
            (ContentSet, E::Play) => {
                self.state = AdsReadyPending;
                self.cancel_content_play();
                self.surface.remove_native_poster();
            }

            (AdsReady, E::Play) => {
                self.state = PrerollPending;
                self.cancel_content_play();
            }
            (AdsReady, E::AdSkip | E::AdsError) => self.state = ContentPlayback,

            (PrerollPending, E::AdStart) => self.state = AdPlayback,
            (PrerollPending, E::AdSkip | E::AdTimeout | E::AdsError | E::NoPreroll) => {
                self.state = ContentPlayback;
            }
            (PrerollPending, E::Play) => self.cancel_content_play(),

            (AdsReadyPending, E::AdsCanceled | E::AdSkip | E::AdTimeout | E::AdsError) => {
                self.state = ContentPlayback;
            }
            (AdsReadyPending, E::AdsReady) => self.state = PrerollPending,
            (AdsReadyPending, E::Play) => self.cancel_content_play(),

            (AdPlayback, E::AdEnd) => self.state = ContentResuming,
            (AdPlayback, E::AdsError) => {
                self.state = ContentResuming;
                self.emit(AdsEvent::AdEnd);
            }

            (ContentResuming, E::ContentUpdate { .. }) => self.state = ContentSet,
            (ContentResuming, E::ContentResumed | E::Playing | E::Ended) => {
                self.state = ContentPlayback;
            }

            (PostrollPending, E::AdStart) => self.state = AdPlayback,
            (PostrollPending, E::AdSkip | E::AdTimeout | E::AdsError) => {
                self.state = ContentResuming;
                // No ad ran, so content was never disturbed beyond its tracks
                if let Some(snapshot) = &self.snapshot {
                    snapshot.restore_tracks(&mut self.surface);
                }
                self.deferred_ended =
                    Some(self.scheduler.set(TICK, TimerAction::Emit(AdEvent::Ended)));
            }
            (PostrollPending, E::ContentUpdate { .. }) => self.state = AdsReadyPending,

            (ContentPlayback, E::AdsReady) => self.emit(AdsEvent::ReadyForPreroll),
            (ContentPlayback, E::AdStart) => self.state = AdPlayback,
            (ContentPlayback, E::ContentUpdate { .. }) => {
                self.state = if self.surface.paused() {
                    ContentSet
                } else {
                    AdsReadyPending
                };

                // A new source must not inherit the old one's ended state
                if self.snapshot.as_ref().is_some_and(|s| s.ended) {
                    self.snapshot = None;
                }
            }
            (ContentPlayback, E::ContentEnded) => {
                // Postroll already handled for this content
                if self.snapshot.as_ref().is_some_and(|s| s.ended) {
                    return;
                }
                self.state = PostrollPending;
            }
            (ContentPlayback, E::Play) => {
                if self.source.content_src() != self.surface.current_src() {
                    self.cancel_content_play();
                }
            }

            _ => {}
        }
    }

    /// Entry action of `state`
    pub(super) fn enter(&mut self, state: AdState) {
        match state {
            AdState::PrerollPending => {
                if self.nopreroll {
                    // Starts the integration in case there are later ads
                    self.emit(AdsEvent::ReadyForPreroll);
                    // Entering content-playback right away would disarm the
                    // guard before its pause lands
                    self.scheduler.set(TICK, TimerAction::Emit(AdEvent::NoPreroll));
                } else {
                    self.surface.set_marker(Marker::AdLoading, true);
                    self.ad_timeout = Some(self.scheduler.set(
                        self.config.preroll_deadline(),
                        TimerAction::Emit(AdEvent::AdTimeout),
                    ));
                    self.emit(AdsEvent::ReadyForPreroll);
                }
            }
            AdState::AdsReadyPending => {
                self.surface.set_marker(Marker::AdLoading, true);
                self.ad_timeout = Some(self.scheduler.set(
                    self.config.ads_ready_deadline(),
                    TimerAction::Emit(AdEvent::AdTimeout),
                ));
            }
            AdState::AdPlayback => {
                self.content_behind_ad = self.should_play_content_behind_ad();
                if self.content_behind_ad {
                    self.pre_ad_volume = Some(self.surface.volume());
                    self.surface.set_volume(0.0);
                } else {
                    self.take_snapshot();
                }

                self.surface.set_marker(Marker::AdLoading, false);
                self.surface.set_marker(Marker::AdPlaying, true);
                self.surface.remove_native_poster();

                // Releasing right away could undo the guard's pause and let
                // content play behind the ad
                if self.guard.is_pending() {
                    self.scheduler.set(TICK, TimerAction::ReleaseGuard);
                }
            }
            AdState::ContentResuming => {
                if self.snapshot.as_ref().is_some_and(|s| s.ended) {
                    self.disarm_fire_ended();
                    self.fire_ended_timeout = Some(
                        self.scheduler
                            .set(ENDED_FALLBACK, TimerAction::Emit(AdEvent::Ended)),
                    );
                }
            }
            AdState::PostrollPending => {
                self.take_snapshot();
                if self.nopostroll {
                    self.scheduler.set(TICK, TimerAction::ForceContentResuming);
                } else {
                    self.surface.set_marker(Marker::AdLoading, true);
                    self.ad_timeout = Some(self.scheduler.set(
                        self.config.postroll_deadline(),
                        TimerAction::Emit(AdEvent::AdTimeout),
                    ));
                }
            }
            AdState::ContentPlayback => {
                self.guard.disarm(&mut self.scheduler);
                self.surface.set_marker(Marker::AdLoading, false);

                if self.guard.take_cancelled_play() && self.surface.paused() {
                    debug!("Resuming content paused by the play guard");
                    self.surface.play();
                }
            }
            AdState::ContentSet | AdState::AdsReady => {}
        }
    }

    /// Exit action of `state`
    pub(super) fn leave(&mut self, state: AdState) {
        match state {
            AdState::PrerollPending => self.disarm_ad_timeout(),
            AdState::AdsReadyPending | AdState::PostrollPending => {
                self.disarm_ad_timeout();
                self.surface.set_marker(Marker::AdLoading, false);
            }
            AdState::AdPlayback => {
                self.surface.set_marker(Marker::AdPlaying, false);

                if std::mem::take(&mut self.content_behind_ad) {
                    if let Some(volume) = self.pre_ad_volume.take() {
                        self.surface.set_volume(volume);
                    }
                } else {
                    self.restore_snapshot();
                }
            }
            AdState::ContentResuming => {
                self.disarm_fire_ended();
                if let Some(id) = self.deferred_ended.take() {
                    self.scheduler.clear(id);
                }
            }
            AdState::ContentSet | AdState::AdsReady | AdState::ContentPlayback => {}
        }
    }

    fn disarm_ad_timeout(&mut self) {
        if let Some(id) = self.ad_timeout.take() {
            self.scheduler.clear(id);
        }
    }

    fn disarm_fire_ended(&mut self) {
        if let Some(id) = self.fire_ended_timeout.take() {
            self.scheduler.clear(id);
        }
    }
}
