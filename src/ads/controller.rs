//! Ads controller implementation for adsequencer
//!
//! This module provides the AdsController that owns all per-player ad
//! state, funnels surface and integration events through the state machine
//! one at a time, and drives the virtual clock its timers run on.

use crate::ads::guard::ContentPlayGuard;
use crate::ads::snapshot::RestoreJob;
use crate::ads::source::SourceChangeDetector;
use crate::ads::{
    AdEvent, AdState, AdsEvent, AdsEventHandler, EventContext, PlayerSnapshot, Scheduler,
    TimerAction, TimerId, TICK,
};
use crate::surface::MediaSurface;
use crate::utils::config::AdsConfig;
use crate::utils::format_clock;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use std::collections::VecDeque;
use std::time::Duration;

/// Per-player ad sequencing state
pub struct AdsController<S: MediaSurface> {
    pub(super) surface: S,
    pub(super) config: AdsConfig,

    // State machine
    pub(super) state: AdState,
    pub(super) snapshot: Option<PlayerSnapshot>,
    pub(super) restore: Option<RestoreJob>,
    pub(super) guard: ContentPlayGuard,
    pub(super) source: SourceChangeDetector,

    /// Volume to put back when content kept playing muted behind an ad
    pub(super) pre_ad_volume: Option<f64>,

    /// Content stayed on the surface during the current ad
    pub(super) content_behind_ad: bool,

    // Latched opt-outs
    pub(super) nopreroll: bool,
    pub(super) nopostroll: bool,

    pub(super) disable_next_snapshot_restore: bool,

    // Deadline timers
    pub(super) ad_timeout: Option<TimerId>,
    pub(super) fire_ended_timeout: Option<TimerId>,

    /// Synthetic `ended` after a `postroll?` exit without an ad
    pub(super) deferred_ended: Option<TimerId>,

    pub(super) scheduler: Scheduler,

    // Dispatch
    queue: VecDeque<AdEvent>,
    dispatching: bool,

    // Outbound events
    handlers: Vec<Box<dyn AdsEventHandler>>,
    subscribers: Vec<Sender<AdsEvent>>,
}

impl<S: MediaSurface> AdsController<S> {
    /// Attach a controller to a playback surface
    ///
    /// The surface's current source becomes the tracked content source, and
    /// a source check runs one tick later to catch a source already loading.
    pub fn new(surface: S, config: AdsConfig) -> Self {
        let content_src = surface.current_src();
        let mut scheduler = Scheduler::new();
        scheduler.set(TICK, TimerAction::CheckSource);

        info!("Ads controller attached to {:?}", content_src);

        Self {
            surface,
            config,
            state: AdState::ContentSet,
            snapshot: None,
            restore: None,
            guard: ContentPlayGuard::default(),
            source: SourceChangeDetector::new(content_src),
            pre_ad_volume: None,
            content_behind_ad: false,
            nopreroll: false,
            nopostroll: false,
            disable_next_snapshot_restore: false,
            ad_timeout: None,
            fire_ended_timeout: None,
            deferred_ended: None,
            scheduler,
            queue: VecDeque::new(),
            dispatching: false,
            handlers: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Deliver an event
    ///
    /// Each event runs to completion (handler, exit, entry) before the next
    /// one starts. Events raised while another is being processed wait in
    /// line behind it.
    pub fn handle_event(&mut self, event: AdEvent) {
        self.queue.push_back(event);
        if self.dispatching {
            return;
        }

        self.dispatching = true;
        while let Some(event) = self.queue.pop_front() {
            self.process_event(event);
        }
        self.dispatching = false;
    }

    /// Advance the virtual clock, firing every timer that comes due
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now().saturating_add(by);
        while let Some((id, action)) = self.scheduler.pop_due(target) {
            self.fire(id, action);
        }
        self.scheduler.advance_to(target);
    }

    /// Time left until the next armed timer
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.scheduler.now()))
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    fn process_event(&mut self, event: AdEvent) {
        match event {
            AdEvent::NoPreroll => self.nopreroll = true,
            AdEvent::NoPostroll => self.nopostroll = true,
            AdEvent::ContentUpdate { .. } => self.cancel_restore(),
            _ => {}
        }

        let previous = self.state;

        if event.is_native() {
            self.emit(AdsEvent::Redispatched {
                context: EventContext::for_state(previous, self.config.stitched_ads),
                event: event.name(),
            });
        }
        self.guard.observe(&event, &mut self.surface);
        self.observe_restore(&event);

        self.handle(&event);

        if self.state != previous {
            let next = self.state;

            self.state = previous;
            self.leave(previous);
            self.state = next;

            if self.config.debug {
                info!("{} triggered: {} -> {}", event.name(), previous, next);
            } else {
                debug!("{} triggered: {} -> {}", event.name(), previous, next);
            }
            self.emit(AdsEvent::StateChanged {
                from: previous,
                to: next,
                event: event.name(),
            });

            self.enter(next);
        }

        match event {
            AdEvent::LoadStart => self.check_source(),
            AdEvent::Ended if previous == AdState::ContentPlayback => {
                self.handle_event(AdEvent::ContentEnded)
            }
            _ => {}
        }
    }

    fn fire(&mut self, id: TimerId, action: TimerAction) {
        if self.ad_timeout == Some(id) {
            self.ad_timeout = None;
        }
        if self.fire_ended_timeout == Some(id) {
            self.fire_ended_timeout = None;
        }
        if self.deferred_ended == Some(id) {
            self.deferred_ended = None;
        }

        debug!("[{}] timer fired: {:?}", format_clock(self.scheduler.now()), action);

        match action {
            TimerAction::Emit(event) => self.handle_event(event),
            TimerAction::CancelContentPlay => self.guard.fire(&mut self.surface),
            TimerAction::ReleaseGuard => self.guard.disarm(&mut self.scheduler),
            TimerAction::ForceContentResuming => {
                // Skips postroll? exit and content-resuming entry
                if self.state == AdState::PostrollPending {
                    if let Some(snapshot) = &self.snapshot {
                        snapshot.restore_tracks(&mut self.surface);
                    }
                    self.state = AdState::ContentResuming;
                    self.handle_event(AdEvent::Ended);
                }
            }
            TimerAction::TryToResume => self.try_to_resume(),
            TimerAction::CheckSource => self.check_source(),
        }
    }

    /// Send an outbound event to handlers and subscribers
    pub(super) fn emit(&mut self, event: AdsEvent) {
        for handler in self.handlers.iter_mut() {
            handler.handle_event(event.clone());
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Register an outbound event handler
    pub fn add_event_handler(&mut self, handler: Box<dyn AdsEventHandler>) {
        self.handlers.push(handler);
    }

    /// Receive outbound events on a channel
    pub fn subscribe(&mut self) -> Receiver<AdsEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Enter linear ad mode on behalf of an ad integration
    pub fn start_linear_ad_mode(&mut self) {
        if matches!(
            self.state,
            AdState::PrerollPending | AdState::PostrollPending | AdState::ContentPlayback
        ) {
            self.emit(AdsEvent::AdStart);
            self.handle_event(AdEvent::AdStart);
        }
    }

    /// Leave linear ad mode on behalf of an ad integration
    pub fn end_linear_ad_mode(&mut self) {
        if self.state == AdState::AdPlayback {
            self.emit(AdsEvent::AdEnd);
            self.handle_event(AdEvent::AdEnd);
        }
    }

    /// Skip the pending ad break on behalf of an ad integration
    pub fn skip_linear_ad_mode(&mut self) {
        if self.state != AdState::AdPlayback {
            self.emit(AdsEvent::AdSkip);
            self.handle_event(AdEvent::AdSkip);
        }
    }

    /// Skip exactly one upcoming snapshot restore
    pub fn disable_next_snapshot_restore(&mut self) {
        self.disable_next_snapshot_restore = true;
    }

    /// Whether content keeps playing (muted) behind ads
    pub fn should_play_content_behind_ad(&self) -> bool {
        self.config.live_cue_points
            && !self.config.live_offset_tracking
            && self.surface.is_live()
    }

    pub fn state(&self) -> AdState {
        self.state
    }

    pub fn is_in_ad_mode(&self) -> bool {
        self.state.is_ad_mode()
    }

    pub fn is_ad_playing(&self) -> bool {
        self.state == AdState::AdPlayback
    }

    pub fn is_content_resuming(&self) -> bool {
        self.state == AdState::ContentResuming
    }

    pub fn snapshot(&self) -> Option<&PlayerSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn content_src(&self) -> &str {
        self.source.content_src()
    }

    pub fn stitched_ads(&self) -> bool {
        self.config.stitched_ads
    }

    pub fn config(&self) -> &AdsConfig {
        &self.config
    }

    /// Whether an ad-wait or synthetic-ended timer is armed
    pub fn has_deadline_armed(&self) -> bool {
        self.ad_timeout.is_some()
            || self.fire_ended_timeout.is_some()
            || self.deferred_ended.is_some()
    }

    /// Whether a content-play guard is in flight
    pub fn has_pending_guard(&self) -> bool {
        self.guard.is_pending()
    }

    /// Whether a guarded pause fired and has not been resumed yet
    pub fn cancelled_play(&self) -> bool {
        self.guard.cancelled_play()
    }

    /// Whether a recycled-surface restore is still waiting on the surface
    pub fn is_restoring(&self) -> bool {
        self.restore.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
