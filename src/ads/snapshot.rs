//! Player snapshot capture and restore
//!
//! An ad that plays on the content's own surface clobbers its source,
//! position, tracks and presentation. Before the ad a [`PlayerSnapshot`] is
//! captured; afterwards it is restored so content picks up where it left
//! off. When the ad swapped the source (a recycled surface), restoring means
//! reloading the content source and waiting until it is seekable before
//! seeking and resuming.

use crate::ads::{AdEvent, AdsController, Scheduler, TimerAction, TimerId};
use crate::surface::{MediaSurface, ReadyState, TrackId, TrackMode};
use crate::utils::error::{AdsError, Result};
use log::{debug, warn};
use std::time::Duration;

/// Polling interval while waiting for restored content to become seekable
pub const RESUME_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of polls before resuming regardless
pub const RESUME_ATTEMPTS: u32 = 20;

/// Start polling even if `canplay` never arrives
pub const CANPLAY_FALLBACK: Duration = Duration::from_millis(2000);

/// A text track that was disabled for the snapshot's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressedTrack {
    pub id: TrackId,

    /// Mode to put back on restore
    pub mode: TrackMode,
}

/// Minimal playback state needed to resume content after an ad
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub ended: bool,
    pub current_src: String,
    pub src: String,

    /// Position in seconds; with live offset tracking, a non-positive
    /// offset behind the live edge
    pub current_time: f64,
    pub mime_type: String,
    pub native_poster: Option<String>,
    pub style: Option<String>,
    pub suppressed_tracks: Vec<SuppressedTrack>,
}

impl PlayerSnapshot {
    /// Capture the surface state and disable every out-of-band text track
    ///
    /// `previous` is the snapshot being replaced, if any. Tracks it had
    /// already disabled keep their original mode instead of `Disabled`.
    pub fn capture<S: MediaSurface + ?Sized>(
        surface: &mut S,
        live_offset_tracking: bool,
        previous: Option<&PlayerSnapshot>,
    ) -> Self {
        let current_time = if live_offset_tracking && surface.is_live() {
            match surface.seekable_end() {
                Some(live_edge) => surface.current_time() - live_edge,
                None => surface.current_time(),
            }
        } else {
            surface.current_time()
        };

        let (native_poster, style) = match surface.tech_attributes() {
            Some(tech) => (tech.poster, tech.style),
            None => (None, None),
        };

        // Read the whole collection before touching any mode
        let tracks = surface.text_tracks();
        let mut suppressed_tracks = Vec::with_capacity(tracks.len());
        for track in tracks.iter().rev() {
            let inherited = previous
                .filter(|_| track.mode == TrackMode::Disabled)
                .and_then(|p| p.suppressed_tracks.iter().find(|s| s.id == track.id))
                .map(|s| s.mode);

            suppressed_tracks.push(SuppressedTrack {
                id: track.id,
                mode: inherited.unwrap_or(track.mode),
            });
            surface.set_text_track_mode(track.id, TrackMode::Disabled);
        }

        Self {
            ended: surface.ended(),
            current_src: surface.current_src(),
            src: surface.src(),
            current_time,
            mime_type: surface.current_type(),
            native_poster,
            style,
            suppressed_tracks,
        }
    }

    /// Whether the ad swapped the source out from under this snapshot
    pub fn recycled_on<S: MediaSurface + ?Sized>(&self, surface: &S) -> bool {
        surface.src() != self.src || surface.current_src() != self.current_src
    }

    /// Put every suppressed track back to its original mode
    pub fn restore_tracks<S: MediaSurface + ?Sized>(&self, surface: &mut S) {
        for track in &self.suppressed_tracks {
            surface.set_text_track_mode(track.id, track.mode);
        }
    }

    /// Source to reload when the surface was recycled
    fn reload_source(&self) -> &str {
        if self.current_src.is_empty() {
            &self.src
        } else {
            &self.current_src
        }
    }
}

/// Seek to the snapshot position and resume unless content had ended
pub(crate) fn resume<S: MediaSurface + ?Sized>(
    surface: &mut S,
    snapshot: &PlayerSnapshot,
    live_offset_tracking: bool,
) {
    if live_offset_tracking && surface.is_live() {
        if snapshot.current_time < 0.0 {
            // Behind real time: stay the same distance behind the current edge
            let target = match surface.seekable_end() {
                Some(live_edge) => live_edge + snapshot.current_time,
                None => surface.current_time(),
            };
            surface.seek(target);
        }
    } else if snapshot.ended {
        let end = surface.duration();
        surface.seek(end);
    } else {
        surface.seek(snapshot.current_time);
    }

    if !snapshot.ended {
        surface.play();
    }
}

fn can_resume<S: MediaSurface + ?Sized>(surface: &S) -> bool {
    surface.ready_state() > ReadyState::HaveMetadata || surface.seekable_end().is_some()
}

/// Restore of a recycled surface in progress
#[derive(Debug)]
pub(crate) struct RestoreJob {
    snapshot: PlayerSnapshot,
    tracks_pending: bool,
    awaiting_canplay: bool,
    resumed: bool,
    attempts_left: u32,
    fallback_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
}

impl RestoreJob {
    fn disarm(&mut self, scheduler: &mut Scheduler) {
        for id in [self.fallback_timer.take(), self.poll_timer.take()].into_iter().flatten() {
            scheduler.clear(id);
        }
    }

    fn done(&self) -> bool {
        self.resumed && !self.tracks_pending
    }
}

impl<S: MediaSurface> AdsController<S> {
    /// Whether the surface source changed since the snapshot was taken
    ///
    /// Always false when content keeps playing behind ads. Asking with no
    /// snapshot is a programming error.
    pub fn video_element_recycled(&self) -> Result<bool> {
        if self.should_play_content_behind_ad() {
            return Ok(false);
        }

        let snapshot = self.snapshot.as_ref().ok_or(AdsError::NoSnapshot)?;
        Ok(snapshot.recycled_on(&self.surface))
    }

    /// Replace the current snapshot with a fresh capture
    pub(super) fn take_snapshot(&mut self) {
        self.cancel_restore();

        let previous = self.snapshot.take();
        let snapshot = PlayerSnapshot::capture(
            &mut self.surface,
            self.config.live_offset_tracking,
            previous.as_ref(),
        );
        debug!(
            "Captured snapshot of {:?} at {:.3}s (ended: {})",
            snapshot.current_src, snapshot.current_time, snapshot.ended
        );
        self.snapshot = Some(snapshot);
    }

    /// Put the content back after an ad
    pub(super) fn restore_snapshot(&mut self) {
        if self.disable_next_snapshot_restore {
            self.disable_next_snapshot_restore = false;
            debug!("Snapshot restore skipped on request");
            return;
        }

        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        self.cancel_restore();

        if let Some(poster) = &snapshot.native_poster {
            self.surface.set_native_poster(poster);
        }
        if let Some(style) = &snapshot.style {
            self.surface.set_style(style);
        }

        if snapshot.recycled_on(&self.surface) {
            debug!("Surface was recycled, reloading {:?}", snapshot.reload_source());
            self.surface.set_source(snapshot.reload_source(), &snapshot.mime_type);
            self.surface.load();

            let fallback = self.scheduler.set(CANPLAY_FALLBACK, TimerAction::TryToResume);
            self.restore = Some(RestoreJob {
                snapshot,
                tracks_pending: true,
                awaiting_canplay: true,
                resumed: false,
                attempts_left: RESUME_ATTEMPTS,
                fallback_timer: Some(fallback),
                poll_timer: None,
            });
        } else {
            snapshot.restore_tracks(&mut self.surface);

            // Source untouched, so the position is still right
            if !self.surface.ended() || !snapshot.ended {
                self.surface.play();
            }
        }
    }

    /// Feed surface events to an in-progress restore
    pub(super) fn observe_restore(&mut self, event: &AdEvent) {
        let Some(job) = self.restore.as_mut() else {
            return;
        };

        match event {
            AdEvent::LoadedMetadata if job.tracks_pending => {
                job.snapshot.restore_tracks(&mut self.surface);
                job.tracks_pending = false;
                if job.done() {
                    self.restore = None;
                }
            }
            AdEvent::CanPlay if job.awaiting_canplay => self.try_to_resume(),
            _ => {}
        }
    }

    /// Resume restored content once the surface can seek
    pub(super) fn try_to_resume(&mut self) {
        let live_offset_tracking = self.config.live_offset_tracking;
        let Some(job) = self.restore.as_mut() else {
            return;
        };
        if job.resumed {
            return;
        }

        // Called from canplay or a timer; drop the other trigger
        job.awaiting_canplay = false;
        job.disarm(&mut self.scheduler);

        if !can_resume(&self.surface) {
            if job.attempts_left > 0 {
                job.attempts_left -= 1;
                job.poll_timer = Some(
                    self.scheduler.set(RESUME_POLL_INTERVAL, TimerAction::TryToResume),
                );
                return;
            }
            warn!(
                "Failed to resume the content after an advertisement: {:?} never became seekable",
                job.snapshot.reload_source()
            );
        }

        resume(&mut self.surface, &job.snapshot, live_offset_tracking);
        job.resumed = true;

        // canplay implies metadata, even if the event was missed
        if job.tracks_pending && self.surface.ready_state() >= ReadyState::HaveMetadata {
            job.snapshot.restore_tracks(&mut self.surface);
            job.tracks_pending = false;
        }

        if job.done() {
            self.restore = None;
        }
    }

    /// Abandon an in-progress restore and disarm its timers
    pub(super) fn cancel_restore(&mut self) {
        if let Some(mut job) = self.restore.take() {
            job.disarm(&mut self.scheduler);
        }
    }
}
