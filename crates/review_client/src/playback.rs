//! Playback state of a single record's audio.
//!
//! The machine only moves to `Playing` or `Stopped` when the player confirms
//! it. Toggling records the operator's request (`Starting`/`Stopping`) and
//! tells the owner which command to send to the player.

use shared::domain::Record;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Starting,
    Playing,
    Stopping,
}

/// Signals reported by an audio player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Started,
    Paused,
    Stopped,
    Ended,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackMachine {
    state: PlaybackState,
    last_error: Option<String>,
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True while a play has been requested or confirmed; drives the
    /// play/pause toggle icon.
    pub fn is_requested_on(&self) -> bool {
        matches!(self.state, PlaybackState::Starting | PlaybackState::Playing)
    }

    /// True only once the player confirmed that audio is running.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn toggle(&mut self) -> PlaybackCommand {
        match self.state {
            PlaybackState::Stopped | PlaybackState::Stopping => {
                self.state = PlaybackState::Starting;
                self.last_error = None;
                PlaybackCommand::Play
            }
            PlaybackState::Starting | PlaybackState::Playing => {
                self.state = PlaybackState::Stopping;
                PlaybackCommand::Stop
            }
        }
    }

    pub fn handle(&mut self, event: PlayerEvent) {
        let next = match (self.state, &event) {
            // A start that lands after the operator already asked to stop
            // does not count; the pending stop will confirm shortly.
            (PlaybackState::Stopping, PlayerEvent::Started) => PlaybackState::Stopping,
            (_, PlayerEvent::Started) => PlaybackState::Playing,
            (_, PlayerEvent::Paused | PlayerEvent::Stopped | PlayerEvent::Ended) => {
                PlaybackState::Stopped
            }
            (_, PlayerEvent::Failed(reason)) => {
                self.last_error = Some(reason.clone());
                PlaybackState::Stopped
            }
        };
        if next != self.state {
            tracing::trace!(from = ?self.state, to = ?next, ?event, "playback transition");
        }
        self.state = next;
    }

    pub fn reset(&mut self) {
        self.state = PlaybackState::Stopped;
        self.last_error = None;
    }
}

/// A loaded clip owned by one widget binding. Implementations report
/// progress asynchronously as [`PlayerEvent`]s routed back to the widget.
pub trait AudioResource {
    fn play(&mut self) -> Result<(), ClientError>;
    fn stop(&mut self);
}

/// Creates the audio resource for a record on first play.
pub trait AudioBackend {
    fn open(&self, record: &Record) -> Result<Box<dyn AudioResource>, ClientError>;
}
