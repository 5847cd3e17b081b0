//! Per-record review state: edit draft, edit mode and audio playback.
//!
//! A widget is bound to one record identity. Writes leave the widget as
//! [`SaveRequest`]/[`DeleteRequest`] values for the list controller; the
//! bound record is only replaced through [`RecordWidget::sync_record`].

use shared::domain::{Record, RecordFields, RecordId};

use crate::{
    playback::{AudioBackend, AudioResource, PlaybackCommand, PlaybackMachine, PlayerEvent},
    ClientError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub id: RecordId,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequest {
    pub id: RecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Same record identity; server values were adopted.
    Refreshed,
    /// A different record now occupies this widget; local state was reset.
    Rebound,
}

pub struct RecordWidget {
    record: Record,
    draft: RecordFields,
    dirty: bool,
    mode: EditMode,
    playback: PlaybackMachine,
    audio: Option<Box<dyn AudioResource>>,
}

impl RecordWidget {
    pub fn new(record: Record) -> Self {
        Self {
            draft: record.fields(),
            dirty: false,
            record,
            mode: EditMode::Viewing,
            playback: PlaybackMachine::new(),
            audio: None,
        }
    }

    pub fn id(&self) -> RecordId {
        self.record.id
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn draft(&self) -> &RecordFields {
        &self.draft
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == EditMode::Editing
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn shows_edit_control(&self) -> bool {
        !self.is_editing() && !self.is_dirty()
    }

    pub fn shows_save_control(&self) -> bool {
        self.is_editing() || self.is_dirty()
    }

    pub fn playback(&self) -> &PlaybackMachine {
        &self.playback
    }

    pub fn has_audio_resource(&self) -> bool {
        self.audio.is_some()
    }

    /// Enters edit mode. Refused once the draft differs from the server
    /// value, since the save control is already offered.
    pub fn begin_edit(&mut self) -> bool {
        if !self.shows_edit_control() {
            return false;
        }
        self.mode = EditMode::Editing;
        true
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
        self.recompute_dirty();
    }

    pub fn set_correct(&mut self, is_correct: bool) {
        self.draft.is_correct = is_correct;
        self.recompute_dirty();
    }

    /// Dirty is always measured against the bound server record.
    fn recompute_dirty(&mut self) {
        self.dirty = self.draft != self.record.fields();
    }

    /// Commits the draft. The widget leaves edit mode and stops being dirty
    /// at once; the controller's reload later brings the server's copy.
    /// The next field change is measured against the server record again.
    pub fn save(&mut self) -> Option<SaveRequest> {
        if !self.shows_save_control() {
            return None;
        }
        self.mode = EditMode::Viewing;
        self.dirty = false;
        Some(SaveRequest {
            id: self.record.id,
            text: self.draft.text.clone(),
            is_correct: self.draft.is_correct,
        })
    }

    /// Discards local edits and asks for deletion. Allowed in any state.
    pub fn delete(&mut self) -> DeleteRequest {
        self.mode = EditMode::Viewing;
        self.draft = self.record.fields();
        self.dirty = false;
        DeleteRequest { id: self.record.id }
    }

    /// Binds the widget to a freshly fetched record.
    ///
    /// A different identity resets draft, mode and playback and releases the
    /// audio resource. For the same identity the draft follows the server
    /// value unless it carries unsaved edits; dirty is then recomputed.
    pub fn sync_record(&mut self, record: Record) -> SyncOutcome {
        if record.id != self.record.id {
            tracing::debug!(
                from = self.record.id.0,
                to = record.id.0,
                "record widget rebound to another record"
            );
            self.release_audio();
            *self = Self::new(record);
            return SyncOutcome::Rebound;
        }

        if !self.dirty {
            self.draft = record.fields();
        }
        if record.audio_ref != self.record.audio_ref {
            self.release_audio();
        }
        self.record = record;
        self.recompute_dirty();
        SyncOutcome::Refreshed
    }

    /// Flips playback. The first play opens the audio resource through
    /// `backend`; later toggles reuse it.
    pub fn toggle_playback(&mut self, backend: &dyn AudioBackend) {
        match self.playback.toggle() {
            PlaybackCommand::Play => {
                if let Err(err) = self.start_audio(backend) {
                    tracing::warn!(record_id = self.record.id.0, "audio start failed: {err}");
                    self.playback.handle(PlayerEvent::Failed(err.to_string()));
                }
            }
            PlaybackCommand::Stop => {
                if let Some(audio) = self.audio.as_mut() {
                    audio.stop();
                }
            }
        }
    }

    fn start_audio(&mut self, backend: &dyn AudioBackend) -> Result<(), ClientError> {
        let audio = match self.audio.take() {
            Some(audio) => audio,
            None => backend.open(&self.record)?,
        };
        self.audio.insert(audio).play()
    }

    pub fn on_player_event(&mut self, event: PlayerEvent) {
        self.playback.handle(event);
    }

    fn release_audio(&mut self) {
        if let Some(mut audio) = self.audio.take() {
            audio.stop();
        }
        self.playback.reset();
    }
}

impl Drop for RecordWidget {
    fn drop(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stop();
        }
    }
}

#[cfg(test)]
#[path = "tests/widget_tests.rs"]
mod tests;
