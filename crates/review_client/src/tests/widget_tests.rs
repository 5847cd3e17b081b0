use super::*;

use std::{cell::RefCell, rc::Rc};

use shared::domain::AudioRef;

use crate::playback::PlaybackState;

#[derive(Default)]
struct AudioLog {
    opened: Vec<RecordId>,
    plays: u32,
    stops: u32,
}

struct FakeAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl AudioResource for FakeAudio {
    fn play(&mut self) -> Result<(), ClientError> {
        self.log.borrow_mut().plays += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }
}

struct FakeBackend {
    log: Rc<RefCell<AudioLog>>,
    fail_open: bool,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(AudioLog::default())),
            fail_open: false,
        }
    }
}

impl AudioBackend for FakeBackend {
    fn open(&self, record: &Record) -> Result<Box<dyn AudioResource>, ClientError> {
        if self.fail_open {
            return Err(ClientError::Audio("no output device".into()));
        }
        self.log.borrow_mut().opened.push(record.id);
        Ok(Box::new(FakeAudio {
            log: Rc::clone(&self.log),
        }))
    }
}

fn record(id: i64, text: &str, is_correct: bool) -> Record {
    Record {
        id: RecordId(id),
        text: text.to_string(),
        audio_ref: AudioRef::new(format!("audio/{id}.wav")),
        is_correct,
    }
}

#[test]
fn starts_viewing_with_snapshot_draft() {
    let widget = RecordWidget::new(record(1, "hello", false));
    assert_eq!(widget.mode(), EditMode::Viewing);
    assert_eq!(widget.draft().text, "hello");
    assert!(!widget.is_dirty());
    assert_eq!(widget.playback().state(), PlaybackState::Stopped);
    assert!(widget.shows_edit_control());
    assert!(!widget.shows_save_control());
}

#[test]
fn editing_text_then_saving_reports_draft_and_clears_dirty() {
    let mut widget = RecordWidget::new(record(7, "hello", false));
    assert!(widget.begin_edit());
    widget.set_text("hello world");

    assert!(widget.is_dirty());
    assert!(widget.shows_save_control());
    assert!(!widget.shows_edit_control());

    let request = widget.save().expect("save request");
    assert_eq!(
        request,
        SaveRequest {
            id: RecordId(7),
            text: "hello world".into(),
            is_correct: false,
        }
    );
    assert!(!widget.is_dirty());
    assert!(!widget.is_editing());
    assert!(widget.shows_edit_control());
}

#[test]
fn dirty_tracks_both_fields_and_reverting_clears_it() {
    let mut widget = RecordWidget::new(record(1, "a", false));
    widget.set_correct(true);
    assert!(widget.is_dirty());
    widget.set_correct(false);
    assert!(!widget.is_dirty());
    widget.set_text("ab");
    assert!(widget.is_dirty());
    widget.set_text("a");
    assert!(!widget.is_dirty());
}

#[test]
fn field_change_after_unconfirmed_save_compares_against_server_record() {
    let mut widget = RecordWidget::new(record(7, "hello", false));
    widget.begin_edit();
    widget.set_text("hello world");
    widget.save().expect("save request");
    assert!(!widget.is_dirty());

    // No reload yet: the bound record still holds "hello".
    widget.set_correct(true);
    widget.set_correct(false);

    assert_eq!(widget.record().text, "hello");
    assert_eq!(widget.draft().text, "hello world");
    assert!(widget.is_dirty());
    assert!(widget.shows_save_control());
    assert!(!widget.shows_edit_control());
}

#[test]
fn failed_save_reload_keeps_draft_and_offers_save_again() {
    let mut widget = RecordWidget::new(record(7, "hello", false));
    widget.begin_edit();
    widget.set_text("hello world");
    widget.save();

    widget.set_text("hello world!");
    widget.sync_record(record(7, "hello", false));

    assert_eq!(widget.draft().text, "hello world!");
    assert!(widget.is_dirty());
    assert!(widget.save().is_some());
}

#[test]
fn cannot_enter_edit_mode_while_dirty() {
    let mut widget = RecordWidget::new(record(1, "a", false));
    widget.set_correct(true);
    assert!(!widget.begin_edit());
    assert_eq!(widget.mode(), EditMode::Viewing);
}

#[test]
fn edit_and_save_controls_are_never_both_visible() {
    let mut widget = RecordWidget::new(record(1, "a", false));
    let check = |widget: &RecordWidget| {
        assert_ne!(widget.shows_edit_control(), widget.shows_save_control());
    };
    check(&widget);
    widget.begin_edit();
    check(&widget);
    widget.set_text("b");
    check(&widget);
    widget.set_text("a");
    check(&widget);
    widget.save();
    check(&widget);
    widget.set_correct(true);
    check(&widget);
}

#[test]
fn save_without_changes_in_edit_mode_still_commits() {
    let mut widget = RecordWidget::new(record(3, "same", true));
    widget.begin_edit();
    let request = widget.save().expect("save while editing");
    assert_eq!(request.text, "same");
    assert!(request.is_correct);
    assert!(widget.save().is_none());
}

#[test]
fn resync_after_save_adopts_server_normalized_text() {
    let mut widget = RecordWidget::new(record(2, "hello", false));
    widget.begin_edit();
    widget.set_text("  hello world ");
    widget.save();

    let outcome = widget.sync_record(record(2, "hello world", false));
    assert_eq!(outcome, SyncOutcome::Refreshed);
    assert_eq!(widget.draft().text, "hello world");
    assert!(!widget.is_dirty());
}

#[test]
fn resync_keeps_unsaved_edits_and_recomputes_dirty() {
    let mut widget = RecordWidget::new(record(2, "hello", false));
    widget.set_correct(true);

    widget.sync_record(record(2, "hello", true));
    assert!(widget.draft().is_correct);
    assert!(!widget.is_dirty());

    widget.set_text("changed");
    widget.sync_record(record(2, "server side", true));
    assert_eq!(widget.draft().text, "changed");
    assert!(widget.is_dirty());
}

#[test]
fn delete_discards_local_edits() {
    let mut widget = RecordWidget::new(record(5, "text", false));
    widget.begin_edit();
    widget.set_text("edited");
    let request = widget.delete();
    assert_eq!(request.id, RecordId(5));
    assert!(!widget.is_editing());
    assert!(!widget.is_dirty());
    assert_eq!(widget.draft().text, "text");
}

#[test]
fn rebinding_to_another_record_resets_local_state_and_releases_audio() {
    let backend = FakeBackend::new();
    let mut widget = RecordWidget::new(record(1, "first", false));
    widget.begin_edit();
    widget.set_text("half edited");
    widget.toggle_playback(&backend);
    widget.on_player_event(PlayerEvent::Started);

    let outcome = widget.sync_record(record(2, "second", true));

    assert_eq!(outcome, SyncOutcome::Rebound);
    assert_eq!(widget.id(), RecordId(2));
    assert_eq!(widget.draft().text, "second");
    assert!(!widget.is_editing());
    assert!(!widget.has_audio_resource());
    assert_eq!(widget.playback().state(), PlaybackState::Stopped);
    assert_eq!(backend.log.borrow().stops, 1);
}

#[test]
fn one_audio_resource_is_reused_across_toggles() {
    let backend = FakeBackend::new();
    let mut widget = RecordWidget::new(record(9, "t", false));

    widget.toggle_playback(&backend);
    widget.on_player_event(PlayerEvent::Started);
    widget.toggle_playback(&backend);
    widget.on_player_event(PlayerEvent::Stopped);
    widget.toggle_playback(&backend);

    let log = backend.log.borrow();
    assert_eq!(log.opened, vec![RecordId(9)]);
    assert_eq!(log.plays, 2);
    assert_eq!(log.stops, 1);
}

#[test]
fn toggle_stays_requested_until_player_confirms() {
    let backend = FakeBackend::new();
    let mut widget = RecordWidget::new(record(4, "t", false));
    widget.toggle_playback(&backend);

    assert!(widget.playback().is_requested_on());
    assert_eq!(widget.playback().state(), PlaybackState::Starting);

    widget.on_player_event(PlayerEvent::Ended);
    assert!(!widget.playback().is_requested_on());
}

#[test]
fn failed_open_reverts_toggle_and_keeps_reason() {
    let mut backend = FakeBackend::new();
    backend.fail_open = true;
    let mut widget = RecordWidget::new(record(4, "t", false));
    widget.toggle_playback(&backend);

    assert_eq!(widget.playback().state(), PlaybackState::Stopped);
    assert!(widget
        .playback()
        .last_error()
        .expect("error kept")
        .contains("no output device"));
    assert!(!widget.has_audio_resource());
}

#[test]
fn dropping_widget_stops_audio() {
    let backend = FakeBackend::new();
    {
        let mut widget = RecordWidget::new(record(4, "t", false));
        widget.toggle_playback(&backend);
    }
    assert_eq!(backend.log.borrow().stops, 1);
}
