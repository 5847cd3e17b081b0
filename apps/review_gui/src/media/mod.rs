//! Audio playback: WAV decoding, the cpal worker thread, and the widget-facing
//! audio backend that talks to it.

pub mod decode;
pub mod player;

use crossbeam_channel::{Sender, TrySendError};
use review_client::{AudioBackend, AudioResource, ClientError};
use shared::domain::{AudioRef, Record, RecordId};

use crate::media::player::AudioCommand;

pub struct WorkerAudioBackend {
    tx: Sender<AudioCommand>,
}

impl WorkerAudioBackend {
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        Self { tx }
    }

    pub fn set_volume(&self, volume: f32) {
        if self.tx.try_send(AudioCommand::SetVolume(volume)).is_err() {
            tracing::warn!(volume, "audio worker unavailable; volume change dropped");
        }
    }
}

impl AudioBackend for WorkerAudioBackend {
    fn open(&self, record: &Record) -> Result<Box<dyn AudioResource>, ClientError> {
        Ok(Box::new(WorkerClip {
            id: record.id,
            audio: record.audio_ref.clone(),
            tx: self.tx.clone(),
        }))
    }
}

/// Handle to the clip the worker keeps for one record. Dropping it frees
/// the worker's stream and samples.
struct WorkerClip {
    id: RecordId,
    audio: AudioRef,
    tx: Sender<AudioCommand>,
}

impl AudioResource for WorkerClip {
    fn play(&mut self) -> Result<(), ClientError> {
        let cmd = AudioCommand::Play {
            id: self.id,
            audio: self.audio.clone(),
        };
        self.tx.try_send(cmd).map_err(|err| match err {
            TrySendError::Full(_) => ClientError::Audio("audio command queue is full".into()),
            TrySendError::Disconnected(_) => ClientError::Audio("audio worker is not running".into()),
        })
    }

    fn stop(&mut self) {
        if self.tx.try_send(AudioCommand::Stop { id: self.id }).is_err() {
            tracing::warn!(record_id = self.id.0, "audio worker unavailable; stop dropped");
        }
    }
}

impl Drop for WorkerClip {
    fn drop(&mut self) {
        if self.tx.try_send(AudioCommand::Release { id: self.id }).is_err() {
            tracing::warn!(record_id = self.id.0, "audio worker unavailable; clip release dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn record() -> Record {
        Record {
            id: RecordId(3),
            text: "hello".into(),
            audio_ref: AudioRef::new("audio/clip_3.wav"),
            is_correct: false,
        }
    }

    #[test]
    fn clip_sends_play_stop_and_release_for_its_record() {
        let (tx, rx) = bounded(8);
        let backend = WorkerAudioBackend::new(tx);
        let mut clip = backend.open(&record()).expect("open");

        clip.play().expect("play");
        clip.stop();
        drop(clip);

        let sent: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            &sent[..],
            [
                AudioCommand::Play { id: RecordId(3), audio },
                AudioCommand::Stop { id: RecordId(3) },
                AudioCommand::Release { id: RecordId(3) },
            ] if audio.as_str() == "audio/clip_3.wav"
        ));
    }

    #[test]
    fn play_fails_when_worker_is_gone() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let backend = WorkerAudioBackend::new(tx);
        let mut clip = backend.open(&record()).expect("open");
        assert!(matches!(clip.play(), Err(ClientError::Audio(_))));
    }

    #[test]
    fn full_queue_drops_release_and_volume_without_blocking() {
        let (tx, rx) = bounded(1);
        let backend = WorkerAudioBackend::new(tx);
        let mut clip = backend.open(&record()).expect("open");
        clip.play().expect("play");

        backend.set_volume(0.3);
        drop(clip);

        let sent: Vec<_> = rx.try_iter().collect();
        assert!(matches!(&sent[..], [AudioCommand::Play { id: RecordId(3), .. }]));
    }
}
