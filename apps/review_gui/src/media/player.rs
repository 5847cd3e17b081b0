//! Audio worker thread: owns the output device and one clip per record.
//!
//! cpal streams are not `Send` on every platform, so they are created and
//! dropped on this thread only. Clip bytes are fetched on first play and
//! kept until the owning widget releases them.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{bail, Context, Result};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SizedSample,
};
use crossbeam_channel::{Receiver, Sender};
use review_client::{PlayerEvent, RecordsApi};
use shared::domain::{AudioRef, RecordId};

use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media::decode::{adapt, decode_wav};

pub enum AudioCommand {
    Play { id: RecordId, audio: AudioRef },
    Stop { id: RecordId },
    Release { id: RecordId },
    SetVolume(f32),
}

struct Output {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: SampleFormat,
}

struct Clip {
    samples: Arc<Vec<f32>>,
    cursor: Arc<AtomicUsize>,
    ended: Arc<AtomicBool>,
    stream: Option<cpal::Stream>,
    running: bool,
}

impl Clip {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: Arc::new(samples),
            cursor: Arc::new(AtomicUsize::new(0)),
            ended: Arc::new(AtomicBool::new(false)),
            stream: None,
            running: false,
        }
    }

    fn pause(&mut self) {
        if let Some(Err(err)) = self.stream.as_ref().map(|stream| stream.pause()) {
            tracing::warn!("failed to pause audio output: {err}");
        }
        self.running = false;
    }

    /// Pauses the stream, then rewinds. The cursor is only reset once the
    /// callback no longer runs.
    fn halt(&mut self) {
        self.pause();
        self.cursor.store(0, Ordering::SeqCst);
        self.ended.store(false, Ordering::SeqCst);
    }

    /// Parks a stream whose callback has played past the end.
    fn park_if_ended(&mut self) {
        if self.running && self.ended.load(Ordering::SeqCst) {
            self.pause();
        }
    }
}

/// State moved into the output callback.
struct ClipFeed {
    id: RecordId,
    samples: Arc<Vec<f32>>,
    cursor: Arc<AtomicUsize>,
    ended: Arc<AtomicBool>,
    volume: Arc<AtomicU32>,
    ui_tx: Sender<UiEvent>,
}

impl ClipFeed {
    fn fill<T>(&mut self, out: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let gain = f32::from_bits(self.volume.load(Ordering::Relaxed));
        let start = self.cursor.load(Ordering::SeqCst).min(self.samples.len());
        let available = &self.samples[start..];
        let n = available.len().min(out.len());

        for (slot, sample) in out.iter_mut().zip(&available[..n]) {
            *slot = T::from_sample(sample * gain);
        }
        for slot in &mut out[n..] {
            *slot = T::EQUILIBRIUM;
        }
        self.cursor.store(start + n, Ordering::SeqCst);

        if start + n >= self.samples.len() && !self.ended.swap(true, Ordering::SeqCst) {
            let _ = self.ui_tx.try_send(UiEvent::Player {
                id: self.id,
                event: PlayerEvent::Ended,
            });
        }
    }
}

struct AudioWorker {
    api: Arc<dyn RecordsApi>,
    runtime: tokio::runtime::Runtime,
    ui_tx: Sender<UiEvent>,
    volume: Arc<AtomicU32>,
    output: Option<Output>,
    clips: HashMap<RecordId, Clip>,
}

pub fn spawn_audio_worker(
    api: Arc<dyn RecordsApi>,
    volume: f32,
    cmd_rx: Receiver<AudioCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("audio worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build audio runtime: {err}");
                return;
            }
        };

        let mut worker = AudioWorker {
            api,
            runtime,
            ui_tx,
            volume: Arc::new(AtomicU32::new(volume.to_bits())),
            output: None,
            clips: HashMap::new(),
        };
        for cmd in cmd_rx.iter() {
            worker.handle(cmd);
        }
        tracing::debug!("audio command queue closed; worker exiting");
    });
}

impl AudioWorker {
    fn handle(&mut self, cmd: AudioCommand) {
        for clip in self.clips.values_mut() {
            clip.park_if_ended();
        }
        match cmd {
            AudioCommand::Play { id, audio } => {
                if let Err(err) = self.play(id, &audio) {
                    tracing::warn!(record_id = id.0, "audio playback failed: {err:#}");
                    emit(&self.ui_tx, id, PlayerEvent::Failed(format!("{err:#}")));
                }
            }
            AudioCommand::Stop { id } => {
                if let Some(clip) = self.clips.get_mut(&id) {
                    clip.halt();
                }
                emit(&self.ui_tx, id, PlayerEvent::Stopped);
            }
            AudioCommand::Release { id } => {
                if self.clips.remove(&id).is_some() {
                    tracing::debug!(record_id = id.0, "released audio clip");
                }
            }
            AudioCommand::SetVolume(volume) => {
                self.volume
                    .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
            }
        }
    }

    fn play(&mut self, id: RecordId, audio: &AudioRef) -> Result<()> {
        let output = ensure_output(&mut self.output)?;
        let clip = match self.clips.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let bytes = self
                    .runtime
                    .block_on(self.api.fetch_audio(audio))
                    .with_context(|| format!("failed to fetch audio '{}'", audio.as_str()))?;
                let decoded = decode_wav(&bytes)?;
                tracing::info!(
                    record_id = id.0,
                    seconds = decoded.duration_secs(),
                    sample_rate = decoded.sample_rate,
                    "decoded audio clip"
                );
                let samples = adapt(&decoded, output.config.sample_rate.0, output.config.channels)?;
                entry.insert(Clip::new(samples))
            }
        };

        if clip.ended.load(Ordering::SeqCst) {
            clip.halt();
        }
        if clip.stream.is_none() {
            let feed = ClipFeed {
                id,
                samples: Arc::clone(&clip.samples),
                cursor: Arc::clone(&clip.cursor),
                ended: Arc::clone(&clip.ended),
                volume: Arc::clone(&self.volume),
                ui_tx: self.ui_tx.clone(),
            };
            clip.stream = Some(build_stream(output, feed)?);
        }

        // Must precede `Ended`, which an empty clip emits on its first callback.
        emit(&self.ui_tx, id, PlayerEvent::Started);
        if let Some(Err(err)) = clip.stream.as_ref().map(|stream| stream.play()) {
            clip.stream = None;
            bail!("failed to start audio output: {err}");
        }
        clip.running = true;
        Ok(())
    }
}

fn emit(ui_tx: &Sender<UiEvent>, id: RecordId, event: PlayerEvent) {
    if ui_tx.try_send(UiEvent::Player { id, event }).is_err() {
        tracing::warn!(record_id = id.0, "ui event queue unavailable; player event dropped");
    }
}

fn ensure_output(slot: &mut Option<Output>) -> Result<&Output> {
    if slot.is_none() {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device available")?;
        let supported = device
            .default_output_config()
            .context("audio output device has no default config")?;
        tracing::info!(
            sample_rate = supported.sample_rate().0,
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "opened audio output device"
        );
        *slot = Some(Output {
            format: supported.sample_format(),
            config: supported.into(),
            device,
        });
    }
    slot.as_ref().context("audio output device unavailable")
}

fn build_stream(output: &Output, feed: ClipFeed) -> Result<cpal::Stream> {
    match output.format {
        SampleFormat::F32 => build_typed_stream::<f32>(output, feed),
        SampleFormat::I16 => build_typed_stream::<i16>(output, feed),
        SampleFormat::U16 => build_typed_stream::<u16>(output, feed),
        other => bail!("unsupported audio output sample format {other:?}"),
    }
}

fn build_typed_stream<T>(output: &Output, mut feed: ClipFeed) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    output
        .device
        .build_output_stream(
            &output.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| feed.fill(data),
            |err| tracing::error!("audio output error: {err}"),
            None,
        )
        .context("failed to open audio output stream")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn feed(samples: Vec<f32>, volume: f32) -> (ClipFeed, crossbeam_channel::Receiver<UiEvent>) {
        let (ui_tx, ui_rx) = bounded(8);
        let feed = ClipFeed {
            id: RecordId(7),
            samples: Arc::new(samples),
            cursor: Arc::new(AtomicUsize::new(0)),
            ended: Arc::new(AtomicBool::new(false)),
            volume: Arc::new(AtomicU32::new(volume.to_bits())),
            ui_tx,
        };
        (feed, ui_rx)
    }

    #[test]
    fn fill_applies_gain_and_pads_with_silence() {
        let (mut feed, ui_rx) = feed(vec![0.5, -0.5, 1.0], 0.5);
        let mut out = [9.0f32; 4];
        feed.fill(&mut out);
        assert_eq!(out, [0.25, -0.25, 0.5, 0.0]);
        assert_eq!(feed.cursor.load(Ordering::SeqCst), 3);

        match ui_rx.try_recv() {
            Ok(UiEvent::Player { id, event }) => {
                assert_eq!(id, RecordId(7));
                assert_eq!(event, PlayerEvent::Ended);
            }
            _ => panic!("expected an ended event"),
        }
    }

    #[test]
    fn ended_is_reported_once() {
        let (mut feed, ui_rx) = feed(vec![0.1, 0.2], 1.0);
        let mut out = [0.0f32; 2];
        feed.fill(&mut out);
        feed.fill(&mut out);
        feed.fill(&mut out);
        assert_eq!(ui_rx.len(), 1);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn partial_fill_keeps_position_without_ending() {
        let (mut feed, ui_rx) = feed(vec![0.1, 0.2, 0.3, 0.4], 1.0);
        let mut out = [0.0f32; 2];
        feed.fill(&mut out);
        assert_eq!(out, [0.1, 0.2]);
        assert!(ui_rx.is_empty());
        feed.fill(&mut out);
        assert_eq!(out, [0.3, 0.4]);
        assert_eq!(ui_rx.len(), 1);
    }

    fn feed_for(clip: &Clip) -> (ClipFeed, crossbeam_channel::Receiver<UiEvent>) {
        let (ui_tx, ui_rx) = bounded(8);
        let feed = ClipFeed {
            id: RecordId(7),
            samples: Arc::clone(&clip.samples),
            cursor: Arc::clone(&clip.cursor),
            ended: Arc::clone(&clip.ended),
            volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            ui_tx,
        };
        (feed, ui_rx)
    }

    #[test]
    fn halt_rewinds_an_ended_clip() {
        let mut clip = Clip::new(vec![0.0; 4]);
        clip.cursor.store(4, Ordering::SeqCst);
        clip.ended.store(true, Ordering::SeqCst);
        clip.halt();
        assert_eq!(clip.cursor.load(Ordering::SeqCst), 0);
        assert!(!clip.ended.load(Ordering::SeqCst));
    }

    #[test]
    fn stopping_midway_restarts_from_the_beginning() {
        let mut clip = Clip::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let (mut feed, ui_rx) = feed_for(&clip);
        clip.running = true;

        let mut out = [0.0f32; 2];
        feed.fill(&mut out);
        feed.fill(&mut out);
        assert_eq!(clip.cursor.load(Ordering::SeqCst), 4);

        clip.halt();
        assert!(!clip.running);
        assert_eq!(clip.cursor.load(Ordering::SeqCst), 0);

        feed.fill(&mut out);
        assert_eq!(out, [0.1, 0.2]);
        assert!(ui_rx.is_empty());
    }

    #[test]
    fn ended_clip_is_parked_and_replays_once() {
        let mut clip = Clip::new(vec![0.1, 0.2]);
        let (mut feed, ui_rx) = feed_for(&clip);
        clip.running = true;

        let mut out = [0.0f32; 4];
        feed.fill(&mut out);
        clip.park_if_ended();
        assert!(!clip.running);
        assert_eq!(ui_rx.len(), 1);

        clip.halt();
        feed.fill(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.0, 0.0]);
        assert_eq!(ui_rx.len(), 2);
    }
}
