//! WAV decoding and conversion to the output device layout.

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use rubato::{FftFixedIn, Resampler};

/// Interleaved samples normalized to `-1.0..=1.0`.
pub struct DecodedClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl DecodedClip {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Supports 8/16/24/32-bit integer and 32-bit float WAV data.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedClip> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .context("audio is not a readable WAV stream")?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        bail!(
            "WAV header declares {} channels at {} Hz",
            spec.channels,
            spec.sample_rate
        );
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read WAV samples")?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read WAV samples")?,
    };

    Ok(DecodedClip {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

/// Converts `clip` to interleaved `channels` at `sample_rate`.
pub fn adapt(clip: &DecodedClip, sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
    let channels = channels.max(1);
    let mapped = remap_channels(&clip.samples, clip.channels, channels);
    resample(&mapped, channels as usize, clip.sample_rate, sample_rate)
}

fn remap_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }
    let (from, to) = (from as usize, to as usize);
    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            out.extend((0..to).map(|ch| frame[ch.min(from - 1)]));
        }
    }
    out
}

fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    (0..channels)
        .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
        .collect()
}

fn interleave(planes: &[Vec<f32>], frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames * planes.len());
    for i in 0..frames {
        out.extend(planes.iter().map(|plane| plane.get(i).copied().unwrap_or(0.0)));
    }
    out
}

/// Resamples interleaved audio with rubato, all channels in one pass.
fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || to_rate == 0 || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        1024, // chunk size
        2,    // sub chunks
        channels,
    )
    .context("failed to create resampler")?;

    let planes = deinterleave(samples, channels);
    let in_frames = planes[0].len();
    let out_frames = (in_frames as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(out_frames); channels];

    let mut pos = 0;
    while pos < in_frames {
        let needed = resampler.input_frames_next();
        let chunk: Vec<Vec<f32>> = planes
            .iter()
            .map(|plane| {
                let end = (pos + needed).min(in_frames);
                let mut part = plane[pos..end].to_vec();
                // Last chunk is padded with silence.
                part.resize(needed, 0.0);
                part
            })
            .collect();
        let resampled = resampler
            .process(&chunk, None)
            .context("resampling failed")?;
        for (plane, out) in output.iter_mut().zip(resampled) {
            plane.extend(out);
        }
        pos += needed;
    }

    Ok(interleave(&output, out_frames))
}
