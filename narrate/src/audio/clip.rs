//! Decoded audio clips.

use crate::error::{ConversionError, Result};
use hound::{SampleFormat, WavReader, WavSpec};
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

/// Sample layout shared by every clip in a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// 16-bit PCM spec used for every exported file.
    pub fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }
}

/// Audio for one segment or one persisted file, normalized to 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    format: AudioFormat,
    samples: Vec<i16>,
}

impl AudioClip {
    /// Create a clip from interleaved samples.
    pub fn new(format: AudioFormat, samples: Vec<i16>) -> Self {
        Self { format, samples }
    }

    /// Decode a WAV payload.
    ///
    /// Streams whose header was written before the length was known (engines
    /// writing to a pipe) are accepted and trimmed to the bytes present.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let repaired = repair_streamed_header(bytes);
        let data = repaired.as_deref().unwrap_or(bytes);
        let reader = WavReader::new(Cursor::new(data))
            .map_err(|e| ConversionError::Assembly(format!("undecodable audio: {}", e)))?;
        decode(reader)
    }

    /// Load and decode a WAV file.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_wav_bytes(&bytes).map_err(|e| match e {
            ConversionError::Assembly(msg) => {
                ConversionError::Assembly(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.format.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.format.sample_rate)
    }
}

pub(crate) fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = frames as u128 * 1_000_000_000 / u128::from(sample_rate);
    Duration::from_nanos(nanos as u64)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioClip> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(ConversionError::Assembly(
            "audio header declares no channels or sample rate".into(),
        ));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => collect(reader.samples::<i8>(), |s| i16::from(s) << 8)?,
        (SampleFormat::Int, 16) => collect(reader.samples::<i16>(), |s| s)?,
        (SampleFormat::Int, bits @ 17..=32) => {
            let shift = bits - 16;
            collect(reader.samples::<i32>(), |s| (s >> shift) as i16)?
        }
        (SampleFormat::Float, 32) => collect(reader.samples::<f32>(), |s| {
            (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
        })?,
        (format, bits) => {
            return Err(ConversionError::Assembly(format!(
                "unsupported sample format {:?} at {} bits",
                format, bits
            )));
        }
    };

    Ok(AudioClip::new(
        AudioFormat::new(spec.sample_rate, spec.channels),
        samples,
    ))
}

/// Collect samples; a sample cut short is an assembly error.
fn collect<S, I, F>(iter: I, convert: F) -> Result<Vec<i16>>
where
    I: Iterator<Item = hound::Result<S>>,
    F: Fn(S) -> i16,
{
    let mut out = Vec::with_capacity(iter.size_hint().0);
    for sample in iter {
        out.push(convert(sample?));
    }
    Ok(out)
}

/// Rewrite the size fields of a WAV stream whose `data` chunk claims more
/// bytes than are present. Returns `None` when the header is already consistent.
fn repair_streamed_header(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut pos = 12;
    let mut block_align = 1usize;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body = pos + 8;

        if id == b"fmt " && body + 14 <= bytes.len() {
            let align = u16::from_le_bytes([bytes[body + 12], bytes[body + 13]]);
            block_align = usize::from(align).max(1);
        }

        if id == b"data" {
            let available = bytes.len() - body;
            if size <= available {
                return None;
            }
            let kept = available - available % block_align;
            let mut repaired = bytes[..body + kept].to_vec();
            repaired[pos + 4..pos + 8].copy_from_slice(&(kept as u32).to_le_bytes());
            let riff_len = (repaired.len() - 8) as u32;
            repaired[4..8].copy_from_slice(&riff_len.to_le_bytes());
            return Some(repaired);
        }

        // Chunks are padded to an even length
        pos = body.saturating_add(size).saturating_add(size & 1);
    }
    None
}
