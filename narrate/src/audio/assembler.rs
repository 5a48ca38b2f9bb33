//! Ordered concatenation of audio clips.

use super::clip::{AudioClip, AudioFormat, frames_to_duration};
use crate::error::{ConversionError, Result};
use hound::WavWriter;
use std::io::{Cursor, Seek, Write};
use std::time::Duration;

/// A continuous track built by appending clips in order.
///
/// Clips are consumed as they are appended, so only the growing track is held.
#[derive(Debug, Clone, Default)]
pub struct AudioTrack {
    format: Option<AudioFormat>,
    samples: Vec<i16>,
    clip_count: usize,
}

impl AudioTrack {
    /// An empty track; the first appended clip fixes its format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clip at the end of the timeline.
    ///
    /// No gap, overlap or crossfade is introduced.
    pub fn append(&mut self, clip: AudioClip) -> Result<()> {
        self.check_format(clip.format())?;
        self.samples.extend(clip.into_samples());
        self.clip_count += 1;
        Ok(())
    }

    /// Append another track's timeline after this one.
    pub fn append_track(&mut self, other: AudioTrack) -> Result<()> {
        let Some(format) = other.format else {
            return Ok(());
        };
        self.check_format(format)?;
        self.samples.extend(other.samples);
        self.clip_count += other.clip_count;
        Ok(())
    }

    fn check_format(&mut self, incoming: AudioFormat) -> Result<()> {
        match self.format {
            None => {
                self.format = Some(incoming);
                Ok(())
            }
            Some(format) if format == incoming => Ok(()),
            Some(format) => Err(ConversionError::Assembly(format!(
                "clip format {} Hz/{} ch does not match track format {} Hz/{} ch",
                incoming.sample_rate, incoming.channels, format.sample_rate, format.channels
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clip_count == 0
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    pub fn format(&self) -> Option<AudioFormat> {
        self.format
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        match self.format {
            Some(format) => self.samples.len() / usize::from(format.channels.max(1)),
            None => 0,
        }
    }

    pub fn duration(&self) -> Duration {
        match self.format {
            Some(format) => frames_to_duration(self.frames(), format.sample_rate),
            None => Duration::ZERO,
        }
    }

    /// Encode the track as 16-bit PCM WAV into `writer`.
    pub fn write_wav<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let format = self
            .format
            .ok_or_else(|| ConversionError::Assembly("no audio to export".into()))?;

        let mut wav = WavWriter::new(writer, format.wav_spec())?;
        let mut samples = wav.get_i16_writer(self.samples.len() as u32);
        for &sample in &self.samples {
            samples.write_sample(sample);
        }
        samples.flush()?;
        wav.finalize()?;
        Ok(())
    }

    /// Encode the track as an in-memory WAV file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_wav(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Concatenate clips strictly in the order given.
pub fn concatenate<I>(clips: I) -> Result<AudioTrack>
where
    I: IntoIterator<Item = AudioClip>,
{
    let mut track = AudioTrack::new();
    for clip in clips {
        track.append(clip)?;
    }
    Ok(track)
}
