//! Text-to-audio pipeline: chunk, synthesize each segment, assemble, export.

use crate::audio::AudioTrack;
use crate::error::Result;
use crate::store::{ArtifactRef, ArtifactStore, JobId, TransientFiles};
use crate::text::{self, Segment};
use crate::tts::SegmentSynthesizer;
use futures_util::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

/// Turns one text blob into one audio artifact.
pub struct TextToAudio {
    synthesizer: SegmentSynthesizer,
    store: Arc<dyn ArtifactStore>,
    scratch_dir: PathBuf,
    chunk_limit: usize,
    concurrency: usize,
}

impl TextToAudio {
    /// Create a pipeline writing transient segment files under `scratch_dir`.
    pub fn new(
        synthesizer: SegmentSynthesizer,
        store: Arc<dyn ArtifactStore>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            store,
            scratch_dir: scratch_dir.into(),
            chunk_limit: text::DEFAULT_CHUNK_LIMIT,
            concurrency: 1,
        }
    }

    /// Set the maximum segment size in characters.
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = limit;
        self
    }

    /// Set how many segments may be synthesized at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Convert `text` to speech and store it under `destination`, or under a
    /// freshly allocated job-scoped name when none is given.
    ///
    /// Nothing is written to the store unless every segment was synthesized
    /// and assembled.
    pub async fn render(&self, text: &str, destination: Option<&str>) -> Result<ArtifactRef> {
        let job = JobId::new();
        let track = self.render_track(&job, "text", text).await?;

        let name = match destination {
            Some(name) => name.to_string(),
            None => job.speech_name(),
        };
        let artifact = self.store.write(&name, track.to_wav_bytes()?).await?;
        log::info!(
            "Final audio file => {} ({:.1}s)",
            self.store.resolve(&artifact),
            track.duration().as_secs_f64()
        );
        Ok(artifact)
    }

    /// Synthesize `text` into an in-memory track.
    ///
    /// Transient files are named from `job` and `label` and are all removed
    /// before this returns, whatever the outcome.
    pub async fn render_track(&self, job: &JobId, label: &str, text: &str) -> Result<AudioTrack> {
        let segments = text::split(text, self.chunk_limit)?;
        log::info!("Splitting text into {} chunks.", segments.len());

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let mut scratch = TransientFiles::new(&self.scratch_dir);

        let result = self.synthesize_all(job, label, segments, &mut scratch).await;

        let warnings = scratch.release();
        if !warnings.is_empty() {
            log::debug!(
                "{} transient file(s) left behind for job {}",
                warnings.len(),
                job
            );
        }
        result
    }

    async fn synthesize_all(
        &self,
        job: &JobId,
        label: &str,
        segments: Vec<Segment>,
        scratch: &mut TransientFiles,
    ) -> Result<AudioTrack> {
        let work: Vec<(Segment, PathBuf)> = segments
            .into_iter()
            .map(|segment| {
                let path = scratch.allocate(&job.segment_name(label, segment.index));
                (segment, path)
            })
            .collect();

        // Futures are lazy; `buffered` polls at most `concurrency` of them and
        // yields results in input order regardless of completion order.
        let pending: Vec<_> = work
            .iter()
            .map(|(segment, path)| self.synthesizer.synthesize(segment, path))
            .collect();
        let mut clips = stream::iter(pending).buffered(self.concurrency);

        let mut track = AudioTrack::new();
        while let Some(clip) = clips.next().await {
            track.append(clip?)?;
        }
        Ok(track)
    }
}
