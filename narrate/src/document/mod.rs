//! Document-to-audio orchestration: one artifact per page, optionally merged.

mod extract;

pub use extract::{PdfTextExtractor, PlainTextExtractor, TextExtractor};

use crate::audio::{AudioClip, AudioTrack};
use crate::error::{ConversionError, Result};
use crate::pipeline::TextToAudio;
use crate::store::{ArtifactRef, ArtifactStore, JobId};
use serde::Serialize;
use std::sync::Arc;

/// One page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUnit {
    /// Zero-based page number in the source document
    pub index: usize,
    pub text: String,
}

impl DocumentUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Merged,
    Split,
}

/// Outcome of a document conversion, serialized as the HTTP response body.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAudioResult {
    pub mode: RenderMode,
    /// Resolved per-page locations, in page order
    pub files: Vec<String>,
    /// Resolved location of the merged file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip)]
    pub pages: Vec<ArtifactRef>,
    #[serde(skip)]
    pub merged: Option<ArtifactRef>,
}

/// Drop pages without text, trim the rest and order them by page number.
pub fn surviving_units(units: Vec<DocumentUnit>) -> Vec<DocumentUnit> {
    let mut pages: Vec<DocumentUnit> = units
        .into_iter()
        .filter_map(|unit| {
            let text = unit.text.trim();
            (!text.is_empty()).then(|| DocumentUnit::new(unit.index, text))
        })
        .collect();
    pages.sort_by_key(|unit| unit.index);
    pages
}

/// Runs the text pipeline once per page of a document.
#[derive(Clone)]
pub struct DocumentNarrator {
    pipeline: Arc<TextToAudio>,
}

impl DocumentNarrator {
    pub fn new(pipeline: Arc<TextToAudio>) -> Self {
        Self { pipeline }
    }

    /// Convert every non-empty page to its own artifact, then optionally
    /// concatenate them into one merged artifact.
    ///
    /// A failing page aborts the job. Pages already written stay in the store.
    pub async fn render_document(
        &self,
        units: Vec<DocumentUnit>,
        merge: bool,
    ) -> Result<DocumentAudioResult> {
        let pages = surviving_units(units);
        if pages.is_empty() {
            return Err(ConversionError::NoExtractableText);
        }

        let job = JobId::new();
        let store = self.pipeline.store();
        log::info!("Converting {} page(s) for job {}", pages.len(), job);

        let mut artifacts = Vec::with_capacity(pages.len());
        for page in &pages {
            let label = format!("page{}", page.index + 1);
            let track = self.pipeline.render_track(&job, &label, &page.text).await?;
            let artifact = store
                .write(&job.page_name(page.index), track.to_wav_bytes()?)
                .await?;
            log::info!("Page {} => {}", page.index + 1, store.resolve(&artifact));
            artifacts.push(artifact);
        }

        let files = artifacts.iter().map(|a| store.resolve(a)).collect();
        if !merge {
            return Ok(DocumentAudioResult {
                mode: RenderMode::Split,
                files,
                url: None,
                pages: artifacts,
                merged: None,
            });
        }

        let mut merged = AudioTrack::new();
        for artifact in &artifacts {
            let bytes = store.read(artifact).await?;
            merged.append(AudioClip::from_wav_bytes(&bytes)?)?;
        }
        let merged_ref = store
            .write(&job.merged_name(), merged.to_wav_bytes()?)
            .await?;
        let url = store.resolve(&merged_ref);
        log::info!("Merged {} page(s) => {}", artifacts.len(), url);

        Ok(DocumentAudioResult {
            mode: RenderMode::Merged,
            files,
            url: Some(url),
            pages: artifacts,
            merged: Some(merged_ref),
        })
    }

    /// Extract pages from raw document bytes, then render them.
    pub async fn render_document_bytes(
        &self,
        bytes: Vec<u8>,
        extractor: Arc<dyn TextExtractor>,
        merge: bool,
    ) -> Result<DocumentAudioResult> {
        let format = extractor.name();
        // Parsing is CPU-bound; keep it off the async workers.
        let units = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| ConversionError::Extraction(format!("extraction task failed: {}", e)))??;
        log::debug!("Extracted {} {} unit(s)", units.len(), format);

        self.render_document(units, merge).await
    }
}
