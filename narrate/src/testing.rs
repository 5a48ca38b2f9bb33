//! Shared helpers for unit tests.

use crate::store::MemoryArtifactStore;
use crate::tts::{SegmentSynthesizer, SynthesisOptions};
use hound::{SampleFormat, WavSpec, WavWriter};
use speech_client::{MockProvider, SpeechRequest};
use std::io::Cursor;
use std::sync::Arc;

pub const TEST_SAMPLE_RATE: u32 = 16_000;

/// Encode 16-bit PCM samples as a WAV file in memory.
pub fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    wav_bytes_with_spec(spec, |writer| {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        Ok(())
    })
}

/// Encode a WAV file with an arbitrary spec.
pub fn wav_bytes_with_spec<F>(spec: WavSpec, write: F) -> Vec<u8>
where
    F: FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>) -> hound::Result<()>,
{
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        write(&mut writer).unwrap();
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Deterministic clip for a piece of text: one frame per character, every
/// sample set to the text's first byte so order can be checked after assembly.
pub fn tone_for(text: &str) -> Vec<u8> {
    let marker = i16::from(text.as_bytes().first().copied().unwrap_or(0));
    wav_bytes(TEST_SAMPLE_RATE, 1, &vec![marker; text.chars().count()])
}

/// Mock provider that answers every request with `tone_for(text)`.
pub fn tone_provider() -> MockProvider {
    MockProvider::responding_with(|req: &SpeechRequest| tone_for(&req.text))
}

pub fn synthesizer(provider: Arc<MockProvider>) -> SegmentSynthesizer {
    SegmentSynthesizer::new(provider, SynthesisOptions::default())
}

pub fn memory_store() -> Arc<MemoryArtifactStore> {
    Arc::new(MemoryArtifactStore::new())
}

/// Build a PDF with one Courier text line per page; empty strings give
/// pages without any text operators.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
