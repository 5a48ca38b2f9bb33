//! narrate - Convert text and PDF documents to spoken audio

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use narrate::config::NarrateConfig;
use narrate::document::{DocumentNarrator, PdfTextExtractor, PlainTextExtractor, TextExtractor};
use narrate::pipeline::TextToAudio;
use narrate::server;
use narrate::store::{ArtifactStore, FsArtifactStore};
use narrate::tts::SegmentSynthesizer;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Convert text and PDF documents to spoken audio", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert text to a single audio file
    Text {
        /// Text to speak (reads --file or stdin when omitted)
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Output file path (default: <output_dir>/<job>_speech.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it already exists
        #[arg(long)]
        force: bool,
    },
    /// Convert a document to one audio file per page
    Pdf {
        /// Path to the PDF (or .txt) document
        file: PathBuf,

        /// Keep per-page files only, without a merged file
        #[arg(long)]
        no_merge: bool,
    },
    /// Run the HTTP conversion service
    Serve {
        /// Address to listen on (default from config)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default language
    SetLanguage {
        /// Language code understood by the speech engine (e.g. "en", "de")
        language: String,
    },
    /// Set maximum characters per segment
    SetChunkLimit {
        /// Value (at least 1)
        value: usize,
    },
    /// Set speech provider
    SetProvider {
        /// Provider kind (command, openai-compatible)
        kind: String,
        /// Engine executable (command) or model name (openai-compatible)
        #[arg(long)]
        engine: Option<String>,
        /// Base URL (openai-compatible)
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match args.command {
        Commands::Config { action } => handle_config_command(&action),
        Commands::Text {
            text,
            file,
            output,
            force,
        } => {
            let config = NarrateConfig::load().context("Failed to load configuration")?;
            let text = read_input_text(text, file.as_deref())?;
            let written = convert_text(&config, &text, output.as_deref(), force).await?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Pdf { file, no_merge } => {
            let config = NarrateConfig::load().context("Failed to load configuration")?;
            convert_document(&config, &file, !no_merge).await
        }
        Commands::Serve { addr } => {
            let config = NarrateConfig::load().context("Failed to load configuration")?;
            let addr = addr.unwrap_or_else(|| config.bind_addr.clone());
            run_server(&config, &addr).await
        }
    }
}

/// Create the speech synthesizer described by the configuration.
fn build_synthesizer(config: &NarrateConfig, require_engine: bool) -> Result<SegmentSynthesizer> {
    let provider = speech_client::get_provider(&config.provider)
        .context("Failed to configure speech provider")?;

    if let Err(e) = provider.is_available() {
        if require_engine {
            return Err(e).context(format!("Speech provider '{}' is not usable", provider.name()));
        }
        log::warn!("Speech provider '{}' is not usable yet: {}", provider.name(), e);
    }
    log::debug!("Using speech provider '{}'", provider.name());

    Ok(SegmentSynthesizer::new(
        Arc::from(provider),
        config.synthesis_options(),
    ))
}

fn build_pipeline(
    config: &NarrateConfig,
    store: Arc<dyn ArtifactStore>,
    require_engine: bool,
) -> Result<Arc<TextToAudio>> {
    let pipeline = TextToAudio::new(
        build_synthesizer(config, require_engine)?,
        store,
        config.scratch_dir(),
    )
    .with_chunk_limit(config.chunk_limit)
    .with_concurrency(config.synthesis_concurrency);
    Ok(Arc::new(pipeline))
}

fn read_input_text(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read text from stdin")?;
    Ok(buf)
}

async fn convert_text(
    config: &NarrateConfig,
    text: &str,
    output: Option<&Path>,
    force: bool,
) -> Result<PathBuf> {
    let Some(path) = output else {
        let dir = &config.output_dir;
        let store = Arc::new(FsArtifactStore::new(dir, &dir.to_string_lossy())?);
        let pipeline = build_pipeline(config, store.clone(), true)?;
        let artifact = pipeline.render(text, None).await?;
        return Ok(store.path(&artifact));
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", path.display()))?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let replace = path.exists();
    if replace && !force {
        anyhow::bail!(
            "Output file already exists: {} (use --force to replace it)",
            path.display()
        );
    }

    let store = Arc::new(FsArtifactStore::new(&dir, &dir.to_string_lossy())?);
    let pipeline = build_pipeline(config, store.clone(), true)?;
    if !replace {
        let artifact = pipeline.render(text, Some(name.as_str())).await?;
        return Ok(store.path(&artifact));
    }

    // The existing file is only touched once the new audio is fully written.
    let staged = store.path(&pipeline.render(text, None).await?);
    if let Err(e) = std::fs::rename(&staged, path) {
        let _ = std::fs::remove_file(&staged);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(path.to_path_buf())
}

async fn convert_document(config: &NarrateConfig, file: &Path, merge: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Document not found: {}", file.display());
    }
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let extractor: Arc<dyn TextExtractor> = match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("txt") => Arc::new(PlainTextExtractor),
        _ => Arc::new(PdfTextExtractor),
    };

    let dir = &config.output_dir;
    let store = Arc::new(FsArtifactStore::new(dir, &dir.to_string_lossy())?);
    let narrator = DocumentNarrator::new(build_pipeline(config, store, true)?);
    let result = narrator
        .render_document_bytes(bytes, extractor, merge)
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_server(config: &NarrateConfig, addr: &str) -> Result<()> {
    let store = Arc::new(FsArtifactStore::new(&config.output_dir, "/static")?);
    let static_dir = store.root().to_path_buf();
    let pipeline = build_pipeline(config, store, false)?;

    let state = server::AppState::new(pipeline, static_dir, config.request_timeout());
    server::serve(addr, state).await
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = NarrateConfig::load()?;
            println!("Configuration file: {:?}", NarrateConfig::config_path()?);
            println!();
            println!("chunk_limit = {}", config.chunk_limit);
            println!("language = \"{}\"", config.language);
            if let Some(voice) = &config.voice {
                println!("voice = \"{}\"", voice);
            } else {
                println!("voice = (engine default)");
            }
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!("scratch_dir = \"{}\"", config.scratch_dir().display());
            println!("synthesis_concurrency = {}", config.synthesis_concurrency);
            println!("max_retries = {}", config.max_retries);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("bind_addr = \"{}\"", config.bind_addr);
            println!("provider.kind = \"{}\"", config.provider.kind);
            println!("provider.command = \"{}\"", config.provider.command.display());
            if let Some(url) = &config.provider.base_url {
                println!("provider.base_url = \"{}\"", url);
            }
            if let Some(model) = &config.provider.model {
                println!("provider.model = \"{}\"", model);
            }
        }
        ConfigAction::SetLanguage { language } => {
            let mut config = NarrateConfig::load()?;
            config.language = language.clone();
            config.save()?;
            println!("Default language set to: {}", config.language);
        }
        ConfigAction::SetChunkLimit { value } => {
            if *value == 0 {
                anyhow::bail!("Chunk limit must be at least 1");
            }
            let mut config = NarrateConfig::load()?;
            config.chunk_limit = *value;
            config.save()?;
            println!("Chunk limit set to: {}", config.chunk_limit);
        }
        ConfigAction::SetProvider {
            kind,
            engine,
            base_url,
        } => {
            let kind = speech_client::ProviderKind::from_str(kind)?;
            let mut config = NarrateConfig::load()?;
            config.provider.kind = kind.as_str().to_string();
            match kind {
                speech_client::ProviderKind::Command => {
                    if let Some(engine) = engine {
                        config.provider.command = PathBuf::from(engine);
                    }
                }
                speech_client::ProviderKind::OpenAICompatible => {
                    if let Some(engine) = engine {
                        config.provider.model = Some(engine.clone());
                    }
                }
            }
            if let Some(url) = base_url {
                config.provider.base_url = Some(url.clone());
            }
            config.save()?;
            println!("Speech provider set to: {}", config.provider.kind);
        }
    }
    Ok(())
}
