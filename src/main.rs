//! storyshorts
//! Turns a short text prompt into a narrated, captioned, 1080x1920 vertical
//! video: script generation, per-sentence speech synthesis with word-level
//! alignment, ASS caption compilation, and a single ffmpeg compositing pass.

mod alignment;
mod catalog;
mod config;
mod renderer;
mod script;
mod subtitle;
mod tts;
mod types;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use config::AppConfig;
use renderer::{FfmpegTranscoder, ProgressCallback};
use script::ScriptClient;
use tts::TtsClient;
use types::{AnimationType, ProjectManifest, VideoConfig};

#[derive(Parser)]
#[command(name = "storyshorts", version, about)]
struct Cli {
    /// Verbose logging, plus a debug.log file
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a text prompt
    Generate {
        /// The story idea to turn into a video
        prompt: String,
        /// Narrator voice id (see `list`)
        #[arg(long)]
        narrator: Option<String>,
        /// Caption theme id
        #[arg(long)]
        theme: Option<String>,
        /// Caption font id
        #[arg(long)]
        font: Option<String>,
        /// Caption animation: popup, karaoke, typewriter or static
        #[arg(long)]
        animation: Option<String>,
        /// Background footage id, or a path to a local video file
        #[arg(long)]
        background: Option<String>,
        /// Caption horizontal anchor, percent of canvas width (0-100)
        #[arg(long)]
        x: Option<f64>,
        /// Caption vertical anchor, percent of canvas height (0-100)
        #[arg(long)]
        y: Option<f64>,
        /// Caption size multiplier (0.5-3.0)
        #[arg(long)]
        scale: Option<f64>,
        /// Output file path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the available narrators, themes, fonts, animations and backgrounds
    List,
    /// Write a default settings.json to fill in
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    match cli.command {
        Commands::Generate {
            prompt,
            narrator,
            theme,
            font,
            animation,
            background,
            x,
            y,
            scale,
            out,
        } => {
            let result = generate(
                &prompt, narrator, theme, font, animation, background, x, y, scale, out,
            )
            .await;
            // Every failure is terminal for the run; the user re-triggers the
            // whole pipeline.
            if let Err(e) = result {
                log::error!("Video generation failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::List => list_catalogs(),
        Commands::Init => {
            AppConfig::create_default()?;
            println!("Wrote settings.json. Add your API keys to enable script and speech generation.");
        }
    }

    Ok(())
}

fn init_logging(debug: bool) -> Result<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if debug {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            LogConfig::default(),
            OpenOptions::new().create(true).append(true).open("debug.log")?,
        ));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logging")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn generate(
    prompt: &str,
    narrator: Option<String>,
    theme: Option<String>,
    font: Option<String>,
    animation: Option<String>,
    background: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    scale: Option<f64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let app_config = AppConfig::load()?;
    FfmpegTranscoder::check_available()?;

    let animation_id = animation.unwrap_or_else(|| app_config.default_animation.clone());
    let caption_animation = AnimationType::parse(&animation_id).unwrap_or_else(|| {
        log::warn!("Unknown animation '{}'; using popup", animation_id);
        AnimationType::Popup
    });

    let mut video_config = VideoConfig {
        prompt: prompt.to_string(),
        script: Vec::new(),
        narrator_id: narrator.unwrap_or_else(|| app_config.default_narrator.clone()),
        caption_animation,
        caption_theme_id: theme.unwrap_or_else(|| app_config.default_theme.clone()),
        caption_font_id: font.unwrap_or_else(|| app_config.default_font.clone()),
        caption_x: x.unwrap_or(app_config.caption_x).clamp(0.0, 100.0),
        caption_y: y.unwrap_or(app_config.caption_y).clamp(0.0, 100.0),
        caption_scale: scale.unwrap_or(app_config.caption_scale).clamp(0.5, 3.0),
        background_id: background.unwrap_or_else(|| app_config.default_background.clone()),
    };

    log::info!("Generating script for prompt: {:.80}", prompt);
    let script_client = ScriptClient::new(app_config.openai_key())?;
    video_config.script = script_client.generate(prompt).await?;
    if video_config.script.is_empty() {
        bail!("Prompt produced no script");
    }
    let sentence_count = video_config.sentences().count();
    log::info!(
        "Script ready: {} sections, {} sentences",
        video_config.script.len(),
        sentence_count
    );

    let work_dir = renderer::prepare_work_dir()?;
    let engine = FfmpegTranscoder;

    // Narration runs strictly in document order; the subtitle timeline
    // depends on it.
    let tts_client = TtsClient::new(app_config.elevenlabs_key());
    let narrator_id = video_config.narrator_id.clone();
    for (i, sentence) in video_config.sentences_mut().enumerate() {
        log::info!(
            "Synthesizing narration {}/{}: {:.60}",
            i + 1,
            sentence_count,
            sentence.text
        );
        tts_client
            .synthesize(sentence, &narrator_id, &engine, &work_dir, i)
            .await?;
    }

    let output = out.unwrap_or_else(|| {
        PathBuf::from(&app_config.output_dir)
            .join(format!("short_{}.mp4", Local::now().format("%Y%m%d_%H%M%S")))
    });

    let progress: ProgressCallback = Box::new(|pct| log::info!("Rendering... {}%", pct));
    let fonts_dir = renderer::asset_cache_dir().join("fonts");
    let mut rng = rand::thread_rng();
    renderer::render_video(
        &video_config,
        &engine,
        &mut rng,
        &work_dir,
        &fonts_dir,
        &output,
        Some(progress),
    )
    .await?;

    write_manifest(&video_config, &output)?;
    log::info!("Video written to {}", output.display());
    Ok(())
}

/// Save a project manifest next to the rendered video
fn write_manifest(video_config: &VideoConfig, output: &std::path::Path) -> Result<()> {
    let title: String = video_config.prompt.chars().take(60).collect();
    let manifest = ProjectManifest {
        id: types::generate_id(),
        title,
        created_at: Utc::now().to_rfc3339(),
        config: video_config.clone(),
        output_path: output.to_string_lossy().to_string(),
    };

    let manifest_path = output.with_extension("json");
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json)
        .with_context(|| format!("Failed to write manifest {}", manifest_path.display()))?;
    Ok(())
}

fn list_catalogs() {
    println!("Narrators:");
    for n in catalog::NARRATORS {
        println!("  {:<10} {} ({})", n.id, n.name, n.style);
    }
    println!("\nCaption themes:");
    for t in catalog::CAPTION_THEMES {
        println!("  {:<10} {}", t.id, t.name);
    }
    println!("\nCaption fonts:");
    for f in catalog::CAPTION_FONTS {
        println!("  {:<10} {}", f.id, f.name);
    }
    println!("\nAnimations:");
    for a in catalog::CAPTION_ANIMATIONS {
        println!("  {:<10} {}", a.name, a.description);
    }
    println!("\nBackgrounds:");
    for b in catalog::BACKGROUNDS {
        println!("  {:<10} {} ({} clips)", b.id, b.name, b.clips.len());
    }
}
