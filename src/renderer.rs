//! Video compositing orchestration.
//!
//! Sequences the external transcoding work: provision caption fonts, pick and
//! fetch a background clip, stitch the per-sentence narration audio, write the
//! compiled subtitle document, then run a single ffmpeg pass that burns the
//! captions and muxes the stitched audio over the background footage.
//!
//! All process spawning goes through the narrow [`Transcoder`] trait so tests
//! can substitute a fake engine, and all randomness (clip choice, start
//! offset, caption jitter) comes from an injected rng so tests can pin it.

use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::catalog::{self, BackgroundOption, CAPTION_FONTS};
use crate::subtitle;
use crate::types::VideoConfig;

/// Assumed upper bound on narration length. The random background start
/// offset is chosen so at least this much clip remains.
const MAX_NARRATION_SECS: f64 = 120.0;

/// Duration assumed for preview clips that carry no metadata
const DEFAULT_CLIP_DURATION: f64 = 300.0;

/// Coarse progress checkpoints reported during a render
const PROGRESS_STARTED: u8 = 5;
const PROGRESS_FONTS_LOADED: u8 = 15;
const PROGRESS_AUDIO_PREPARED: u8 = 40;
const PROGRESS_VIDEO_LOADED: u8 = 45;
const PROGRESS_READY_TO_RENDER: u8 = 50;
const PROGRESS_PROCESSING_DONE: u8 = 95;
const PROGRESS_COMPLETE: u8 = 100;

/// Callback receiving coarse render progress (0-100)
pub type ProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// One final compositing pass: background video sought to `start_offset`,
/// stitched narration audio, and the subtitle document burned in, truncated
/// to the shorter of the two streams on the 1080x1920 canvas.
pub struct CompositeJob<'a> {
    pub background: &'a Path,
    pub start_offset: f64,
    pub audio: &'a Path,
    pub subtitles: &'a Path,
    pub fonts_dir: &'a Path,
    pub output: &'a Path,
}

/// Narrow interface to the external transcoding engine
pub trait Transcoder {
    /// Media duration in seconds
    fn probe_duration(&self, path: &Path) -> Result<f64>;
    /// Write a silent audio track of the given length
    fn synthesize_silence(&self, out: &Path, duration: f64) -> Result<()>;
    /// Concatenate the audio files listed in a concat-format list file
    fn concat_audio(&self, list_file: &Path, out: &Path) -> Result<()>;
    /// Run the final compositing pass
    fn composite(&self, job: &CompositeJob<'_>) -> Result<()>;
}

/// Production engine backed by the system ffmpeg/ffprobe binaries
pub struct FfmpegTranscoder;

impl FfmpegTranscoder {
    /// Verify the required binaries are on PATH before starting a pipeline
    pub fn check_available() -> Result<()> {
        let mut missing = Vec::new();
        for bin in ["ffmpeg", "ffprobe"] {
            let found = Command::new(bin)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .output()
                .is_ok();
            if !found {
                missing.push(bin);
            }
        }
        if !missing.is_empty() {
            bail!(
                "Missing required dependencies: {}. Please install ffmpeg first.",
                missing.join(", ")
            );
        }
        Ok(())
    }
}

impl Transcoder for FfmpegTranscoder {
    fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .context("Failed to run ffprobe")?;

        let duration_str = String::from_utf8_lossy(&output.stdout);
        duration_str
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse duration of {}", path.display()))
    }

    fn synthesize_silence(&self, out: &Path, duration: f64) -> Result<()> {
        let output = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                "anullsrc=r=44100:cl=mono",
                "-t",
                &format!("{:.3}", duration),
                "-c:a",
                "libmp3lame",
                "-q:a",
                "9",
            ])
            .arg(out)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to run ffmpeg for silence generation")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg silence generation failed: {}", stderr.trim());
        }
        Ok(())
    }

    fn concat_audio(&self, list_file: &Path, out: &Path) -> Result<()> {
        let dir = list_file.parent().unwrap_or_else(|| Path::new("."));
        let run = |codec_args: &[&str]| -> Result<std::process::Output> {
            Command::new("ffmpeg")
                .current_dir(dir)
                .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "concat", "-safe", "0", "-i"])
                .arg(list_file)
                .args(codec_args)
                .arg(out)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .context("Failed to run ffmpeg for audio concat")
        };

        // Stream copy first; fall back to a re-encode when the clips disagree
        // on codec parameters.
        let output = run(&["-c", "copy"])?;
        if output.status.success() {
            return Ok(());
        }
        log::warn!("Audio concat with stream copy failed; retrying with re-encode");
        let output = run(&["-c:a", "libmp3lame"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg audio concat failed: {}", stderr.trim());
        }
        Ok(())
    }

    fn composite(&self, job: &CompositeJob<'_>) -> Result<()> {
        // Run from the subtitle file's directory so the ass= filter argument
        // stays a bare file name and needs no filter-syntax escaping.
        let dir = job.subtitles.parent().unwrap_or_else(|| Path::new("."));
        let subs_name = job
            .subtitles
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Invalid subtitle file name"))?;

        let vf = format!("ass={}:fontsdir={}", subs_name, job.fonts_dir.display());

        let output = Command::new("ffmpeg")
            .current_dir(dir)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-ss", &format!("{:.2}", job.start_offset)])
            .arg("-i")
            .arg(job.background)
            .arg("-i")
            .arg(job.audio)
            .args(["-vf", &vf])
            .args(["-c:v", "libx264", "-preset", "ultrafast", "-c:a", "aac"])
            .args(["-map", "0:v:0", "-map", "1:a:0", "-shortest"])
            .arg(job.output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to run ffmpeg for compositing")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg compositing failed: {}", stderr.trim());
        }
        Ok(())
    }
}

/// Pick one clip from a background option. Several clips: uniform random
/// choice. None provisioned: the preview clip with an assumed duration.
pub fn pick_background<'a, R: Rng>(
    option: &'a BackgroundOption,
    rng: &mut R,
) -> (&'a str, f64) {
    if option.clips.is_empty() {
        (option.preview, DEFAULT_CLIP_DURATION)
    } else {
        let clip = &option.clips[rng.gen_range(0..option.clips.len())];
        (clip.source, clip.duration)
    }
}

/// Random whole-second start offset, bounded so the remaining clip length
/// safely exceeds the assumed maximum narration length.
pub fn pick_start_offset<R: Rng>(clip_duration: f64, rng: &mut R) -> f64 {
    let safe_max = (clip_duration - MAX_NARRATION_SECS).max(0.0);
    if safe_max <= 0.0 {
        0.0
    } else {
        rng.gen_range(0.0..safe_max).floor()
    }
}

/// Create a clean per-run working directory under the system temp dir
pub fn prepare_work_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join("storyshorts");
    if dir.exists() {
        fs::remove_dir_all(&dir).context("Failed to clear working directory")?;
    }
    fs::create_dir_all(&dir).context("Failed to create working directory")?;
    Ok(dir)
}

/// Per-user cache directory for downloaded assets (fonts, background clips)
pub fn asset_cache_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyshorts")
}

/// Download every catalog font that is not already cached
pub async fn ensure_fonts(fonts_dir: &Path) -> Result<()> {
    fs::create_dir_all(fonts_dir).context("Failed to create fonts directory")?;
    for font in CAPTION_FONTS {
        let dest = fonts_dir.join(font.file_name);
        if dest.exists() {
            continue;
        }
        log::info!("Downloading caption font {} to {}", font.name, dest.display());
        let bytes = reqwest::get(font.url)
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to download font {}", font.name))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read font {}", font.name))?;
        fs::write(&dest, &bytes)
            .with_context(|| format!("Failed to save font to {}", dest.display()))?;
    }
    Ok(())
}

/// Resolve the configured background to a local file plus its duration.
/// A value naming an existing local file is used directly; otherwise it is
/// treated as a catalog id and the chosen clip is fetched into the cache.
async fn resolve_background<R: Rng>(
    background_id: &str,
    engine: &dyn Transcoder,
    rng: &mut R,
) -> Result<(PathBuf, f64)> {
    let local = Path::new(background_id);
    if local.is_file() {
        let duration = engine.probe_duration(local)?;
        return Ok((local.to_path_buf(), duration));
    }

    let option = catalog::resolve(background_id, catalog::BACKGROUNDS);
    let (source, duration) = pick_background(option, rng);

    if source.starts_with("http://") || source.starts_with("https://") {
        let cache = asset_cache_dir().join("backgrounds");
        fs::create_dir_all(&cache).context("Failed to create background cache")?;
        let file_name = source.rsplit('/').next().unwrap_or("clip.mp4");
        let dest = cache.join(format!("{}_{}", option.id, file_name));
        if !dest.exists() {
            log::info!("Downloading background clip {} to {}", source, dest.display());
            let bytes = reqwest::get(source)
                .await
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Failed to download background {}", source))?
                .bytes()
                .await
                .context("Failed to read background clip")?;
            fs::write(&dest, &bytes)
                .with_context(|| format!("Failed to save background to {}", dest.display()))?;
        }
        Ok((dest, duration))
    } else {
        let path = Path::new(source);
        if !path.is_file() {
            bail!("Background clip not found: {}", source);
        }
        Ok((path.to_path_buf(), duration))
    }
}

/// Run the full compositing sequence for a configured video.
///
/// Narration audio must already be synthesized into the working directory.
/// Any failure aborts the whole render; no partial output is kept.
pub async fn render_video<R: Rng>(
    config: &VideoConfig,
    engine: &dyn Transcoder,
    rng: &mut R,
    work_dir: &Path,
    fonts_dir: &Path,
    output: &Path,
    progress: Option<ProgressCallback>,
) -> Result<()> {
    let report = |pct: u8| {
        log::debug!("Render progress: {}%", pct);
        if let Some(cb) = progress.as_ref() {
            cb(pct);
        }
    };

    report(PROGRESS_STARTED);

    ensure_fonts(fonts_dir).await?;
    report(PROGRESS_FONTS_LOADED);

    // Stitch per-sentence narration clips in document order; when no sentence
    // has audio, substitute a silent track covering the estimated narration.
    let audio_files: Vec<&str> = config
        .sentences()
        .filter_map(|s| s.audio_path.as_deref())
        .collect();

    let combined_audio = work_dir.join("combined.mp3");
    if audio_files.is_empty() {
        let total: f64 = config.sentences().map(|s| s.duration_or_estimate()).sum();
        log::warn!("No narration audio present; rendering with {:.1}s of silence", total.max(1.0));
        engine.synthesize_silence(&combined_audio, total.max(1.0))?;
    } else {
        let list_path = work_dir.join("list.txt");
        let mut list = String::new();
        for path in &audio_files {
            let name = Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Invalid audio file name: {}", path))?;
            list.push_str(&format!("file '{}'\n", name));
        }
        fs::write(&list_path, list).context("Failed to write audio concat list")?;
        engine.concat_audio(&list_path, &combined_audio)?;
    }
    report(PROGRESS_AUDIO_PREPARED);

    let (background, clip_duration) =
        resolve_background(&config.background_id, engine, rng).await?;
    report(PROGRESS_VIDEO_LOADED);

    let start_offset = pick_start_offset(clip_duration, rng);
    log::info!(
        "Background {} ({}s clip), starting at {}s",
        background.display(),
        clip_duration,
        start_offset
    );

    let subs_path = work_dir.join("subs.ass");
    let ass = subtitle::generate_ass(config, rng);
    fs::write(&subs_path, ass).context("Failed to write subtitle document")?;
    report(PROGRESS_READY_TO_RENDER);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }

    engine.composite(&CompositeJob {
        background: &background,
        start_offset,
        audio: &combined_audio,
        subtitles: &subs_path,
        fonts_dir,
        output,
    })?;
    report(PROGRESS_PROCESSING_DONE);

    report(PROGRESS_COMPLETE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnimationType, Section, Sentence};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    /// Records engine calls instead of spawning processes
    struct FakeTranscoder {
        calls: RefCell<Vec<String>>,
        probed_duration: f64,
    }

    impl FakeTranscoder {
        fn new(probed_duration: f64) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                probed_duration,
            }
        }
    }

    impl Transcoder for FakeTranscoder {
        fn probe_duration(&self, path: &Path) -> Result<f64> {
            self.calls.borrow_mut().push(format!("probe {}", path.display()));
            Ok(self.probed_duration)
        }

        fn synthesize_silence(&self, out: &Path, duration: f64) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("silence {:.1}", duration));
            fs::write(out, b"").unwrap();
            Ok(())
        }

        fn concat_audio(&self, _list_file: &Path, out: &Path) -> Result<()> {
            self.calls.borrow_mut().push("concat".to_string());
            fs::write(out, b"").unwrap();
            Ok(())
        }

        fn composite(&self, job: &CompositeJob<'_>) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("composite ss={:.0}", job.start_offset));
            fs::write(job.output, b"").unwrap();
            Ok(())
        }
    }

    fn test_config(background_id: &str) -> VideoConfig {
        let mut s = Sentence::new("Hello world");
        s.duration = Some(2.0);
        VideoConfig {
            prompt: "test".to_string(),
            script: vec![Section::new("A", vec![s])],
            narrator_id: "adam".to_string(),
            caption_animation: AnimationType::Static,
            caption_theme_id: "hormozi".to_string(),
            caption_font_id: "bold".to_string(),
            caption_x: 50.0,
            caption_y: 50.0,
            caption_scale: 1.0,
            background_id: background_id.to_string(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("storyshorts_test").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_fonts_dir(base: &Path) -> PathBuf {
        let dir = base.join("fonts");
        fs::create_dir_all(&dir).unwrap();
        for font in CAPTION_FONTS {
            fs::write(dir.join(font.file_name), b"ttf").unwrap();
        }
        dir
    }

    #[test]
    fn test_pick_start_offset_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let offset = pick_start_offset(300.0, &mut rng);
            assert!(offset >= 0.0);
            assert!(offset < 180.0);
            assert_eq!(offset, offset.floor());
        }
    }

    #[test]
    fn test_pick_start_offset_short_clip_starts_at_zero() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(pick_start_offset(60.0, &mut rng), 0.0);
        assert_eq!(pick_start_offset(120.0, &mut rng), 0.0);
    }

    #[test]
    fn test_pick_background_prefers_full_clips() {
        let option = catalog::resolve("minecraft", catalog::BACKGROUNDS);
        let mut rng = StdRng::seed_from_u64(1);
        let (source, duration) = pick_background(option, &mut rng);
        assert!(option.clips.iter().any(|c| c.source == source));
        assert_eq!(duration, 300.0);
    }

    #[test]
    fn test_pick_background_empty_falls_back_to_preview() {
        let option = catalog::resolve("gta", catalog::BACKGROUNDS);
        let mut rng = StdRng::seed_from_u64(1);
        let (source, duration) = pick_background(option, &mut rng);
        assert_eq!(source, option.preview);
        assert_eq!(duration, 300.0);
    }

    #[tokio::test]
    async fn test_render_with_local_background_and_no_audio() {
        let dir = scratch_dir("render_silence");
        let fonts = fake_fonts_dir(&dir);
        let bg = dir.join("bg.mp4");
        fs::write(&bg, b"video").unwrap();

        let config = test_config(bg.to_str().unwrap());
        let engine = FakeTranscoder::new(300.0);
        let mut rng = StdRng::seed_from_u64(9);
        let out = dir.join("out.mp4");

        render_video(&config, &engine, &mut rng, &dir, &fonts, &out, None)
            .await
            .unwrap();

        let calls = engine.calls.borrow();
        // Silent fallback track covers the 2.0s estimated narration
        assert!(calls.iter().any(|c| c == "silence 2.0"));
        assert!(calls.iter().any(|c| c.starts_with("probe")));
        assert!(calls.iter().any(|c| c.starts_with("composite")));
        assert!(out.exists());
        // Subtitle document was compiled into the working dir
        let subs = fs::read_to_string(dir.join("subs.ass")).unwrap();
        assert!(subs.contains("Hello world"));
    }

    #[tokio::test]
    async fn test_render_concats_narration_audio() {
        let dir = scratch_dir("render_concat");
        let fonts = fake_fonts_dir(&dir);
        let bg = dir.join("bg.mp4");
        fs::write(&bg, b"video").unwrap();

        let mut config = test_config(bg.to_str().unwrap());
        let audio = dir.join("audio_000.mp3");
        fs::write(&audio, b"mp3").unwrap();
        config.script[0].sentences[0].audio_path = Some(audio.to_string_lossy().to_string());

        let engine = FakeTranscoder::new(300.0);
        let mut rng = StdRng::seed_from_u64(9);
        let out = dir.join("out.mp4");

        render_video(&config, &engine, &mut rng, &dir, &fonts, &out, None)
            .await
            .unwrap();

        assert!(engine.calls.borrow().iter().any(|c| c == "concat"));
        let list = fs::read_to_string(dir.join("list.txt")).unwrap();
        assert_eq!(list, "file 'audio_000.mp3'\n");
    }

    #[tokio::test]
    async fn test_render_reports_monotonic_progress() {
        let dir = scratch_dir("render_progress");
        let fonts = fake_fonts_dir(&dir);
        let bg = dir.join("bg.mp4");
        fs::write(&bg, b"video").unwrap();

        let config = test_config(bg.to_str().unwrap());
        let engine = FakeTranscoder::new(300.0);
        let mut rng = StdRng::seed_from_u64(9);
        let out = dir.join("out.mp4");

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let progress: ProgressCallback = Box::new(move |p| seen_cb.lock().unwrap().push(p));

        render_video(&config, &engine, &mut rng, &dir, &fonts, &out, Some(progress))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![5, 15, 40, 45, 50, 95, 100]);
    }
}
