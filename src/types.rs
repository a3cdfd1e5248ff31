//! Shared data types for storyshorts

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Output canvas for vertical shorts (9:16 aspect ratio)
pub const VIDEO_WIDTH: u32 = 1080;
pub const VIDEO_HEIGHT: u32 = 1920;

/// Seconds of narration assumed per word when no real audio duration is known
pub const SECONDS_PER_WORD: f64 = 0.4;

/// Word-level timing in seconds, relative to the start of the sentence's own
/// audio clip (not the global timeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// A single unit of narration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_locked: bool,
    /// Path of the synthesized audio clip, once narration has run
    #[serde(default)]
    pub audio_path: Option<String>,
    /// Playback length of the audio clip in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub word_timestamps: Option<Vec<WordTimestamp>>,
}

impl Sentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            text: text.into(),
            is_locked: false,
            audio_path: None,
            duration: None,
            word_timestamps: None,
        }
    }

    /// Known audio duration, or a word-count estimate when narration has not
    /// produced one.
    pub fn duration_or_estimate(&self) -> f64 {
        self.duration
            .unwrap_or_else(|| self.text.split_whitespace().count() as f64 * SECONDS_PER_WORD)
    }
}

/// Organizational grouping of sentences. Sentences are concatenated across all
/// sections, in insertion order, to form the global narration timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub sentences: Vec<Sentence>,
}

impl Section {
    pub fn new(title: impl Into<String>, sentences: Vec<Sentence>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            sentences,
        }
    }
}

/// Caption reveal cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    /// One word at a time
    Popup,
    /// Whole sentence visible, current word highlighted
    Karaoke,
    /// Text accumulates word by word with a caret marker
    Typewriter,
    /// Whole sentence, no reveal animation
    Static,
}

impl AnimationType {
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "popup" => Some(Self::Popup),
            "karaoke" => Some(Self::Karaoke),
            "typewriter" => Some(Self::Typewriter),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

/// Full configuration for one video generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub prompt: String,
    pub script: Vec<Section>,
    pub narrator_id: String,
    pub caption_animation: AnimationType,
    pub caption_theme_id: String,
    pub caption_font_id: String,
    /// Horizontal anchor as a percentage of the canvas width (0-100)
    pub caption_x: f64,
    /// Vertical anchor as a percentage of the canvas height (0-100)
    pub caption_y: f64,
    /// Font scale multiplier (0.5-3.0)
    pub caption_scale: f64,
    pub background_id: String,
}

impl VideoConfig {
    /// All sentences in document order, across section boundaries.
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.script.iter().flat_map(|s| s.sentences.iter())
    }

    pub fn sentences_mut(&mut self) -> impl Iterator<Item = &mut Sentence> {
        self.script.iter_mut().flat_map(|s| s.sentences.iter_mut())
    }
}

/// Manifest written next to a finished render so a project can be revisited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub config: VideoConfig,
    pub output_path: String,
}

/// Short random identifier for script entities
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
