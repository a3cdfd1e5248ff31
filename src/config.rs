//! Configuration management for storyshorts.
//! Settings are loaded from settings.json in the working directory; a missing
//! file falls back to defaults so the tool still runs in offline mock mode.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration stored in settings.json
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// OpenAI API key for script generation
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// ElevenLabs API key for speech synthesis
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,
    #[serde(default = "default_narrator")]
    pub default_narrator: String,
    #[serde(default = "default_theme")]
    pub default_theme: String,
    #[serde(default = "default_font")]
    pub default_font: String,
    #[serde(default = "default_animation")]
    pub default_animation: String,
    #[serde(default = "default_background")]
    pub default_background: String,
    /// Caption anchor, percentage of canvas width (0-100)
    #[serde(default = "default_caption_x")]
    pub caption_x: f64,
    /// Caption anchor, percentage of canvas height (0-100)
    #[serde(default = "default_caption_y")]
    pub caption_y: f64,
    /// Caption size multiplier (0.5-3.0)
    #[serde(default = "default_caption_scale")]
    pub caption_scale: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_narrator() -> String {
    "adam".to_string()
}

fn default_theme() -> String {
    "hormozi".to_string()
}

fn default_font() -> String {
    "bold".to_string()
}

fn default_animation() -> String {
    "popup".to_string()
}

fn default_background() -> String {
    "minecraft".to_string()
}

fn default_caption_x() -> f64 {
    50.0
}

fn default_caption_y() -> f64 {
    50.0
}

fn default_caption_scale() -> f64 {
    1.0
}

fn default_output_dir() -> String {
    "./output".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            elevenlabs_api_key: None,
            default_narrator: default_narrator(),
            default_theme: default_theme(),
            default_font: default_font(),
            default_animation: default_animation(),
            default_background: default_background(),
            caption_x: default_caption_x(),
            caption_y: default_caption_y(),
            caption_scale: default_caption_scale(),
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Configuration file name
    const CONFIG_PATH: &'static str = "settings.json";

    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        if !Path::new(Self::CONFIG_PATH).exists() {
            log::debug!("No settings.json found; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(Self::CONFIG_PATH)
            .context("Failed to read settings.json")?;
        serde_json::from_str(&content).context("Failed to parse settings.json")
    }

    /// Write a default configuration file for the user to fill in
    pub fn create_default() -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(Self::CONFIG_PATH, json).context("Failed to write settings.json")?;
        Ok(())
    }

    /// Script-generation key: settings value, or the OPENAI_API_KEY env var
    pub fn openai_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Speech key: settings value, or the ELEVENLABS_API_KEY env var
    pub fn elevenlabs_key(&self) -> Option<String> {
        self.elevenlabs_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}
