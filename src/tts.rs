//! Speech synthesis via the ElevenLabs text-to-speech API.
//!
//! Each sentence is synthesized individually, in document order, through the
//! with-timestamps endpoint so the response carries character-level alignment
//! alongside the audio. When the service is unconfigured or degraded the
//! client substitutes a silent clip with estimated word timings, keeping the
//! rest of the pipeline oblivious.

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::alignment::{self, AlignmentData};
use crate::catalog;
use crate::renderer::Transcoder;
use crate::types::{Sentence, SECONDS_PER_WORD};

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const TTS_MODEL_ID: &str = "eleven_monolingual_v1";

const VOICE_STABILITY: f64 = 0.5;
const VOICE_SIMILARITY_BOOST: f64 = 0.75;

pub struct TtsClient {
    client: Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TtsResponse {
    audio_base64: Option<String>,
    alignment: Option<AlignmentData>,
}

impl TtsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Synthesize narration for one sentence into the working directory,
    /// filling its audio path, duration and word timings in place.
    pub async fn synthesize(
        &self,
        sentence: &mut Sentence,
        narrator_id: &str,
        engine: &dyn Transcoder,
        work_dir: &Path,
        index: usize,
    ) -> Result<()> {
        let out = work_dir.join(format!("audio_{:03}.mp3", index));

        let Some(key) = self.api_key.as_deref() else {
            log::warn!("No ElevenLabs API key configured; using silent narration");
            return mock_synthesize(sentence, engine, &out);
        };

        match self.request(key, sentence, narrator_id, engine, &out).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("Speech synthesis failed ({:#}); using silent narration", e);
                mock_synthesize(sentence, engine, &out)
            }
        }
    }

    async fn request(
        &self,
        key: &str,
        sentence: &mut Sentence,
        narrator_id: &str,
        engine: &dyn Transcoder,
        out: &Path,
    ) -> Result<()> {
        let narrator = catalog::resolve(narrator_id, catalog::NARRATORS);
        let url = format!(
            "{}/{}/with-timestamps",
            ELEVENLABS_API_BASE, narrator.voice_id
        );

        let payload = json!({
            "text": sentence.text,
            "model_id": TTS_MODEL_ID,
            "voice_settings": {
                "stability": VOICE_STABILITY,
                "similarity_boost": VOICE_SIMILARITY_BOOST
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", key)
            .json(&payload)
            .send()
            .await
            .context("Speech request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("ElevenLabs API error (HTTP {}): {}", status, body.trim());
        }

        let body: TtsResponse = resp.json().await.context("Invalid speech response body")?;
        let audio_b64 = body
            .audio_base64
            .ok_or_else(|| anyhow!("Speech response contained no audio"))?;
        let bytes = STANDARD
            .decode(audio_b64.as_bytes())
            .context("Speech response audio was not valid base64")?;
        fs::write(out, &bytes)
            .with_context(|| format!("Failed to write audio clip {}", out.display()))?;

        let duration = engine.probe_duration(out)?;

        let timestamps = match &body.alignment {
            Some(data) => match alignment::parse_alignment(data) {
                Ok(words) if !words.is_empty() => words,
                Ok(_) => alignment::estimate_word_timestamps(&sentence.text, duration),
                Err(e) => {
                    log::warn!("Malformed alignment payload ({}); estimating word timings", e);
                    alignment::estimate_word_timestamps(&sentence.text, duration)
                }
            },
            None => {
                log::warn!("No alignment data returned; estimating word timings");
                alignment::estimate_word_timestamps(&sentence.text, duration)
            }
        };

        sentence.audio_path = Some(out.to_string_lossy().to_string());
        sentence.duration = Some(duration);
        sentence.word_timestamps = Some(timestamps);
        Ok(())
    }
}

/// Offline fallback: a silent clip sized from the word count, with estimated
/// timings, so captions still animate sensibly.
fn mock_synthesize(sentence: &mut Sentence, engine: &dyn Transcoder, out: &Path) -> Result<()> {
    let duration = (sentence.text.split_whitespace().count() as f64 * SECONDS_PER_WORD).max(1.0);
    engine.synthesize_silence(out, duration)?;

    sentence.audio_path = Some(out.to_string_lossy().to_string());
    sentence.duration = Some(duration);
    sentence.word_timestamps = Some(alignment::estimate_word_timestamps(
        &sentence.text,
        duration,
    ));
    Ok(())
}
