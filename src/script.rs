//! Script generation via the OpenAI chat completions API.
//!
//! Turns a rough prompt into a structured section/sentence script. The call is
//! bounded by a hard timeout; on timeout, transport failure or a missing API
//! key the client degrades to an offline mock script so the pipeline can still
//! run end to end.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::types::{Section, Sentence};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const SCRIPT_MODEL: &str = "gpt-4o-mini";

/// Hard cap on the script request; past this we fall back to the mock
const SCRIPT_TIMEOUT_SECS: u64 = 8;

const SYSTEM_INSTRUCTION: &str = r#"You are an expert viral scriptwriter for TikTok and YouTube Shorts, specializing in "Reddit Story" style content.

Your goal is to take a rough idea and turn it into a hook-filled, engaging FIRST-PERSON story suitable for video narration.

CRITICAL RULES:
1. **Perspective**: ALWAYS write in the **First Person ("I", "Me", "My")**. You are the protagonist telling your own story.
2. **Length**: The total story MUST be between **300 and 600 words**. Keep it concise but ensure the story is fully told.
3. **Tone**: Conversational, slightly dramatic, and engaging. Like you are telling a crazy secret to a friend.
4. **Formatting**: Split the story into **multiple distinct sections** (e.g., "The Hook", "The Story", "The Conclusion"). Use as many sections as necessary to tell the full story. Do NOT put the entire story in one section.

Return ONLY a valid JSON object. The JSON structure must be:
{
  "script": [
    {
      "title": "Section Title",
      "sentences": ["Sentence 1", "Sentence 2"]
    }
  ]
}

Do not include any markdown formatting, code blocks, or extra text. Only return the raw JSON object."#;

pub struct ScriptClient {
    client: Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawScript {
    #[serde(default)]
    script: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sentences: Vec<String>,
}

impl ScriptClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SCRIPT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }

    /// Generate a script for the prompt. Never fails outright: service
    /// problems degrade to the offline mock script.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<Section>> {
        if prompt.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(key) = self.api_key.as_deref() else {
            log::warn!("No OpenAI API key configured; using offline mock script");
            return Ok(mock_script(prompt));
        };

        match self.request(key, prompt).await {
            Ok(sections) => Ok(sections),
            Err(e) => {
                log::warn!("Script generation failed ({:#}); falling back to mock script", e);
                Ok(mock_script(prompt))
            }
        }
    }

    async fn request(&self, key: &str, prompt: &str) -> Result<Vec<Section>> {
        let payload = json!({
            "model": SCRIPT_MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": format!("Enhance this video idea into a compelling script: {}", prompt) }
            ],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });

        let resp = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .context("Script request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OpenAI API error (HTTP {}): {}", status, body.trim());
        }

        let body: ChatResponse = resp.json().await.context("Invalid script response body")?;
        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| anyhow!("Script response contained no content"))?;

        Ok(parse_script(content))
    }
}

/// Parse the model's JSON payload into sections. Accepts either the
/// `{"script": [...]}` object the prompt asks for or a bare section array.
/// Unparseable output degrades to a single section holding the raw text so
/// the story is never silently dropped.
pub fn parse_script(text: &str) -> Vec<Section> {
    let clean = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw_sections = match serde_json::from_str::<RawScript>(clean) {
        Ok(raw) if !raw.script.is_empty() => raw.script,
        _ => match serde_json::from_str::<Vec<RawSection>>(clean) {
            Ok(sections) if !sections.is_empty() => sections,
            _ => {
                log::warn!("Script response was not valid JSON; keeping raw text");
                return vec![Section::new("Script", vec![Sentence::new(clean)])];
            }
        },
    };

    raw_sections
        .into_iter()
        .map(|raw| {
            Section::new(
                raw.title.unwrap_or_else(|| "Section".to_string()),
                raw.sentences.into_iter().map(Sentence::new).collect(),
            )
        })
        .collect()
}

/// Canned three-section story used when the script service is unreachable
/// or unconfigured.
pub fn mock_script(prompt: &str) -> Vec<Section> {
    let topic = if prompt.trim().is_empty() {
        "something mysterious"
    } else {
        prompt.trim()
    };

    vec![
        Section::new(
            "The Hook",
            vec![
                Sentence::new(format!("Let me tell you a crazy story about {}.", topic)),
                Sentence::new("You probably won't believe what happened next."),
            ],
        ),
        Section::new(
            "The Context",
            vec![
                Sentence::new("It started like any normal day, but then I found the box."),
                Sentence::new("I realized I had made a huge mistake opening it."),
            ],
        ),
        Section::new(
            "The Resolution",
            vec![Sentence::new(
                "And that is why you should always double check the details.",
            )],
        ),
    ]
}
