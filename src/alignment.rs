//! Word-level caption timing, either extracted from the speech provider's
//! character alignment payload or estimated from text length.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::types::WordTimestamp;

/// Character-level timing metadata returned by the speech-synthesis provider.
/// The three arrays are parallel and must have equal length.
#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentData {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

/// Collapse character alignment into word timings. A word starts at the start
/// time of its first character and ends at the end time of its last; spaces
/// and newlines close the current word. Consecutive separators produce no
/// empty words.
pub fn parse_alignment(alignment: &AlignmentData) -> Result<Vec<WordTimestamp>> {
    let n = alignment.characters.len();
    if alignment.character_start_times_seconds.len() != n
        || alignment.character_end_times_seconds.len() != n
    {
        bail!(
            "alignment arrays have mismatched lengths: {} characters, {} starts, {} ends",
            n,
            alignment.character_start_times_seconds.len(),
            alignment.character_end_times_seconds.len()
        );
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut word_start = 0.0;
    let mut word_end = 0.0;

    for i in 0..n {
        let ch = alignment.characters[i].as_str();

        if ch == " " || ch == "\n" {
            if !current.is_empty() {
                words.push(WordTimestamp {
                    word: std::mem::take(&mut current),
                    start: word_start,
                    end: word_end,
                });
            }
            continue;
        }

        if current.is_empty() {
            word_start = alignment.character_start_times_seconds[i];
        }
        current.push_str(ch);
        word_end = alignment.character_end_times_seconds[i];
    }

    if !current.is_empty() {
        words.push(WordTimestamp {
            word: current,
            start: word_start,
            end: word_end,
        });
    }

    Ok(words)
}

/// Estimate per-word timings when no alignment data is available. Each word is
/// weighted by its character count plus one (a trailing-space proxy), and the
/// total duration is distributed proportionally with no gaps, so the last
/// word's end equals `duration` exactly.
pub fn estimate_word_timestamps(text: &str, duration: f64) -> Vec<WordTimestamp> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let total_weight: f64 = words
        .iter()
        .map(|w| w.chars().count() as f64 + 1.0)
        .sum();

    let mut current = 0.0;
    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let start = current;
            // Pin the final end to the exact duration so float accumulation
            // never drifts past it.
            let end = if i == last {
                duration
            } else {
                start + duration * (w.chars().count() as f64 + 1.0) / total_weight
            };
            current = end;
            WordTimestamp {
                word: (*w).to_string(),
                start,
                end,
            }
        })
        .collect()
}
