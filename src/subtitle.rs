//! ASS subtitle track compiler.
//!
//! Builds the complete time-coded caption document that gets burned into the
//! video: a header fixing the 1080x1920 canvas and one named style derived
//! from the chosen theme and font, followed by one Dialogue event per caption
//! beat. Sentences are walked in document order and a running global offset
//! places every event on the shared narration timeline.

use std::fmt::Write as _;

use rand::Rng;

use crate::alignment;
use crate::catalog::{self, FontFamily};
use crate::types::{AnimationType, VideoConfig, WordTimestamp, VIDEO_HEIGHT, VIDEO_WIDTH};

/// Color the non-active words are dimmed to in karaoke mode
const KARAOKE_INACTIVE_COLOR: &str = "&HAAAAAA&";

/// Words longer than this get the pop-up "impact" scale bump
const IMPACT_WORD_LEN: usize = 5;

/// Convert a web hex color (#RRGGBB) to the ASS BGR literal (&HBBGGRR&).
/// Anything that is not six hex digits maps to opaque white.
pub fn ass_color(hex: &str) -> String {
    let clean = hex.trim_start_matches('#');
    if clean.len() != 6 || !clean.bytes().all(|b| b.is_ascii_hexdigit()) {
        return "&HFFFFFF&".to_string();
    }
    format!("&H{}{}{}&", &clean[4..6], &clean[2..4], &clean[0..2])
}

/// Format seconds as an ASS timestamp (H:MM:SS.cc, centisecond precision)
pub fn format_ass_time(seconds: f64) -> String {
    let h = (seconds / 3600.0).floor() as u64;
    let m = ((seconds % 3600.0) / 60.0).floor() as u64;
    let s = (seconds % 60.0).floor() as u64;
    let cs = ((seconds * 100.0) % 100.0).floor() as u64;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}

/// Compile the full ASS document for a video configuration.
///
/// The style's Alignment is 5 (middle-center) and every event carries a
/// `\pos` override; together they make the configured (x%, y%) anchor the
/// geometric center of the rendered text block. The two must stay in sync.
///
/// Unknown theme/font ids resolve to the first catalog entry. The rng drives
/// the per-word jitter rotation of the comic font in pop-up mode.
pub fn generate_ass<R: Rng>(config: &VideoConfig, rng: &mut R) -> String {
    let theme = catalog::resolve(&config.caption_theme_id, catalog::CAPTION_THEMES);
    let font = catalog::resolve(&config.caption_font_id, catalog::CAPTION_FONTS);

    let primary_color = ass_color(theme.primary_color);
    let secondary_color = ass_color(theme.secondary_color);

    let font_size = (font.family.base_size() as f64 * config.caption_scale).round() as u32;

    let outline = 3;
    let shadow = 0;
    let blur = if theme.is_neon { 5 } else { 0 };

    let pos_x = (VIDEO_WIDTH as f64 * config.caption_x / 100.0).round() as i64;
    let pos_y = (VIDEO_HEIGHT as f64 * config.caption_y / 100.0).round() as i64;
    let pos_tag = format!("\\pos({},{})", pos_x, pos_y);

    let blur_tag = if blur > 0 {
        format!("\\blur{}", blur)
    } else {
        String::new()
    };

    let mut doc = String::new();
    let _ = write!(
        doc,
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {VIDEO_WIDTH}\n\
         PlayResY: {VIDEO_HEIGHT}\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: CustomStyle,{},{},{},{},{},&H80000000,-1,0,0,0,100,100,0,0,1,{},{},5,10,10,10,1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        font.family.ass_name(),
        font_size,
        primary_color,
        secondary_color,
        secondary_color,
        outline,
        shadow,
    );

    let emit = |doc: &mut String, start: f64, end: f64, text: &str| {
        let _ = writeln!(
            doc,
            "Dialogue: 0,{},{},CustomStyle,,0,0,0,,{}",
            format_ass_time(start),
            format_ass_time(end),
            text
        );
    };

    // Cumulative narration time before the current sentence begins. Sentence
    // order is load-bearing: reordering changes every downstream timestamp.
    let mut global_offset = 0.0_f64;

    for sentence in config.sentences() {
        let duration = sentence.duration_or_estimate();

        let timestamps: Vec<WordTimestamp> = match &sentence.word_timestamps {
            Some(ts) if !ts.is_empty() => ts.clone(),
            _ => alignment::estimate_word_timestamps(&sentence.text, duration),
        };

        match config.caption_animation {
            AnimationType::Popup => {
                for wt in &timestamps {
                    let abs_start = global_offset + wt.start;
                    let abs_end = global_offset + wt.end;

                    let scale_tag = if wt.word.chars().count() > IMPACT_WORD_LEN {
                        "\\fscx115\\fscy115"
                    } else {
                        ""
                    };
                    let rotate_tag = if font.family == FontFamily::Bangers {
                        format!("\\frz{}", if rng.gen_bool(0.5) { 5 } else { -5 })
                    } else {
                        String::new()
                    };

                    let text = format!("{{{pos_tag}{scale_tag}{blur_tag}{rotate_tag}}}{}", wt.word);
                    emit(&mut doc, abs_start, abs_end, &text);
                }
            }

            AnimationType::Karaoke => {
                for (index, wt) in timestamps.iter().enumerate() {
                    let abs_start = global_offset + wt.start;
                    let abs_end = global_offset + wt.end;

                    let line = timestamps
                        .iter()
                        .enumerate()
                        .map(|(i, t)| {
                            if i == index {
                                format!(
                                    "{{\\c{primary_color}\\fscx110\\fscy110{blur_tag}}}{}{{\\fscx100\\fscy100}}",
                                    t.word
                                )
                            } else {
                                format!("{{\\c{KARAOKE_INACTIVE_COLOR}\\blur0}}{}", t.word)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(" ");

                    let text = format!("{{{pos_tag}}}{line}");
                    emit(&mut doc, abs_start, abs_end, &text);
                }
            }

            AnimationType::Typewriter => {
                let mut accumulated = String::new();
                for wt in &timestamps {
                    let abs_start = global_offset + wt.start;
                    let abs_end = global_offset + wt.end;

                    if !accumulated.is_empty() {
                        accumulated.push(' ');
                    }
                    accumulated.push_str(&wt.word);

                    let text = format!("{{{pos_tag}}}{accumulated}_");
                    emit(&mut doc, abs_start, abs_end, &text);
                }
            }

            AnimationType::Static => {
                let text = format!("{{{pos_tag}{blur_tag}}}{}", sentence.text);
                emit(&mut doc, global_offset, global_offset + duration, &text);
            }
        }

        global_offset += duration;
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Section, Sentence};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sentence(text: &str, duration: f64, words: &[(&str, f64, f64)]) -> Sentence {
        let mut s = Sentence::new(text);
        s.duration = Some(duration);
        if !words.is_empty() {
            s.word_timestamps = Some(
                words
                    .iter()
                    .map(|(w, start, end)| WordTimestamp {
                        word: w.to_string(),
                        start: *start,
                        end: *end,
                    })
                    .collect(),
            );
        }
        s
    }

    fn config(animation: AnimationType, sentences: Vec<Sentence>) -> VideoConfig {
        VideoConfig {
            prompt: "test".to_string(),
            script: vec![Section::new("Section", sentences)],
            narrator_id: "adam".to_string(),
            caption_animation: animation,
            caption_theme_id: "hormozi".to_string(),
            caption_font_id: "bold".to_string(),
            caption_x: 50.0,
            caption_y: 50.0,
            caption_scale: 1.0,
            background_id: "minecraft".to_string(),
        }
    }

    fn dialogue_lines(doc: &str) -> Vec<&str> {
        doc.lines().filter(|l| l.starts_with("Dialogue:")).collect()
    }

    #[test]
    fn test_ass_color_reverses_byte_order() {
        assert_eq!(ass_color("#FFD700"), "&H00D7FF&");
        assert_eq!(ass_color("#000000"), "&H000000&");
        assert_eq!(ass_color("FF0000"), "&H0000FF&");
    }

    #[test]
    fn test_ass_color_malformed_defaults_to_white() {
        assert_eq!(ass_color("short"), "&HFFFFFF&");
        assert_eq!(ass_color("#FFD7"), "&HFFFFFF&");
        assert_eq!(ass_color("#GGGGGG"), "&HFFFFFF&");
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(2.0), "0:00:02.00");
        assert_eq!(format_ass_time(3.5), "0:00:03.50");
        assert_eq!(format_ass_time(61.25), "0:01:01.25");
        assert_eq!(format_ass_time(3661.0), "1:01:01.00");
    }

    #[test]
    fn test_header_fixes_canvas_and_style() {
        let cfg = config(AnimationType::Static, vec![sentence("Hi", 1.0, &[])]);
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        assert!(doc.contains("PlayResX: 1080"));
        assert!(doc.contains("PlayResY: 1920"));
        // Bold Gold on Inter at scale 1.0: size 90, primary &H00D7FF&
        assert!(doc.contains("Style: CustomStyle,Inter,90,&H00D7FF&,&H000000&,&H000000&"));
    }

    #[test]
    fn test_caption_scale_multiplies_base_size() {
        let mut cfg = config(AnimationType::Static, vec![sentence("Hi", 1.0, &[])]);
        cfg.caption_scale = 2.0;
        cfg.caption_font_id = "typewriter".to_string();
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        // RobotoMono base 60 * 2.0
        assert!(doc.contains("Style: CustomStyle,Roboto Mono,120,"));
    }

    #[test]
    fn test_position_tag_from_percentages() {
        let mut cfg = config(AnimationType::Static, vec![sentence("Hi", 1.0, &[])]);
        cfg.caption_x = 50.0;
        cfg.caption_y = 25.0;
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        assert!(doc.contains("\\pos(540,480)"));
    }

    #[test]
    fn test_unknown_theme_and_font_never_panic() {
        let mut cfg = config(AnimationType::Popup, vec![sentence("Hello there", 1.0, &[])]);
        cfg.caption_theme_id = "nope".to_string();
        cfg.caption_font_id = "missing".to_string();
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        // First entries: Bold Gold theme, Inter font
        assert!(doc.contains("Style: CustomStyle,Inter,90,&H00D7FF&"));
    }

    #[test]
    fn test_popup_emits_one_event_per_word() {
        let cfg = config(
            AnimationType::Popup,
            vec![sentence(
                "Hi there friend",
                3.0,
                &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0), ("friend", 2.0, 3.0)],
            )],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        assert_eq!(dialogue_lines(&doc).len(), 3);
    }

    #[test]
    fn test_popup_impact_scale_on_long_words() {
        let cfg = config(
            AnimationType::Popup,
            vec![sentence(
                "Hi extraordinary",
                2.0,
                &[("Hi", 0.0, 1.0), ("extraordinary", 1.0, 2.0)],
            )],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert!(!lines[0].contains("\\fscx115"));
        assert!(lines[1].contains("\\fscx115\\fscy115"));
    }

    #[test]
    fn test_popup_comic_font_adds_jitter_rotation() {
        let mut cfg = config(
            AnimationType::Popup,
            vec![sentence("Hi there", 2.0, &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0)])],
        );
        cfg.caption_font_id = "comic".to_string();
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(7));
        for line in dialogue_lines(&doc) {
            assert!(line.contains("\\frz5") || line.contains("\\frz-5"));
        }
    }

    #[test]
    fn test_karaoke_renders_full_sentence_per_event() {
        let cfg = config(
            AnimationType::Karaoke,
            vec![sentence("Hi there", 2.0, &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0)])],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 2);
        // Every event contains both words, the active one in the theme color
        for line in &lines {
            assert!(line.contains("Hi"));
            assert!(line.contains("there"));
            assert!(line.contains("&H00D7FF&"));
            assert!(line.contains("&HAAAAAA&"));
            assert!(line.contains("\\fscx110\\fscy110"));
        }
    }

    #[test]
    fn test_typewriter_accumulates_with_caret() {
        let cfg = config(
            AnimationType::Typewriter,
            vec![sentence("Hi there", 2.0, &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0)])],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Hi_"));
        assert!(lines[1].ends_with("Hi there_"));
    }

    #[test]
    fn test_static_emits_one_event_per_sentence() {
        let cfg = config(
            AnimationType::Static,
            vec![
                sentence("Hi there", 2.0, &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0)]),
                sentence("Bye", 1.5, &[("Bye", 0.0, 1.5)]),
            ],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("0:00:00.00,0:00:02.00"));
        assert!(lines[0].ends_with("Hi there"));
        assert!(lines[1].contains("0:00:02.00,0:00:03.50"));
        assert!(lines[1].ends_with("Bye"));
    }

    #[test]
    fn test_global_offset_accumulates_across_sentences() {
        let cfg = config(
            AnimationType::Popup,
            vec![
                sentence("Hi there", 2.0, &[("Hi", 0.0, 1.0), ("there", 1.0, 2.0)]),
                sentence("Bye", 1.5, &[("Bye", 0.0, 1.5)]),
            ],
        );
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 3);
        // Second sentence's event starts at the 2.0s offset
        assert!(lines[2].contains("0:00:02.00,0:00:03.50"));
    }

    #[test]
    fn test_missing_timestamps_fall_back_to_estimation() {
        // No word timestamps and no duration: word count * 0.4s estimate
        let cfg = config(AnimationType::Popup, vec![Sentence::new("one two")]);
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 2);
        // Total estimated span is 0.8s
        assert!(lines[1].contains(",0:00:00.80,"));
    }

    #[test]
    fn test_neon_theme_enables_blur() {
        let mut cfg = config(AnimationType::Static, vec![sentence("Hi", 1.0, &[])]);
        cfg.caption_theme_id = "neon_blue".to_string();
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        assert!(doc.contains("\\blur5"));
    }

    #[test]
    fn test_empty_script_emits_header_only() {
        let cfg = config(AnimationType::Popup, vec![]);
        let doc = generate_ass(&cfg, &mut StdRng::seed_from_u64(1));
        assert!(dialogue_lines(&doc).is_empty());
        assert!(doc.contains("[Events]"));
    }
}
