//! Fixed catalogs: narrators, caption themes, caption fonts, animations and
//! background footage. Entries are immutable and selected by id.
//!
//! Lookups are total: an unknown id resolves to the first catalog entry
//! instead of erroring, so a stale or misspelled id in a saved config can
//! never break a render.

use crate::types::AnimationType;

/// Implemented by every catalog entry so [`resolve`] works across catalogs.
pub trait CatalogEntry {
    fn id(&self) -> &str;
}

/// Total lookup. Falls back to the first entry when the id is unknown.
/// Catalogs are compile-time constants and never empty.
pub fn resolve<'a, T: CatalogEntry>(id: &str, catalog: &'a [T]) -> &'a T {
    catalog.iter().find(|e| e.id() == id).unwrap_or(&catalog[0])
}

/// A narration voice, mapped to its speech-provider voice id
pub struct Narrator {
    pub id: &'static str,
    pub name: &'static str,
    pub style: &'static str,
    pub voice_id: &'static str,
}

impl CatalogEntry for Narrator {
    fn id(&self) -> &str {
        self.id
    }
}

pub const NARRATORS: &[Narrator] = &[
    Narrator { id: "adam", name: "Adam", style: "Deep, Authoritative", voice_id: "pNInz6obpgDQGcFmaJgB" },
    Narrator { id: "josh", name: "Josh", style: "Deep, Narrator", voice_id: "TxGEqnHWrfWFTfGW9XjX" },
    Narrator { id: "clyde", name: "Clyde", style: "War Veteran, Intense", voice_id: "2EiwWnXFnvU5JabPnv8n" },
    Narrator { id: "charlie", name: "Charlie", style: "Casual, Natural", voice_id: "IKne3meq5aSn9XLyUdCD" },
    Narrator { id: "james", name: "James", style: "Deep, Australian", voice_id: "ZQe5CZNOzWyzPSCn5a3c" },
    Narrator { id: "sam", name: "Sam", style: "Raspy, Dynamic", voice_id: "yoZ06aMxZJJ28mfd3POQ" },
    Narrator { id: "rachel", name: "Rachel", style: "Calm, Professional", voice_id: "21m00Tcm4TlvDq8ikWAM" },
    Narrator { id: "freya", name: "Freya", style: "Dramatic, Expressive", voice_id: "jsCqWAovK2LkecY7zXl4" },
    Narrator { id: "emily", name: "Emily", style: "Calm, Soothing", voice_id: "LcfcDJNUP1GQjkzn1xUU" },
    Narrator { id: "matilda", name: "Matilda", style: "Warm, Friendly", voice_id: "XrExE9yKIg1WjnnlVkGX" },
    Narrator { id: "jessie", name: "Jessie", style: "Raspy, Intense", voice_id: "t0jbNlBVZ17f02VDIeMI" },
    Narrator { id: "dorothy", name: "Dorothy", style: "Pleasant, British", voice_id: "ThT5KcBeYPX3keUQqHPh" },
];

/// One of the three supported type-face families. Each carries its own base
/// point size on the 1080x1920 canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Inter,
    Bangers,
    RobotoMono,
}

impl FontFamily {
    /// Name the subtitle renderer matches against the loaded font files
    pub fn ass_name(self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Bangers => "Bangers",
            FontFamily::RobotoMono => "Roboto Mono",
        }
    }

    /// Base font size before the user scale multiplier is applied
    pub fn base_size(self) -> u32 {
        match self {
            FontFamily::Inter => 90,
            FontFamily::Bangers => 110,
            FontFamily::RobotoMono => 60,
        }
    }
}

pub struct CaptionFont {
    pub id: &'static str,
    pub name: &'static str,
    pub family: FontFamily,
    /// Download URL for the .ttf file
    pub url: &'static str,
    /// File name the font is stored under in the local fonts directory
    pub file_name: &'static str,
}

impl CatalogEntry for CaptionFont {
    fn id(&self) -> &str {
        self.id
    }
}

pub const CAPTION_FONTS: &[CaptionFont] = &[
    CaptionFont {
        id: "bold",
        name: "Bold Sans",
        family: FontFamily::Inter,
        url: "https://raw.githubusercontent.com/google/fonts/main/ofl/inter/Inter-Black.ttf",
        file_name: "Inter.ttf",
    },
    CaptionFont {
        id: "comic",
        name: "Comic",
        family: FontFamily::Bangers,
        url: "https://raw.githubusercontent.com/google/fonts/main/ofl/bangers/Bangers-Regular.ttf",
        file_name: "Bangers.ttf",
    },
    CaptionFont {
        id: "typewriter",
        name: "Typewriter",
        family: FontFamily::RobotoMono,
        url: "https://raw.githubusercontent.com/google/fonts/main/ofl/robotomono/RobotoMono-Bold.ttf",
        file_name: "RobotoMono.ttf",
    },
];

pub struct CaptionTheme {
    pub id: &'static str,
    pub name: &'static str,
    /// Web hex color (#RRGGBB)
    pub primary_color: &'static str,
    /// Web hex color (#RRGGBB), used for outline and border
    pub secondary_color: &'static str,
    /// Enables the soft glow (blur) treatment
    pub is_neon: bool,
}

impl CatalogEntry for CaptionTheme {
    fn id(&self) -> &str {
        self.id
    }
}

pub const CAPTION_THEMES: &[CaptionTheme] = &[
    CaptionTheme { id: "hormozi", name: "Bold Gold", primary_color: "#FFD700", secondary_color: "#000000", is_neon: false },
    CaptionTheme { id: "super_red", name: "Super Red", primary_color: "#FF0000", secondary_color: "#FFFFFF", is_neon: false },
    CaptionTheme { id: "neon_blue", name: "Neon Blue", primary_color: "#FFFFFF", secondary_color: "#00FFFF", is_neon: true },
    CaptionTheme { id: "matrix", name: "Matrix", primary_color: "#00FF00", secondary_color: "#000000", is_neon: false },
    CaptionTheme { id: "royal", name: "Royal Purple", primary_color: "#D8BFD8", secondary_color: "#4B0082", is_neon: false },
    CaptionTheme { id: "clean", name: "Clean White", primary_color: "#FFFFFF", secondary_color: "#000000", is_neon: false },
];

pub struct CaptionAnimation {
    pub id: AnimationType,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CAPTION_ANIMATIONS: &[CaptionAnimation] = &[
    CaptionAnimation { id: AnimationType::Popup, name: "Pop-Up", description: "Fast-paced, one word at a time." },
    CaptionAnimation { id: AnimationType::Karaoke, name: "Karaoke", description: "Highlight current word in sentence." },
    CaptionAnimation { id: AnimationType::Typewriter, name: "Typewriter", description: "Characters appear one by one." },
    CaptionAnimation { id: AnimationType::Static, name: "Static", description: "Clean full text. No motion." },
];

/// One full-length background clip with a known duration
pub struct BackgroundClip {
    pub id: &'static str,
    /// Remote URL or local file path
    pub source: &'static str,
    /// Playback length in seconds
    pub duration: f64,
}

/// A background footage option. When several clips exist, the renderer picks
/// one at random; `preview` is the fallback when none have been provisioned.
pub struct BackgroundOption {
    pub id: &'static str,
    pub name: &'static str,
    pub clips: &'static [BackgroundClip],
    pub preview: &'static str,
}

impl CatalogEntry for BackgroundOption {
    fn id(&self) -> &str {
        self.id
    }
}

pub const BACKGROUNDS: &[BackgroundOption] = &[
    BackgroundOption {
        id: "minecraft",
        name: "Minecraft Parkour",
        clips: &[
            BackgroundClip { id: "mc1", source: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/minecraft/full_1.mp4", duration: 300.0 },
            BackgroundClip { id: "mc2", source: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/minecraft/full_2.mp4", duration: 300.0 },
        ],
        preview: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/minecraft/preview.mp4",
    },
    BackgroundOption {
        id: "gta",
        name: "GTA V Ramps",
        clips: &[],
        preview: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/gta/preview.mp4",
    },
    BackgroundOption {
        id: "subway",
        name: "Subway Surfers",
        clips: &[
            BackgroundClip { id: "sub1", source: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/subway/full_1.mp4", duration: 300.0 },
        ],
        preview: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/subway/preview.mp4",
    },
    BackgroundOption {
        id: "slime",
        name: "Satisfying Slime",
        clips: &[],
        preview: "https://pub-404883f327e545929c96e214f0c46f31.r2.dev/slime/preview.mp4",
    },
];
