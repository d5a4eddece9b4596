//! # Script Classification
//!
//! Detects the dominant writing system of a string so the text-fit solver
//! can pick per-script glyph coefficients.
//!
//! Scripts are tested in a fixed priority order and the first one with any
//! code point in the string wins:
//!
//! | Priority | Script | Ranges |
//! |----------|--------|--------|
//! | 1 | Arabic | U+0600–06FF, 0750–077F, 08A0–08FF, FB50–FDFF, FE70–FEFF |
//! | 2 | Hebrew | U+0590–05FF, FB1D–FB4F |
//! | 3 | Thai | U+0E00–0E7F |
//! | 4 | Korean | U+1100–11FF, 3130–318F, A960–A97F, AC00–D7AF |
//! | 5 | Japanese | U+3040–30FF (kana), 31F0–31FF, FF66–FF9F |
//! | 6 | Chinese | U+3400–4DBF, 4E00–9FFF, F900–FAFF, 20000–2A6DF |
//!
//! Japanese is checked before Chinese because Japanese text mixes kana with
//! Han ideographs; Han alone classifies as Chinese. Everything else,
//! including the empty string, is Latin.

use serde::{Deserialize, Serialize};

/// A writing system with distinct layout coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    #[default]
    Latin,
    Arabic,
    Hebrew,
    Thai,
    Japanese,
    Chinese,
    Korean,
}

impl Script {
    /// Right-to-left scripts.
    pub fn is_rtl(self) -> bool {
        matches!(self, Script::Arabic | Script::Hebrew)
    }

    /// Scripts whose shaping makes the estimate less reliable.
    pub fn is_complex(self) -> bool {
        matches!(self, Script::Arabic | Script::Hebrew | Script::Thai)
    }

    pub fn name(self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Arabic => "arabic",
            Script::Hebrew => "hebrew",
            Script::Thai => "thai",
            Script::Japanese => "japanese",
            Script::Chinese => "chinese",
            Script::Korean => "korean",
        }
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text direction derived from the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

type Ranges = &'static [(u32, u32)];

const ARABIC: Ranges = &[
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];
const HEBREW: Ranges = &[(0x0590, 0x05FF), (0xFB1D, 0xFB4F)];
const THAI: Ranges = &[(0x0E00, 0x0E7F)];
const KOREAN: Ranges = &[
    (0x1100, 0x11FF),
    (0x3130, 0x318F),
    (0xA960, 0xA97F),
    (0xAC00, 0xD7AF),
];
const JAPANESE: Ranges = &[(0x3040, 0x30FF), (0x31F0, 0x31FF), (0xFF66, 0xFF9F)];
const CHINESE: Ranges = &[
    (0x3400, 0x4DBF),
    (0x4E00, 0x9FFF),
    (0xF900, 0xFAFF),
    (0x20000, 0x2A6DF),
];

/// Priority order used by [`classify`].
const PRIORITY: &[(Script, Ranges)] = &[
    (Script::Arabic, ARABIC),
    (Script::Hebrew, HEBREW),
    (Script::Thai, THAI),
    (Script::Korean, KOREAN),
    (Script::Japanese, JAPANESE),
    (Script::Chinese, CHINESE),
];

fn in_ranges(c: char, ranges: Ranges) -> bool {
    let cp = c as u32;
    ranges.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// Classify the dominant script of `text`.
pub fn classify(text: &str) -> Script {
    PRIORITY
        .iter()
        .find(|(_, ranges)| text.chars().any(|c| in_ranges(c, ranges)))
        .map(|(script, _)| *script)
        .unwrap_or(Script::Latin)
}

/// Direction of `text` as implied by its script.
pub fn dominant_direction(text: &str) -> Direction {
    if classify(text).is_rtl() {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_latin() {
        assert_eq!(classify(""), Script::Latin);
    }

    #[test]
    fn test_latin() {
        assert_eq!(classify("Best before 2026-10-15"), Script::Latin);
        assert_eq!(classify("Crème brûlée"), Script::Latin);
    }

    #[test]
    fn test_arabic_is_rtl() {
        let script = classify("تاريخ الانتهاء");
        assert_eq!(script, Script::Arabic);
        assert!(script.is_rtl());
        assert_eq!(dominant_direction("تاريخ"), Direction::Rtl);
    }

    #[test]
    fn test_hebrew() {
        assert_eq!(classify("תאריך תפוגה"), Script::Hebrew);
        assert!(Script::Hebrew.is_rtl());
    }

    #[test]
    fn test_thai() {
        assert_eq!(classify("วันหมดอายุ"), Script::Thai);
        assert!(!Script::Thai.is_rtl());
    }

    #[test]
    fn test_japanese_beats_chinese() {
        // Kana mixed with kanji
        assert_eq!(classify("賞味期限です"), Script::Japanese);
        // Han only
        assert_eq!(classify("保质期"), Script::Chinese);
    }

    #[test]
    fn test_korean() {
        assert_eq!(classify("유통기한"), Script::Korean);
    }

    #[test]
    fn test_priority_arabic_over_latin_mix() {
        assert_eq!(classify("Lot 42 - دفعة"), Script::Arabic);
        assert_eq!(dominant_direction("Lot 42"), Direction::Ltr);
    }
}
