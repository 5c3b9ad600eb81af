//! # Typography Service
//!
//! Layout never loads fonts. Glyph advances and, for scripts written without
//! spaces between words, legal break offsets come from a
//! [`TypographyService`] supplied by the caller. [`BasicTypography`] is a
//! deterministic stand-in with a fixed advance per character and no word
//! break discovery.

use unicode_script::{Script, UnicodeScript};

/// The font a run of text is shaped with.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub weight: u32,
}

/// One shaped glyph. Shaping is one glyph per input character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    /// Horizontal advance in points.
    pub advance: f64,
    /// For a mark glyph, the position of its base glyph relative to itself
    /// in the glyph sequence (`-1` is the glyph immediately before).
    pub anchor_delta: Option<isize>,
}

impl Glyph {
    pub fn is_mark(&self) -> bool {
        self.anchor_delta.is_some()
    }
}

/// Capability interface to the text shaping and word segmentation backend.
pub trait TypographyService {
    /// Shape `text` into exactly one glyph per character.
    fn shape(&self, text: &[char], font: &FontSpec) -> Vec<Glyph>;

    /// Legal break offsets (in chars, "break before this char") for text in a
    /// script that does not separate words. `None` means the backend cannot
    /// segment it, and only the generic line break rules apply.
    fn word_breaks(&self, _text: &str) -> Option<Vec<usize>> {
        None
    }
}

/// Fixed-pitch typography: every character advances half the font size,
/// combining marks have zero advance and anchor to the preceding glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTypography;

impl TypographyService for BasicTypography {
    fn shape(&self, text: &[char], font: &FontSpec) -> Vec<Glyph> {
        text.iter()
            .map(|&ch| {
                if is_combining_mark(ch) {
                    Glyph {
                        ch,
                        advance: 0.0,
                        anchor_delta: Some(-1),
                    }
                } else {
                    Glyph {
                        ch,
                        advance: font.size * 0.5,
                        anchor_delta: None,
                    }
                }
            })
            .collect()
    }
}

/// Whether `ch` belongs to a script written without spaces between words,
/// for which break points must be discovered by the typography service.
pub fn needs_word_break_discovery(ch: char) -> bool {
    matches!(
        ch.script(),
        Script::Thai | Script::Lao | Script::Khmer | Script::Myanmar | Script::Tibetan
    )
}

/// Whether a run of text contains any character needing break discovery.
pub fn has_special_script(text: &[char]) -> bool {
    text.iter().copied().any(needs_word_break_discovery)
}

/// Nonspacing combining marks of the blocks layout commonly meets.
pub fn is_combining_mark(ch: char) -> bool {
    matches!(ch,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{0483}'..='\u{0489}' |  // Cyrillic
        '\u{0591}'..='\u{05BD}' |  // Hebrew points
        '\u{05BF}' | '\u{05C1}' | '\u{05C2}' | '\u{05C4}' | '\u{05C5}' | '\u{05C7}' |
        '\u{0610}'..='\u{061A}' |  // Arabic
        '\u{064B}'..='\u{065F}' |
        '\u{0670}' |
        '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}' |  // Thai
        '\u{0EB1}' | '\u{0EB4}'..='\u{0EBC}' | '\u{0EC8}'..='\u{0ECD}' |  // Lao
        '\u{1AB0}'..='\u{1AFF}' |
        '\u{1DC0}'..='\u{1DFF}' |
        '\u{20D0}'..='\u{20FF}' |
        '\u{FE20}'..='\u{FE2F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f64) -> FontSpec {
        FontSpec {
            family: "Helvetica".into(),
            size,
            weight: 400,
        }
    }

    #[test]
    fn basic_typography_is_fixed_pitch() {
        let text: Vec<char> = "abc".chars().collect();
        let glyphs = BasicTypography.shape(&text, &font(10.0));
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs.iter().all(|g| (g.advance - 5.0).abs() < 1e-9));
    }

    #[test]
    fn combining_marks_have_no_advance() {
        let text: Vec<char> = "e\u{0301}".chars().collect();
        let glyphs = BasicTypography.shape(&text, &font(10.0));
        assert_eq!(glyphs[1].advance, 0.0);
        assert_eq!(glyphs[1].anchor_delta, Some(-1));
        assert!(!glyphs[0].is_mark());
    }

    #[test]
    fn thai_needs_break_discovery() {
        assert!(needs_word_break_discovery('ก'));
        assert!(!needs_word_break_discovery('a'));
        assert!(!needs_word_break_discovery('中'));
        assert!(BasicTypography.word_breaks("สวัสดี").is_none());
    }
}
