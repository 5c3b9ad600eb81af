//! # BiDi Text Support
//!
//! Implements UAX#9 (Unicode Bidirectional Algorithm) for mixed LTR/RTL text.
//! Uses `unicode-bidi` for level resolution.
//!
//! The pipeline:
//! 1. Resolve an embedding level per char of the whole paragraph
//! 2. After line breaking, each line's units are visually reordered (L2)
//! 3. Mark glyphs get their anchors recomputed against the new order

use unicode_bidi::{BidiInfo, Level};

use crate::style::Direction;

/// Embedding levels of a paragraph, one per char.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphLevels {
    pub levels: Vec<Level>,
    /// Resolved paragraph direction.
    pub base_rtl: bool,
}

/// Resolve per-char embedding levels for `text`.
///
/// `direction` controls the paragraph-level direction:
/// - `Ltr` → paragraph is LTR
/// - `Rtl` → paragraph is RTL
/// - `Auto` → detect from first strong character
pub fn resolve_levels(text: &[char], direction: Direction) -> ParagraphLevels {
    let para_level = match direction {
        Direction::Ltr => Some(Level::ltr()),
        Direction::Rtl => Some(Level::rtl()),
        Direction::Auto => None,
    };

    if is_pure_ltr(text, direction) {
        return ParagraphLevels {
            levels: vec![Level::ltr(); text.len()],
            base_rtl: false,
        };
    }

    let string: String = text.iter().collect();
    let bidi_info = BidiInfo::new(&string, para_level);
    let base_rtl = bidi_info
        .paragraphs
        .first()
        .map(|p| p.level.is_rtl())
        .unwrap_or(matches!(direction, Direction::Rtl));

    // Levels are indexed by byte; take the one at each char's first byte.
    let levels = string
        .char_indices()
        .map(|(byte_idx, _)| {
            bidi_info
                .levels
                .get(byte_idx)
                .copied()
                .unwrap_or(Level::ltr())
        })
        .collect();

    ParagraphLevels { levels, base_rtl }
}

/// Check if text is purely LTR (no RTL characters at all).
/// This is a fast path to skip BiDi processing for the common case.
pub fn is_pure_ltr(text: &[char], direction: Direction) -> bool {
    if matches!(direction, Direction::Rtl) {
        return false;
    }
    !text.iter().copied().any(is_rtl_char)
}

/// Check if a character has an RTL BiDi class (R, AL, or AN).
fn is_rtl_char(ch: char) -> bool {
    matches!(ch,
        '\u{0590}'..='\u{05FF}' |  // Hebrew
        '\u{0600}'..='\u{06FF}' |  // Arabic
        '\u{0700}'..='\u{074F}' |  // Syriac
        '\u{0750}'..='\u{077F}' |  // Arabic Supplement
        '\u{0780}'..='\u{07BF}' |  // Thaana
        '\u{07C0}'..='\u{07FF}' |  // NKo
        '\u{0800}'..='\u{083F}' |  // Samaritan
        '\u{0840}'..='\u{085F}' |  // Mandaic
        '\u{08A0}'..='\u{08FF}' |  // Arabic Extended-A
        '\u{FB1D}'..='\u{FB4F}' |  // Hebrew Presentation Forms
        '\u{FB50}'..='\u{FDFF}' |  // Arabic Presentation Forms-A
        '\u{FE70}'..='\u{FEFF}' |  // Arabic Presentation Forms-B
        '\u{10800}'..='\u{10FFF}' |
        '\u{1E800}'..='\u{1EEFF}' |
        '\u{200F}' | '\u{202B}' | '\u{202E}' | '\u{2067}'
    )
}

/// Visual order of a line's units.
///
/// Returns logical indices in visual (left-to-right) order, computed with the
/// standard L2 rule: from the highest level down to the lowest odd level,
/// reverse every contiguous run at that level or higher.
pub fn visual_order(levels: &[Level]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    if levels.is_empty() {
        return order;
    }

    let min_level = levels.iter().copied().min().unwrap_or(Level::ltr());
    let max_level = levels.iter().copied().max().unwrap_or(Level::ltr());
    if !max_level.is_rtl() {
        return order;
    }

    let min_odd = if min_level.is_rtl() {
        min_level.number()
    } else {
        1
    };

    let mut current = max_level.number();
    while current >= min_odd {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]].number() >= current {
                let start = i;
                while i < order.len() && levels[order[i]].number() >= current {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        if current == 0 {
            break;
        }
        current -= 1;
    }

    order
}

/// Recompute mark anchors after reordering.
///
/// `anchors[i]` is the logical anchor delta of logical unit `i` (its base is
/// `i + delta`). Anchoring is positional, so after reordering each mark's
/// delta must point at where its base ended up. Returns the new deltas
/// indexed by visual position.
pub fn repair_mark_anchors(anchors: &[Option<isize>], order: &[usize]) -> Vec<Option<isize>> {
    let mut visual_of = vec![0usize; order.len()];
    for (visual, &logical) in order.iter().enumerate() {
        visual_of[logical] = visual;
    }

    order
        .iter()
        .enumerate()
        .map(|(visual, &logical)| {
            let delta = anchors.get(logical).copied().flatten()?;
            let base = logical as isize + delta;
            if base < 0 || base as usize >= order.len() {
                return Some(delta);
            }
            Some(visual_of[base as usize] as isize - visual as isize)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_pure_ltr() {
        assert!(is_pure_ltr(&chars("Hello World"), Direction::Ltr));
        assert!(is_pure_ltr(&chars("Hello World"), Direction::Auto));
        assert!(!is_pure_ltr(&chars("Hello World"), Direction::Rtl));
    }

    #[test]
    fn test_rtl_detection() {
        assert!(!is_pure_ltr(&chars("مرحبا"), Direction::Ltr));
        assert!(!is_pure_ltr(&chars("שלום"), Direction::Ltr));
    }

    #[test]
    fn auto_direction_detects_rtl_paragraph() {
        let levels = resolve_levels(&chars("שלום world"), Direction::Auto);
        assert!(levels.base_rtl);
        assert_eq!(levels.levels.len(), 10);
        assert!(levels.levels[0].is_rtl());
    }

    #[test]
    fn mixed_line_reverses_only_rtl_run() {
        // "ab" LTR, then three RTL chars.
        let levels = resolve_levels(&chars("ab אבג"), Direction::Ltr).levels;
        let order = visual_order(&levels);
        assert_eq!(order, vec![0, 1, 2, 5, 4, 3]);
    }

    #[test]
    fn pure_ltr_order_is_identity() {
        let levels = vec![Level::ltr(); 4];
        assert_eq!(visual_order(&levels), vec![0, 1, 2, 3]);
    }

    #[test]
    fn reversed_mark_points_forward_to_its_base() {
        // Base at logical 0, mark at logical 1 anchored to it; an RTL run
        // reverses them so the mark now precedes its base.
        let levels = vec![Level::rtl(); 2];
        let order = visual_order(&levels);
        assert_eq!(order, vec![1, 0]);
        let repaired = repair_mark_anchors(&[None, Some(-1)], &order);
        assert_eq!(repaired, vec![Some(1), None]);
    }
}
