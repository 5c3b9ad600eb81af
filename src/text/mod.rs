//! # Text Segmentation
//!
//! Where a line may break. Generic rules come from UAX#14
//! (`unicode-linebreak`). Scripts written without spaces between words are
//! handed to the typography service instead; because a word may straddle
//! several styled runs, the runs of one such stretch are concatenated
//! before asking, and the answer is split back per run.

pub mod bidi;

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::typography::{has_special_script, TypographyService};

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.len()`. Each entry is the break
/// opportunity *before* that character position (i.e. "can we break before
/// char[i]?"). Index 0 is always `None` (no break before the first char).
pub fn compute_break_opportunities(text: &[char]) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.len();
    let mut result = vec![None; char_count];
    if char_count == 0 {
        return result;
    }

    let string: String = text.iter().collect();
    // linebreaks() yields byte offsets of the segment *after* each break.
    let mut byte_to_char = vec![0usize; string.len() + 1];
    for (char_idx, (byte_idx, _)) in string.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[string.len()] = char_count;

    for (byte_offset, opp) in linebreaks(&string) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx > 0 && char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

/// What an inline run looks like to break discovery.
#[derive(Debug, Clone, Copy)]
pub enum RunShape<'a> {
    Text(&'a [char]),
    /// A floated box: skipped over, does not end a stretch.
    Floating,
    /// Any other inline box: ends the current stretch.
    Atom,
}

/// One run's share of a special-script stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceMember {
    /// Index of the run among the paragraph's runs.
    pub run: usize,
    /// Char offset of the run's first char in the concatenated text.
    pub start: usize,
    pub len: usize,
}

/// Adjacent text runs in scripts without word separators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialScriptSequence {
    pub text: String,
    pub members: Vec<SequenceMember>,
    /// Floating runs that sat between members, by run index.
    pub skipped: Vec<usize>,
}

impl SpecialScriptSequence {
    fn char_len(&self) -> usize {
        self.members.last().map(|m| m.start + m.len).unwrap_or(0)
    }

    /// Split absolute break offsets back onto the member runs, re-offset to
    /// each run's local char indices.
    pub fn distribute(&self, breaks: &[usize]) -> Vec<(usize, Vec<usize>)> {
        self.members
            .iter()
            .map(|m| {
                let local = breaks
                    .iter()
                    .filter(|&&b| b >= m.start && b < m.start + m.len)
                    .map(|&b| b - m.start)
                    .collect();
                (m.run, local)
            })
            .collect()
    }
}

/// Group the runs of a paragraph into stretches needing break discovery.
pub fn find_special_sequences(runs: &[RunShape<'_>]) -> Vec<SpecialScriptSequence> {
    let mut sequences = Vec::new();
    let mut current = SpecialScriptSequence::default();
    let mut pending_skips = Vec::new();

    let mut close = |current: &mut SpecialScriptSequence, pending: &mut Vec<usize>| {
        pending.clear();
        if !current.members.is_empty() {
            sequences.push(std::mem::take(current));
        }
    };

    for (index, run) in runs.iter().enumerate() {
        match run {
            RunShape::Text(chars) if has_special_script(chars) => {
                let start = current.char_len();
                current.skipped.append(&mut pending_skips);
                current.members.push(SequenceMember {
                    run: index,
                    start,
                    len: chars.len(),
                });
                current.text.extend(chars.iter());
            }
            RunShape::Floating => {
                if !current.members.is_empty() {
                    pending_skips.push(index);
                }
            }
            RunShape::Text(_) | RunShape::Atom => close(&mut current, &mut pending_skips),
        }
    }
    close(&mut current, &mut pending_skips);
    sequences
}

/// Ask the typography service for break points of every special-script
/// stretch and return them per run, local to that run.
pub fn discover_special_breaks(
    runs: &[RunShape<'_>],
    typography: &dyn TypographyService,
) -> Vec<Option<Vec<usize>>> {
    let mut per_run = vec![None; runs.len()];
    for sequence in find_special_sequences(runs) {
        let Some(breaks) = typography.word_breaks(&sequence.text) else {
            continue;
        };
        log::trace!(
            "special-script stretch of {} runs yields {} breaks",
            sequence.members.len(),
            breaks.len()
        );
        for (run, local) in sequence.distribute(&breaks) {
            per_run[run] = Some(local);
        }
    }
    per_run
}
