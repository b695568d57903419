//! # Text Utilities
//!
//! Word tokenization, hard splitting of oversized words and greedy line
//! packing. These are the pure calculations behind the text dimension and
//! paragraph formatters, kept free of the node tree so they can be tested
//! in isolation.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::style::TextAlign;

/// Tolerance for "fits" comparisons on accumulated widths.
pub const EPSILON: f64 = 1e-6;

/// A measured word. Words keep their trailing whitespace so the widths of
/// consecutive words add up to the width of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub width: f64,
    /// A mandatory break (newline) follows this word.
    pub forced_break: bool,
}

/// Split a run at UAX#14 break opportunities. Each segment keeps its
/// trailing spaces; mandatory breaks other than end-of-text are flagged and
/// their newline characters stripped.
pub fn split_words(text: &str) -> Vec<(String, bool)> {
    let mut words = Vec::new();
    let mut start = 0;
    for (end, opportunity) in linebreaks(text) {
        let segment = &text[start..end];
        start = end;
        let at_end = end == text.len();
        let forced = opportunity == BreakOpportunity::Mandatory && !at_end
            || segment.ends_with(['\n', '\r']);
        let segment = segment.trim_end_matches(['\n', '\r']);
        if segment.is_empty() && !forced {
            continue;
        }
        words.push((segment.to_string(), forced));
    }
    words
}

/// Split `word` into chunks no wider than `max_width`, taking the longest
/// fitting prefix each time. A chunk always holds at least one character.
pub fn hard_split(word: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = word;

    while !rest.is_empty() {
        if measure(rest) <= max_width + EPSILON {
            chunks.push(rest.to_string());
            break;
        }

        let mut cut = 0;
        for (index, ch) in rest.char_indices() {
            let end = index + ch.len_utf8();
            if measure(&rest[..end]) > max_width + EPSILON {
                break;
            }
            cut = end;
        }
        if cut == 0 {
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks
}

/// Tokenize and measure a text run, hard-splitting words wider than
/// `max_width`.
pub fn measure_words(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<Word> {
    let mut words = Vec::new();
    for (segment, forced_break) in split_words(text) {
        let width = measure(&segment);
        if max_width > 0.0 && width > max_width + EPSILON {
            let chunks = hard_split(&segment, max_width, &measure);
            let last = chunks.len().saturating_sub(1);
            for (i, chunk) in chunks.into_iter().enumerate() {
                words.push(Word {
                    width: measure(&chunk),
                    text: chunk,
                    forced_break: forced_break && i == last,
                });
            }
        } else {
            words.push(Word {
                text: segment,
                width,
                forced_break,
            });
        }
    }
    words
}

/// Input to the line packer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WordBox {
    pub width: f64,
    /// Start a new line before this word.
    pub break_before: bool,
    /// End the line after this word.
    pub break_after: bool,
}

/// A packed line of words.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    /// Index of the first word in this line.
    pub start: usize,
    /// One past the last word (exclusive end).
    pub end: usize,
    /// Sum of the word widths, spacing excluded.
    pub words_width: f64,
}

impl LineSpan {
    pub fn word_count(&self) -> usize {
        self.end - self.start
    }

    /// Width including the base spacing between words.
    pub fn width(&self, word_spacing: f64) -> f64 {
        self.words_width + word_spacing * self.word_count().saturating_sub(1) as f64
    }
}

/// Greedy line packing. A word that does not fit starts a new line; every
/// line holds at least one word.
pub fn pack_lines(words: &[WordBox], available_width: f64, word_spacing: f64) -> Vec<LineSpan> {
    let mut lines = Vec::new();
    if words.is_empty() {
        return lines;
    }

    let mut line_start = 0;
    let mut words_width = 0.0;
    let mut line_width = 0.0;

    for (i, word) in words.iter().enumerate() {
        let occupied = i > line_start;
        let needed = if occupied { word_spacing + word.width } else { word.width };

        if occupied && (word.break_before || line_width + needed > available_width + EPSILON) {
            lines.push(LineSpan {
                start: line_start,
                end: i,
                words_width,
            });
            line_start = i;
            words_width = word.width;
            line_width = word.width;
        } else {
            words_width += word.width;
            line_width += needed;
        }

        if word.break_after {
            lines.push(LineSpan {
                start: line_start,
                end: i + 1,
                words_width,
            });
            line_start = i + 1;
            words_width = 0.0;
            line_width = 0.0;
        }
    }

    if line_start < words.len() {
        lines.push(LineSpan {
            start: line_start,
            end: words.len(),
            words_width,
        });
    }

    lines
}

/// Horizontal offset of a line inside the available width.
pub fn alignment_offset(align: TextAlign, available_width: f64, line_width: f64) -> f64 {
    match align {
        TextAlign::Left | TextAlign::Justify => 0.0,
        TextAlign::Right => available_width - line_width,
        TextAlign::Center => (available_width - line_width) / 2.0,
    }
}

/// Word spacing that stretches a line to the available width.
pub fn justify_spacing(available_width: f64, words_width: f64, word_count: usize) -> f64 {
    if word_count < 2 {
        return 0.0;
    }
    ((available_width - words_width) / (word_count - 1) as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f64 {
        s.chars().count() as f64
    }

    fn boxes(widths: &[f64]) -> Vec<WordBox> {
        widths
            .iter()
            .map(|&width| WordBox {
                width,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_split_keeps_trailing_spaces() {
        let words: Vec<String> = split_words("some text with some words")
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(words, vec!["some ", "text ", "with ", "some ", "words"]);
    }

    #[test]
    fn test_split_flags_newlines() {
        let words = split_words("first\nsecond");
        assert_eq!(
            words,
            vec![("first".to_string(), true), ("second".to_string(), false)]
        );
    }

    #[test]
    fn test_hard_split_takes_longest_prefix() {
        let word = "a".repeat(105);
        let chunks = hard_split(&word, 100.0, chars);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1], "aaaaa");
    }

    #[test]
    fn test_hard_split_keeps_one_char_when_nothing_fits() {
        let chunks = hard_split("abc", 0.5, chars);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_measure_words_splits_oversized() {
        let text = format!("{} tail", "x".repeat(12));
        let words = measure_words(&text, 5.0, chars);
        let widths: Vec<f64> = words.iter().map(|w| w.width).collect();
        assert_eq!(widths, vec![5.0, 5.0, 3.0, 4.0]);
    }

    #[test]
    fn test_pack_greedy() {
        let lines = pack_lines(&boxes(&[10.0, 12.0, 10.0, 12.0, 15.0]), 25.0, 0.0);
        let spans: Vec<(usize, usize)> = lines.iter().map(|l| (l.start, l.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 4), (4, 5)]);
        assert_eq!(lines[0].words_width, 22.0);
    }

    #[test]
    fn test_pack_respects_spacing() {
        let lines = pack_lines(&boxes(&[10.0, 10.0]), 20.0, 1.0);
        assert_eq!(lines.len(), 2);
        let lines = pack_lines(&boxes(&[10.0, 10.0]), 21.0, 1.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width(1.0), 21.0);
    }

    #[test]
    fn test_pack_oversized_word_gets_own_line() {
        let lines = pack_lines(&boxes(&[50.0, 5.0]), 20.0, 0.0);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].start, lines[0].end), (0, 1));
    }

    #[test]
    fn test_pack_forced_breaks() {
        let mut words = boxes(&[5.0, 5.0, 5.0]);
        words[0].break_after = true;
        words[2].break_before = true;
        let lines = pack_lines(&words, 100.0, 0.0);
        let spans: Vec<(usize, usize)> = lines.iter().map(|l| (l.start, l.end)).collect();
        assert_eq!(spans, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(alignment_offset(TextAlign::Left, 100.0, 60.0), 0.0);
        assert_eq!(alignment_offset(TextAlign::Right, 100.0, 60.0), 40.0);
        assert_eq!(alignment_offset(TextAlign::Center, 100.0, 60.0), 20.0);
        assert_eq!(justify_spacing(100.0, 70.0, 4), 10.0);
        assert_eq!(justify_spacing(100.0, 70.0, 1), 0.0);
    }
}
