//! Bounded before/after excerpts around change spans.

use crate::model::{ChangeSpan, Snippet};
use std::ops::Range;

/// Default number of context chars shown on each side of a change.
pub const DEFAULT_CONTEXT_MARGIN: usize = 25;

/// Cut one [`Snippet`] per span out of `old` and `new`.
///
/// Each window is the span widened by `context_margin` chars on both ends and
/// clamped to the text it is cut from; old and new windows are computed
/// independently from the span's own ranges. Ordinals are 1-based in span
/// order. Out-of-range spans are clamped rather than rejected.
#[must_use]
pub fn extract(
    old: &str,
    new: &str,
    spans: &[ChangeSpan],
    context_margin: usize,
) -> Vec<Snippet> {
    if spans.is_empty() {
        return Vec::new();
    }

    let old_text = CharText::new(old);
    let new_text = CharText::new(new);

    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let old_window = window(&span.old, context_margin, old_text.len());
            let new_window = window(&span.new, context_margin, new_text.len());
            Snippet {
                ordinal: i + 1,
                old_text: old_text.slice(&old_window).to_string(),
                new_text: new_text.slice(&new_window).to_string(),
                old_window,
                new_window,
            }
        })
        .collect()
}

fn window(span: &Range<usize>, margin: usize, len: usize) -> Range<usize> {
    let start = span.start.saturating_sub(margin).min(len);
    let end = span.end.saturating_add(margin).min(len).max(start);
    start..end
}

/// Char-indexed view of a string.
///
/// ASCII text indexes directly; other text keeps a table of char boundaries.
struct CharText<'a> {
    text: &'a str,
    boundaries: Option<Vec<usize>>,
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let boundaries = (!text.is_ascii()).then(|| {
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect()
        });
        Self { text, boundaries }
    }

    fn len(&self) -> usize {
        self.boundaries
            .as_ref()
            .map_or(self.text.len(), |b| b.len() - 1)
    }

    fn byte(&self, char_idx: usize) -> usize {
        self.boundaries.as_ref().map_or(char_idx, |b| b[char_idx])
    }

    fn slice(&self, chars: &Range<usize>) -> &'a str {
        &self.text[self.byte(chars.start)..self.byte(chars.end)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spans_give_no_snippets() {
        assert!(extract("abc", "abd", &[], 25).is_empty());
    }

    #[test]
    fn test_window_clamps_to_text() {
        let snippets = extract("var x=1;", "var x=2;", &[ChangeSpan::new(6..7, 6..7)], 25);
        assert_eq!(snippets.len(), 1);
        let s = &snippets[0];
        assert_eq!(s.ordinal, 1);
        assert_eq!(s.old_window, 0..8);
        assert_eq!(s.new_window, 0..8);
        assert_eq!(s.old_text, "var x=1;");
        assert_eq!(s.new_text, "var x=2;");
    }

    #[test]
    fn test_window_margin_inside_long_text() {
        let old = format!("{}OLD{}", "a".repeat(50), "b".repeat(50));
        let new = format!("{}NEW!{}", "a".repeat(50), "b".repeat(50));
        let snippets = extract(&old, &new, &[ChangeSpan::new(50..53, 50..54)], 5);
        assert_eq!(snippets[0].old_window, 45..58);
        assert_eq!(snippets[0].new_window, 45..59);
        assert_eq!(snippets[0].old_text, "aaaaaOLDbbbbb");
        assert_eq!(snippets[0].new_text, "aaaaaNEW!bbbbb");
    }

    #[test]
    fn test_windows_use_each_side_independently() {
        let snippets = extract("abcdef", "abXYZcdef", &[ChangeSpan::new(2..2, 2..5)], 1);
        assert_eq!(snippets[0].old_window, 1..3);
        assert_eq!(snippets[0].new_window, 1..6);
        assert_eq!(snippets[0].old_text, "bc");
        assert_eq!(snippets[0].new_text, "bXYZc");
    }

    #[test]
    fn test_out_of_range_span_is_clamped() {
        let snippets = extract("abc", "", &[ChangeSpan::new(10..20, 4..9)], 2);
        assert_eq!(snippets[0].old_window, 3..3);
        assert_eq!(snippets[0].new_window, 0..0);
        assert_eq!(snippets[0].old_text, "");
    }

    #[test]
    fn test_ordinals_follow_span_order() {
        let spans = [ChangeSpan::new(0..1, 0..1), ChangeSpan::new(5..6, 5..6)];
        let snippets = extract("0123456", "x1234y6", &spans, 0);
        let ordinals: Vec<usize> = snippets.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(snippets[1].old_text, "5");
        assert_eq!(snippets[1].new_text, "y");
    }

    #[test]
    fn test_non_ascii_slices_on_char_boundaries() {
        let old = "é→1;";
        let new = "é→2;";
        let snippets = extract(old, new, &[ChangeSpan::new(2..3, 2..3)], 1);
        assert_eq!(snippets[0].old_text, "→1;");
        assert_eq!(snippets[0].new_text, "→2;");
    }
}
