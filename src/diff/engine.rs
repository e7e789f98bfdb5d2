//! Text diff engine implementation.

use crate::model::ChangeSpan;
use similar::{Algorithm, DiffTag, TextDiff};
use std::time::Duration;

/// Default gap (in chars) below which neighbouring spans are merged.
pub const DEFAULT_MERGE_GAP: usize = 8;

/// Default time budget for each diff pass.
pub const DEFAULT_DIFF_TIMEOUT: Duration = Duration::from_secs(5);

/// Locates changed character regions between two texts.
///
/// Runs in two passes: a Myers line diff isolates the changed line blocks,
/// then a char diff inside each block pins down the exact characters. Only
/// the changed blocks are diffed at char level, which keeps large bundles
/// with small edits cheap. When a pass runs out of time, `similar` falls
/// back to a coarser but still correct alignment.
#[derive(Debug, Clone)]
pub struct TextDiffEngine {
    merge_gap: usize,
    timeout: Duration,
}

impl Default for TextDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDiffEngine {
    /// Create a new diff engine with default settings
    #[must_use]
    pub const fn new() -> Self {
        Self {
            merge_gap: DEFAULT_MERGE_GAP,
            timeout: DEFAULT_DIFF_TIMEOUT,
        }
    }

    /// Merge spans separated by at most `gap` unchanged chars on both sides
    #[must_use]
    pub const fn with_merge_gap(mut self, gap: usize) -> Self {
        self.merge_gap = gap;
        self
    }

    /// Time budget for each diff pass
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn merge_gap(&self) -> usize {
        self.merge_gap
    }

    /// Compute the change spans between `old` and `new`, in document order.
    ///
    /// Equal inputs yield no spans.
    #[must_use]
    pub fn diff(&self, old: &str, new: &str) -> Vec<ChangeSpan> {
        if old == new {
            return Vec::new();
        }

        let lines = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(self.timeout)
            .diff_lines(old, new);
        let old_index = LineIndex::new(lines.old_slices());
        let new_index = LineIndex::new(lines.new_slices());

        let mut raw = Vec::new();
        for op in lines.ops() {
            let (tag, old_lines, new_lines) = op.as_tag_tuple();
            if tag == DiffTag::Equal {
                continue;
            }
            let old_bytes = old_index.bytes(&old_lines);
            let new_bytes = new_index.bytes(&new_lines);
            self.refine(
                &old[old_bytes],
                &new[new_bytes],
                old_index.chars[old_lines.start],
                new_index.chars[new_lines.start],
                &mut raw,
            );
        }

        coalesce(raw, self.merge_gap)
    }

    /// Char-level diff of one changed line block, offset into document
    /// coordinates.
    fn refine(
        &self,
        old_block: &str,
        new_block: &str,
        old_base: usize,
        new_base: usize,
        out: &mut Vec<ChangeSpan>,
    ) {
        let chars = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(self.timeout)
            .diff_chars(old_block, new_block);
        for op in chars.ops() {
            let (tag, o, n) = op.as_tag_tuple();
            if tag == DiffTag::Equal {
                continue;
            }
            out.push(ChangeSpan::new(
                old_base + o.start..old_base + o.end,
                new_base + n.start..new_base + n.end,
            ));
        }
    }
}

/// Prefix sums of byte and char lengths over a text's lines.
struct LineIndex {
    bytes: Vec<usize>,
    chars: Vec<usize>,
}

impl LineIndex {
    fn new(lines: &[&str]) -> Self {
        let mut bytes = Vec::with_capacity(lines.len() + 1);
        let mut chars = Vec::with_capacity(lines.len() + 1);
        let (mut b, mut c) = (0, 0);
        bytes.push(0);
        chars.push(0);
        for line in lines {
            b += line.len();
            c += line.chars().count();
            bytes.push(b);
            chars.push(c);
        }
        Self { bytes, chars }
    }

    fn bytes(&self, lines: &std::ops::Range<usize>) -> std::ops::Range<usize> {
        self.bytes[lines.start]..self.bytes[lines.end]
    }
}

/// Merge spans that overlap, touch, or sit within `gap` chars of each other.
fn coalesce(spans: Vec<ChangeSpan>, gap: usize) -> Vec<ChangeSpan> {
    let mut merged: Vec<ChangeSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.is_near(&span, gap) => last.absorb(&span),
            _ => merged.push(span),
        }
    }
    merged
}
