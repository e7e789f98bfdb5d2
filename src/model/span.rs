//! Change spans and review snippets.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A region where two texts differ.
///
/// Each side is a half-open char range relative to its own text. A pure
/// insertion has an empty `old` range, a pure deletion an empty `new` range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpan {
    pub old: Range<usize>,
    pub new: Range<usize>,
}

impl ChangeSpan {
    #[must_use]
    pub const fn new(old: Range<usize>, new: Range<usize>) -> Self {
        Self { old, new }
    }

    /// Whether `other` starts within `gap` chars of this span's end on both sides.
    #[must_use]
    pub fn is_near(&self, other: &Self, gap: usize) -> bool {
        other.old.start <= self.old.end + gap && other.new.start <= self.new.end + gap
    }

    /// Extend this span to also cover `other`.
    pub fn absorb(&mut self, other: &Self) {
        self.old.start = self.old.start.min(other.old.start);
        self.old.end = self.old.end.max(other.old.end);
        self.new.start = self.new.start.min(other.new.start);
        self.new.end = self.new.end.max(other.new.end);
    }
}

/// A bounded before/after excerpt around one change span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// 1-based position among all snippets of one comparison
    pub ordinal: usize,
    pub old_window: Range<usize>,
    pub new_window: Range<usize>,
    pub old_text: String,
    pub new_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_near_requires_both_sides() {
        let a = ChangeSpan::new(0..2, 0..2);
        assert!(a.is_near(&ChangeSpan::new(4..5, 4..5), 2));
        assert!(!a.is_near(&ChangeSpan::new(4..5, 9..10), 2));
    }

    #[test]
    fn test_absorb_covers_both() {
        let mut a = ChangeSpan::new(2..4, 2..3);
        a.absorb(&ChangeSpan::new(6..6, 5..8));
        assert_eq!(a, ChangeSpan::new(2..6, 2..8));
    }
}
