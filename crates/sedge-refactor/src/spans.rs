//! The span-edit primitive: non-overlapping byte-range replacements.

use thiserror::Error;

/// Replace the half-open byte range `[start, end)` with `with`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEdit {
    pub start: usize,
    pub end: usize,
    pub with: String,
}

impl SpanEdit {
    pub fn new(start: usize, end: usize, with: impl Into<String>) -> Self {
        SpanEdit {
            start,
            end,
            with: with.into(),
        }
    }

    /// A pure insertion at a byte offset.
    pub fn insert(at: usize, with: impl Into<String>) -> Self {
        Self::new(at, at, with)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("span {start}..{end} is out of bounds for a {len}-byte source")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("span {a_start}..{a_end} overlaps span {b_start}..{b_end}")]
    Overlap {
        a_start: usize,
        a_end: usize,
        b_start: usize,
        b_end: usize,
    },
}

/// Apply a list of span edits to a source string.
///
/// Edits are sorted ascending by start and applied left to right with a
/// running offset equal to the cumulative length delta of the earlier
/// replacements. Overlapping spans are a caller bug and fail loudly; the
/// result is independent of the order equal-start insertions arrive in
/// only up to their relative order, which the sort keeps stable.
pub fn apply_edits(source: &str, edits: &[SpanEdit]) -> Result<String, EditError> {
    let mut edits: Vec<&SpanEdit> = edits.iter().collect();
    edits.sort_by_key(|e| e.start);

    for window in edits.windows(2) {
        let (a, b) = (window[0], window[1]);
        if a.end > b.start {
            return Err(EditError::Overlap {
                a_start: a.start,
                a_end: a.end,
                b_start: b.start,
                b_end: b.end,
            });
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        if edit.end > source.len() || edit.start > edit.end {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.with);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_left_to_right_with_offsets() {
        let src = "var a = 1; var b = 2;";
        let edits = vec![SpanEdit::new(0, 3, "let"), SpanEdit::new(11, 14, "const")];
        assert_eq!(
            apply_edits(src, &edits).unwrap(),
            "let a = 1; const b = 2;"
        );
    }

    #[test]
    fn order_of_submission_does_not_matter() {
        let src = "abcdef";
        let forward = vec![SpanEdit::new(0, 1, "X"), SpanEdit::new(3, 5, "YY")];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            apply_edits(src, &forward).unwrap(),
            apply_edits(src, &reversed).unwrap()
        );
    }

    #[test]
    fn insertions_at_a_point() {
        let src = "import A\nThing { }";
        let edits = vec![SpanEdit::insert(8, "\nimport B")];
        assert_eq!(apply_edits(src, &edits).unwrap(), "import A\nimport B\nThing { }");
    }

    #[test]
    fn growing_and_shrinking_replacements_accumulate() {
        let src = "aa bb cc";
        let edits = vec![
            SpanEdit::new(0, 2, "xxxx"),
            SpanEdit::new(3, 5, "y"),
            SpanEdit::new(6, 8, "zzz"),
        ];
        assert_eq!(apply_edits(src, &edits).unwrap(), "xxxx y zzz");
    }

    #[test]
    fn overlap_fails_loudly() {
        let src = "abcdef";
        let edits = vec![SpanEdit::new(0, 3, "x"), SpanEdit::new(2, 4, "y")];
        assert!(matches!(
            apply_edits(src, &edits),
            Err(EditError::Overlap { .. })
        ));
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let src = "abc";
        let edits = vec![SpanEdit::new(1, 9, "x")];
        assert!(matches!(
            apply_edits(src, &edits),
            Err(EditError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_edit_list_is_identity() {
        assert_eq!(apply_edits("abc", &[]).unwrap(), "abc");
    }
}
