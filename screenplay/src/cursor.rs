use crate::document::Document;

/// A logical position: block index plus char offset within that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor {
    pub block: usize,
    pub offset: usize,
}

impl Cursor {
    pub fn new(block: usize, offset: usize) -> Self {
        Cursor { block, offset }
    }
}

/// An anchor/head pair. Collapsed when both ends coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    pub anchor: Cursor,
    pub head: Cursor,
}

impl Selection {
    pub fn collapsed(cursor: Cursor) -> Self {
        Selection {
            anchor: cursor,
            head: cursor,
        }
    }

    pub fn range(anchor: Cursor, head: Cursor) -> Self {
        Selection { anchor, head }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// The earlier end.
    pub fn from(&self) -> Cursor {
        self.anchor.min(self.head)
    }

    /// The later end.
    pub fn to(&self) -> Cursor {
        self.anchor.max(self.head)
    }
}

/// Facts about the cursor that transition rules are allowed to look at.
///
/// Always computed from the current document and selection; a value of this
/// type describes exactly one document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPredicates {
    pub at_start: bool,
    pub at_end: bool,
    pub is_empty: bool,
    pub selection_collapsed: bool,
}

impl CursorPredicates {
    /// Evaluate against the block containing the start of the selection.
    /// Returns `None` when the selection points outside the document.
    pub fn compute(document: &Document, selection: &Selection) -> Option<Self> {
        let from = selection.from();
        let block = document.blocks.get(from.block)?;
        let len = block.len();
        Some(CursorPredicates {
            at_start: from.offset == 0,
            at_end: from.offset >= len,
            is_empty: len == 0,
            selection_collapsed: selection.is_collapsed(),
        })
    }
}
