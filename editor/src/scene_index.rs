use std::slice;

use screenplay::block::{Block, BlockType};
use screenplay::document::Document;
use tracing::trace;

/// One scene heading: its text and where it sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntry {
    /// Block text verbatim; may be empty.
    pub label: String,
    /// Offset of the heading block, as [`Document::position_of`] computes it.
    pub position: usize,
}

/// Scene headings of a document, in order. Call [`scan`] again to start
/// over; a clone carries on independently from where it was taken.
#[derive(Debug, Clone)]
pub struct Scenes<'a> {
    blocks: slice::Iter<'a, Block>,
    position: usize,
}

impl Iterator for Scenes<'_> {
    type Item = SceneEntry;

    fn next(&mut self) -> Option<SceneEntry> {
        loop {
            let block = self.blocks.next()?;
            let position = self.position;
            self.position += block.len() + 2;
            if block.kind == BlockType::SceneHeading {
                return Some(SceneEntry {
                    label: block.text(),
                    position,
                });
            }
        }
    }
}

pub fn scan(document: &Document) -> Scenes<'_> {
    Scenes {
        blocks: document.blocks.iter(),
        position: 0,
    }
}

/// The latest scan of a document, replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneIndex {
    entries: Vec<SceneEntry>,
}

impl SceneIndex {
    pub fn build(document: &Document) -> Self {
        SceneIndex {
            entries: scan(document).collect(),
        }
    }

    pub fn refresh(&mut self, document: &Document) {
        self.entries = scan(document).collect();
        trace!(scenes = self.entries.len(), "scene index rebuilt");
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }
}
