use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::cursor::{Cursor, Selection};

/// An ordered sequence of screenplay blocks.
///
/// Serializes as `{"type": "doc", "content": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "doc")]
pub struct Document {
    #[serde(rename = "content", default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Document { blocks }
    }

    pub fn empty() -> Self {
        Document { blocks: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Document offset of the opening token of block `index`.
    ///
    /// Every block spans its char length plus two positions (open and close),
    /// so this is the sum of `len + 2` over the preceding blocks. Indices past
    /// the end give the end-of-document offset.
    pub fn position_of(&self, index: usize) -> usize {
        self.blocks.iter().take(index).map(|b| b.len() + 2).sum()
    }

    /// Document offset of a cursor (inside the block, after the open token).
    pub fn offset_of(&self, cursor: Cursor) -> usize {
        self.position_of(cursor.block) + 1 + cursor.offset
    }

    /// Render in listing notation, marking `selection` with `|`.
    pub fn to_listing(&self, selection: Option<&Selection>) -> String {
        let mut out = String::new();
        for (index, block) in self.blocks.iter().enumerate() {
            out.push_str(block.kind.name());
            out.push(':');
            let markers = markers_in(selection, index);
            let text = block.text();
            if !text.is_empty() || !markers.is_empty() {
                out.push(' ');
            }
            let mut marker_iter = markers.iter().peekable();
            for (offset, ch) in text.chars().enumerate() {
                while marker_iter.next_if(|&&m| m <= offset).is_some() {
                    out.push('|');
                }
                if ch == '|' || ch == '\\' {
                    out.push('\\');
                }
                out.push(ch);
            }
            for _ in marker_iter {
                out.push('|');
            }
            out.push('\n');
        }
        out
    }
}

/// Marker offsets inside block `index`, sorted. A backward range within a
/// single block therefore reads back as a forward one.
fn markers_in(selection: Option<&Selection>, index: usize) -> Vec<usize> {
    let Some(selection) = selection else {
        return Vec::new();
    };
    if selection.is_collapsed() {
        return if selection.head.block == index {
            vec![selection.head.offset]
        } else {
            Vec::new()
        };
    }
    let mut markers: Vec<usize> = [selection.anchor, selection.head]
        .iter()
        .filter(|c| c.block == index)
        .map(|c| c.offset)
        .collect();
    markers.sort_unstable();
    markers
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_listing(None))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text())
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        Document { blocks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;

    fn sample() -> Document {
        Document::new(vec![
            Block::new(BlockType::SceneHeading, "INT. CAFE - DAY"),
            Block::new(BlockType::Action, "Rain."),
            Block::new(BlockType::SceneHeading, "EXT. STREET - NIGHT"),
        ])
    }

    #[test]
    fn positions_count_open_and_close_tokens() {
        let doc = sample();
        assert_eq!(doc.position_of(0), 0);
        assert_eq!(doc.position_of(1), 17);
        assert_eq!(doc.position_of(2), 24);
        assert_eq!(doc.offset_of(Cursor::new(1, 0)), 18);
    }

    #[test]
    fn listing_marks_cursor_and_escapes_pipes() {
        let doc = Document::new(vec![
            Block::new(BlockType::Action, "a|b"),
            Block::empty(BlockType::Dialogue),
        ]);
        let sel = Selection::collapsed(Cursor::new(1, 0));
        assert_eq!(doc.to_listing(Some(&sel)), "action: a\\|b\ndialogue: |\n");
        assert_eq!(doc.to_string(), "action: a\\|b\ndialogue:\n");
    }

    #[test]
    fn listing_marks_both_ends_of_a_range() {
        let doc = Document::new(vec![Block::new(BlockType::Dialogue, "Hello world")]);
        let sel = Selection::range(Cursor::new(0, 5), Cursor::new(0, 0));
        assert_eq!(doc.to_listing(Some(&sel)), "dialogue: |Hello| world\n");
    }

    #[test]
    fn serializes_as_prosemirror_json() {
        let doc = Document::new(vec![Block::new(BlockType::Character, "JOHN")]);
        let json = serde_json::to_string(&doc).unwrap();
        let expected = concat!(
            r#"{"type":"doc","content":[{"type":"character","#,
            r#""content":[{"type":"text","text":"JOHN"}]}]}"#,
        );
        assert_eq!(json, expected);
    }
}
