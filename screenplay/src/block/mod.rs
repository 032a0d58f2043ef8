pub mod kind;

use serde::{Deserialize, Serialize};

pub use kind::{BlockType, UnknownBlockType};

/// Inline style applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

/// A contiguous run of text sharing the same marks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        TextRun {
            text: text.into(),
            marks,
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A unit of screenplay structure: one element type and its inline content.
///
/// Offsets taken by the editing methods are char offsets within the block's
/// text. Empty runs are never kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<TextRun>,
}

impl Block {
    pub fn new(kind: BlockType, text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![TextRun::plain(text)]
        };
        Block { kind, content }
    }

    pub fn empty(kind: BlockType) -> Self {
        Block {
            kind,
            content: Vec::new(),
        }
    }

    pub fn with_runs(kind: BlockType, runs: Vec<TextRun>) -> Self {
        let mut block = Block {
            kind,
            content: runs,
        };
        block.normalize();
        block
    }

    /// The block's text with all runs concatenated.
    pub fn text(&self) -> String {
        self.content.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.content.iter().map(TextRun::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.content.iter().all(TextRun::is_empty)
    }

    /// Change the block's type in place. Every character is kept; marks are
    /// dropped only if the new type does not allow them.
    pub fn set_kind(&mut self, kind: BlockType) {
        self.kind = kind;
        if !kind.allows_marks() {
            for run in &mut self.content {
                run.marks.clear();
            }
        }
    }

    /// Insert `text` at char `offset`. The inserted text joins the run it
    /// lands in, so it inherits that run's marks.
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut remaining = offset;
        for run in &mut self.content {
            let len = run.len();
            if remaining <= len {
                let at = byte_offset(&run.text, remaining);
                run.text.insert_str(at, text);
                return;
            }
            remaining -= len;
        }
        self.content.push(TextRun::plain(text));
    }

    /// Split the content at char `offset`, keeping the head and returning
    /// the tail runs.
    pub fn split_off(&mut self, offset: usize) -> Vec<TextRun> {
        let mut tail = Vec::new();
        let mut remaining = offset;
        let mut split_at = self.content.len();
        for (i, run) in self.content.iter_mut().enumerate() {
            let len = run.len();
            if remaining < len {
                let at = byte_offset(&run.text, remaining);
                let rest = run.text.split_off(at);
                tail.push(TextRun::marked(rest, run.marks.clone()));
                split_at = i + 1;
                break;
            }
            remaining -= len;
        }
        tail.extend(self.content.drain(split_at..));
        tail.retain(|run| !run.is_empty());
        self.normalize();
        tail
    }

    /// Remove the chars in `start..end`.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let tail = self.split_off(end);
        self.split_off(start);
        self.content.extend(tail);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.content.retain(|run| !run.is_empty());
        if !self.kind.allows_marks() {
            for run in &mut self.content {
                run.marks.clear();
            }
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
