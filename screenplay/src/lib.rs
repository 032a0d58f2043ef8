pub mod block;
pub mod config;
pub mod cursor;
pub mod document;
pub mod parser;
pub mod transcript;

use crate::cursor::Selection;
use crate::document::Document;

pub use crate::block::{Block, BlockType};

/// A parsed listing: a document and the selection marked in it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub document: Document,
    pub selection: Option<Selection>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
