pub mod error;
mod listing;

pub use error::ParseError;

use crate::Listing;

/// Parser for the listing notation: one `type: text` block per line, with
/// `|` marking the cursor.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the whole source into a document and its marked selection.
    pub fn parse(&self) -> Result<Listing, Vec<ParseError>> {
        let (blocks, selection) = listing::parse_lines(&self.source, self.file_id)?;
        Ok(Listing {
            document: blocks.into(),
            selection,
            source_id: self.file_id,
        })
    }
}
