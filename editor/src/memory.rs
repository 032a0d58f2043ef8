//! A small in-memory document engine.
//!
//! Flat block list, char offsets, one undo step per transaction. It stands in
//! for a real rich-text engine in tests, fixtures and the CLI.

use screenplay::Listing;
use screenplay::block::{Block, BlockType};
use screenplay::cursor::{Cursor, Selection};
use screenplay::document::Document;

use crate::error::HostError;
use crate::events::{ChangeCallback, ChangeNotifier, SubscriptionId};
use crate::host::{ChangeEvent, Command, DocumentHost, Origin, Transaction, TxMeta};
use crate::key::Key;

#[derive(Debug, Clone)]
struct Snapshot {
    document: Document,
    selection: Selection,
}

#[derive(Debug)]
pub struct MemoryHost {
    document: Document,
    selection: Selection,
    version: u64,
    alive: bool,
    notifier: ChangeNotifier,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(Document::empty())
    }
}

impl MemoryHost {
    /// A document never has zero blocks; an empty one gets a single empty
    /// action block. The cursor starts at the beginning.
    pub fn new(document: Document) -> Self {
        MemoryHost {
            document: non_empty(document),
            selection: Selection::default(),
            version: 0,
            alive: true,
            notifier: ChangeNotifier::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Start from a parsed listing, using its marked selection if it has one.
    pub fn from_listing(listing: Listing) -> Result<Self, HostError> {
        let mut host = MemoryHost::new(listing.document);
        if let Some(selection) = listing.selection {
            host.set_selection(selection)?;
        }
        Ok(host)
    }

    /// Replace the whole document. Silent, and clears undo history.
    pub fn load(&mut self, document: Document) -> Result<(), HostError> {
        self.ensure_alive()?;
        self.document = non_empty(document);
        self.selection = Selection::default();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.commit(TxMeta {
            origin: Origin::Load,
            silent: true,
        });
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), HostError> {
        self.ensure_alive()?;
        validate(&self.document, &selection)?;
        self.selection = selection;
        Ok(())
    }

    pub fn set_cursor(&mut self, block: usize, offset: usize) -> Result<(), HostError> {
        self.set_selection(Selection::collapsed(Cursor::new(block, offset)))
    }

    /// Tear the document down. Every later mutation is refused.
    pub fn destroy(&mut self) {
        self.alive = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Revert the last transaction. Returns false when there is nothing to
    /// undo or the document is gone.
    pub fn undo(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(next);
        true
    }

    /// Listing of the current document with the selection marked.
    pub fn to_listing(&self) -> String {
        self.document.to_listing(Some(&self.selection))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.selection = snapshot.selection;
        self.commit(TxMeta {
            origin: Origin::History,
            silent: false,
        });
    }

    fn ensure_alive(&self) -> Result<(), HostError> {
        if self.alive {
            Ok(())
        } else {
            Err(HostError::Destroyed)
        }
    }

    /// Record a new version and tell subscribers.
    fn commit(&mut self, meta: TxMeta) {
        self.version += 1;
        let event = ChangeEvent {
            document: &self.document,
            selection: self.selection,
            version: self.version,
            meta,
        };
        self.notifier.notify(&event);
    }

    /// Run `edit` on a copy of the state and commit it as one undoable step.
    fn transact(
        &mut self,
        meta: TxMeta,
        edit: impl FnOnce(&mut Document, &mut Selection),
    ) -> Result<(), HostError> {
        self.ensure_alive()?;
        validate(&self.document, &self.selection)?;

        let before = self.snapshot();
        let mut document = self.document.clone();
        let mut selection = self.selection;
        edit(&mut document, &mut selection);
        if document == before.document && selection == before.selection {
            return Ok(());
        }

        self.document = document;
        self.selection = selection;
        self.undo_stack.push(before);
        self.redo_stack.clear();
        self.commit(meta);
        Ok(())
    }
}

impl DocumentHost for MemoryHost {
    fn document(&self) -> &Document {
        &self.document
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn apply(&mut self, tx: Transaction) -> Result<(), HostError> {
        let Transaction { commands, meta } = tx;
        self.transact(meta, |document, selection| {
            for command in commands {
                run_command(document, selection, command);
            }
        })
    }

    /// Enter deletes a ranged selection and splits the block; Tab does
    /// nothing.
    fn apply_default(&mut self, key: Key) -> Result<(), HostError> {
        match key {
            Key::Enter => self.transact(
                TxMeta {
                    origin: Origin::Key(key),
                    silent: false,
                },
                |document, selection| {
                    delete_selection(document, selection);
                    split_block(document, selection);
                },
            ),
            Key::Tab => self.ensure_alive(),
        }
    }

    fn on_document_changed(&mut self, callback: ChangeCallback) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

fn non_empty(mut document: Document) -> Document {
    if document.is_empty() {
        document.blocks.push(Block::empty(BlockType::default()));
    }
    document
}

fn validate(document: &Document, selection: &Selection) -> Result<(), HostError> {
    let in_bounds = |cursor: Cursor| {
        document
            .get(cursor.block)
            .is_some_and(|block| cursor.offset <= block.len())
    };
    if in_bounds(selection.anchor) && in_bounds(selection.head) {
        Ok(())
    } else {
        Err(HostError::InvalidSelection(*selection))
    }
}

fn run_command(document: &mut Document, selection: &mut Selection, command: Command) {
    match command {
        Command::InsertText(text) => {
            delete_selection(document, selection);
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    split_block(document, selection);
                }
                let cursor = selection.head;
                document.blocks[cursor.block].insert_text(cursor.offset, line);
                *selection = Selection::collapsed(Cursor::new(
                    cursor.block,
                    cursor.offset + line.chars().count(),
                ));
            }
        }
        Command::InsertBlockAfter(kind) => {
            let index = selection.to().block + 1;
            document.blocks.insert(index, Block::empty(kind));
            *selection = Selection::collapsed(Cursor::new(index, 0));
        }
        Command::SetBlockType(kind) => {
            document.blocks[selection.from().block].set_kind(kind);
        }
    }
}

/// Remove the selected text, joining the end block into the start block.
fn delete_selection(document: &mut Document, selection: &mut Selection) {
    if selection.is_collapsed() {
        return;
    }
    let (from, to) = (selection.from(), selection.to());
    if from.block == to.block {
        document.blocks[from.block].delete_range(from.offset, to.offset);
    } else {
        let tail = document.blocks[to.block].split_off(to.offset);
        let start = &mut document.blocks[from.block];
        start.split_off(from.offset);
        let mut runs = std::mem::take(&mut start.content);
        runs.extend(tail);
        *start = Block::with_runs(start.kind, runs);
        document.blocks.drain(from.block + 1..=to.block);
    }
    *selection = Selection::collapsed(from);
}

/// Split at a collapsed cursor. Text after the cursor moves to a new block
/// of the same type; at the very end the new block is an empty block of the
/// default type instead.
fn split_block(document: &mut Document, selection: &mut Selection) {
    let cursor = selection.head;
    let block = &mut document.blocks[cursor.block];
    let new_block = if cursor.offset >= block.len() {
        Block::empty(BlockType::default())
    } else {
        let tail = block.split_off(cursor.offset);
        Block::with_runs(block.kind, tail)
    };
    document.blocks.insert(cursor.block + 1, new_block);
    *selection = Selection::collapsed(Cursor::new(cursor.block + 1, 0));
}
