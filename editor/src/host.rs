//! The interface to the document engine that owns the text.
//!
//! The core never mutates a document itself. It reads the current state,
//! decides, and hands the engine a [`Transaction`] to apply atomically.

use screenplay::block::BlockType;
use screenplay::cursor::{CursorPredicates, Selection};
use screenplay::document::Document;

use crate::error::HostError;
use crate::events::{ChangeCallback, SubscriptionId};
use crate::key::Key;

/// A structural edit, relative to the host's current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert text at the selection, replacing it if it is ranged. Line
    /// breaks split the block the way a default Enter would.
    InsertText(String),
    /// Insert an empty block after the block holding the selection's end and
    /// move the cursor into it.
    InsertBlockAfter(BlockType),
    /// Change the type of the block holding the selection's start. Content is
    /// kept as is.
    SetBlockType(BlockType),
}

/// Where a change came from. Collaborators such as audio cues key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Characters typed by the user.
    Typing,
    /// The host's own default handling of a key.
    Key(Key),
    /// A transition rule reacting to a key.
    Rule(Key),
    /// Whole-document replacement, e.g. opening a script or importing one.
    Load,
    /// Undo or redo.
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxMeta {
    pub origin: Origin,
    /// Set on programmatic edits that must not be mistaken for user typing.
    pub silent: bool,
}

/// Commands applied together, producing exactly one change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub commands: Vec<Command>,
    pub meta: TxMeta,
}

impl Transaction {
    pub fn typing(commands: Vec<Command>) -> Self {
        Transaction {
            commands,
            meta: TxMeta {
                origin: Origin::Typing,
                silent: false,
            },
        }
    }

    /// An edit issued by a transition rule. Always silent.
    pub fn rule(key: Key, command: Command) -> Self {
        Transaction {
            commands: vec![command],
            meta: TxMeta {
                origin: Origin::Rule(key),
                silent: true,
            },
        }
    }
}

/// What subscribers see after every applied transaction.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    pub document: &'a Document,
    pub selection: Selection,
    pub version: u64,
    pub meta: TxMeta,
}

/// Capabilities the core needs from a document engine.
pub trait DocumentHost {
    fn document(&self) -> &Document;

    fn selection(&self) -> Selection;

    /// Bumped once per applied transaction.
    fn version(&self) -> u64;

    /// False once the document has been torn down. Nothing may be issued
    /// against a dead host.
    fn is_alive(&self) -> bool;

    /// Apply all commands as one transaction, or none of them.
    fn apply(&mut self, tx: Transaction) -> Result<(), HostError>;

    /// The engine's own behaviour for a key no rule handled.
    fn apply_default(&mut self, key: Key) -> Result<(), HostError>;

    fn on_document_changed(&mut self, callback: ChangeCallback) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    fn current_block_type(&self) -> Option<BlockType> {
        let from = self.selection().from();
        self.document().get(from.block).map(|block| block.kind)
    }

    /// Freshly computed for the current document version on every call.
    fn cursor_predicates(&self) -> Option<CursorPredicates> {
        CursorPredicates::compute(self.document(), &self.selection())
    }
}
