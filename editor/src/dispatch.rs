//! Key and typing dispatch over a [`DocumentHost`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::events::SubscriptionId;
use crate::host::{Command, DocumentHost, Transaction};
use crate::key::Key;
use crate::prefix::{PrefixRule, PrefixRules, Reclassified};
use crate::rules::{Decision, TransitionTable};
use crate::scene_index::{SceneEntry, SceneIndex};

/// What happened to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A transition rule took the key.
    Handled(Decision),
    /// No rule applied; the host ran its default behaviour.
    Deferred,
    /// The document is gone or refused the edit. Nothing changed.
    Ignored,
}

/// A decision taken against one document version, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub key: Key,
    pub decision: Decision,
    pub version: u64,
}

/// The screenplay editing core attached to one document.
///
/// Keeps the scene index current through the host's change notifications,
/// so it is up to date as soon as any mutation returns.
pub struct Editor<H: DocumentHost> {
    host: H,
    transitions: TransitionTable,
    prefixes: PrefixRules,
    scenes: Rc<RefCell<SceneIndex>>,
    subscription: SubscriptionId,
}

impl<H: DocumentHost> Editor<H> {
    /// Attach with the screenplay transition table and prefix rules.
    pub fn new(host: H) -> Self {
        Self::with_rules(host, TransitionTable::screenplay(), PrefixRules::screenplay())
    }

    pub fn with_rules(mut host: H, transitions: TransitionTable, prefixes: PrefixRules) -> Self {
        let scenes = Rc::new(RefCell::new(SceneIndex::build(host.document())));
        let index = Rc::clone(&scenes);
        let subscription = host.on_document_changed(Box::new(move |event| {
            index.borrow_mut().refresh(event.document);
        }));
        Editor {
            host,
            transitions,
            prefixes,
            scenes,
            subscription,
        }
    }

    pub fn register_prefix_rule(&mut self, rule: PrefixRule) {
        self.prefixes.register(rule);
    }

    /// Decide what `key` would do right now. `None` when the document is gone
    /// or the selection does not point into it.
    pub fn decide(&self, key: Key) -> Option<PendingDecision> {
        if !self.host.is_alive() {
            return None;
        }
        let active = self.host.current_block_type()?;
        let predicates = self.host.cursor_predicates()?;
        let decision = self.transitions.decide(active, key, &predicates);
        debug!(%key, %active, ?predicates, ?decision, "key decision");
        Some(PendingDecision {
            key,
            decision,
            version: self.host.version(),
        })
    }

    /// Apply a decision. One taken against an older document version is
    /// thrown away and the key decided again.
    pub fn commit(&mut self, pending: PendingDecision) -> KeyOutcome {
        if !self.host.is_alive() {
            return KeyOutcome::Ignored;
        }
        let current = self.host.version();
        if pending.version != current {
            warn!(
                key = %pending.key,
                decided_at = pending.version,
                current,
                "stale key decision, deciding again"
            );
            return self.press(pending.key);
        }

        let key = pending.key;
        let result = match pending.decision {
            Decision::Defer => return self.apply_default(key),
            Decision::Consume => Ok(()),
            Decision::InsertAfter(kind) => self
                .host
                .apply(Transaction::rule(key, Command::InsertBlockAfter(kind))),
            Decision::ChangeType(kind) => self
                .host
                .apply(Transaction::rule(key, Command::SetBlockType(kind))),
        };
        match result {
            Ok(()) => KeyOutcome::Handled(pending.decision),
            Err(err) => {
                // A failed rule counts as no rule.
                warn!(%key, decision = ?pending.decision, %err, "rule command failed");
                self.apply_default(key)
            }
        }
    }

    fn apply_default(&mut self, key: Key) -> KeyOutcome {
        if !self.host.is_alive() {
            return KeyOutcome::Ignored;
        }
        match self.host.apply_default(key) {
            Ok(()) => KeyOutcome::Deferred,
            Err(err) => {
                warn!(%key, %err, "default key handling failed");
                KeyOutcome::Ignored
            }
        }
    }

    pub fn press(&mut self, key: Key) -> KeyOutcome {
        match self.decide(key) {
            Some(pending) => self.commit(pending),
            None => KeyOutcome::Ignored,
        }
    }

    /// Type one character. Line feed and tab go through [`Editor::press`].
    ///
    /// When the text from block start up to and including `ch` matches a
    /// prefix rule, the type change rides in the same transaction as the
    /// character.
    pub fn type_char(&mut self, ch: char) -> Option<Reclassified> {
        match ch {
            '\n' => {
                self.press(Key::Enter);
                return None;
            }
            '\t' => {
                self.press(Key::Tab);
                return None;
            }
            _ => {}
        }
        if !self.host.is_alive() {
            return None;
        }

        let selection = self.host.selection();
        let from = selection.from();
        let block = self.host.document().get(from.block)?;
        let current = block.kind;
        let mut before_cursor: String = block.text().chars().take(from.offset).collect();
        before_cursor.push(ch);

        let target = if selection.is_collapsed() {
            self.prefixes.reclassify(current, &before_cursor)
        } else {
            None
        };
        let mut commands = vec![Command::InsertText(ch.to_string())];
        if let Some(to) = target {
            debug!(block = from.block, %current, %to, "prefix reclassification");
            commands.push(Command::SetBlockType(to));
        }
        if let Err(err) = self.host.apply(Transaction::typing(commands)) {
            warn!(%ch, %err, "typing failed");
            return None;
        }
        target.map(|to| Reclassified {
            block: from.block,
            from: current,
            to,
        })
    }

    /// Type `text` one character at a time, returning every reclassification
    /// it caused.
    pub fn type_text(&mut self, text: &str) -> Vec<Reclassified> {
        text.chars().filter_map(|ch| self.type_char(ch)).collect()
    }

    pub fn scene_index(&self) -> Vec<SceneEntry> {
        self.scenes.borrow().entries().to_vec()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Detach from the host and hand it back.
    pub fn into_host(mut self) -> H {
        self.host.unsubscribe(self.subscription);
        self.host
    }
}

#[cfg(test)]
mod tests {
    use screenplay::block::{Block, BlockType};
    use screenplay::document::Document;

    use super::*;
    use crate::memory::MemoryHost;

    fn editor(blocks: Vec<Block>, block: usize, offset: usize) -> Editor<MemoryHost> {
        let mut host = MemoryHost::new(Document::new(blocks));
        host.set_cursor(block, offset).unwrap();
        Editor::new(host)
    }

    #[test]
    fn stale_decision_is_decided_again() {
        let mut editor = editor(vec![Block::new(BlockType::Character, "MIA")], 0, 3);
        let pending = editor.decide(Key::Enter).unwrap();
        assert_eq!(pending.decision, Decision::InsertAfter(BlockType::Dialogue));

        // The document moves on before the decision is committed: the cursor
        // is now in an empty dialogue block, which collapses instead.
        editor.press(Key::Enter);
        let outcome = editor.commit(pending);
        assert_eq!(outcome, KeyOutcome::Handled(Decision::ChangeType(BlockType::Action)));
        assert_eq!(editor.host().to_listing(), "character: MIA\naction: |\n");
    }

    #[test]
    fn consume_leaves_the_document_alone() {
        let table = TransitionTable::empty().with_rule(
            BlockType::Transition,
            Key::Tab,
            crate::rules::Rule::Swallow,
        );
        let mut host = MemoryHost::new(Document::new(vec![Block::new(
            BlockType::Transition,
            "CUT TO:",
        )]));
        host.set_cursor(0, 2).unwrap();
        let mut editor = Editor::with_rules(host, table, PrefixRules::empty());
        assert_eq!(editor.press(Key::Tab), KeyOutcome::Handled(Decision::Consume));
        assert_eq!(editor.host().version(), 0);
    }

    #[test]
    fn registered_prefix_rule_fires() {
        let mut editor = editor(vec![Block::empty(BlockType::Dialogue)], 0, 0);
        editor.register_prefix_rule(PrefixRule::new(r"\(", BlockType::Parenthetical).unwrap());
        let changes = editor.type_text("(beat)");
        assert_eq!(
            changes,
            vec![Reclassified {
                block: 0,
                from: BlockType::Dialogue,
                to: BlockType::Parenthetical,
            }]
        );
        assert_eq!(editor.host().to_listing(), "parenthetical: (beat)|\n");
    }

    #[test]
    fn line_feed_and_tab_are_keys() {
        let mut editor = editor(vec![Block::new(BlockType::Action, "")], 0, 0);
        editor.type_text("\tMIA\nHi");
        assert_eq!(editor.host().to_listing(), "character: MIA\ndialogue: Hi|\n");
    }

    /// Refuses every transaction but runs default key handling.
    struct Refusing(MemoryHost);

    impl DocumentHost for Refusing {
        fn document(&self) -> &Document {
            self.0.document()
        }
        fn selection(&self) -> screenplay::cursor::Selection {
            self.0.selection()
        }
        fn version(&self) -> u64 {
            self.0.version()
        }
        fn is_alive(&self) -> bool {
            self.0.is_alive()
        }
        fn apply(&mut self, _tx: Transaction) -> Result<(), crate::error::HostError> {
            Err(crate::error::HostError::InvalidSelection(self.0.selection()))
        }
        fn apply_default(&mut self, key: Key) -> Result<(), crate::error::HostError> {
            self.0.apply_default(key)
        }
        fn on_document_changed(
            &mut self,
            callback: crate::events::ChangeCallback,
        ) -> SubscriptionId {
            self.0.on_document_changed(callback)
        }
        fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
            self.0.unsubscribe(id)
        }
    }

    #[test]
    fn failed_rule_falls_back_to_the_default() {
        let mut inner =
            MemoryHost::new(Document::new(vec![Block::new(BlockType::Character, "MIA")]));
        inner.set_cursor(0, 3).unwrap();
        let mut editor = Editor::new(Refusing(inner));
        assert_eq!(editor.press(Key::Enter), KeyOutcome::Deferred);
        assert_eq!(editor.host().0.to_listing(), "character: MIA\naction: |\n");
    }

    #[test]
    fn into_host_detaches_the_scene_index() {
        let editor = editor(vec![Block::new(BlockType::Action, "")], 0, 0);
        let scenes = Rc::clone(&editor.scenes);
        let mut host = editor.into_host();
        host.load(Document::new(vec![Block::new(BlockType::SceneHeading, "EXT. PIER")]))
            .unwrap();
        assert!(scenes.borrow().entries().is_empty());
    }
}
