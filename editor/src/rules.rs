//! Enter/Tab transition rules, one table keyed by block type and key.
//!
//! Deciding is pure: [`TransitionTable::decide`] looks at the active block's
//! type and fresh cursor predicates and returns a [`Decision`]. Applying the
//! decision is a separate step owned by the dispatcher.

use std::collections::HashMap;

use screenplay::block::BlockType;
use screenplay::cursor::CursorPredicates;

use crate::key::Key;

/// The outcome of evaluating a key against the active block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No rule applies; the host's default behaviour runs.
    Defer,
    /// Insert an empty block of this type after the current one.
    InsertAfter(BlockType),
    /// Change the current block's type in place.
    ChangeType(BlockType),
    /// Swallow the key without touching the document.
    Consume,
}

/// A rule owned by one block type for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// At the end of the block insert `successor` after it; elsewhere defer.
    InsertAtEnd(BlockType),
    /// An empty block becomes `collapse` in place; otherwise behaves like
    /// `InsertAtEnd(successor)`.
    CollapseOrInsert {
        collapse: BlockType,
        successor: BlockType,
    },
    /// Change the block's type wherever the cursor is.
    Convert(BlockType),
    /// Consume the key and do nothing.
    Swallow,
}

impl Rule {
    /// Evaluate against predicates of a collapsed selection.
    pub fn evaluate(self, at: &CursorPredicates) -> Decision {
        match self {
            Rule::InsertAtEnd(successor) if at.at_end => Decision::InsertAfter(successor),
            Rule::InsertAtEnd(_) => Decision::Defer,
            Rule::CollapseOrInsert { collapse, .. } if at.is_empty => {
                Decision::ChangeType(collapse)
            }
            Rule::CollapseOrInsert { successor, .. } if at.at_end => {
                Decision::InsertAfter(successor)
            }
            Rule::CollapseOrInsert { .. } => Decision::Defer,
            Rule::Convert(target) => Decision::ChangeType(target),
            Rule::Swallow => Decision::Consume,
        }
    }

    /// The type a collapse or conversion would give the owner block itself.
    fn in_place_target(self) -> Option<BlockType> {
        match self {
            Rule::CollapseOrInsert { collapse, .. } => Some(collapse),
            Rule::Convert(target) => Some(target),
            Rule::InsertAtEnd(_) | Rule::Swallow => None,
        }
    }
}

/// At most one rule per (block type, key). Dispatch only ever consults the
/// entry for the block the cursor is in, so one key press yields one
/// decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    rules: HashMap<(BlockType, Key), Rule>,
}

impl TransitionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The screenplay element flow:
    ///
    /// | block          | key   | rule                                              |
    /// |----------------|-------|---------------------------------------------------|
    /// | scene heading  | Enter | at end → action after                             |
    /// | character      | Enter | at end → dialogue after                           |
    /// | dialogue       | Enter | empty → becomes action; at end → character after  |
    /// | parenthetical  | Enter | at end → dialogue after                           |
    /// | transition     | Enter | at end → scene heading after                      |
    /// | action         | Tab   | becomes character                                 |
    ///
    /// Action has no Enter rule and nothing but action has a Tab rule.
    pub fn screenplay() -> Self {
        use BlockType::*;

        TransitionTable::empty()
            .with_rule(SceneHeading, Key::Enter, Rule::InsertAtEnd(Action))
            .with_rule(Character, Key::Enter, Rule::InsertAtEnd(Dialogue))
            .with_rule(
                Dialogue,
                Key::Enter,
                Rule::CollapseOrInsert {
                    collapse: Action,
                    successor: Character,
                },
            )
            .with_rule(Parenthetical, Key::Enter, Rule::InsertAtEnd(Dialogue))
            .with_rule(Transition, Key::Enter, Rule::InsertAtEnd(SceneHeading))
            .with_rule(Action, Key::Tab, Rule::Convert(Character))
    }

    /// Set the rule for `owner` and `key`, replacing any previous one.
    ///
    /// A rule that would convert its owner into the owner's own type is a
    /// programming error.
    pub fn with_rule(mut self, owner: BlockType, key: Key, rule: Rule) -> Self {
        debug_assert!(
            rule.in_place_target() != Some(owner),
            "{rule:?} on {owner} {key} converts the block into its own type"
        );
        self.rules.insert((owner, key), rule);
        self
    }

    pub fn rule(&self, owner: BlockType, key: Key) -> Option<Rule> {
        self.rules.get(&(owner, key)).copied()
    }

    /// Decide what `key` does in a block of type `active`.
    ///
    /// Ranged selections always defer, as do keys the active type has no
    /// rule for.
    pub fn decide(&self, active: BlockType, key: Key, at: &CursorPredicates) -> Decision {
        if !at.selection_collapsed {
            return Decision::Defer;
        }
        match self.rule(active, key) {
            Some(rule) => rule.evaluate(at),
            None => Decision::Defer,
        }
    }
}
