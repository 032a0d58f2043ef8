//! Typed-prefix reclassification.
//!
//! Unlike a generic input rule, which deletes the text it matched and inserts
//! a replacement, a prefix rule only changes the enclosing block's type. The
//! typed characters stay exactly where they are. Keep the two apart: routing
//! these rules through a delete-and-reinsert path loses the "INT. " the user
//! just typed.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use screenplay::block::BlockType;

/// Scene heading openers, each followed by exactly one space.
pub const SCENE_HEADING_PREFIX: &str = r"(?:INT\./EXT\.|INT\.|EXT\.|EST\.|I/E\.) ";

static SCENE_HEADING: LazyLock<PrefixRule> = LazyLock::new(|| {
    PrefixRule::new(SCENE_HEADING_PREFIX, BlockType::SceneHeading)
        .expect("scene heading prefix is a valid pattern")
});

/// Change a block to `target` when the text between block start and the
/// cursor matches `pattern` exactly (case-insensitive).
#[derive(Debug, Clone)]
pub struct PrefixRule {
    pattern: Regex,
    target: BlockType,
}

impl PrefixRule {
    /// `pattern` is anchored at block start and at the cursor.
    pub fn new(pattern: &str, target: BlockType) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()?;
        Ok(PrefixRule { pattern, target })
    }

    pub fn target(&self) -> BlockType {
        self.target
    }

    pub fn matches(&self, before_cursor: &str) -> bool {
        self.pattern.is_match(before_cursor)
    }
}

/// A block whose type a prefix rule changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclassified {
    pub block: usize,
    pub from: BlockType,
    pub to: BlockType,
}

#[derive(Debug, Clone, Default)]
pub struct PrefixRules {
    rules: Vec<PrefixRule>,
}

impl PrefixRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Just the scene heading rule.
    pub fn screenplay() -> Self {
        PrefixRules {
            rules: vec![SCENE_HEADING.clone()],
        }
    }

    pub fn register(&mut self, rule: PrefixRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The type a block of kind `current` should take given the text now in
    /// front of the cursor. The first matching rule wins; a rule never fires
    /// on a block that already has its target type.
    pub fn reclassify(&self, current: BlockType, before_cursor: &str) -> Option<BlockType> {
        self.rules
            .iter()
            .find(|rule| rule.target != current && rule.matches(before_cursor))
            .map(PrefixRule::target)
    }
}
