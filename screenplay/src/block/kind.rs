use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of screenplay element types a block can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    /// "INT./EXT. LOCATION - TIME"
    #[serde(alias = "slugline")]
    SceneHeading,
    /// Narrative description. The fallback type for anything unclassified.
    #[default]
    Action,
    /// Speaker cue, uppercase by convention.
    Character,
    /// A spoken line following a character cue.
    Dialogue,
    /// Stage direction inside dialogue, e.g. "(beat)".
    Parenthetical,
    /// "CUT TO:" style scene transition.
    Transition,
}

impl BlockType {
    pub const ALL: [BlockType; 6] = [
        BlockType::SceneHeading,
        BlockType::Action,
        BlockType::Character,
        BlockType::Dialogue,
        BlockType::Parenthetical,
        BlockType::Transition,
    ];

    /// Canonical kebab-case name, as used in listings and serialized documents.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::SceneHeading => "scene-heading",
            BlockType::Action => "action",
            BlockType::Character => "character",
            BlockType::Dialogue => "dialogue",
            BlockType::Parenthetical => "parenthetical",
            BlockType::Transition => "transition",
        }
    }

    /// Whether inline style marks (bold, italic, ...) may appear in this block.
    /// Scene headings are plain text only.
    pub fn allows_marks(self) -> bool {
        !matches!(self, BlockType::SceneHeading)
    }

    /// Tag a renderer should use for this block.
    pub fn render_tag(self) -> &'static str {
        match self {
            BlockType::SceneHeading => "h3",
            _ => "p",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            BlockType::SceneHeading => "sp-slugline",
            BlockType::Action => "sp-action",
            BlockType::Character => "sp-character",
            BlockType::Dialogue => "sp-dialogue",
            BlockType::Parenthetical => "sp-parenthetical",
            BlockType::Transition => "sp-transition",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known block type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type '{0}'")]
pub struct UnknownBlockType(pub String);

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scene-heading" | "slugline" | "scene" => Ok(BlockType::SceneHeading),
            "action" => Ok(BlockType::Action),
            "character" => Ok(BlockType::Character),
            "dialogue" => Ok(BlockType::Dialogue),
            "parenthetical" => Ok(BlockType::Parenthetical),
            "transition" => Ok(BlockType::Transition),
            _ => Err(UnknownBlockType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in BlockType::ALL {
            assert_eq!(kind.name().parse::<BlockType>(), Ok(kind));
        }
    }

    #[test]
    fn slugline_is_an_alias_for_scene_heading() {
        assert_eq!("slugline".parse::<BlockType>(), Ok(BlockType::SceneHeading));
        assert_eq!("Scene-Heading".parse::<BlockType>(), Ok(BlockType::SceneHeading));
    }

    #[test]
    fn unknown_names_are_rejected_not_coerced() {
        let err = "montage".parse::<BlockType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown block type 'montage'");
    }

    #[test]
    fn only_scene_heading_forbids_marks() {
        let plain: Vec<_> = BlockType::ALL
            .into_iter()
            .filter(|k| !k.allows_marks())
            .collect();
        assert_eq!(plain, vec![BlockType::SceneHeading]);
    }
}
