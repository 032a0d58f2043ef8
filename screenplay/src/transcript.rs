//! Batch conversion of a raw "Speaker: line" transcript into screenplay blocks.
//!
//! This runs once, offline from live editing. The result is meant to be handed
//! to the document engine as an initial load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockType};

/// Raw transcript speaker name → canonical character cue.
/// Keys are matched exactly and case-sensitively.
pub type CharacterMap = BTreeMap<String, String>;

/// The parts of the scene heading that opens an imported transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneDetails {
    pub int_ext: String,
    pub location: String,
    pub time: String,
}

impl Default for SceneDetails {
    fn default() -> Self {
        SceneDetails {
            int_ext: "INT.".to_string(),
            location: String::new(),
            time: "DAY".to_string(),
        }
    }
}

impl SceneDetails {
    pub fn new(
        int_ext: impl Into<String>,
        location: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        SceneDetails {
            int_ext: int_ext.into(),
            location: location.into(),
            time: time.into(),
        }
    }

    /// "{int_ext} {LOCATION} - {time}"; only the location is uppercased.
    pub fn heading(&self) -> String {
        format!(
            "{} {} - {}",
            self.int_ext,
            self.location.to_uppercase(),
            self.time
        )
    }
}

/// Classify a transcript into blocks.
///
/// The first block is always the scene heading, even for empty input. Every
/// non-blank line then becomes either a character/dialogue pair (when it has
/// a colon followed by some text) or an action block holding the trimmed line.
pub fn classify(raw: &str, details: &SceneDetails, characters: &CharacterMap) -> Vec<Block> {
    let mut blocks = vec![Block::new(BlockType::SceneHeading, details.heading())];

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_speaker(line) {
            Some((speaker, dialogue)) => {
                let cue = characters
                    .get(speaker)
                    .filter(|cue| !cue.is_empty())
                    .cloned()
                    .unwrap_or_else(|| speaker.to_uppercase());
                blocks.push(Block::new(BlockType::Character, cue));
                blocks.push(Block::new(BlockType::Dialogue, dialogue));
            }
            None => blocks.push(Block::new(BlockType::Action, line)),
        }
    }

    blocks
}

/// Split "Name: text" at the first colon. Lines without a colon, or with
/// nothing on either side of it, are not dialogue.
fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let (speaker, dialogue) = line.split_once(':')?;
    let (speaker, dialogue) = (speaker.trim(), dialogue.trim());
    if speaker.is_empty() || dialogue.is_empty() {
        return None;
    }
    Some((speaker, dialogue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_uppercases_location_only() {
        let details = SceneDetails::new("EXT.", "Rooftop garden", "night");
        assert_eq!(details.heading(), "EXT. ROOFTOP GARDEN - night");
    }

    #[test]
    fn colon_with_nothing_after_is_action_with_the_colon_kept() {
        let blocks = classify("NARRATOR:   ", &SceneDetails::default(), &CharacterMap::new());
        assert_eq!(blocks[1], Block::new(BlockType::Action, "NARRATOR:"));
    }

    #[test]
    fn missing_speaker_is_action() {
        let blocks = classify(": who said that?", &SceneDetails::default(), &CharacterMap::new());
        assert_eq!(blocks[1], Block::new(BlockType::Action, ": who said that?"));
    }

    #[test]
    fn empty_mapping_falls_back_to_the_uppercased_name() {
        let mut map = CharacterMap::new();
        map.insert("Bo".to_string(), String::new());
        let blocks = classify("Bo: hey", &SceneDetails::default(), &map);
        assert_eq!(blocks[1].text(), "BO");
    }

    #[test]
    fn only_the_first_colon_splits() {
        let blocks = classify(
            "Ana: Meet me at 10:30.",
            &SceneDetails::default(),
            &CharacterMap::new(),
        );
        assert_eq!(blocks[1], Block::new(BlockType::Character, "ANA"));
        assert_eq!(blocks[2], Block::new(BlockType::Dialogue, "Meet me at 10:30."));
    }

    #[test]
    fn map_keys_are_case_sensitive_and_values_are_not_uppercased() {
        let mut map = CharacterMap::new();
        map.insert("Ana".to_string(), "Ana María".to_string());
        let blocks = classify("ana: hi\nAna: hello", &SceneDetails::default(), &map);
        assert_eq!(blocks[1].text(), "ANA");
        assert_eq!(blocks[3].text(), "Ana María");
    }

    #[test]
    fn crlf_and_blank_lines() {
        let blocks = classify(
            "\r\n  \r\nA: one\r\n\r\n(beat)\r\n",
            &SceneDetails::default(),
            &CharacterMap::new(),
        );
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockType::SceneHeading,
                BlockType::Character,
                BlockType::Dialogue,
                BlockType::Action,
            ]
        );
        assert_eq!(blocks[3].text(), "(beat)");
    }

    fn cafe() -> SceneDetails {
        SceneDetails::new("INT.", "CAFE", "DAY")
    }

    #[test]
    fn empty_transcript_is_just_the_heading() {
        let blocks = classify("", &cafe(), &CharacterMap::new());
        assert_eq!(blocks, vec![Block::new(BlockType::SceneHeading, "INT. CAFE - DAY")]);
    }

    #[test]
    fn blank_lines_only_is_just_the_heading() {
        let blocks = classify("\n   \n\t\n", &cafe(), &CharacterMap::new());
        assert_eq!(blocks, vec![Block::new(BlockType::SceneHeading, "INT. CAFE - DAY")]);
    }

    #[test]
    fn mapped_names_are_used_as_given() {
        let mut map = CharacterMap::new();
        map.insert("Vivek".to_string(), "VIVEK ROHTASVI".to_string());
        map.insert("Gemini".to_string(), "AI ASSISTANT".to_string());
        let blocks = classify("Vivek: Hi.\nGemini: Hello.", &cafe(), &map);
        assert_eq!(
            blocks,
            vec![
                Block::new(BlockType::SceneHeading, "INT. CAFE - DAY"),
                Block::new(BlockType::Character, "VIVEK ROHTASVI"),
                Block::new(BlockType::Dialogue, "Hi."),
                Block::new(BlockType::Character, "AI ASSISTANT"),
                Block::new(BlockType::Dialogue, "Hello."),
            ]
        );
    }
}
