use std::ops::Range;

use crate::block::{Block, BlockType};
use crate::cursor::{Cursor, Selection};
use crate::parser::error::ParseError;

/// Parse listing source into blocks plus the selection its `|` markers
/// describe. All errors in the source are collected before returning.
pub(super) fn parse_lines(
    source: &str,
    file_id: usize,
) -> Result<(Vec<Block>, Option<Selection>), Vec<ParseError>> {
    let mut blocks = Vec::new();
    let mut markers: Vec<(Cursor, Range<usize>)> = Vec::new();
    let mut errors = Vec::new();

    let mut line_start = 0;
    for raw_line in source.split_inclusive('\n') {
        let start = line_start;
        line_start += raw_line.len();

        let line = raw_line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        let Some(colon) = line.find(':') else {
            errors.push(
                ParseError::new("expected `<type>: <text>`", start..start + line.len(), file_id)
                    .with_note("every non-blank line is one block, e.g. `action: She waits.`"),
            );
            continue;
        };

        let name = &line[..colon];
        let kind = match name.trim().parse::<BlockType>() {
            Ok(kind) => kind,
            Err(err) => {
                let lead = name.len() - name.trim_start().len();
                let span = start + lead..start + lead + name.trim().len();
                errors.push(ParseError::new(err.to_string(), span, file_id).with_note(format!(
                    "known types: {}",
                    BlockType::ALL.map(BlockType::name).join(", ")
                )));
                continue;
            }
        };

        let mut body_start = start + colon + 1;
        let mut body = &line[colon + 1..];
        if let Some(rest) = body.strip_prefix(' ') {
            body = rest;
            body_start += 1;
        }

        let index = blocks.len();
        let (text, found) = unescape(body, body_start);
        for (offset, span) in found {
            markers.push((Cursor::new(index, offset), span));
        }
        blocks.push(Block::new(kind, text));
    }

    if markers.len() > 2 {
        for (_, span) in &markers[2..] {
            errors.push(
                ParseError::new("too many cursor markers", span.clone(), file_id).with_note(
                    "use one `|` for a cursor or two for a selection; \
                     write `\\|` for a literal pipe",
                ),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let selection = match markers.as_slice() {
        [] => None,
        [(cursor, _)] => Some(Selection::collapsed(*cursor)),
        [(anchor, _), (head, _), ..] => Some(Selection::range(*anchor, *head)),
    };
    Ok((blocks, selection))
}

/// Resolve `\|` and `\\` escapes and pull out bare `|` markers as
/// (char offset, source span) pairs.
fn unescape(body: &str, body_start: usize) -> (String, Vec<(usize, Range<usize>)>) {
    let mut text = String::with_capacity(body.len());
    let mut markers = Vec::new();
    let mut chars = body.char_indices().peekable();
    let mut offset = 0;

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&(_, next @ ('|' | '\\'))) => {
                    chars.next();
                    text.push(next);
                    offset += 1;
                }
                _ => {
                    text.push('\\');
                    offset += 1;
                }
            },
            '|' => markers.push((offset, body_start + i..body_start + i + 1)),
            _ => {
                text.push(ch);
                offset += 1;
            }
        }
    }
    (text, markers)
}
