//! Key field parsing.

use crate::ast::{Accidental, Key, Mode, NoteName};
use crate::feedback::LineError;

/// Parse a `Key:` value such as `G`, `Em`, `F# minor` or `Bb major`
pub fn parse_key_field(value: &str) -> Result<Key, LineError> {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();

    let root = match chars.next() {
        Some(c) => NoteName::from_char(c).ok_or_else(|| {
            LineError::reference(format!("unknown key root '{c}'"))
                .with_suggestion("key roots are A to G, for example Key: Bb major")
        })?,
        None => return Err(LineError::syntax("Key: line has no value")),
    };

    // A `b` right after the root is always a flat; no mode name starts with b.
    let remaining = chars.as_str();
    let (accidental, remaining) = match remaining.chars().next().and_then(Accidental::from_char) {
        Some(acc) => (Some(acc), &remaining[1..]),
        None => (None, remaining),
    };

    let mode_word = remaining.trim();
    let mode = Mode::parse(mode_word).ok_or_else(|| {
        LineError::reference(format!("unknown key mode '{mode_word}'"))
            .with_suggestion("use major or minor, for example Key: E minor or Key: Em")
    })?;

    Ok(Key {
        root,
        accidental,
        mode,
    })
}
