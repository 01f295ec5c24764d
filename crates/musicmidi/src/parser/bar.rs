//! Compact bar notation: `| C4q D4q E4h | [C4,E4,G4]w |`.
//!
//! Each segment between pipes is one measure. Tokens run back to back from
//! beat 1. A bare dynamic token applies to the notes after it on the line.

use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, delimited, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::ast::{Duration, Dynamic, EventKind, Position, TimeSignature, MAX_MEASURE};
use crate::feedback::LineError;
use crate::fraction::Fraction;

use super::note::{
    parse_compact_chord, parse_compact_note, read_duration_code, read_dynamic, read_pitch,
};

type PResult<T> = winnow::ModalResult<T>;

/// One token of a bar
#[derive(Debug, Clone, PartialEq)]
pub enum BarToken {
    Sound { kind: EventKind, duration: Duration },
    Dynamic(Dynamic),
}

/// A timed event read from a bar line
#[derive(Debug, Clone, PartialEq)]
pub struct BarEvent {
    pub position: Position,
    pub kind: EventKind,
    pub duration: Duration,
    pub dynamic: Dynamic,
}

fn chord_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    (
        '[',
        take_till(0.., ']'),
        ']',
        take_while(0.., |c: char| !c.is_whitespace()),
    )
        .take()
        .parse_next(input)
}

fn plain_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

/// Split one bar segment into raw tokens
pub fn parse_bar_tokens<'a>(input: &mut &'a str) -> PResult<Vec<&'a str>> {
    delimited(
        space0,
        separated(1.., alt((chord_token, plain_token)), space1),
        space0,
    )
    .parse_next(input)
}

/// True for lines written in compact bar notation
pub fn is_bar_line(line: &str) -> bool {
    line.starts_with('|')
}

/// Non-empty segments between pipes
pub fn split_bars(line: &str) -> Vec<&str> {
    line.split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Classify one token
pub fn read_bar_token(token: &str) -> Result<BarToken, LineError> {
    if token.starts_with('[') {
        let (pitches, code) = parse_compact_chord.parse(token).map_err(|_| {
            LineError::syntax(format!("'{token}' is not a chord"))
                .with_suggestion("write chords as [C4,E4,G4]h")
        })?;
        let pitches = pitches
            .into_iter()
            .map(read_pitch)
            .collect::<Result<Vec<_>, _>>()?;
        let duration = read_duration_code(code, token)?;
        return Ok(BarToken::Sound {
            kind: EventKind::Chord(pitches),
            duration,
        });
    }

    if let Some(code) = token.strip_prefix('R') {
        return Ok(BarToken::Sound {
            kind: EventKind::Rest,
            duration: read_duration_code(code, token)?,
        });
    }

    if token.chars().all(|c| c.is_ascii_alphabetic()) {
        return read_dynamic(token).map(BarToken::Dynamic);
    }

    let (pitch, code) = parse_compact_note.parse(token).map_err(|_| {
        LineError::syntax(format!("'{token}' is not a note"))
            .with_suggestion("write notes as pitch plus duration code, for example C4q or F#4e.")
    })?;
    let pitch = read_pitch(pitch)?;
    let duration = read_duration_code(code, token)?;
    Ok(BarToken::Sound {
        kind: EventKind::Note(pitch),
        duration,
    })
}

/// Read a bar line whose first measure is `first_measure`.
///
/// `meter_at` gives the time signature of a measure, used to turn elapsed
/// note values into beat offsets.
pub fn read_bar_line(
    line: &str,
    first_measure: u16,
    meter_at: impl Fn(u16) -> TimeSignature,
) -> Result<Vec<BarEvent>, Vec<LineError>> {
    let segments = split_bars(line);
    if segments.is_empty() {
        return Err(vec![LineError::syntax("bar line has no measures")
            .with_suggestion("for example | C4q D4q E4q F4q |")]);
    }

    let last = first_measure as usize + segments.len() - 1;
    if last > MAX_MEASURE as usize {
        return Err(vec![LineError::range(format!(
            "bar line reaches measure {last}, above {MAX_MEASURE}"
        ))]);
    }

    let mut events = Vec::new();
    let mut errors = Vec::new();
    let mut dynamic = Dynamic::Mf;

    for (index, segment) in segments.into_iter().enumerate() {
        let measure = first_measure + index as u16;
        let beat_length = meter_at(measure).beat_length();

        let tokens = match parse_bar_tokens.parse(segment) {
            Ok(tokens) => tokens,
            Err(_) => {
                errors.push(LineError::syntax(format!("cannot split bar '{segment}'")));
                continue;
            }
        };

        let mut elapsed = Fraction::ZERO;
        for token in tokens {
            match read_bar_token(token) {
                Ok(BarToken::Dynamic(d)) => dynamic = d,
                Ok(BarToken::Sound { kind, duration }) => {
                    events.push(BarEvent {
                        position: Position::new(measure, elapsed / beat_length),
                        kind,
                        duration,
                        dynamic,
                    });
                    elapsed = elapsed + duration.whole_notes();
                }
                Err(error) => errors.push(error),
            }
        }
    }

    if errors.is_empty() {
        Ok(events)
    } else {
        Err(errors)
    }
}
