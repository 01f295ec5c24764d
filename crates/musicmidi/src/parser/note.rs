//! Token parsers for pitches, chords, durations, dynamics and beats.
//!
//! The winnow parsers only check shape. The `read_*` functions classify what
//! they find into syntax, range and reference errors.

use winnow::ascii::{digit1, space0};
use winnow::combinator::{alt, delimited, opt, separated};
use winnow::prelude::*;
use winnow::token::{one_of, rest, take_while};

use crate::ast::{
    Accidental, Duration, Dynamic, NoteName, NoteValue, Pitch, MAX_MEASURE,
};
use crate::feedback::LineError;
use crate::fraction::Fraction;

type PResult<T> = winnow::ModalResult<T>;

/// Pitch spelling before validation: letter, accidental, signed octave text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchSpelling<'a> {
    pub letter: char,
    pub accidental: Option<Accidental>,
    pub octave: &'a str,
}

/// Parse a pitch spelling such as `C4`, `F#4`, `Bb3` or `C-1`
pub fn parse_pitch_spelling<'a>(input: &mut &'a str) -> PResult<PitchSpelling<'a>> {
    let letter = one_of(|c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let accidental = opt(parse_accidental).parse_next(input)?;
    let octave = (opt('-'), digit1).take().parse_next(input)?;
    Ok(PitchSpelling {
        letter,
        accidental,
        octave,
    })
}

/// Parse `#` or `b`
pub fn parse_accidental(input: &mut &str) -> PResult<Accidental> {
    alt(('#'.value(Accidental::Sharp), 'b'.value(Accidental::Flat))).parse_next(input)
}

/// Characters allowed inside a pitch token
fn is_pitch_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '#' || c == '-'
}

/// Parse a bracketed chord body `[C4, E4, G4]` into raw pitch tokens
pub fn parse_chord_tokens<'a>(input: &mut &'a str) -> PResult<Vec<&'a str>> {
    delimited(
        ('[', space0),
        separated(1.., take_while(1.., is_pitch_char), (space0, ',', space0)),
        (space0, ']'),
    )
    .parse_next(input)
}

/// Parse a compact note token `C4q.` into (pitch text, duration text)
pub fn parse_compact_note<'a>(input: &mut &'a str) -> PResult<(&'a str, &'a str)> {
    let pitch = (
        one_of(|c: char| c.is_ascii_alphabetic()),
        opt(parse_accidental),
        opt('-'),
        digit1,
    )
        .take()
        .parse_next(input)?;
    let duration = rest.parse_next(input)?;
    Ok((pitch, duration))
}

/// Parse a compact chord token `[C4,E4,G4]h` into (pitch texts, duration text)
pub fn parse_compact_chord<'a>(input: &mut &'a str) -> PResult<(Vec<&'a str>, &'a str)> {
    let pitches = parse_chord_tokens(input)?;
    let duration = rest.parse_next(input)?;
    Ok((pitches, duration))
}

/// Validate a pitch token
pub fn read_pitch(token: &str) -> Result<Pitch, LineError> {
    let spelling = parse_pitch_spelling.parse(token).map_err(|_| {
        LineError::syntax(format!("'{token}' is not a pitch"))
            .with_suggestion("write pitches as letter, optional # or b, octave: C4, F#4, Bb3")
    })?;

    let name = NoteName::from_char(spelling.letter).ok_or_else(|| {
        LineError::reference(format!("unknown pitch name '{}' in '{token}'", spelling.letter))
            .with_suggestion("pitch names are A to G")
    })?;

    let octave: i32 = spelling
        .octave
        .parse()
        .map_err(|_| LineError::range(format!("octave in '{token}' is outside 0-9")))?;
    if !(0..=9).contains(&octave) {
        return Err(LineError::range(format!(
            "octave {octave} in '{token}' is outside 0-9"
        )));
    }

    Pitch::new(name, spelling.accidental, octave as u8).ok_or_else(|| {
        LineError::range(format!("'{token}' is outside the MIDI note range 0-127"))
    })
}

/// Validate a bracketed chord such as `[C4, E4, G4]`
pub fn read_chord(token: &str) -> Result<Vec<Pitch>, LineError> {
    let pitches = parse_chord_tokens.parse(token).map_err(|_| {
        LineError::syntax(format!("'{token}' is not a chord"))
            .with_suggestion("write chords as [C4, E4, G4]")
    })?;
    pitches.into_iter().map(read_pitch).collect()
}

/// Validate a long-form duration: `quarter`, `quarter.` or `dotted-quarter`
pub fn read_duration_name(word: &str) -> Result<Duration, LineError> {
    let (name, dotted) = if let Some(base) = word.strip_prefix("dotted-") {
        (base, true)
    } else if let Some(base) = word.strip_suffix('.') {
        (base, true)
    } else {
        (word, false)
    };
    let value = NoteValue::from_name(name).ok_or_else(|| {
        LineError::reference(format!("unknown duration '{word}'")).with_suggestion(
            "use whole, half, quarter, eighth, sixteenth or thirtysecond, optionally dotted-",
        )
    })?;
    Ok(Duration { value, dotted })
}

/// Validate a compact duration code: `q` or `q.`
pub fn read_duration_code(code: &str, token: &str) -> Result<Duration, LineError> {
    let (letters, dotted) = match code.strip_suffix('.') {
        Some(base) => (base, true),
        None => (code, false),
    };
    let mut chars = letters.chars();
    let value = match (chars.next(), chars.next()) {
        (Some(c), None) => NoteValue::from_code(c),
        _ => None,
    };
    match value {
        Some(value) => Ok(Duration { value, dotted }),
        None if code.is_empty() => Err(LineError::syntax(format!(
            "'{token}' has no duration code"
        ))
        .with_suggestion("append w, h, q, e, s or t, for example C4q")),
        None => Err(LineError::reference(format!(
            "unknown duration code '{code}' in '{token}'"
        ))
        .with_suggestion("duration codes are w, h, q, e, s and t")),
    }
}

/// Validate a dynamic marking
pub fn read_dynamic(word: &str) -> Result<Dynamic, LineError> {
    if let Some(dynamic) = Dynamic::parse(word) {
        return Ok(dynamic);
    }
    if Dynamic::looks_like_dynamic(word) {
        Err(LineError::range(format!(
            "dynamic '{word}' is outside the range ppp to fff"
        )))
    } else {
        Err(LineError::reference(format!("unknown dynamic '{word}'"))
            .with_suggestion("use ppp, pp, p, mp, mf, f, ff or fff"))
    }
}

/// Validate a measure number (1-1000)
pub fn read_measure(text: &str) -> Result<u16, LineError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineError::syntax(format!("measure number '{text}' is not an integer")));
    }
    let limit = || LineError::range(format!("measure {text} is outside 1-{MAX_MEASURE}"));
    let number: u32 = text.parse().map_err(|_| limit())?;
    if number == 0 || number > MAX_MEASURE as u32 {
        return Err(limit());
    }
    Ok(number as u16)
}

/// Validate a one-based decimal beat and return the zero-based offset
pub fn read_beat(text: &str) -> Result<Fraction, LineError> {
    let beat = Fraction::parse_decimal(text).ok_or_else(|| {
        LineError::syntax(format!("beat '{text}' is not a decimal number"))
            .with_suggestion("write beats as <beat>.<subdivision>, for example 2.5")
    })?;
    beat.checked_sub(Fraction::ONE)
        .ok_or_else(|| LineError::range(format!("beat {text} is below 1")))
}
