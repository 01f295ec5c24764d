//! Errors raised after parsing, when a song cannot be converted.

use thiserror::Error;

use crate::ast::{Dynamic, Instrument, TimeSignature};
use crate::feedback::{Feedback, FeedbackLevel};
use crate::fraction::Fraction;

/// A note or rest that does not fit the song's time grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error(
        "line {line}: beat {beat} is past the end of measure {measure} ({time_signature} has {capacity} beats)"
    )]
    BeatOverflow {
        line: usize,
        measure: u16,
        beat: Fraction,
        time_signature: TimeSignature,
        capacity: u8,
    },

    #[error(
        "line {line}: event at measure {measure} beat {beat} ends after the last measure ({last_measure})"
    )]
    PastSongEnd {
        line: usize,
        measure: u16,
        beat: Fraction,
        last_measure: u16,
    },

    #[error("line {line}: {what} change at measure {measure} is after the last measure ({last_measure})")]
    ChangePastSongEnd {
        line: usize,
        what: &'static str,
        measure: u16,
        last_measure: u16,
    },
}

impl TimingError {
    pub fn line(&self) -> usize {
        match self {
            TimingError::BeatOverflow { line, .. }
            | TimingError::PastSongEnd { line, .. }
            | TimingError::ChangePastSongEnd { line, .. } => *line,
        }
    }
}

/// A valid symbolic value with no MIDI encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no velocity is mapped for dynamic '{0}'")]
    MissingVelocity(Dynamic),

    #[error("velocity {velocity} for dynamic '{dynamic}' is above 127")]
    VelocityRange { dynamic: Dynamic, velocity: u8 },

    #[error("program {program} for instrument {instrument} is above 127")]
    ProgramRange { instrument: Instrument, program: u8 },

    #[error("no free MIDI channel for voice '{0}' (15 melodic channels in use)")]
    NoFreeChannel(String),

    #[error("tempo of {us_per_quarter} microseconds per quarter does not fit a tempo event")]
    TempoRange { us_per_quarter: u64 },
}

/// Everything that can stop a conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{} parse error(s)", count_errors(.0))]
    Parse(Vec<Feedback>),

    #[error("TimingError: {0}")]
    Timing(#[from] TimingError),

    #[error("MappingError: {0}")]
    Mapping(#[from] MappingError),

    #[error("style 'genre' needs a genre: pass one, add a Genre: header, or set convert.genre")]
    NeedsGenre,
}

fn count_errors(feedback: &[Feedback]) -> usize {
    feedback
        .iter()
        .filter(|f| f.level == FeedbackLevel::Error)
        .count()
}
