//! Song notation parser, accompaniment generator and MIDI writer.
//!
//! Songs are plain text: a few header fields followed by measure lines or
//! compact bars. Conversion runs four stages:
//!
//! 1. [`parse`] turns text into a [`Song`] plus feedback
//! 2. [`timing::resolve`] places every event on a 480 ticks-per-quarter grid
//! 3. [`accompaniment::Accompanist`] adds voices in the requested style
//! 4. [`midi::build`] writes a Standard MIDI File
//!
//! # Example
//!
//! ```
//! use musicmidi::{convert, ConvertOptions};
//!
//! let song = "\
//! Title: Scale
//! Key: C
//! Tempo: 96
//! Time Signature: 4/4
//! Measure 1 1.0 C4 mf quarter
//! Measure 1 2.0 D4 mf quarter
//! | E4q F4q G4h |
//! ";
//!
//! let conversion = convert(song, &ConvertOptions::default()).unwrap();
//! assert!(conversion.midi.starts_with(b"MThd"));
//! ```

pub mod accompaniment;
pub mod ast;
pub mod error;
pub mod feedback;
pub mod fraction;
pub mod midi;
pub mod parser;
pub mod timing;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use ast::*;
pub use error::{ConvertError, MappingError, TimingError};
pub use feedback::{ErrorKind, Feedback, FeedbackLevel, ParseResult};
pub use midi::{MidiParams, ProgramTable, VelocityTable};
pub use timing::{resolve, ResolvedSong, ResolvedVoice};

use accompaniment::Accompanist;

/// Parse song notation into a Song.
///
/// This is a generous parser: it keeps going after bad lines and returns
/// every problem it found in the feedback.
pub fn parse(input: &str) -> ParseResult<Song> {
    parser::parse(input)
}

/// How the accompaniment style is chosen for a song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    /// This style, whatever the song header says
    Fixed(AccompanimentStyle),
    /// The genre style with `genre`, else the song's `Genre:`, else `fallback`
    Genre {
        genre: Option<Genre>,
        fallback: Option<Genre>,
    },
    /// The song's `Style:` header, else this style
    Default(AccompanimentStyle),
}

impl Default for StyleChoice {
    fn default() -> Self {
        StyleChoice::Default(AccompanimentStyle::Basic)
    }
}

impl StyleChoice {
    pub fn resolve(&self, header: &Header) -> Result<AccompanimentStyle, ConvertError> {
        match *self {
            StyleChoice::Fixed(style) => Ok(style),
            StyleChoice::Genre { genre, fallback } => genre
                .or(header.genre)
                .or(fallback)
                .map(AccompanimentStyle::Genre)
                .ok_or(ConvertError::NeedsGenre),
            StyleChoice::Default(style) => Ok(header.style.unwrap_or(style)),
        }
    }
}

/// Options for [`convert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub style: StyleChoice,
    /// Measures of melody, ending at the current one, used for harmony
    pub harmony_window: u16,
    pub midi: MidiParams,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            style: StyleChoice::default(),
            harmony_window: 1,
            midi: MidiParams::default(),
        }
    }
}

/// A converted song
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub song: ResolvedSong,
    pub style: AccompanimentStyle,
    pub accompaniment: Vec<ResolvedVoice>,
    /// Warnings and notes from parsing
    pub feedback: Vec<Feedback>,
    #[serde(skip)]
    pub midi: Vec<u8>,
}

/// Parse, resolve, accompany and encode a song.
pub fn convert(input: &str, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
    let parsed = parse(input);
    if parsed.has_errors() {
        return Err(ConvertError::Parse(parsed.feedback));
    }
    for feedback in parsed.warnings() {
        warn!("{feedback}");
    }
    let ParseResult { value: song, feedback } = parsed;
    debug!(voices = song.voices.len(), "parsed song");

    let resolved = resolve(&song)?;
    let style = options.style.resolve(&song.header)?;
    let accompaniment = Accompanist::new(options.harmony_window).accompany(&resolved, style);
    let midi = midi::build(&resolved, &accompaniment, &options.midi)?;

    info!(
        title = %resolved.title,
        %style,
        voices = resolved.voices.len() + accompaniment.len(),
        bytes = midi.len(),
        "converted song"
    );

    Ok(Conversion {
        song: resolved,
        style,
        accompaniment,
        feedback,
        midi,
    })
}
