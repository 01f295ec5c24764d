//! Header field parsing (`Title:`, `Key:`, `Time Signature:`, `Tempo:` and
//! friends).

use winnow::combinator::preceded;
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use crate::ast::{
    AccompanimentStyle, Genre, Header, InfoField, Tempo, TimeSignature, MAX_MEASURE,
};
use crate::feedback::{FeedbackCollector, LineError};

use super::key::parse_key_field;

type PResult<T> = winnow::ModalResult<T>;

/// Tempo range the metronome marks of most scores stay within.
const USUAL_TEMPO: std::ops::RangeInclusive<u16> = 40..=208;
const MAX_TEMPO: u16 = 1000;

/// Parse `Name: value`, where the name is letters and spaces
pub fn parse_field<'a>(input: &mut &'a str) -> PResult<(&'a str, &'a str)> {
    let name = take_while(1.., |c: char| c.is_ascii_alphabetic() || c == ' ').parse_next(input)?;
    let value = preceded(':', rest).parse_next(input)?;
    Ok((name.trim(), value.trim()))
}

/// Split a header-shaped line into its name and value
pub fn split_field(line: &str) -> Option<(&str, &str)> {
    parse_field.parse(line).ok()
}

/// Header fields this parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Title,
    Key,
    TimeSignature,
    Tempo,
    Genre,
    Style,
    Measures,
}

impl FieldName {
    pub fn parse(name: &str) -> Option<FieldName> {
        match name.to_lowercase().as_str() {
            "title" => Some(FieldName::Title),
            "key" => Some(FieldName::Key),
            "time signature" | "meter" => Some(FieldName::TimeSignature),
            "tempo" => Some(FieldName::Tempo),
            "genre" => Some(FieldName::Genre),
            "style" => Some(FieldName::Style),
            "measures" => Some(FieldName::Measures),
            _ => None,
        }
    }
}

/// Accumulates header lines; `finish` applies defaults and cross-field checks.
#[derive(Debug, Default)]
pub struct HeaderBuilder {
    header: Header,
    style: Option<(usize, String)>,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        HeaderBuilder::default()
    }

    /// Apply one header line
    pub fn apply(&mut self, name: &str, value: &str, collector: &mut FeedbackCollector) {
        let Some(field) = FieldName::parse(name) else {
            collector.info(format!("Ignoring unrecognized header field '{name}'"));
            self.header.other_fields.push(InfoField {
                name: name.to_string(),
                value: value.to_string(),
            });
            return;
        };

        if let Err(error) = self.apply_known(field, name, value, collector) {
            collector.reject(error);
        }
    }

    fn apply_known(
        &mut self,
        field: FieldName,
        name: &str,
        value: &str,
        collector: &mut FeedbackCollector,
    ) -> Result<(), LineError> {
        let header = &mut self.header;
        let repeated = match field {
            FieldName::Title => !std::mem::replace(&mut header.title, value.to_string()).is_empty(),
            FieldName::Key => header.key.replace(parse_key_field(value)?).is_some(),
            FieldName::TimeSignature => header
                .time_signature
                .replace(parse_time_signature(value)?)
                .is_some(),
            FieldName::Tempo => header
                .tempo
                .replace(parse_tempo(value, collector)?)
                .is_some(),
            FieldName::Genre => {
                let genre = Genre::parse(value).ok_or_else(|| unknown_genre(value))?;
                header.genre.replace(genre).is_some()
            }
            FieldName::Style => self
                .style
                .replace((collector.line(), value.to_string()))
                .is_some(),
            FieldName::Measures => header.measures.replace(parse_measure_count(value)?).is_some(),
        };
        if repeated {
            collector.warning(format!("{name}: given more than once, using the later value"));
        }
        Ok(())
    }

    /// Resolve the style line and report missing defaults
    pub fn finish(mut self, collector: &mut FeedbackCollector) -> Header {
        if let Some((line, word)) = self.style.take() {
            let saved = collector.line();
            collector.set_line(line);
            match parse_style(&word, self.header.genre) {
                Ok(style) => self.header.style = Some(style),
                Err(error) => collector.reject(error),
            }
            collector.set_line(saved);
        }

        let saved = collector.line();
        collector.set_line(1);
        if self.header.tempo.is_none() {
            collector.warning_with_suggestion(
                "Missing Tempo: line, assuming 120 BPM",
                "Add Tempo: 120 to the header",
            );
        }
        if self.header.time_signature.is_none() {
            collector.warning_with_suggestion(
                "Missing Time Signature: line, assuming 4/4",
                "Add Time Signature: 4/4 to the header",
            );
        }
        collector.set_line(saved);

        self.header
    }

    /// Declared time signature, or 4/4
    pub fn time_signature(&self) -> TimeSignature {
        self.header.time_signature.unwrap_or_default()
    }
}

fn unknown_genre(word: &str) -> LineError {
    LineError::reference(format!("unknown genre '{word}'")).with_suggestion(format!(
        "genres are {}",
        Genre::ALL.map(|g| g.name()).join(", ")
    ))
}

/// Parse a style word, which may also be a genre name
pub fn parse_style(word: &str, genre: Option<Genre>) -> Result<AccompanimentStyle, LineError> {
    use crate::ast::StyleLookup;

    AccompanimentStyle::parse(word, genre).map_err(|lookup| match lookup {
        StyleLookup::Unknown => LineError::reference(format!("unknown accompaniment style '{word}'"))
            .with_suggestion(
                "styles are none, basic, quarter, half, whole, waltz, alberti, arpeggio, genre or a genre name",
            ),
        StyleLookup::NeedsGenre => LineError::reference("style 'genre' needs a Genre: line")
            .with_suggestion("Add Genre: jazz (or another genre) to the header"),
    })
}

/// Parse a time signature like `3/4`
pub fn parse_time_signature(value: &str) -> Result<TimeSignature, LineError> {
    let malformed = || {
        LineError::syntax(format!("time signature '{value}' is not <beats>/<note>"))
            .with_suggestion("for example 3/4 or 6/8")
    };
    let (num, den) = value.trim().split_once('/').ok_or_else(malformed)?;
    let (num, den) = (num.trim(), den.trim());
    if num.is_empty()
        || den.is_empty()
        || !num.bytes().chain(den.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let numerator: u32 = num.parse().unwrap_or(u32::MAX);
    let denominator: u32 = den.parse().unwrap_or(u32::MAX);
    if !(1..=32).contains(&numerator) {
        return Err(LineError::range(format!(
            "time signature numerator {num} is outside 1-32"
        )));
    }
    if !(1..=32).contains(&denominator) || !denominator.is_power_of_two() {
        return Err(LineError::range(format!(
            "time signature denominator {den} is not a power of two from 1 to 32"
        )));
    }

    Ok(TimeSignature {
        numerator: numerator as u8,
        denominator: denominator as u8,
    })
}

/// Parse a tempo like `120` or `96 BPM`
pub fn parse_tempo(value: &str, collector: &mut FeedbackCollector) -> Result<Tempo, LineError> {
    let mut words = value.split_whitespace();
    let number = words.next().unwrap_or("");
    let unit = words.next();
    let well_formed = !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
        && unit.map_or(true, |u| u.eq_ignore_ascii_case("bpm"))
        && words.next().is_none();
    if !well_formed {
        return Err(LineError::syntax(format!("tempo '{value}' is not a BPM number"))
            .with_suggestion("for example Tempo: 120"));
    }

    let bpm: u32 = number.parse().unwrap_or(u32::MAX);
    if bpm == 0 || bpm > MAX_TEMPO as u32 {
        return Err(LineError::range(format!(
            "tempo {number} is outside 1-{MAX_TEMPO} BPM"
        )));
    }
    let bpm = bpm as u16;
    if !USUAL_TEMPO.contains(&bpm) {
        collector.warning(format!(
            "Tempo {bpm} BPM is outside the usual {}-{} range",
            USUAL_TEMPO.start(),
            USUAL_TEMPO.end()
        ));
    }
    Ok(Tempo { bpm })
}

/// Parse the declared song length (`Measures: 16`)
fn parse_measure_count(value: &str) -> Result<u16, LineError> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineError::syntax(format!(
            "song length '{value}' is not a number of measures"
        )));
    }
    match value.parse::<u32>() {
        Ok(n) if (1..=MAX_MEASURE as u32).contains(&n) => Ok(n as u16),
        _ => Err(LineError::range(format!(
            "song length {value} is outside 1-{MAX_MEASURE} measures"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Mode, NoteName};
    use crate::feedback::ErrorKind;

    #[test]
    fn test_split_field() {
        assert_eq!(
            split_field("Time Signature: 3/4"),
            Some(("Time Signature", "3/4"))
        );
        assert_eq!(split_field("Title:  My Song "), Some(("Title", "My Song")));
        assert_eq!(split_field("Measure 1 1.0 C4 p quarter"), None);
    }

    #[test]
    fn test_parse_time_signature() {
        assert_eq!(
            parse_time_signature("6/8").unwrap(),
            TimeSignature {
                numerator: 6,
                denominator: 8
            }
        );
        assert_eq!(parse_time_signature("3/5").unwrap_err().kind, ErrorKind::Range);
        assert_eq!(parse_time_signature("0/4").unwrap_err().kind, ErrorKind::Range);
        assert_eq!(parse_time_signature("three").unwrap_err().kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_parse_tempo() {
        let mut collector = FeedbackCollector::new();
        assert_eq!(parse_tempo("96 BPM", &mut collector).unwrap().bpm, 96);
        assert!(collector.feedback().is_empty());

        assert_eq!(parse_tempo("0", &mut collector).unwrap_err().kind, ErrorKind::Range);
        assert_eq!(parse_tempo("fast", &mut collector).unwrap_err().kind, ErrorKind::Syntax);

        assert_eq!(parse_tempo("300", &mut collector).unwrap().bpm, 300);
        assert_eq!(collector.feedback().len(), 1);
    }

    #[test]
    fn test_missing_defaults_warn() {
        let mut collector = FeedbackCollector::new();
        let header = HeaderBuilder::new().finish(&mut collector);

        assert_eq!(header.tempo, None);
        assert_eq!(header.time_signature, None);
        assert_eq!(collector.feedback().len(), 2);
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_header_builder_fields() {
        let mut collector = FeedbackCollector::new();
        let mut builder = HeaderBuilder::new();
        builder.apply("Title", "Waltz for Two", &mut collector);
        builder.apply("Key", "F# minor", &mut collector);
        builder.apply("Tempo", "90", &mut collector);
        builder.apply("Time Signature", "3/4", &mut collector);
        builder.apply("Style", "genre", &mut collector);
        builder.apply("Genre", "romantic", &mut collector);
        builder.apply("Mood", "wistful", &mut collector);
        let header = builder.finish(&mut collector);

        assert_eq!(header.title, "Waltz for Two");
        let key = header.key.unwrap();
        assert_eq!(key.root, NoteName::F);
        assert_eq!(key.mode, Mode::Minor);
        assert_eq!(
            header.style,
            Some(AccompanimentStyle::Genre(Genre::Romantic))
        );
        assert_eq!(header.other_fields.len(), 1);
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_style_genre_without_genre_is_reference_error() {
        let mut collector = FeedbackCollector::new();
        let mut builder = HeaderBuilder::new();
        collector.set_line(3);
        builder.apply("Style", "genre", &mut collector);
        builder.finish(&mut collector);

        let errors: Vec<_> = collector
            .feedback()
            .iter()
            .filter(|f| f.kind.is_some())
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, Some(ErrorKind::Reference));
        assert_eq!(errors[0].line, 3);
    }

    #[test]
    fn test_measures_field() {
        assert_eq!(parse_measure_count("16").unwrap(), 16);
        assert_eq!(parse_measure_count("2000").unwrap_err().kind, ErrorKind::Range);
        assert_eq!(parse_measure_count("lots").unwrap_err().kind, ErrorKind::Syntax);
    }
}
