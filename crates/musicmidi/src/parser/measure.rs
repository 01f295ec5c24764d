//! `Measure ...` lines: events, tempo changes and time signature changes.

use winnow::ascii::{space0, space1, Caseless};
use winnow::combinator::{alt, eof, preceded, terminated};
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_while};

use crate::ast::{Duration, Dynamic, EventKind, Position, Tempo, TimeSignature};
use crate::feedback::{FeedbackCollector, LineError};

use super::header::{parse_tempo, parse_time_signature};
use super::note::{read_beat, read_chord, read_duration_name, read_dynamic, read_measure, read_pitch};

type PResult<T> = winnow::ModalResult<T>;

const GRAMMAR_HINT: &str =
    "Measure <1-1000> <beat>.<subdivision> <pitch or [chord]> <dynamic> <duration>";

/// Fields of a measure line, split but not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMeasureLine<'a> {
    Event {
        measure: &'a str,
        beat: &'a str,
        target: &'a str,
        dynamic: &'a str,
        duration: &'a str,
    },
    Tempo {
        measure: &'a str,
        value: &'a str,
    },
    TimeSignature {
        measure: &'a str,
        value: &'a str,
    },
}

/// A validated measure line
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureStatement {
    Event {
        position: Position,
        kind: EventKind,
        dynamic: Dynamic,
        duration: Duration,
    },
    Tempo {
        measure: u16,
        tempo: Tempo,
    },
    TimeSignature {
        measure: u16,
        time_signature: TimeSignature,
    },
}

fn word<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

fn bracketed<'a>(input: &mut &'a str) -> PResult<&'a str> {
    ('[', take_till(0.., ']'), ']').take().parse_next(input)
}

fn event_fields<'a>(input: &mut &'a str) -> PResult<(&'a str, &'a str, &'a str, &'a str)> {
    let beat = terminated(word, space1).parse_next(input)?;
    let target = terminated(alt((bracketed, word)), space1).parse_next(input)?;
    let dynamic = terminated(word, space1).parse_next(input)?;
    let duration = terminated(word, (space0, eof)).parse_next(input)?;
    Ok((beat, target, dynamic, duration))
}

/// Split a measure line into raw fields
pub fn parse_measure_line<'a>(input: &mut &'a str) -> PResult<RawMeasureLine<'a>> {
    let measure = preceded((Caseless("measure"), space1), word).parse_next(input)?;
    space1.parse_next(input)?;
    alt((
        preceded((Caseless("tempo"), space1), rest)
            .map(|value: &'a str| RawMeasureLine::Tempo { measure, value: value.trim() }),
        preceded(
            (Caseless("time"), space1, Caseless("signature"), space1),
            rest,
        )
        .map(|value: &'a str| RawMeasureLine::TimeSignature { measure, value: value.trim() }),
        event_fields.map(|(beat, target, dynamic, duration)| RawMeasureLine::Event {
            measure,
            beat,
            target,
            dynamic,
            duration,
        }),
    ))
    .parse_next(input)
}

/// True when a line starts with the `Measure` keyword
pub fn is_measure_line(line: &str) -> bool {
    line.get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("measure"))
        && line[7..].starts_with([' ', '\t'])
}

/// Parse the note, chord or rest field
pub fn read_target(target: &str) -> Result<EventKind, LineError> {
    if target.starts_with('[') {
        return read_chord(target).map(EventKind::Chord);
    }
    if target.eq_ignore_ascii_case("r") || target.eq_ignore_ascii_case("rest") {
        return Ok(EventKind::Rest);
    }
    read_pitch(target).map(EventKind::Note)
}

/// Validate a measure line, reporting every bad field
pub fn read_measure_line(
    line: &str,
    collector: &mut FeedbackCollector,
) -> Result<MeasureStatement, Vec<LineError>> {
    let raw = parse_measure_line.parse(line).map_err(|_| {
        vec![LineError::syntax(format!("'{line}' does not match the measure grammar"))
            .with_suggestion(GRAMMAR_HINT)]
    })?;

    match raw {
        RawMeasureLine::Tempo { measure, value } => {
            let measure = read_measure(measure);
            let tempo = parse_tempo(value, collector);
            match (measure, tempo) {
                (Ok(measure), Ok(tempo)) => Ok(MeasureStatement::Tempo { measure, tempo }),
                (measure, tempo) => Err(collect_errors([measure.err(), tempo.err()])),
            }
        }
        RawMeasureLine::TimeSignature { measure, value } => {
            let measure = read_measure(measure);
            let time_signature = parse_time_signature(value);
            match (measure, time_signature) {
                (Ok(measure), Ok(time_signature)) => Ok(MeasureStatement::TimeSignature {
                    measure,
                    time_signature,
                }),
                (measure, ts) => Err(collect_errors([measure.err(), ts.err()])),
            }
        }
        RawMeasureLine::Event {
            measure,
            beat,
            target,
            dynamic,
            duration,
        } => {
            let measure = read_measure(measure);
            let offset = read_beat(beat);
            let kind = read_target(target);
            let dynamic = read_dynamic(dynamic);
            let duration = read_duration_name(duration);
            match (measure, offset, kind, dynamic, duration) {
                (Ok(measure), Ok(offset), Ok(kind), Ok(dynamic), Ok(duration)) => {
                    Ok(MeasureStatement::Event {
                        position: Position::new(measure, offset),
                        kind,
                        dynamic,
                        duration,
                    })
                }
                (measure, offset, kind, dynamic, duration) => Err(collect_errors([
                    measure.err(),
                    offset.err(),
                    kind.err(),
                    dynamic.err(),
                    duration.err(),
                ])),
            }
        }
    }
}

fn collect_errors<const N: usize>(errors: [Option<LineError>; N]) -> Vec<LineError> {
    errors.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NoteValue;
    use crate::feedback::ErrorKind;
    use crate::fraction::Fraction;

    fn read(line: &str) -> Result<MeasureStatement, Vec<LineError>> {
        let mut collector = FeedbackCollector::new();
        read_measure_line(line, &mut collector)
    }

    #[test]
    fn test_split_event_line() {
        let raw = parse_measure_line
            .parse("Measure 3 2.5 [C4, E4, G4] mf dotted-half")
            .unwrap();
        assert_eq!(
            raw,
            RawMeasureLine::Event {
                measure: "3",
                beat: "2.5",
                target: "[C4, E4, G4]",
                dynamic: "mf",
                duration: "dotted-half",
            }
        );
    }

    #[test]
    fn test_read_note_event() {
        let statement = read("Measure 1 2.0 D5 mf quarter").unwrap();
        match statement {
            MeasureStatement::Event {
                position,
                kind,
                dynamic,
                duration,
            } => {
                assert_eq!(position, Position::new(1, Fraction::ONE));
                assert!(matches!(kind, EventKind::Note(p) if p.midi_number() == 74));
                assert_eq!(dynamic, Dynamic::Mf);
                assert_eq!(duration.value, NoteValue::Quarter);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rest_event() {
        let statement = read("measure 2 3.0 R p half").unwrap();
        assert!(matches!(
            statement,
            MeasureStatement::Event {
                kind: EventKind::Rest,
                ..
            }
        ));
    }

    #[test]
    fn test_read_change_lines() {
        assert_eq!(
            read("Measure 5 Tempo 90").unwrap(),
            MeasureStatement::Tempo {
                measure: 5,
                tempo: Tempo { bpm: 90 }
            }
        );
        assert_eq!(
            read("Measure 9 Time Signature 3/4").unwrap(),
            MeasureStatement::TimeSignature {
                measure: 9,
                time_signature: TimeSignature {
                    numerator: 3,
                    denominator: 4
                }
            }
        );
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let errors = read("Measure 1001 1.0 H4 loud quaver").unwrap_err();
        let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::Range,
                ErrorKind::Reference,
                ErrorKind::Reference,
                ErrorKind::Reference
            ]
        );
    }

    #[test]
    fn test_grammar_mismatch_is_syntax_error() {
        let errors = read("Measure 1 1.0 C4 p").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_is_measure_line() {
        assert!(is_measure_line("Measure 1 1.0 C4 p quarter"));
        assert!(is_measure_line("MEASURE 1 1.0 C4 p quarter"));
        assert!(!is_measure_line("Measures: 12"));
        assert!(!is_measure_line("Measure"));
    }
}
