//! Song notation parser using winnow.
//!
//! Every line is read on its own. A bad line is reported and skipped so the
//! caller sees all faults in one pass; the song is usable only when no errors
//! were collected.

mod bar;
mod header;
mod key;
mod measure;
mod note;

pub use header::parse_style;

use tracing::debug;

use crate::ast::{
    Event, Instrument, MeterChange, Section, Song, TempoChange, TimeSignature, Voice,
};
use crate::feedback::{FeedbackCollector, LineError, ParseResult};

use bar::{is_bar_line, read_bar_line};
use header::{split_field, HeaderBuilder};
use measure::{is_measure_line, read_measure_line, MeasureStatement};

/// Parse song notation into a [`Song`].
pub fn parse(input: &str) -> ParseResult<Song> {
    let mut collector = FeedbackCollector::new();
    let mut builder = SongBuilder::default();

    for (index, raw) in input.lines().enumerate() {
        collector.set_line(index + 1);
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        builder.line(line, &mut collector);
    }

    let song = builder.finish(&mut collector);
    debug!(
        voices = song.voices.len(),
        feedback = collector.feedback().len(),
        "parsed song"
    );
    ParseResult::new(song, collector.into_feedback())
}

/// Drop a `#` comment. A `#` directly after a letter is a sharp, not a comment.
fn strip_comment(line: &str) -> &str {
    let mut previous = None;
    for (index, c) in line.char_indices() {
        if c == '#' && previous.map_or(true, char::is_whitespace) {
            return &line[..index];
        }
        previous = Some(c);
    }
    line
}

/// Section line waiting for the measure of the next event
#[derive(Debug)]
struct PendingSection {
    line: usize,
    name: String,
    style: Option<String>,
}

#[derive(Debug, Default)]
struct SongBuilder {
    header: HeaderBuilder,
    body_started: bool,
    voices: Vec<Voice>,
    current_voice: usize,
    tempo_changes: Vec<TempoChange>,
    meter_changes: Vec<MeterChange>,
    pending_sections: Vec<PendingSection>,
    sections: Vec<(PendingSection, u16)>,
}

impl SongBuilder {
    fn line(&mut self, line: &str, collector: &mut FeedbackCollector) {
        if is_measure_line(line) {
            self.body_started = true;
            self.measure_line(line, collector);
        } else if is_bar_line(line) {
            self.body_started = true;
            self.bar_line(line, collector);
        } else if line.starts_with('[') && line.ends_with(']') {
            self.section_line(line, collector);
        } else if let Some((name, value)) = split_field(line) {
            if name.eq_ignore_ascii_case("voice") {
                if let Err(error) = self.voice_line(value, collector) {
                    collector.reject(error);
                }
            } else if self.body_started {
                collector.reject(
                    LineError::syntax(format!("header field '{name}:' after the first measure"))
                        .with_suggestion(format!(
                            "move it above the body, or use Measure <n> {name} <value> for a change"
                        )),
                );
            } else {
                self.header.apply(name, value, collector);
            }
        } else {
            collector.reject(
                LineError::syntax(format!("unrecognized line '{line}'")).with_suggestion(
                    "lines are headers (Name: value), Measure lines, | bars |, [Sections] or comments",
                ),
            );
        }
    }

    fn measure_line(&mut self, line: &str, collector: &mut FeedbackCollector) {
        let statement = match read_measure_line(line, collector) {
            Ok(statement) => statement,
            Err(errors) => {
                errors.into_iter().for_each(|e| collector.reject(e));
                return;
            }
        };

        match statement {
            MeasureStatement::Event {
                position,
                kind,
                dynamic,
                duration,
            } => {
                self.start_sections(position.measure);
                let line = collector.line();
                self.voice_mut().events.push(Event {
                    line,
                    position,
                    kind,
                    duration,
                    dynamic,
                });
            }
            MeasureStatement::Tempo { measure, tempo } => {
                if let Some(last) = self.tempo_changes.last() {
                    if measure <= last.measure {
                        collector.reject(out_of_order("tempo", measure, last.measure));
                        return;
                    }
                }
                self.tempo_changes.push(TempoChange {
                    line: collector.line(),
                    measure,
                    tempo,
                });
            }
            MeasureStatement::TimeSignature {
                measure,
                time_signature,
            } => {
                if let Some(last) = self.meter_changes.last() {
                    if measure <= last.measure {
                        collector.reject(out_of_order("time signature", measure, last.measure));
                        return;
                    }
                }
                self.meter_changes.push(MeterChange {
                    line: collector.line(),
                    measure,
                    time_signature,
                });
            }
        }
    }

    fn bar_line(&mut self, text: &str, collector: &mut FeedbackCollector) {
        let first = self.current_voice_end().saturating_add(1);
        let events = match read_bar_line(text, first, |m| self.meter_at(m)) {
            Ok(events) => events,
            Err(errors) => {
                errors.into_iter().for_each(|e| collector.reject(e));
                return;
            }
        };

        self.start_sections(first);
        let line = collector.line();
        for event in events {
            self.voice_mut().events.push(Event {
                line,
                position: event.position,
                kind: event.kind,
                duration: event.duration,
                dynamic: event.dynamic,
            });
        }
    }

    fn section_line(&mut self, line: &str, collector: &mut FeedbackCollector) {
        let inner = line[1..line.len() - 1].trim();
        let (name, style) = match inner.split_once(':') {
            Some((name, style)) => (name.trim(), Some(style.trim().to_string())),
            None => (inner, None),
        };
        if name.is_empty() {
            collector.reject(LineError::syntax("section marker has no name"));
            return;
        }
        self.pending_sections.push(PendingSection {
            line: collector.line(),
            name: name.to_string(),
            style,
        });
    }

    fn voice_line(&mut self, value: &str, collector: &mut FeedbackCollector) -> Result<(), LineError> {
        let (name, instrument) = match value.split_once('(') {
            Some((name, rest)) => {
                let word = rest.strip_suffix(')').ok_or_else(|| {
                    LineError::syntax(format!("voice instrument '({rest}' is missing ')'"))
                })?;
                let instrument = Instrument::parse(word).ok_or_else(|| {
                    LineError::reference(format!("unknown instrument '{}'", word.trim()))
                        .with_suggestion(format!(
                            "instruments are {}",
                            Instrument::ALL.map(|i| i.name()).join(", ")
                        ))
                })?;
                (name.trim(), Some(instrument))
            }
            None => (value.trim(), None),
        };
        if name.is_empty() {
            return Err(LineError::syntax("Voice: line has no name"));
        }

        match self.voices.iter().position(|v| v.name == name) {
            Some(index) => {
                self.current_voice = index;
                if let Some(instrument) = instrument {
                    if self.voices[index].instrument != instrument {
                        collector.warning(format!(
                            "voice '{name}' already plays {}, ignoring {instrument}",
                            self.voices[index].instrument
                        ));
                    }
                }
            }
            None => {
                self.voices
                    .push(Voice::new(name, instrument.unwrap_or(Instrument::Piano)));
                self.current_voice = self.voices.len() - 1;
            }
        }
        Ok(())
    }

    fn voice_mut(&mut self) -> &mut Voice {
        if self.voices.is_empty() {
            self.voices.push(Voice::default());
            self.current_voice = 0;
        }
        &mut self.voices[self.current_voice]
    }

    /// Last measure the current voice has events in
    fn current_voice_end(&self) -> u16 {
        self.voices
            .get(self.current_voice)
            .and_then(|v| v.events.iter().map(|e| e.position.measure).max())
            .unwrap_or(0)
    }

    fn start_sections(&mut self, measure: u16) {
        for pending in self.pending_sections.drain(..) {
            self.sections.push((pending, measure));
        }
    }

    /// Time signature in force at `measure`, from changes read so far
    fn meter_at(&self, measure: u16) -> TimeSignature {
        self.meter_changes
            .iter()
            .rev()
            .find(|c| c.measure <= measure)
            .map(|c| c.time_signature)
            .unwrap_or_else(|| self.header.time_signature())
    }

    fn finish(self, collector: &mut FeedbackCollector) -> Song {
        let header = self.header.finish(collector);

        for pending in &self.pending_sections {
            collector.set_line(pending.line);
            collector.warning(format!(
                "section '{}' has no measures after it, ignoring",
                pending.name
            ));
        }

        let mut sections = Vec::with_capacity(self.sections.len());
        for (pending, measure) in self.sections {
            collector.set_line(pending.line);
            let style = match pending.style.as_deref() {
                Some(word) => match parse_style(word, header.genre) {
                    Ok(style) => Some(style),
                    Err(error) => {
                        collector.reject(error);
                        continue;
                    }
                },
                None => None,
            };
            sections.push(Section {
                line: pending.line,
                name: pending.name,
                style,
                measure,
            });
        }
        sections.sort_by_key(|s| s.measure);

        let voices: Vec<Voice> = self.voices;
        if voices.iter().all(|v| v.events.is_empty()) {
            collector.set_line(1);
            collector.warning("song has no notes");
        }

        Song {
            header,
            voices,
            tempo_changes: self.tempo_changes,
            meter_changes: self.meter_changes,
            sections,
        }
    }
}

fn out_of_order(what: &str, measure: u16, previous: u16) -> LineError {
    LineError::range(format!(
        "{what} change at measure {measure} must come after the change at measure {previous}"
    ))
}
