//! Standard MIDI File output for resolved songs.
//!
//! A song with one voice is written as format 0, with conductor events and
//! notes in one track. More voices give format 1: a conductor track followed
//! by one track per voice. The emitted time signature is always 4/4, matching
//! the internal tick grid; the written one is kept in a text event.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{Dynamic, Instrument, Mode};
use crate::error::MappingError;
use crate::timing::{ResolvedSong, ResolvedVoice, TICKS_PER_MEASURE, TICKS_PER_QUARTER};

/// General MIDI percussion channel (zero-based)
pub const PERCUSSION_CHANNEL: u8 = 9;

const MAX_TEMPO: u64 = 0xFF_FFFF;

/// General MIDI program for an instrument
pub fn general_midi_program(instrument: Instrument) -> u8 {
    match instrument {
        Instrument::Piano => 0,
        Instrument::Harpsichord => 6,
        Instrument::Organ => 19,
        Instrument::AcousticGuitar => 24,
        Instrument::ElectricGuitar => 27,
        Instrument::OverdrivenGuitar => 29,
        Instrument::AcousticBass => 32,
        Instrument::ElectricBass => 33,
        Instrument::Strings => 48,
        Instrument::Drums => 0,
    }
}

/// Dynamic to velocity mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VelocityTable {
    velocities: BTreeMap<Dynamic, u8>,
}

impl Default for VelocityTable {
    fn default() -> Self {
        VelocityTable {
            velocities: Dynamic::ALL
                .into_iter()
                .map(|d| (d, d.default_velocity()))
                .collect(),
        }
    }
}

impl VelocityTable {
    /// A table with only the given entries
    pub fn new(velocities: impl IntoIterator<Item = (Dynamic, u8)>) -> Self {
        VelocityTable {
            velocities: velocities.into_iter().collect(),
        }
    }

    pub fn set(&mut self, dynamic: Dynamic, velocity: u8) {
        self.velocities.insert(dynamic, velocity);
    }

    pub fn velocity(&self, dynamic: Dynamic) -> Result<u8, MappingError> {
        match self.velocities.get(&dynamic) {
            None => Err(MappingError::MissingVelocity(dynamic)),
            Some(&velocity) if velocity > 127 => {
                Err(MappingError::VelocityRange { dynamic, velocity })
            }
            Some(&velocity) => Ok(velocity),
        }
    }
}

/// Instrument to program mapping, falling back to General MIDI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramTable {
    overrides: BTreeMap<Instrument, u8>,
}

impl ProgramTable {
    pub fn set(&mut self, instrument: Instrument, program: u8) {
        self.overrides.insert(instrument, program);
    }

    pub fn program(&self, instrument: Instrument) -> Result<u8, MappingError> {
        let program = self
            .overrides
            .get(&instrument)
            .copied()
            .unwrap_or_else(|| general_midi_program(instrument));
        if program > 127 {
            return Err(MappingError::ProgramRange {
                instrument,
                program,
            });
        }
        Ok(program)
    }
}

/// Parameters for MIDI generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiParams {
    pub velocities: VelocityTable,
    pub programs: ProgramTable,
}

/// Events at one tick are written meta first, then program changes, then
/// note-offs before note-ons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventOrder {
    Meta,
    Program,
    NoteOff,
    NoteOn,
}

struct MidiEvent {
    tick: u32,
    order: EventOrder,
    data: Vec<u8>,
}

struct MidiWriter {
    events: Vec<MidiEvent>,
}

impl MidiWriter {
    fn new() -> Self {
        MidiWriter { events: Vec::new() }
    }

    fn tempo(&mut self, tick: u32, us_per_quarter: u64) -> Result<(), MappingError> {
        if us_per_quarter == 0 || us_per_quarter > MAX_TEMPO {
            return Err(MappingError::TempoRange { us_per_quarter });
        }
        self.meta_event(
            tick,
            0x51,
            vec![
                ((us_per_quarter >> 16) & 0xFF) as u8,
                ((us_per_quarter >> 8) & 0xFF) as u8,
                (us_per_quarter & 0xFF) as u8,
            ],
        );
        Ok(())
    }

    /// 4/4, 24 clocks per click, 8 thirty-seconds per quarter
    fn common_time(&mut self, tick: u32) {
        self.meta_event(tick, 0x58, vec![4, 2, 24, 8]);
    }

    fn key_signature(&mut self, fifths: i8, mode: Mode) {
        let minor = u8::from(mode == Mode::Minor);
        self.meta_event(0, 0x59, vec![fifths as u8, minor]);
    }

    fn text(&mut self, tick: u32, event_type: u8, text: &str) {
        self.meta_event(tick, event_type, text.as_bytes().to_vec());
    }

    fn note_on(&mut self, tick: u32, channel: u8, pitch: u8, velocity: u8) {
        self.channel_event(tick, EventOrder::NoteOn, vec![0x90 | channel, pitch, velocity]);
    }

    fn note_off(&mut self, tick: u32, channel: u8, pitch: u8) {
        self.channel_event(tick, EventOrder::NoteOff, vec![0x80 | channel, pitch, 0]);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.channel_event(0, EventOrder::Program, vec![0xC0 | channel, program & 0x7F]);
    }

    fn meta_event(&mut self, tick: u32, event_type: u8, data: Vec<u8>) {
        let mut event_data = vec![0xFF, event_type];
        event_data.extend(encode_variable_length(data.len() as u32));
        event_data.extend(data);
        self.events.push(MidiEvent {
            tick,
            order: EventOrder::Meta,
            data: event_data,
        });
    }

    fn channel_event(&mut self, tick: u32, order: EventOrder, data: Vec<u8>) {
        self.events.push(MidiEvent { tick, order, data });
    }

    /// Encode as track data with end of track no earlier than `end`
    fn encode_track(mut self, end: u32) -> Vec<u8> {
        self.events.sort_by_key(|e| (e.tick, e.order));

        let mut out = Vec::new();
        let mut last_tick = 0u32;
        for event in &self.events {
            let delta = event.tick.saturating_sub(last_tick);
            out.extend(encode_variable_length(delta));
            out.extend(&event.data);
            last_tick = event.tick;
        }

        out.extend(encode_variable_length(end.saturating_sub(last_tick)));
        out.extend(&[0xFF, 0x2F, 0x00]);
        out
    }
}

/// Channel per voice in order, skipping the percussion channel
fn assign_channels<'a>(
    voices: impl IntoIterator<Item = &'a ResolvedVoice>,
) -> Result<Vec<u8>, MappingError> {
    let mut next = 0u8;
    let mut channels = Vec::new();
    for voice in voices {
        if voice.instrument.is_percussion() {
            channels.push(PERCUSSION_CHANNEL);
            continue;
        }
        if next == PERCUSSION_CHANNEL {
            next += 1;
        }
        if next > 15 {
            return Err(MappingError::NoFreeChannel(voice.name.clone()));
        }
        channels.push(next);
        next += 1;
    }
    Ok(channels)
}

fn write_conductor(writer: &mut MidiWriter, song: &ResolvedSong) -> Result<(), MappingError> {
    if !song.title.is_empty() {
        writer.text(0, 0x03, &song.title);
    }
    if let Some(key) = song.key {
        if let Some(fifths) = key.signature() {
            writer.key_signature(fifths, key.mode);
        }
    }
    for point in &song.tempo_map {
        writer.tempo(point.tick, point.us_per_quarter)?;
        writer.common_time(point.tick);
        writer.text(
            point.tick,
            0x01,
            &format!("time signature {}", point.time_signature),
        );
    }
    for section in &song.sections {
        let tick = (section.measure as u32).saturating_sub(1) * TICKS_PER_MEASURE;
        writer.text(tick, 0x06, &section.name);
    }
    Ok(())
}

fn write_voice(
    writer: &mut MidiWriter,
    voice: &ResolvedVoice,
    channel: u8,
    params: &MidiParams,
    named: bool,
) -> Result<(), MappingError> {
    if named {
        writer.text(0, 0x03, &voice.name);
    }
    writer.program_change(channel, params.programs.program(voice.instrument)?);
    for note in &voice.notes {
        let velocity = params.velocities.velocity(note.dynamic)?;
        writer.note_on(note.start, channel, note.pitch, velocity);
        writer.note_off(note.end, channel, note.pitch);
    }
    Ok(())
}

/// Serialize a resolved song plus extra (accompaniment) voices.
pub fn build(
    song: &ResolvedSong,
    accompaniment: &[ResolvedVoice],
    params: &MidiParams,
) -> Result<Vec<u8>, MappingError> {
    let voices: Vec<&ResolvedVoice> = song.voices.iter().chain(accompaniment).collect();
    let channels = assign_channels(voices.iter().copied())?;

    let end = voices
        .iter()
        .flat_map(|v| v.notes.iter().map(|n| n.end))
        .max()
        .unwrap_or(0)
        .max(song.end);

    let mut tracks = Vec::new();
    let format = if voices.len() <= 1 {
        let mut writer = MidiWriter::new();
        write_conductor(&mut writer, song)?;
        if let (Some(voice), Some(channel)) = (voices.first(), channels.first()) {
            write_voice(&mut writer, voice, *channel, params, false)?;
        }
        tracks.push(writer.encode_track(end));
        0u16
    } else {
        let mut conductor = MidiWriter::new();
        write_conductor(&mut conductor, song)?;
        tracks.push(conductor.encode_track(end));
        for (voice, channel) in voices.iter().zip(&channels) {
            let mut writer = MidiWriter::new();
            write_voice(&mut writer, voice, *channel, params, true)?;
            tracks.push(writer.encode_track(end));
        }
        1u16
    };

    debug!(format, tracks = tracks.len(), end, "encoded midi");
    Ok(write_file(format, &tracks))
}

fn write_file(format: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&(TICKS_PER_QUARTER as u16).to_be_bytes());

    for track_data in tracks {
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
        out.extend_from_slice(track_data);
    }

    out
}

/// Encode a value as MIDI variable-length quantity
fn encode_variable_length(mut value: u32) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }

    let mut bytes = Vec::new();
    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push(((value & 0x7F) | 0x80) as u8);
        value >>= 7;
    }

    bytes.reverse();
    bytes
}
