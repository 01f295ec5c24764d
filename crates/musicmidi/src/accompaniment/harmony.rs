//! Chord detection over a window of melody notes.
//!
//! Templates are interval bitmasks over the twelve pitch classes.

use serde::{Deserialize, Serialize};

use crate::timing::ResolvedNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    /// A lone root, used when nothing matches
    Single,
}

impl ChordQuality {
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Single => "",
        }
    }

    /// Semitones above the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Single => &[0],
        }
    }
}

struct ChordTemplate {
    quality: ChordQuality,
    intervals: u16,
}

impl ChordTemplate {
    const fn new(quality: ChordQuality, intervals: &[u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self {
            quality,
            intervals: mask,
        }
    }
}

// Seventh chords first so a full seventh is never reported as its triad.
static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new(ChordQuality::Dominant7, &[0, 4, 7, 10]),
    ChordTemplate::new(ChordQuality::Major7, &[0, 4, 7, 11]),
    ChordTemplate::new(ChordQuality::Minor7, &[0, 3, 7, 10]),
    ChordTemplate::new(ChordQuality::HalfDiminished7, &[0, 3, 6, 10]),
    ChordTemplate::new(ChordQuality::Diminished7, &[0, 3, 6, 9]),
    ChordTemplate::new(ChordQuality::Major, &[0, 4, 7]),
    ChordTemplate::new(ChordQuality::Minor, &[0, 3, 7]),
    ChordTemplate::new(ChordQuality::Diminished, &[0, 3, 6]),
    ChordTemplate::new(ChordQuality::Augmented, &[0, 4, 8]),
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A detected chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harmony {
    /// Pitch class of the root, 0 = C
    pub root: u8,
    pub quality: ChordQuality,
}

impl Harmony {
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        Harmony {
            root: root % 12,
            quality,
        }
    }

    pub fn symbol(&self) -> String {
        format!("{}{}", NOTE_NAMES[self.root as usize], self.quality.suffix())
    }

    /// The root as the lowest pitch at or above `floor`
    pub fn root_from(&self, floor: u8) -> u8 {
        let up = (self.root + 12 - floor % 12) % 12;
        floor.saturating_add(up).min(127)
    }

    /// Chord tones stacked upward from the root at or above `floor`
    pub fn tones_from(&self, floor: u8) -> Vec<u8> {
        let root = self.root_from(floor);
        self.quality
            .intervals()
            .iter()
            .map(|i| root.saturating_add(*i).min(127))
            .collect()
    }

    /// Semitones from root to third; a lone root uses the octave
    pub fn third(&self) -> u8 {
        self.quality.intervals().get(1).copied().unwrap_or(12)
    }

    /// Semitones from root to fifth; a lone root uses a plain fifth
    pub fn fifth(&self) -> u8 {
        self.quality.intervals().get(2).copied().unwrap_or(7)
    }
}

/// Finds the harmony of a stretch of melody
pub trait HarmonyAnalyzer: Send + Sync {
    /// `notes` are the melody notes sounding in the window; `downbeat` is the
    /// first tick of the measure being harmonized.
    fn analyze(&self, notes: &[ResolvedNote], downbeat: u32) -> Option<Harmony>;
}

/// Matches pitch-class sets against fixed triad and seventh templates
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAnalyzer;

fn interval_mask(pitch_classes: u16, root: u8) -> u16 {
    (0..12u8)
        .filter(|pc| pitch_classes & (1 << pc) != 0)
        .fold(0u16, |mask, pc| mask | 1 << ((pc + 12 - root) % 12))
}

impl TemplateAnalyzer {
    fn bass(notes: &[ResolvedNote], downbeat: u32) -> Option<u8> {
        notes
            .iter()
            .filter(|n| n.start <= downbeat && downbeat < n.end)
            .map(|n| n.pitch)
            .min()
            .or_else(|| notes.iter().map(|n| n.pitch).min())
    }

    /// Best template for a pitch-class set, trying `bass` as root first
    pub fn match_pitch_classes(pitch_classes: u16, bass: u8) -> Harmony {
        let bass_pc = bass % 12;
        let roots: Vec<u8> = std::iter::once(bass_pc)
            .chain((0..12).filter(|pc| *pc != bass_pc))
            .collect();

        for root in &roots {
            let mask = interval_mask(pitch_classes, *root);
            if let Some(template) = TEMPLATES.iter().find(|t| t.intervals == mask) {
                return Harmony::new(*root, template.quality);
            }
        }

        for root in &roots {
            let mask = interval_mask(pitch_classes, *root);
            if let Some(template) = TEMPLATES
                .iter()
                .find(|t| mask & t.intervals == t.intervals)
            {
                return Harmony::new(*root, template.quality);
            }
        }

        Harmony::new(bass_pc, ChordQuality::Single)
    }
}

impl HarmonyAnalyzer for TemplateAnalyzer {
    fn analyze(&self, notes: &[ResolvedNote], downbeat: u32) -> Option<Harmony> {
        let bass = Self::bass(notes, downbeat)?;
        let pitch_classes = notes
            .iter()
            .fold(0u16, |mask, n| mask | 1 << (n.pitch % 12));
        Some(Self::match_pitch_classes(pitch_classes, bass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Dynamic;

    fn note(pitch: u8, start: u32, end: u32) -> ResolvedNote {
        ResolvedNote {
            pitch,
            start,
            end,
            dynamic: Dynamic::Mf,
            group: 0,
            line: 1,
        }
    }

    fn analyze(pitches: &[u8]) -> Harmony {
        let notes: Vec<ResolvedNote> = pitches
            .iter()
            .enumerate()
            .map(|(i, p)| note(*p, i as u32 * 480, i as u32 * 480 + 480))
            .collect();
        TemplateAnalyzer.analyze(&notes, 0).unwrap()
    }

    #[test]
    fn test_c_major_triad() {
        let harmony = analyze(&[60, 64, 67]);
        assert_eq!(harmony, Harmony::new(0, ChordQuality::Major));
        assert_eq!(harmony.symbol(), "C");
    }

    #[test]
    fn test_d_minor_and_g_seventh() {
        assert_eq!(analyze(&[62, 65, 69]).symbol(), "Dm");
        assert_eq!(analyze(&[67, 71, 74, 77]).symbol(), "G7");
    }

    #[test]
    fn test_bass_root_is_tried_first() {
        // A C E G is both Am7 and C6; the A on the downbeat decides
        assert_eq!(analyze(&[57, 60, 64, 67]).symbol(), "Am7");
    }

    #[test]
    fn test_subset_match_with_passing_tone() {
        // C D E G: no exact template, C major is contained
        let harmony = analyze(&[60, 62, 64, 67]);
        assert_eq!(harmony, Harmony::new(0, ChordQuality::Major));
    }

    #[test]
    fn test_monophonic_fallback() {
        let harmony = analyze(&[62, 64]);
        assert_eq!(harmony, Harmony::new(2, ChordQuality::Single));
        assert_eq!(harmony.tones_from(36), vec![38]);
        assert_eq!(harmony.fifth(), 7);
    }

    #[test]
    fn test_bass_prefers_note_sounding_at_downbeat() {
        let notes = vec![note(67, 0, 960), note(64, 960, 1440), note(60, 1440, 1920)];
        let harmony = TemplateAnalyzer.analyze(&notes, 0).unwrap();
        // exact C major still wins; bass G is only tried first
        assert_eq!(harmony.root, 0);
        assert_eq!(TemplateAnalyzer::bass(&notes, 0), Some(67));
    }

    #[test]
    fn test_empty_window() {
        assert_eq!(TemplateAnalyzer.analyze(&[], 0), None);
    }

    #[test]
    fn test_voicing_from_floor() {
        let harmony = Harmony::new(9, ChordQuality::Minor);
        assert_eq!(harmony.root_from(48), 57);
        assert_eq!(harmony.tones_from(48), vec![57, 60, 64]);
        assert_eq!(Harmony::new(0, ChordQuality::Major).root_from(48), 48);
    }
}
