//! # Tone Theory Module
//!
//! Tonic-relative music theory for the movable-tonic staff: tonic selection,
//! pitch-class-to-scale-degree mapping, enharmonic spelling, and the fixed
//! per-offset styling tables the renderer consumes.
//!
//! ## Conventions
//! - Pitch class 0 is C; a `Tonic` is one of 17 named keys (12 pitch classes,
//!   with both spellings for the 5 enharmonic pairs).
//! - An *offset pitch class* is `(pc - tonic_pc + 12) % 12`, so offset 0 is
//!   always the current tonic no matter which tonic is selected.
//! - All styling tables (line styles, palette) are indexed by offset pitch
//!   class, never by absolute pitch class, so the tonic keeps its accent line
//!   and palette entry when the key changes.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The major-scale interval pattern, as offsets above the tonic.
pub const DIATONIC_OFFSETS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// One of the 17 selectable tonics. The enharmonic pairs (C♯/D♭ and friends)
/// are distinct tonics because each carries its own key-signature spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tonic {
    C,
    CSharp,
    DFlat,
    D,
    DSharp,
    EFlat,
    E,
    F,
    FSharp,
    GFlat,
    G,
    GSharp,
    AFlat,
    A,
    ASharp,
    BFlat,
    B,
}

static TONIC_BY_NAME: Lazy<BTreeMap<&'static str, Tonic>> =
    Lazy::new(|| Tonic::ALL.iter().map(|t| (t.name(), *t)).collect());

impl Tonic {
    pub const ALL: [Tonic; 17] = [
        Tonic::C,
        Tonic::CSharp,
        Tonic::DFlat,
        Tonic::D,
        Tonic::DSharp,
        Tonic::EFlat,
        Tonic::E,
        Tonic::F,
        Tonic::FSharp,
        Tonic::GFlat,
        Tonic::G,
        Tonic::GSharp,
        Tonic::AFlat,
        Tonic::A,
        Tonic::ASharp,
        Tonic::BFlat,
        Tonic::B,
    ];

    /// Semitones above C, 0..=11.
    pub fn pitch_class(self) -> u8 {
        match self {
            Tonic::C => 0,
            Tonic::CSharp | Tonic::DFlat => 1,
            Tonic::D => 2,
            Tonic::DSharp | Tonic::EFlat => 3,
            Tonic::E => 4,
            Tonic::F => 5,
            Tonic::FSharp | Tonic::GFlat => 6,
            Tonic::G => 7,
            Tonic::GSharp | Tonic::AFlat => 8,
            Tonic::A => 9,
            Tonic::ASharp | Tonic::BFlat => 10,
            Tonic::B => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tonic::C => "C",
            Tonic::CSharp => "C♯",
            Tonic::DFlat => "D♭",
            Tonic::D => "D",
            Tonic::DSharp => "D♯",
            Tonic::EFlat => "E♭",
            Tonic::E => "E",
            Tonic::F => "F",
            Tonic::FSharp => "F♯",
            Tonic::GFlat => "G♭",
            Tonic::G => "G",
            Tonic::GSharp => "G♯",
            Tonic::AFlat => "A♭",
            Tonic::A => "A",
            Tonic::ASharp => "A♯",
            Tonic::BFlat => "B♭",
            Tonic::B => "B",
        }
    }

    /// Looks a tonic up by its display name (e.g. "G♭"), as stored in the
    /// settings file.
    pub fn from_name(name: &str) -> Option<Tonic> {
        TONIC_BY_NAME.get(name).copied()
    }

    /// The canonical key-signature spelling of an in-scale pitch class, or
    /// `None` when the pitch class is not in this tonic's major scale.
    ///
    /// Every tonic spells each of its 7 scale members exactly one way; the
    /// theoretical sharp keys keep their double-sharp-avoiding spellings from
    /// the source tables (e.g. C♯ major spells pitch class 0 as "B♯").
    pub fn scale_spelling(self, pc: u8) -> Option<&'static str> {
        let name = match self {
            Tonic::C => match pc {
                0 => "C",
                2 => "D",
                4 => "E",
                5 => "F",
                7 => "G",
                9 => "A",
                11 => "B",
                _ => return None,
            },
            Tonic::CSharp => match pc {
                1 => "C♯",
                3 => "D♯",
                5 => "E♯",
                6 => "F♯",
                8 => "G♯",
                10 => "A♯",
                0 => "B♯",
                _ => return None,
            },
            Tonic::DFlat => match pc {
                1 => "D♭",
                3 => "E♭",
                5 => "F",
                6 => "G♭",
                8 => "A♭",
                10 => "B♭",
                0 => "C",
                _ => return None,
            },
            Tonic::D => match pc {
                2 => "D",
                4 => "E",
                6 => "F♯",
                7 => "G",
                9 => "A",
                11 => "B",
                1 => "C♯",
                _ => return None,
            },
            Tonic::DSharp => match pc {
                3 => "D♯",
                5 => "E♯",
                7 => "G",
                8 => "G♯",
                10 => "A♯",
                0 => "B♯",
                2 => "D",
                _ => return None,
            },
            Tonic::EFlat => match pc {
                3 => "E♭",
                5 => "F",
                7 => "G",
                8 => "A♭",
                10 => "B♭",
                0 => "C",
                2 => "D",
                _ => return None,
            },
            Tonic::E => match pc {
                4 => "E",
                6 => "F♯",
                8 => "G♯",
                9 => "A",
                11 => "B",
                1 => "C♯",
                3 => "D♯",
                _ => return None,
            },
            Tonic::F => match pc {
                5 => "F",
                7 => "G",
                9 => "A",
                10 => "B♭",
                0 => "C",
                2 => "D",
                4 => "E",
                _ => return None,
            },
            Tonic::FSharp => match pc {
                6 => "F♯",
                8 => "G♯",
                10 => "A♯",
                11 => "B",
                1 => "C♯",
                3 => "D♯",
                5 => "E♯",
                _ => return None,
            },
            Tonic::GFlat => match pc {
                6 => "G♭",
                8 => "A♭",
                10 => "B♭",
                11 => "C♭",
                1 => "D♭",
                3 => "E♭",
                5 => "F",
                _ => return None,
            },
            Tonic::G => match pc {
                7 => "G",
                9 => "A",
                11 => "B",
                0 => "C",
                2 => "D",
                4 => "E",
                6 => "F♯",
                _ => return None,
            },
            Tonic::GSharp => match pc {
                8 => "G♯",
                10 => "A♯",
                0 => "B♯",
                1 => "C♯",
                3 => "D♯",
                5 => "E♯",
                7 => "G",
                _ => return None,
            },
            Tonic::AFlat => match pc {
                8 => "A♭",
                10 => "B♭",
                0 => "C",
                1 => "D♭",
                3 => "E♭",
                5 => "F",
                7 => "G",
                _ => return None,
            },
            Tonic::A => match pc {
                9 => "A",
                11 => "B",
                1 => "C♯",
                2 => "D",
                4 => "E",
                6 => "F♯",
                8 => "G♯",
                _ => return None,
            },
            Tonic::ASharp => match pc {
                10 => "A♯",
                0 => "B♯",
                2 => "D",
                3 => "D♯",
                5 => "E♯",
                7 => "G",
                9 => "A",
                _ => return None,
            },
            Tonic::BFlat => match pc {
                10 => "B♭",
                0 => "C",
                2 => "D",
                3 => "E♭",
                5 => "F",
                7 => "G",
                9 => "A",
                _ => return None,
            },
            Tonic::B => match pc {
                11 => "B",
                1 => "C♯",
                3 => "D♯",
                4 => "E",
                6 => "F♯",
                8 => "G♯",
                10 => "A♯",
                _ => return None,
            },
        };
        Some(name)
    }
}

impl fmt::Display for Tonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How out-of-scale pitches are spelled when accidentals are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnharmonicPreference {
    Sharps,
    Flats,
    /// Slash-joined dual names, e.g. "C♯/D♭".
    Both,
}

impl fmt::Display for EnharmonicPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnharmonicPreference::Sharps => "Sharps",
            EnharmonicPreference::Flats => "Flats",
            EnharmonicPreference::Both => "Both",
        })
    }
}

impl EnharmonicPreference {
    pub const ALL: [EnharmonicPreference; 3] = [
        EnharmonicPreference::Sharps,
        EnharmonicPreference::Flats,
        EnharmonicPreference::Both,
    ];
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

const FLAT_NAMES: [&str; 12] = [
    "C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B",
];

const DUAL_NAMES: [&str; 12] = [
    "C",
    "C♯/D♭",
    "D",
    "D♯/E♭",
    "E",
    "F",
    "F♯/G♭",
    "G",
    "G♯/A♭",
    "A",
    "A♯/B♭",
    "B",
];

/// Scale-degree labels indexed by offset pitch class. Diatonic offsets get a
/// plain degree, chromatic offsets a dual sharp/flat degree.
const DEGREE_LABELS: [&str; 12] = [
    "1", "#1 / b2", "2", "#2 / b3", "3", "4", "#4 / b5", "5", "#5 / b6", "6", "#6 / b7", "7",
];

/// An opaque sRGB triple handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The fixed 12-entry label palette, indexed by offset pitch class so the
/// tonic always gets the same hue regardless of key.
const PALETTE: [Rgb; 12] = [
    Rgb { r: 240, g: 144, b: 174 }, // offset 0, tonic
    Rgb { r: 245, g: 147, b: 131 },
    Rgb { r: 234, g: 158, b: 94 },
    Rgb { r: 208, g: 174, b: 78 },
    Rgb { r: 168, g: 189, b: 97 },
    Rgb { r: 118, g: 199, b: 136 },
    Rgb { r: 65, g: 203, b: 181 },
    Rgb { r: 51, g: 198, b: 220 }, // offset 7, fifth
    Rgb { r: 98, g: 187, b: 247 },
    Rgb { r: 148, g: 173, b: 255 },
    Rgb { r: 190, g: 160, b: 243 },
    Rgb { r: 221, g: 149, b: 214 },
];

/// Horizontal grid-line styling for one offset pitch class.
///
/// A tagged variant rather than a nullable style object: the renderer either
/// draws nothing, strokes a line, or fills a band behind the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineStyle {
    None,
    Line {
        color: Rgb,
        width: f32,
        dash: Option<[f32; 2]>,
    },
    Band,
}

/// The fixed, tonic-invariant per-offset line-style table.
///
/// Offset 0 (the tonic) gets a red accent line, offset 7 (the fifth) a filled
/// band, the remaining diatonic offsets a plain or dashed line, and chromatic
/// offsets no line at all. This is data, not logic; alternate skins can swap
/// the table wholesale.
pub fn line_style(offset_pc: u8) -> LineStyle {
    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    match offset_pc {
        0 => LineStyle::Line {
            color: RED,
            width: 2.0,
            dash: None,
        },
        4 => LineStyle::Line {
            color: BLACK,
            width: 1.0,
            dash: Some([5.0, 5.0]),
        },
        2 | 5 | 9 | 11 => LineStyle::Line {
            color: BLACK,
            width: 1.0,
            dash: None,
        },
        7 => LineStyle::Band,
        _ => LineStyle::None,
    }
}

/// Palette color for an offset pitch class.
pub fn color(offset_pc: u8) -> Rgb {
    PALETTE[(offset_pc % 12) as usize]
}

fn lerp_rgb(a: Rgb, b: Rgb, factor: f32) -> Rgb {
    let mix = |x: u8, y: u8| (x as f32 + factor * (y as f32 - x as f32)).round() as u8;
    Rgb {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
    }
}

/// The theory engine: current tonic plus the display toggles.
///
/// All derived values (labels, colors, scale membership) are computed on
/// demand from the raw pitch, so replacing the tonic is a plain state
/// mutation with nothing to invalidate.
#[derive(Debug, Clone)]
pub struct TheoryEngine {
    tonic: Tonic,
    pub use_scale_degrees: bool,
    pub show_accidentals: bool,
    pub enharmonic_preference: EnharmonicPreference,
}

impl Default for TheoryEngine {
    fn default() -> Self {
        Self {
            tonic: Tonic::C,
            use_scale_degrees: false,
            show_accidentals: false,
            enharmonic_preference: EnharmonicPreference::Both,
        }
    }
}

impl TheoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tonic(&self) -> Tonic {
        self.tonic
    }

    pub fn set_tonic(&mut self, tonic: Tonic) {
        self.tonic = tonic;
    }

    /// Semitones above the current tonic, 0..=11. Offset 0 is the tonic.
    pub fn offset_pitch_class(&self, midi: i32) -> u8 {
        let pc = midi.rem_euclid(12) as u8;
        (pc + 12 - self.tonic.pitch_class()) % 12
    }

    /// True when the absolute pitch class belongs to the current tonic's
    /// major scale.
    pub fn is_diatonic(&self, pc: u8) -> bool {
        let offset = (pc + 12 - self.tonic.pitch_class()) % 12;
        DIATONIC_OFFSETS.contains(&offset)
    }

    /// The label drawn next to a grid note, or `None` when the note is not
    /// labelled (out-of-scale with accidentals hidden).
    ///
    /// In degree mode, diatonic notes show "1".."7" and chromatic notes show
    /// a dual degree like "#4 / b5"; in name mode, in-scale notes use the
    /// tonic's canonical key-signature spelling and out-of-scale notes use
    /// the enharmonic preference.
    pub fn label(&self, midi: i32) -> Option<&'static str> {
        let pc = midi.rem_euclid(12) as u8;
        if self.use_scale_degrees {
            let offset = self.offset_pitch_class(midi);
            if self.is_diatonic(pc) || self.show_accidentals {
                Some(DEGREE_LABELS[offset as usize])
            } else {
                None
            }
        } else if let Some(spelling) = self.tonic.scale_spelling(pc) {
            Some(spelling)
        } else if self.show_accidentals {
            let names = match self.enharmonic_preference {
                EnharmonicPreference::Sharps => &SHARP_NAMES,
                EnharmonicPreference::Flats => &FLAT_NAMES,
                EnharmonicPreference::Both => &DUAL_NAMES,
            };
            Some(names[pc as usize])
        } else {
            None
        }
    }

    /// Palette color for a fractional MIDI pitch, interpolated between the
    /// adjacent offset pitch classes for cents-smooth coloring.
    pub fn color_for_pitch(&self, midi: f32) -> Rgb {
        let floor = midi.floor();
        let fraction = midi - floor;
        let base = self.offset_pitch_class(floor as i32);
        let next = (base + 1) % 12;
        lerp_rgb(color(base), color(next), fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonic_offset_is_always_zero() {
        for tonic in Tonic::ALL {
            let mut engine = TheoryEngine::new();
            engine.set_tonic(tonic);
            let midi = 60 + tonic.pitch_class() as i32;
            assert_eq!(engine.offset_pitch_class(midi), 0, "tonic {}", tonic);
        }
    }

    #[test]
    fn every_tonic_has_seven_diatonic_pitch_classes() {
        for tonic in Tonic::ALL {
            let mut engine = TheoryEngine::new();
            engine.set_tonic(tonic);
            let count = (0..12u8).filter(|&pc| engine.is_diatonic(pc)).count();
            assert_eq!(count, 7, "tonic {}", tonic);
        }
    }

    #[test]
    fn spellings_cover_exactly_the_scale() {
        for tonic in Tonic::ALL {
            let mut engine = TheoryEngine::new();
            engine.set_tonic(tonic);
            for pc in 0..12u8 {
                assert_eq!(
                    tonic.scale_spelling(pc).is_some(),
                    engine.is_diatonic(pc),
                    "tonic {} pc {}",
                    tonic,
                    pc
                );
            }
        }
    }

    #[test]
    fn enharmonic_tonics_spell_differently() {
        // Pitch class 0 is "C" in D-flat major but "B♯" in C-sharp major.
        assert_eq!(Tonic::DFlat.scale_spelling(0), Some("C"));
        assert_eq!(Tonic::CSharp.scale_spelling(0), Some("B♯"));
        // G-flat major is the one key with a C♭.
        assert_eq!(Tonic::GFlat.scale_spelling(11), Some("C♭"));
    }

    #[test]
    fn labels_follow_toggles() {
        let mut engine = TheoryEngine::new();
        engine.set_tonic(Tonic::G);

        // Name mode: F natural (pc 5) is out of scale in G major.
        assert_eq!(engine.label(65), None);
        engine.show_accidentals = true;
        assert_eq!(engine.label(65), Some("F"));
        engine.enharmonic_preference = EnharmonicPreference::Both;
        assert_eq!(engine.label(66), Some("F♯")); // in scale, spelled from the key
        assert_eq!(engine.label(63), Some("D♯/E♭")); // out of scale, dual name

        // Degree mode: the tonic is "1", the fifth is "5".
        engine.use_scale_degrees = true;
        assert_eq!(engine.label(67), Some("1"));
        assert_eq!(engine.label(74), Some("5"));
        engine.show_accidentals = false;
        assert_eq!(engine.label(68), None); // chromatic degree hidden
    }

    #[test]
    fn line_style_table() {
        assert_eq!(
            line_style(0),
            LineStyle::Line {
                color: Rgb { r: 255, g: 0, b: 0 },
                width: 2.0,
                dash: None
            }
        );
        assert_eq!(line_style(7), LineStyle::Band);
        assert_eq!(
            line_style(4),
            LineStyle::Line {
                color: Rgb { r: 0, g: 0, b: 0 },
                width: 1.0,
                dash: Some([5.0, 5.0])
            }
        );
        // Every diatonic offset gets some line; every chromatic offset none.
        for offset in DIATONIC_OFFSETS {
            assert!(
                matches!(line_style(offset), LineStyle::Line { .. } | LineStyle::Band),
                "diatonic offset {} has no line",
                offset
            );
        }
        for offset in [1u8, 3, 6, 8, 10] {
            assert_eq!(line_style(offset), LineStyle::None);
        }
    }

    #[test]
    fn palette_is_tonic_relative() {
        // The tonic's own pitch maps to palette entry 0 in every key.
        for tonic in Tonic::ALL {
            let mut engine = TheoryEngine::new();
            engine.set_tonic(tonic);
            let midi = 60 + tonic.pitch_class() as i32;
            assert_eq!(engine.color_for_pitch(midi as f32), color(0));
        }
    }

    #[test]
    fn tonic_round_trips_through_name() {
        for tonic in Tonic::ALL {
            assert_eq!(Tonic::from_name(tonic.name()), Some(tonic));
        }
        assert_eq!(Tonic::from_name("H"), None);
    }
}
