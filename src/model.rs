//! # Tablature Model
//!
//! In-memory representation of a six-string guitar piece.
//!
//! ## Type Hierarchy
//! ```text
//! Piece
//!   └── [GuitarString; 6]   (one per StringName, E A D G B e)
//!         ├── name: StringName
//!         └── events: BTreeMap<Tick, Note>
//!               └── Note
//!                     ├── fret: 0..=24
//!                     └── modifiers: Vec<Modifier>
//! ```
//!
//! ## Key Concepts
//!
//! ### Tick
//! Time positions are fixed-point quarter-beats: `Tick::new(1)` is beat 0.25,
//! `Tick::new(16)` is beat 4. Equality is integer equality, so walking the grid
//! never drifts.
//!
//! ### Piece shape
//! A `Piece` stores its strings in a fixed array indexed by `StringName`, so
//! "exactly six strings, one per name" holds by construction. `Piece::new`
//! validates caller-supplied strings into that array; after that every edit
//! goes through `with_string`, which returns a new piece and shares the
//! unchanged strings.
//!
//! ## Related Modules
//! - `modifier` - modifier codes used by `parse_note`
//! - `musicxml` - writes a `Piece` as a document
//! - `parser` - reads a document back into a `Piece`

use crate::error::TabError;
use crate::modifier::Modifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Highest playable fret
pub const MAX_FRET: u8 = 24;

/// Number of strings on the instrument
pub const STRING_COUNT: usize = 6;

/// Grid resolution: ticks per beat
pub const TICKS_PER_BEAT: u32 = 4;

/// Latest beat a note may be placed on.
///
/// The encoder writes one element per quarter-beat up to the last note, so
/// positions are capped to keep a document bounded (about 262k elements).
pub const MAX_BEATS: u32 = 65_536;

/// Quarter-beat time position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Latest valid position, beat `MAX_BEATS`
    pub const MAX: Tick = Tick(MAX_BEATS * TICKS_PER_BEAT);

    /// Tick from a count of quarter-beat steps.
    ///
    /// Unchecked; `from_beats` and the decoder keep positions at or before
    /// `Tick::MAX`.
    pub const fn new(steps: u32) -> Self {
        Tick(steps)
    }

    /// Tick from a beat number such as `4.0` or `6.25`.
    ///
    /// Rejects negative, non-finite and off-grid values, and beats past
    /// `MAX_BEATS`.
    pub fn from_beats(beats: f64) -> Result<Self, TabError> {
        if !beats.is_finite() || beats < 0.0 {
            return Err(TabError::InvalidPosition(format!(
                "{} is not a non-negative beat number",
                beats
            )));
        }
        let steps = beats * TICKS_PER_BEAT as f64;
        if steps.fract() != 0.0 {
            return Err(TabError::InvalidPosition(format!(
                "beat {} is not on the quarter-beat grid",
                beats
            )));
        }
        if steps > Tick::MAX.0 as f64 {
            return Err(TabError::InvalidPosition(format!(
                "beat {} is past the last supported beat {}",
                beats, MAX_BEATS
            )));
        }
        Ok(Tick(steps as u32))
    }

    pub fn steps(self) -> u32 {
        self.0
    }

    /// Beat number; exact for every tick since the grid is a power of two
    pub fn beats(self) -> f64 {
        self.0 as f64 / TICKS_PER_BEAT as f64
    }

    pub fn next(self) -> Tick {
        self.offset(1)
    }

    pub fn offset(self, steps: u32) -> Tick {
        Tick(self.0.saturating_add(steps))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.beats())
    }
}

/// The six strings in pitch order, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StringName {
    E,
    A,
    D,
    G,
    B,
    #[serde(rename = "e")]
    HighE,
}

impl StringName {
    /// Canonical iteration order
    pub const ALL: [StringName; STRING_COUNT] = [
        StringName::E,
        StringName::A,
        StringName::D,
        StringName::G,
        StringName::B,
        StringName::HighE,
    ];

    /// Position in `ALL`, 0 for low E
    pub fn index(self) -> usize {
        match self {
            StringName::E => 0,
            StringName::A => 1,
            StringName::D => 2,
            StringName::G => 3,
            StringName::B => 4,
            StringName::HighE => 5,
        }
    }

    /// Document string number, 1 for low E through 6 for high e
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(number: i64) -> Result<Self, TabError> {
        match number {
            1 => Ok(StringName::E),
            2 => Ok(StringName::A),
            3 => Ok(StringName::D),
            4 => Ok(StringName::G),
            5 => Ok(StringName::B),
            6 => Ok(StringName::HighE),
            other => Err(TabError::InvalidStringNumber(other.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StringName::E => "E",
            StringName::A => "A",
            StringName::D => "D",
            StringName::G => "G",
            StringName::B => "B",
            StringName::HighE => "e",
        }
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StringName {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StringName::ALL
            .into_iter()
            .find(|name| name.label() == s)
            .ok_or_else(|| TabError::InvalidStringName(s.to_string()))
    }
}

/// A fretted note with its playing techniques
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Note {
    fret: u8,
    modifiers: Vec<Modifier>,
}

impl Note {
    /// Create a note. Modifier order and duplicates are kept as given.
    pub fn new(fret: i64, modifiers: Vec<Modifier>) -> Result<Self, TabError> {
        if !(0..=MAX_FRET as i64).contains(&fret) {
            return Err(TabError::InvalidFret(fret));
        }
        Ok(Note {
            fret: fret as u8,
            modifiers,
        })
    }

    /// Note without modifiers
    pub fn plain(fret: i64) -> Result<Self, TabError> {
        Note::new(fret, Vec::new())
    }

    pub fn fret(&self) -> u8 {
        self.fret
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}

/// Writes the compact token form, e.g. `12hx`
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fret)?;
        for modifier in &self.modifiers {
            write!(f, "{}", modifier.code())?;
        }
        Ok(())
    }
}

impl FromStr for Note {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_note(s)
    }
}

/// Parse a note token such as `7t` or `12hpgvmtxn`.
///
/// The leading run of digits is the fret; every following character is one
/// modifier code, kept in order. Only single notes are supported, so bends with
/// releases and similar compound techniques have no token form.
pub fn parse_note(token: &str) -> Result<Note, TabError> {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, codes) = token.split_at(digits_end);

    if digits.is_empty() {
        return Err(TabError::InvalidNoteToken(token.to_string()));
    }

    // Only overflow can fail here, and anything that large is off the fretboard
    let fret = digits.parse::<i64>().map_err(|_| TabError::InvalidFret(i64::MAX))?;
    let modifiers = codes
        .chars()
        .map(Modifier::from_code)
        .collect::<Result<Vec<_>, _>>()?;

    Note::new(fret, modifiers)
}

/// One string and its notes, keyed by time position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuitarString {
    name: StringName,
    events: BTreeMap<Tick, Note>,
}

impl GuitarString {
    pub fn new(name: StringName) -> Self {
        GuitarString {
            name,
            events: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> StringName {
        self.name
    }

    /// Insert a note, replacing any note already at `tick`
    pub fn add_note(&mut self, note: Note, tick: Tick) {
        self.events.insert(tick, note);
    }

    /// Read-only view of the notes in tick order
    pub fn events(&self) -> &BTreeMap<Tick, Note> {
        &self.events
    }

    pub fn note_at(&self, tick: Tick) -> Option<&Note> {
        self.events.get(&tick)
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.events.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A six-string piece
///
/// Strings are shared between a piece and the pieces derived from it with
/// `with_string`; a piece is never modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    strings: [Arc<GuitarString>; STRING_COUNT],
}

impl Piece {
    /// Build a piece from exactly six strings, one for each name, in any order
    pub fn new(strings: Vec<GuitarString>) -> Result<Self, TabError> {
        if strings.len() != STRING_COUNT {
            return Err(TabError::InvalidPieceShape(format!(
                "expected {} strings, got {}",
                STRING_COUNT,
                strings.len()
            )));
        }

        let mut slots: [Option<Arc<GuitarString>>; STRING_COUNT] = Default::default();
        for string in strings {
            let slot = &mut slots[string.name().index()];
            if slot.is_some() {
                return Err(TabError::InvalidPieceShape(format!(
                    "string {} appears more than once",
                    string.name()
                )));
            }
            *slot = Some(Arc::new(string));
        }

        let mut filled = Vec::with_capacity(STRING_COUNT);
        for (name, slot) in StringName::ALL.into_iter().zip(slots) {
            match slot {
                Some(string) => filled.push(string),
                None => {
                    return Err(TabError::InvalidPieceShape(format!("string {} is missing", name)))
                }
            }
        }

        let strings = filled
            .try_into()
            .map_err(|_| TabError::InvalidPieceShape("wrong number of strings".to_string()))?;
        Ok(Piece { strings })
    }

    /// Six empty strings
    pub fn standard() -> Self {
        Piece {
            strings: StringName::ALL.map(|name| Arc::new(GuitarString::new(name))),
        }
    }

    /// New piece with the string named `updated.name()` replaced
    pub fn with_string(&self, updated: GuitarString) -> Piece {
        let mut strings = self.strings.clone();
        let index = updated.name().index();
        strings[index] = Arc::new(updated);
        Piece { strings }
    }

    /// New piece with `note` placed on string `name` at `tick`
    pub fn add_note(&self, name: StringName, note: Note, tick: Tick) -> Piece {
        let mut string = self.string(name).clone();
        string.add_note(note, tick);
        self.with_string(string)
    }

    pub fn string(&self, name: StringName) -> &GuitarString {
        &self.strings[name.index()]
    }

    /// The six strings in E, A, D, G, B, e order
    pub fn strings(&self) -> impl ExactSizeIterator<Item = &GuitarString> + '_ {
        self.strings.iter().map(|string| &**string)
    }

    /// Latest occupied tick on any string
    pub fn last_tick(&self) -> Option<Tick> {
        self.strings().filter_map(GuitarString::last_tick).max()
    }

    pub fn note_count(&self) -> usize {
        self.strings().map(GuitarString::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.strings().all(GuitarString::is_empty)
    }
}

impl Default for Piece {
    fn default() -> Self {
        Piece::standard()
    }
}
