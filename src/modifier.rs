//! # Modifier Grammar
//!
//! Playing-technique modifiers and their single-character codes.
//!
//! | Modifier | Code |
//! |---|---|
//! | HammerOn | `h` |
//! | PullOff | `p` |
//! | Vibrato | `v` |
//! | Muted | `m` |
//! | Ghost | `g` |
//! | NaturalHarmonic | `n` |
//! | Tap | `t` |
//! | PalmMute | `x` |
//!
//! Codes follow the fret number in a note token, e.g. `7t` or `12hx`.

use crate::error::TabError;
use std::fmt;

/// Playing technique attached to a fretted note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    HammerOn,
    PullOff,
    Vibrato,
    Muted,
    Ghost,
    NaturalHarmonic,
    Tap,
    PalmMute,
}

impl Modifier {
    pub const ALL: [Modifier; 8] = [
        Modifier::HammerOn,
        Modifier::PullOff,
        Modifier::Vibrato,
        Modifier::Muted,
        Modifier::Ghost,
        Modifier::NaturalHarmonic,
        Modifier::Tap,
        Modifier::PalmMute,
    ];

    /// Canonical single-character code
    pub fn code(self) -> char {
        match self {
            Modifier::HammerOn => 'h',
            Modifier::PullOff => 'p',
            Modifier::Vibrato => 'v',
            Modifier::Muted => 'm',
            Modifier::Ghost => 'g',
            Modifier::NaturalHarmonic => 'n',
            Modifier::Tap => 't',
            Modifier::PalmMute => 'x',
        }
    }

    /// Decode a modifier code. Codes are case-sensitive.
    pub fn from_code(c: char) -> Result<Self, TabError> {
        match c {
            'h' => Ok(Modifier::HammerOn),
            'p' => Ok(Modifier::PullOff),
            'v' => Ok(Modifier::Vibrato),
            'm' => Ok(Modifier::Muted),
            'g' => Ok(Modifier::Ghost),
            'n' => Ok(Modifier::NaturalHarmonic),
            't' => Ok(Modifier::Tap),
            'x' => Ok(Modifier::PalmMute),
            other => Err(TabError::InvalidModifier(other)),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<char> for Modifier {
    type Error = TabError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Modifier::from_code(c)
    }
}
