//! # Error Types
//!
//! This module defines the single error type for the tablature crate.
//!
//! Every failure is a local, deterministic validation or parsing failure: the
//! caller gets it back at the point of detection and decides how to present it.
//!
//! ## Error Types
//! - `InvalidFret` - fret outside 0..=24
//! - `InvalidModifier` - unknown modifier code in a note token
//! - `InvalidNoteToken` - note token without a leading fret number
//! - `InvalidPieceShape` - a piece that is not exactly one string per name
//! - `InvalidStringNumber` - document string number outside 1..6
//! - `MalformedDocument` - missing fields or broken XML in a document
//! - `InvalidStringName`, `InvalidPosition`, `MetadataError` - sparse map and tab-file input
//!
//! ## Usage
//! ```rust
//! use tablature::{decode, TabError};
//!
//! match decode("<score-partwise/>") {
//!     Ok(piece) => println!("{} notes", piece.note_count()),
//!     Err(TabError::MalformedDocument(message)) => eprintln!("bad document: {}", message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TabError {
    /// Fret number outside the playable range.
    ///
    /// # Example
    /// ```
    /// # use tablature::TabError;
    /// let err = TabError::InvalidFret(25);
    /// assert_eq!(err.to_string(), "Invalid fret 25: must be between 0 and 24");
    /// ```
    #[error("Invalid fret {0}: must be between 0 and 24")]
    InvalidFret(i64),

    /// Character that is not one of the eight modifier codes.
    #[error("Invalid modifier '{0}'")]
    InvalidModifier(char),

    /// Note token that does not start with a fret number.
    #[error("Invalid note '{0}': expected a fret number followed by modifiers")]
    InvalidNoteToken(String),

    /// A piece must hold exactly one string for each of E, A, D, G, B and e.
    #[error("Invalid piece: {0}")]
    InvalidPieceShape(String),

    /// Document string number outside 1..6.
    #[error("Invalid string number '{0}': must be between 1 and 6")]
    InvalidStringNumber(String),

    /// Document that is not well-formed XML or lacks a required element.
    ///
    /// # Example
    /// ```
    /// # use tablature::TabError;
    /// let err = TabError::MalformedDocument("note 3 has no fret".to_string());
    /// assert_eq!(err.to_string(), "Malformed document: note 3 has no fret");
    /// ```
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// String label that is not one of E, A, D, G, B, e.
    #[error("Invalid string name '{0}'")]
    InvalidStringName(String),

    /// Time position that is negative, not finite, or off the quarter-beat grid.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Tab-file YAML that fails to parse or carries unsupported values.
    #[error("Invalid metadata: {0}")]
    MetadataError(String),
}
