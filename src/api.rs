//! # Public API
//!
//! Entry points for callers that only exchange plain data with the crate.
//!
//! ## Document Functions
//!
//! - [`encode()`] - Piece to MusicXML, interleaved layout
//! - [`encode_with_options()`] - Piece to MusicXML with explicit layout and metadata
//! - [`decode()`] - MusicXML to Piece
//! - [`decode_document()`] - MusicXML to Piece plus title and author
//!
//! ## Sparse Data Functions
//!
//! - [`piece_from_sparse_map()`] - `{string: [(token, beat)]}` to Piece
//! - [`piece_to_sparse_map()`] - Piece to `{string: [(token, beat)]}`
//!
//! ## Typical Usage
//!
//! ```rust
//! use tablature::{decode, encode, parse_note, Piece, StringName, Tick};
//!
//! let piece = Piece::standard()
//!     .add_note(StringName::E, parse_note("5")?, Tick::from_beats(4.0)?)
//!     .add_note(StringName::E, parse_note("12")?, Tick::from_beats(6.0)?);
//!
//! let musicxml = encode(&piece, "Riff", "Me");
//! assert_eq!(decode(&musicxml)?, piece);
//! # Ok::<(), tablature::TabError>(())
//! ```

use crate::{
    parse, parse_piece, to_musicxml, to_musicxml_with_options, Document, EncodeOptions, Piece,
    TabError,
};

pub use crate::sparse::{piece_from_sparse_map, piece_to_sparse_map};

/// Encode a piece as MusicXML.
///
/// Uses the interleaved layout: one shared timeline on a quarter-beat grid,
/// simultaneous notes written as chords, one beat of trailing rests.
/// `title` and `author` are escaped and written verbatim.
///
/// Modifiers are not part of the document and are dropped.
///
/// # Example
/// ```rust
/// use tablature::{encode, Note, Piece, StringName, Tick};
///
/// let piece = Piece::standard().add_note(StringName::D, Note::plain(2)?, Tick::ZERO);
/// let musicxml = encode(&piece, "Title", "Author");
/// assert!(musicxml.contains("<string>3</string>"));
/// assert!(musicxml.contains("<fret>2</fret>"));
/// # Ok::<(), tablature::TabError>(())
/// ```
pub fn encode(piece: &Piece, title: &str, author: &str) -> String {
    to_musicxml(piece, title, author)
}

/// Encode a piece with explicit metadata and layout.
///
/// # Example
/// ```rust
/// use tablature::{encode_with_options, EncodeMode, EncodeOptions, Note, Piece, StringName, Tick};
///
/// let piece = Piece::standard()
///     .add_note(StringName::A, Note::plain(0)?, Tick::ZERO)
///     .add_note(StringName::D, Note::plain(2)?, Tick::ZERO);
///
/// let options = EncodeOptions::new("Title", "Author").with_mode(EncodeMode::PerString);
/// let musicxml = encode_with_options(&piece, &options);
/// // Each string gets its own timeline, so nothing is grouped as a chord
/// assert!(!musicxml.contains("<chord/>"));
/// # Ok::<(), tablature::TabError>(())
/// ```
pub fn encode_with_options(piece: &Piece, options: &EncodeOptions) -> String {
    to_musicxml_with_options(piece, options)
}

/// Decode a MusicXML tablature document.
///
/// Notes come back without modifiers.
///
/// # Errors
/// - [`TabError::MalformedDocument`] for broken XML, a missing `<string>` or
///   `<fret>`, or a `<chord/>` note with no preceding note
/// - [`TabError::InvalidStringNumber`] for a string number outside 1..6
/// - [`TabError::InvalidFret`] for a fret outside 0..=24
pub fn decode(xml: &str) -> Result<Piece, TabError> {
    parse_piece(xml)
}

/// Decode a MusicXML document together with its title and author.
///
/// # Example
/// ```rust
/// use tablature::{decode_document, encode, Piece};
///
/// let musicxml = encode(&Piece::standard(), "Riff & Roll", "Me");
/// let document = decode_document(&musicxml)?;
/// assert_eq!(document.metadata.title.as_deref(), Some("Riff & Roll"));
/// assert_eq!(document.metadata.author.as_deref(), Some("Me"));
/// # Ok::<(), tablature::TabError>(())
/// ```
pub fn decode_document(xml: &str) -> Result<Document, TabError> {
    parse(xml)
}
