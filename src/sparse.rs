//! # Sparse Piece Data
//!
//! The plain-data form of a piece exchanged with the editor front end: for
//! each string label, a list of `(note token, beat)` pairs.
//!
//! ```yaml
//! E: [["5", 4.0], ["12hx", 6.0]]
//! A: []
//! D: []
//! G: []
//! B: []
//! e: [["0", 4.0]]
//! ```
//!
//! Tokens use the `parse_note` grammar, so modifiers survive a round trip
//! through this form even though the MusicXML codec drops them.

use crate::error::TabError;
use crate::model::*;
use std::collections::BTreeMap;

/// Note token and beat position
pub type NoteEntry = (String, f64);

/// String label to notes, in string order when iterated
pub type PieceData = BTreeMap<StringName, Vec<NoteEntry>>;

/// Build a piece from sparse data; all six strings must be present
pub fn piece_from_sparse_map(data: &PieceData) -> Result<Piece, TabError> {
    let mut strings = Vec::with_capacity(data.len());
    for (name, entries) in data {
        let mut string = GuitarString::new(*name);
        for (token, beats) in entries {
            let note = parse_note(token)?;
            string.add_note(note, Tick::from_beats(*beats)?);
        }
        strings.push(string);
    }
    Piece::new(strings)
}

/// Sparse data for every string of `piece`, notes in tick order
pub fn piece_to_sparse_map(piece: &Piece) -> PieceData {
    piece
        .strings()
        .map(|string| {
            let entries = string
                .events()
                .iter()
                .map(|(tick, note)| (note.to_string(), tick.beats()))
                .collect();
            (string.name(), entries)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn empty_data() -> PieceData {
        StringName::ALL.into_iter().map(|name| (name, Vec::new())).collect()
    }

    #[test]
    fn test_from_sparse_map() {
        let mut data = empty_data();
        data.insert(
            StringName::E,
            vec![("5".to_string(), 4.0), ("12hx".to_string(), 6.0)],
        );
        let piece = piece_from_sparse_map(&data).unwrap();

        let low_e = piece.string(StringName::E);
        assert_eq!(low_e.len(), 2);
        let tapped = low_e.note_at(Tick::new(24)).unwrap();
        assert_eq!(tapped.fret(), 12);
        assert_eq!(tapped.modifiers(), &[Modifier::HammerOn, Modifier::PalmMute]);
    }

    #[test]
    fn test_missing_string_is_invalid_shape() {
        let mut data = empty_data();
        data.remove(&StringName::HighE);
        assert!(matches!(
            piece_from_sparse_map(&data),
            Err(TabError::InvalidPieceShape(_))
        ));
    }

    #[test]
    fn test_bad_entries_are_rejected() {
        let mut data = empty_data();
        data.insert(StringName::A, vec![("x".to_string(), 0.0)]);
        assert!(matches!(
            piece_from_sparse_map(&data),
            Err(TabError::InvalidNoteToken(_))
        ));

        data.insert(StringName::A, vec![("3".to_string(), 0.1)]);
        assert!(matches!(
            piece_from_sparse_map(&data),
            Err(TabError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_to_sparse_map_keeps_modifiers() {
        let piece = Piece::standard()
            .add_note(StringName::G, "7t".parse().unwrap(), Tick::new(10))
            .add_note(StringName::G, "0".parse().unwrap(), Tick::new(2));
        let data = piece_to_sparse_map(&piece);

        assert_eq!(data.len(), 6);
        assert_eq!(
            data[&StringName::G],
            vec![("0".to_string(), 0.5), ("7t".to_string(), 2.5)]
        );
        assert!(data[&StringName::E].is_empty());
        assert_eq!(piece_from_sparse_map(&data).unwrap(), piece);
    }
}
