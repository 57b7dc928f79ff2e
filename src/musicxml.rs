//! # MusicXML Encoder
//!
//! Writes a `Piece` as a single-measure MusicXML tablature document.
//!
//! ## Timeline
//! The encoder walks the quarter-beat grid from tick 0 up to one beat past the
//! last occupied tick and flattens the sparse piece into a gapless list of
//! `TimelineEvent`s:
//!
//! - `EncodeMode::Interleaved` walks one shared timeline. A tick with no notes
//!   on any string becomes one rest; a tick with notes becomes one note element
//!   per sounding string, every element after the first flagged `<chord/>`.
//! - `EncodeMode::PerString` walks each string on its own timeline up to that
//!   string's last note and concatenates the strings in E, A, D, G, B, e order.
//!   Strings with no notes contribute nothing.
//!
//! Rests always have duration 1 (one tick). Modifiers have no element in this
//! document shape and are not written.
//!
//! ## Header
//! One part, one measure, divisions 1, key fifths 0, 4/4 time, TAB clef on
//! line 5. Title and author come from `EncodeOptions`, never from the piece.

use crate::model::*;
use log::{debug, trace};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

/// Timeline layout used by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodeMode {
    /// One shared timeline, simultaneous notes grouped as chords
    #[default]
    Interleaved,
    /// Each string on its own timeline, strings one after another
    PerString,
}

/// Document metadata and layout for encoding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodeOptions {
    pub title: Option<String>,
    pub author: Option<String>,
    pub mode: EncodeMode,
}

impl EncodeOptions {
    pub fn new(title: &str, author: &str) -> Self {
        EncodeOptions {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            mode: EncodeMode::Interleaved,
        }
    }

    pub fn with_mode(mut self, mode: EncodeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One `<note>` element of the flattened timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent<'a> {
    /// One empty tick
    Rest,
    Note {
        string: StringName,
        note: &'a Note,
        /// Shares the tick of the preceding note element
        chord: bool,
    },
}

/// Flatten the whole piece onto one timeline, grouping simultaneous notes
pub fn interleaved_timeline(piece: &Piece) -> Vec<TimelineEvent<'_>> {
    let end = piece.last_tick().unwrap_or(Tick::ZERO).offset(TICKS_PER_BEAT);
    let mut events = Vec::new();

    for step in 0..end.steps() {
        let tick = Tick::new(step);
        let sounding: Vec<_> = piece
            .strings()
            .filter_map(|string| string.note_at(tick).map(|note| (string.name(), note)))
            .collect();

        if sounding.is_empty() {
            events.push(TimelineEvent::Rest);
            continue;
        }

        if sounding.len() > 1 {
            trace!("chord of {} notes at beat {}", sounding.len(), tick);
        }
        for (i, (string, note)) in sounding.into_iter().enumerate() {
            events.push(TimelineEvent::Note {
                string,
                note,
                chord: i > 0,
            });
        }
    }

    events
}

/// Flatten one string onto its own timeline; empty strings produce nothing
pub fn string_timeline(string: &GuitarString) -> Vec<TimelineEvent<'_>> {
    let Some(last) = string.last_tick() else {
        return Vec::new();
    };

    (0..last.offset(TICKS_PER_BEAT).steps())
        .map(|step| match string.note_at(Tick::new(step)) {
            Some(note) => TimelineEvent::Note {
                string: string.name(),
                note,
                chord: false,
            },
            None => TimelineEvent::Rest,
        })
        .collect()
}

/// Every string's timeline, concatenated in string order
pub fn per_string_timeline(piece: &Piece) -> Vec<TimelineEvent<'_>> {
    piece.strings().flat_map(string_timeline).collect()
}

/// Convert a Piece to MusicXML using the interleaved layout
pub fn to_musicxml(piece: &Piece, title: &str, author: &str) -> String {
    to_musicxml_with_options(piece, &EncodeOptions::new(title, author))
}

/// Convert a Piece to MusicXML with explicit metadata and layout
pub fn to_musicxml_with_options(piece: &Piece, options: &EncodeOptions) -> String {
    let events = match options.mode {
        EncodeMode::Interleaved => interleaved_timeline(piece),
        EncodeMode::PerString => per_string_timeline(piece),
    };
    debug!(
        "encoding {} notes as {} elements ({:?})",
        piece.note_count(),
        events.len(),
        options.mode
    );

    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#);
    xml.push('\n');
    xml.push_str(r#"<score-partwise version="3.1">"#);
    xml.push('\n');

    if let Some(title) = &options.title {
        xml.push_str(&format!("  <movement-title>{}</movement-title>\n", escape(title)));
    }

    if let Some(author) = &options.author {
        xml.push_str("  <identification>\n");
        xml.push_str(&format!("    <creator>{}</creator>\n", escape(author)));
        xml.push_str("  </identification>\n");
    }

    xml.push_str("  <part-list>\n");
    xml.push_str("    <score-part id=\"P1\">\n");
    xml.push_str("      <part-name>Music</part-name>\n");
    xml.push_str("    </score-part>\n");
    xml.push_str("  </part-list>\n");

    xml.push_str("  <part id=\"P1\">\n");
    xml.push_str("    <measure number=\"1\">\n");
    xml.push_str(&attributes_to_xml());
    for event in &events {
        xml.push_str(&event_to_xml(event));
    }
    xml.push_str("    </measure>\n");
    xml.push_str("  </part>\n");
    xml.push_str("</score-partwise>\n");

    xml
}

fn attributes_to_xml() -> String {
    let mut xml = String::new();
    xml.push_str("      <attributes>\n");
    xml.push_str("        <divisions>1</divisions>\n");
    xml.push_str("        <key>\n");
    xml.push_str("          <fifths>0</fifths>\n");
    xml.push_str("        </key>\n");
    xml.push_str("        <time>\n");
    xml.push_str("          <beats>4</beats>\n");
    xml.push_str("          <beat-type>4</beat-type>\n");
    xml.push_str("        </time>\n");
    xml.push_str("        <clef>\n");
    xml.push_str("          <sign>TAB</sign>\n");
    xml.push_str("          <line>5</line>\n");
    xml.push_str("        </clef>\n");
    xml.push_str("      </attributes>\n");
    xml
}

fn event_to_xml(event: &TimelineEvent<'_>) -> String {
    match event {
        TimelineEvent::Rest => rest_to_xml(),
        TimelineEvent::Note {
            string,
            note,
            chord,
        } => note_to_xml(*string, note, *chord),
    }
}

fn rest_to_xml() -> String {
    let mut xml = String::new();
    xml.push_str("      <note>\n");
    xml.push_str("        <rest/>\n");
    xml.push_str("        <duration>1</duration>\n");
    xml.push_str("      </note>\n");
    xml
}

fn note_to_xml(string: StringName, note: &Note, chord: bool) -> String {
    let mut xml = String::new();
    xml.push_str("      <note>\n");
    if chord {
        xml.push_str("        <chord/>\n");
    }
    xml.push_str("        <notations>\n");
    xml.push_str("          <technical>\n");
    xml.push_str(&format!("            <string>{}</string>\n", string.number()));
    xml.push_str(&format!("            <fret>{}</fret>\n", note.fret()));
    xml.push_str("          </technical>\n");
    xml.push_str("        </notations>\n");
    xml.push_str("      </note>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn note(fret: i64) -> Note {
        Note::plain(fret).unwrap()
    }

    fn rest_count(events: &[TimelineEvent<'_>]) -> usize {
        events.iter().filter(|e| **e == TimelineEvent::Rest).count()
    }

    #[test]
    fn test_empty_piece_is_one_beat_of_rests() {
        let piece = Piece::standard();
        let events = interleaved_timeline(&piece);
        assert_eq!(events, vec![TimelineEvent::Rest; 4]);
        assert!(per_string_timeline(&piece).is_empty());
    }

    #[test]
    fn test_interleaved_pads_with_rests() {
        let piece = Piece::standard()
            .add_note(StringName::E, note(12), Tick::from_beats(6.0).unwrap())
            .add_note(StringName::E, note(5), Tick::from_beats(4.0).unwrap());
        let events = interleaved_timeline(&piece);

        // 16 rests, note, 7 rests, note, 3 trailing rests
        assert_eq!(events.len(), 28);
        assert_eq!(rest_count(&events), 26);
        assert_eq!(
            events[16],
            TimelineEvent::Note {
                string: StringName::E,
                note: &note(5),
                chord: false
            }
        );
        assert_eq!(
            events[24],
            TimelineEvent::Note {
                string: StringName::E,
                note: &note(12),
                chord: false
            }
        );
    }

    #[test]
    fn test_simultaneous_notes_form_chord() {
        let piece = Piece::standard()
            .add_note(StringName::HighE, note(3), Tick::new(1))
            .add_note(StringName::E, note(3), Tick::new(1))
            .add_note(StringName::A, note(2), Tick::new(1));
        let events = interleaved_timeline(&piece);

        assert_eq!(events[0], TimelineEvent::Rest);
        // String order, only the first note of the tick is unflagged
        let chord: Vec<_> = events[1..4]
            .iter()
            .map(|e| match e {
                TimelineEvent::Note { string, chord, .. } => (*string, *chord),
                TimelineEvent::Rest => panic!("expected note"),
            })
            .collect();
        assert_eq!(
            chord,
            vec![
                (StringName::E, false),
                (StringName::A, true),
                (StringName::HighE, true)
            ]
        );
        assert_eq!(events.len(), 1 + 3 + 3);
    }

    #[test]
    fn test_per_string_concatenates_in_string_order() {
        let piece = Piece::standard()
            .add_note(StringName::G, note(7), Tick::new(0))
            .add_note(StringName::A, note(0), Tick::new(2));
        let events = per_string_timeline(&piece);

        // A: rest, rest, note, 3 rests; G: note, 3 rests
        assert_eq!(events.len(), 6 + 4);
        assert!(matches!(events[2], TimelineEvent::Note { string: StringName::A, .. }));
        assert!(matches!(events[6], TimelineEvent::Note { string: StringName::G, .. }));
    }

    #[test]
    fn test_header_and_metadata() {
        let xml = to_musicxml(&Piece::standard(), "Riff <1>", "A & B");
        assert!(xml.contains(r#"<score-partwise version="3.1">"#));
        assert!(xml.contains("<movement-title>Riff &lt;1&gt;</movement-title>"));
        assert!(xml.contains("<creator>A &amp; B</creator>"));
        assert!(xml.contains("<divisions>1</divisions>"));
        assert!(xml.contains("<sign>TAB</sign>"));
        assert_eq!(xml.matches("<rest/>").count(), 4);
    }

    #[test]
    fn test_metadata_omitted_when_absent() {
        let xml = to_musicxml_with_options(&Piece::standard(), &EncodeOptions::default());
        assert!(!xml.contains("<movement-title>"));
        assert!(!xml.contains("<identification>"));
    }

    #[test]
    fn test_note_element_drops_modifiers() {
        let tapped = Note::new(12, vec![Modifier::Tap, Modifier::PalmMute]).unwrap();
        let piece = Piece::standard().add_note(StringName::D, tapped, Tick::ZERO);
        let xml = to_musicxml(&piece, "t", "a");
        assert!(xml.contains("<string>3</string>"));
        assert!(xml.contains("<fret>12</fret>"));
        assert!(!xml.contains("<chord/>"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let piece = Piece::standard()
            .add_note(StringName::B, note(1), Tick::new(3))
            .add_note(StringName::D, note(2), Tick::new(3));
        assert_eq!(to_musicxml(&piece, "x", "y"), to_musicxml(&piece, "x", "y"));
    }
}
