//! # MusicXML Decoder
//!
//! Reads a single-part MusicXML tablature document back into a `Piece`.
//!
//! ## Pipeline
//! 1. Stream the document with `quick_xml` and collect each `<note>` element
//!    into a `RawNote` (rest flag, chord flag, string, fret, duration text),
//!    along with the `movement-title` and `creator` metadata.
//! 2. Replay the raw notes through a `Cursor` to assign each note its tick.
//! 3. Validate string numbers and frets and build the six strings.
//!
//! `<string>` and `<fret>` are recognized anywhere inside a `<note>`, so the
//! `<notations><technical>` wrapper is optional. Notes are read in document
//! order across all measures. Modifiers are never reconstructed.
//!
//! ## Chord Cursor
//! The encoder writes a chord as one unflagged note element followed by
//! `<chord/>`-flagged elements that share its tick. The cursor inverts that:
//!
//! ```text
//!              rest(d)          note             chord note
//! Open(n)      Open(n+d)        AfterNote(n)     error: nothing to chord with
//! AfterNote(t) Open(t+1+d)      AfterNote(t+1)   InChord(t)
//! InChord(t)   Open(t+1+d)      AfterNote(t+1)   InChord(t)
//! ```
//!
//! A note placed by `note` lands on the cursor's next free tick; a chord note
//! lands on the tick of the group it joins.

use crate::error::TabError;
use crate::model::*;
use log::{debug, trace};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::num::IntErrorKind;

const ROOT_ELEMENT: &str = "score-partwise";

/// Title and author carried by a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// A decoded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub metadata: Metadata,
    pub piece: Piece,
}

/// Decoder position on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// The next element takes this tick; there is no note to chord with
    Open(Tick),
    /// The last element was a single note at this tick
    AfterNote(Tick),
    /// Inside a chord group sharing this tick
    InChord(Tick),
}

impl Cursor {
    pub fn start() -> Self {
        Cursor::Open(Tick::ZERO)
    }

    /// Consume a rest lasting `duration` ticks
    pub fn rest(self, duration: u32) -> Cursor {
        Cursor::Open(self.next_free().offset(duration))
    }

    /// Place an unflagged note; returns its tick and the following state
    pub fn note(self) -> (Tick, Cursor) {
        let tick = self.next_free();
        (tick, Cursor::AfterNote(tick))
    }

    /// Place a `<chord/>` note on the preceding note's tick.
    ///
    /// Returns `None` when no note precedes it.
    pub fn chord_note(self) -> Option<(Tick, Cursor)> {
        match self {
            Cursor::Open(_) => None,
            Cursor::AfterNote(tick) | Cursor::InChord(tick) => Some((tick, Cursor::InChord(tick))),
        }
    }

    fn next_free(self) -> Tick {
        match self {
            Cursor::Open(tick) => tick,
            Cursor::AfterNote(tick) | Cursor::InChord(tick) => tick.next(),
        }
    }
}

/// One `<note>` element as written, before validation
#[derive(Debug, Clone, Default)]
struct RawNote {
    rest: bool,
    chord: bool,
    string: Option<String>,
    fret: Option<String>,
    duration: Option<String>,
}

impl RawNote {
    fn mark(&mut self, element: &str) {
        match element {
            "rest" => self.rest = true,
            "chord" => self.chord = true,
            _ => {}
        }
    }
}

/// Parse a MusicXML document into its metadata and piece
pub fn parse(xml: &str) -> Result<Document, TabError> {
    let (metadata, notes) = read_document(xml)?;
    let piece = build_piece(&notes)?;
    debug!(
        "decoded {} notes from {} note elements",
        piece.note_count(),
        notes.len()
    );
    Ok(Document { metadata, piece })
}

/// Parse only the piece of a MusicXML document
pub fn parse_piece(xml: &str) -> Result<Piece, TabError> {
    parse(xml).map(|document| document.piece)
}

/// Read the title and author without validating the notes
pub fn read_metadata(xml: &str) -> Result<Metadata, TabError> {
    read_document(xml).map(|(metadata, _)| metadata)
}

fn read_document(xml: &str) -> Result<(Metadata, Vec<RawNote>), TabError> {
    let mut reader = Reader::from_str(xml);

    let mut metadata = Metadata::default();
    let mut notes = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RawNote> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e.local_name().as_ref());
                check_root(&mut seen_root, &name)?;
                if name == "note" {
                    current = Some(RawNote::default());
                } else if let Some(note) = current.as_mut() {
                    note.mark(&name);
                } else {
                    metadata.open(&name);
                }
                path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e.local_name().as_ref());
                check_root(&mut seen_root, &name)?;
                if name == "note" {
                    notes.push(RawNote::default());
                } else if let Some(note) = current.as_mut() {
                    note.mark(&name);
                } else {
                    metadata.open(&name);
                }
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("note") {
                    if let Some(note) = current.take() {
                        notes.push(note);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| {
                    TabError::MalformedDocument(format!(
                        "bad text at position {}: {}",
                        reader.buffer_position(),
                        err
                    ))
                })?;
                record_text(&text, path.last(), current.as_mut(), &mut metadata);
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(&**e);
                record_text(&text, path.last(), current.as_mut(), &mut metadata);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(TabError::MalformedDocument(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    err
                )))
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(TabError::MalformedDocument(format!(
            "missing <{}> root element",
            ROOT_ELEMENT
        )));
    }
    if let Some(open) = path.last() {
        return Err(TabError::MalformedDocument(format!(
            "document ends inside <{}>",
            open
        )));
    }

    trace!("read {} note elements", notes.len());
    Ok((metadata, notes))
}

impl Metadata {
    /// An element that is present but empty still counts as set
    fn open(&mut self, element: &str) {
        match element {
            "movement-title" => self.title = Some(String::new()),
            "creator" => self.author = Some(String::new()),
            _ => {}
        }
    }
}

/// Append character data to whichever field the innermost element names.
///
/// Text is kept as written; numeric fields are trimmed when parsed.
fn record_text(
    text: &str,
    element: Option<&String>,
    note: Option<&mut RawNote>,
    metadata: &mut Metadata,
) {
    let field = match (note, element.map(String::as_str)) {
        (Some(note), Some("string")) => &mut note.string,
        (Some(note), Some("fret")) => &mut note.fret,
        (Some(note), Some("duration")) => &mut note.duration,
        (None, Some("movement-title")) => &mut metadata.title,
        (None, Some("creator")) => &mut metadata.author,
        _ => return,
    };
    field.get_or_insert_with(String::new).push_str(text);
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn check_root(seen_root: &mut bool, name: &str) -> Result<(), TabError> {
    if *seen_root {
        return Ok(());
    }
    if name != ROOT_ELEMENT {
        return Err(TabError::MalformedDocument(format!(
            "expected <{}> root element, found <{}>",
            ROOT_ELEMENT, name
        )));
    }
    *seen_root = true;
    Ok(())
}

fn build_piece(notes: &[RawNote]) -> Result<Piece, TabError> {
    let mut strings = StringName::ALL.map(GuitarString::new);
    let mut cursor = Cursor::start();

    for (i, raw) in notes.iter().enumerate() {
        let index = i + 1;

        if raw.rest {
            cursor = cursor.rest(rest_duration(raw, index)?);
            continue;
        }

        let string_text = required_field(&raw.string, "string", index)?;
        let fret_text = required_field(&raw.fret, "fret", index)?;

        let number = parse_number(string_text, "string", index)?;
        let name = StringName::from_number(number)
            .map_err(|_| TabError::InvalidStringNumber(string_text.trim().to_string()))?;
        let note = Note::plain(parse_number(fret_text, "fret", index)?)?;

        let (tick, next) = if raw.chord {
            cursor.chord_note().ok_or_else(|| {
                TabError::MalformedDocument(format!(
                    "note {} is marked <chord/> but follows no note",
                    index
                ))
            })?
        } else {
            cursor.note()
        };
        if tick > Tick::MAX {
            return Err(TabError::InvalidPosition(format!(
                "note {} at beat {} is past the last supported beat {}",
                index, tick, MAX_BEATS
            )));
        }

        trace!("note {}: string {} fret {} at beat {}", index, name, note.fret(), tick);
        strings[name.index()].add_note(note, tick);
        cursor = next;
    }

    Piece::new(strings.into())
}

fn required_field<'a>(
    field: &'a Option<String>,
    element: &str,
    index: usize,
) -> Result<&'a str, TabError> {
    field.as_deref().ok_or_else(|| {
        TabError::MalformedDocument(format!("note {} has no <{}>", index, element))
    })
}

fn parse_number(text: &str, element: &str, index: usize) -> Result<i64, TabError> {
    let digits = text.trim();
    digits.parse::<i64>().map_err(|err| match err.kind() {
        // Numeric but out of i64 range: report it as the value being out of range
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => match element {
            "fret" if digits.starts_with('-') => TabError::InvalidFret(i64::MIN),
            "fret" => TabError::InvalidFret(i64::MAX),
            _ => TabError::InvalidStringNumber(digits.to_string()),
        },
        _ => TabError::MalformedDocument(format!(
            "note {}: <{}> value '{}' is not a number",
            index, element, text
        )),
    })
}

fn rest_duration(raw: &RawNote, index: usize) -> Result<u32, TabError> {
    match raw.duration.as_deref() {
        None => Ok(1),
        Some(text) => match text.trim().parse::<u32>() {
            Ok(duration) if duration > 0 => Ok(duration),
            _ => Err(TabError::MalformedDocument(format!(
                "rest {} has invalid duration '{}'",
                index, text
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "<score-partwise version=\"3.1\">\
        <part-list><score-part id=\"P1\"><part-name>Music</part-name></score-part></part-list>\
        <part id=\"P1\"><measure number=\"1\">\
        <attributes><divisions>1</divisions><key><fifths>0</fifths></key>\
        <time><beats>4</beats><beat-type>4</beat-type></time>\
        <clef><sign>TAB</sign><line>5</line></clef></attributes>";
    const FOOTER: &str = "</measure></part></score-partwise>";
    const REST: &str = "<note><rest/><duration>1</duration></note>";

    fn document(body: &str) -> String {
        format!("{}{}{}", HEADER, body, FOOTER)
    }

    fn note(string: u8, fret: u8) -> String {
        format!(
            "<note><notations><technical><string>{}</string><fret>{}</fret></technical></notations></note>",
            string, fret
        )
    }

    fn chord_note(string: u8, fret: u8) -> String {
        format!(
            "<note><chord/><notations><technical><string>{}</string><fret>{}</fret></technical></notations></note>",
            string, fret
        )
    }

    fn frets_on(piece: &Piece, name: StringName) -> Vec<(u32, u8)> {
        piece
            .string(name)
            .events()
            .iter()
            .map(|(tick, note)| (tick.steps(), note.fret()))
            .collect()
    }

    #[test]
    fn test_cursor_transitions() {
        let cursor = Cursor::start();
        assert_eq!(cursor.chord_note(), None);

        let (tick, cursor) = cursor.rest(1).note();
        assert_eq!(tick, Tick::new(1));
        assert_eq!(cursor, Cursor::AfterNote(Tick::new(1)));

        // Chord members step back onto the previous note's tick
        let (tick, cursor) = cursor.chord_note().unwrap();
        assert_eq!(tick, Tick::new(1));
        let (tick, cursor) = cursor.chord_note().unwrap();
        assert_eq!(tick, Tick::new(1));
        assert_eq!(cursor, Cursor::InChord(Tick::new(1)));

        // Leaving the group resumes on the following tick
        let (tick, cursor) = cursor.note();
        assert_eq!(tick, Tick::new(2));
        assert_eq!(cursor.rest(1), Cursor::Open(Tick::new(4)));
    }

    #[test]
    fn test_rest_after_chord_takes_next_tick() {
        let cursor = Cursor::InChord(Tick::new(5));
        assert_eq!(cursor.rest(1), Cursor::Open(Tick::new(7)));
        assert_eq!(cursor.rest(1).chord_note(), None);
    }

    #[test]
    fn test_decode_compact_document_without_notations() {
        // Technical elements directly under <note>
        let mut body = REST.repeat(16);
        body.push_str("<note><technical><string>1</string><fret>5</fret></technical></note>");
        body.push_str(&REST.repeat(7));
        body.push_str("<note><technical><string>1</string><fret>12</fret></technical></note>");
        body.push_str(&REST.repeat(3));

        let piece = parse_piece(&document(&body)).unwrap();
        assert_eq!(frets_on(&piece, StringName::E), vec![(16, 5), (24, 12)]);
        assert_eq!(piece.note_count(), 2);
    }

    #[test]
    fn test_decode_chord_shares_tick() {
        let body = format!(
            "{}{}{}{}{}",
            REST,
            note(1, 3),
            chord_note(5, 0),
            note(2, 7),
            REST
        );
        let piece = parse_piece(&document(&body)).unwrap();
        assert_eq!(frets_on(&piece, StringName::E), vec![(1, 3)]);
        assert_eq!(frets_on(&piece, StringName::B), vec![(1, 0)]);
        assert_eq!(frets_on(&piece, StringName::A), vec![(2, 7)]);
    }

    #[test]
    fn test_decode_metadata() {
        let xml = "<score-partwise version=\"3.1\">\
            <movement-title>Riff &amp; Roll</movement-title>\
            <identification><creator>Someone</creator></identification>\
            </score-partwise>";
        let document = parse(xml).unwrap();
        assert_eq!(document.metadata.title.as_deref(), Some("Riff & Roll"));
        assert_eq!(document.metadata.author.as_deref(), Some("Someone"));
        assert!(document.piece.is_empty());
        assert_eq!(read_metadata(xml).unwrap(), document.metadata);
    }

    #[test]
    fn test_missing_fret_is_malformed() {
        let body = "<note><notations><technical><string>1</string></technical></notations></note>";
        let err = parse_piece(&document(body)).unwrap_err();
        assert_eq!(err, TabError::MalformedDocument("note 1 has no <fret>".to_string()));
    }

    #[test]
    fn test_string_number_out_of_range() {
        let err = parse_piece(&document(&note(7, 0))).unwrap_err();
        assert_eq!(err, TabError::InvalidStringNumber("7".to_string()));
        let err = parse_piece(&document(&note(0, 0))).unwrap_err();
        assert_eq!(err, TabError::InvalidStringNumber("0".to_string()));
    }

    #[test]
    fn test_fret_out_of_range() {
        let err = parse_piece(&document(&note(1, 30))).unwrap_err();
        assert_eq!(err, TabError::InvalidFret(30));
    }

    #[test]
    fn test_non_numeric_fields_are_malformed() {
        let body = "<note><technical><string>low</string><fret>1</fret></technical></note>";
        assert!(matches!(
            parse_piece(&document(body)),
            Err(TabError::MalformedDocument(_))
        ));
        let body = "<note><rest/><duration>0</duration></note>";
        assert!(matches!(
            parse_piece(&document(body)),
            Err(TabError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_oversized_numbers_are_out_of_range() {
        let body = "<note><technical><string>1</string><fret>99999999999999999999</fret></technical></note>";
        assert_eq!(
            parse_piece(&document(body)),
            Err(TabError::InvalidFret(i64::MAX))
        );
        let body = "<note><technical><string>1</string><fret>-99999999999999999999</fret></technical></note>";
        assert_eq!(
            parse_piece(&document(body)),
            Err(TabError::InvalidFret(i64::MIN))
        );
        let body = "<note><technical><string>99999999999999999999</string><fret>0</fret></technical></note>";
        assert_eq!(
            parse_piece(&document(body)),
            Err(TabError::InvalidStringNumber("99999999999999999999".to_string()))
        );
    }

    #[test]
    fn test_cdata_and_spaced_fields() {
        let body = "<note><technical><string><![CDATA[2]]></string><fret><![CDATA[7]]></fret></technical></note>\
            <note>\n  <technical>\n    <string> 3 </string>\n    <fret>\n      5\n    </fret>\n  </technical>\n</note>";
        let piece = parse_piece(&document(body)).unwrap();
        assert_eq!(frets_on(&piece, StringName::A), vec![(0, 7)]);
        assert_eq!(frets_on(&piece, StringName::D), vec![(1, 5)]);
    }

    #[test]
    fn test_metadata_text_is_kept_verbatim() {
        let xml = "<score-partwise version=\"3.1\">\
            <movement-title>  Riff  </movement-title>\
            <identification><creator type=\"composer\"></creator></identification>\
            </score-partwise>";
        let metadata = read_metadata(xml).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("  Riff  "));
        assert_eq!(metadata.author.as_deref(), Some(""));

        let xml = "<score-partwise><movement-title><![CDATA[A & B]]></movement-title><creator/></score-partwise>";
        let metadata = read_metadata(xml).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("A & B"));
        assert_eq!(metadata.author.as_deref(), Some(""));
    }

    #[test]
    fn test_note_past_last_beat_is_rejected() {
        let rest = format!("<note><rest/><duration>{}</duration></note>", Tick::MAX.steps());
        let body = format!("{}{}", rest, note(1, 0));
        let piece = parse_piece(&document(&body)).unwrap();
        assert_eq!(piece.last_tick(), Some(Tick::MAX));

        let body = format!("{}{}{}", rest, REST, note(1, 0));
        assert!(matches!(
            parse_piece(&document(&body)),
            Err(TabError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_leading_chord_note_is_malformed() {
        let err = parse_piece(&document(&chord_note(1, 0))).unwrap_err();
        assert!(matches!(err, TabError::MalformedDocument(_)));
    }

    #[test]
    fn test_rest_duration_advances_cursor() {
        let body = format!("<note><rest/><duration>3</duration></note>{}", note(4, 2));
        let piece = parse_piece(&document(&body)).unwrap();
        assert_eq!(frets_on(&piece, StringName::G), vec![(3, 2)]);
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(parse(""), Err(TabError::MalformedDocument(_))));
        assert!(matches!(
            parse("<score-timewise/>"),
            Err(TabError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse("<score-partwise><part>"),
            Err(TabError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse("<score-partwise><part></measure></score-partwise>"),
            Err(TabError::MalformedDocument(_))
        ));
    }
}
