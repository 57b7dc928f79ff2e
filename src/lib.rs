pub mod api;
pub mod error;
pub mod model;
pub mod modifier;
pub mod musicxml;
pub mod parser;
pub mod sparse;
pub mod tabfile;

pub use api::*;
pub use error::*;
pub use model::*;
pub use modifier::Modifier;
pub use musicxml::{
    interleaved_timeline, per_string_timeline, to_musicxml, to_musicxml_with_options,
    EncodeMode, EncodeOptions, TimelineEvent,
};
pub use parser::{parse, parse_piece, read_metadata, Cursor, Document, Metadata};
pub use sparse::{NoteEntry, PieceData};
pub use tabfile::{parse_tab_file, TabFile};
