//! # Tab Files
//!
//! YAML source files for the command-line tool: document metadata, the
//! encoding layout, and the notes in sparse form.
//!
//! ```yaml
//! title: Open Strings
//! author: Me
//! mode: interleaved   # or per-string; optional
//! strings:
//!   E: [["0", 0]]
//!   A: [["0", 1]]
//!   D: [["0", 2]]
//!   G: [["0", 3]]
//!   B: [["0", 4]]
//!   e: [["0", 5], ["3h", 5.5]]
//! ```
//!
//! Note tokens are quoted so YAML keeps them as strings.

use crate::error::TabError;
use crate::model::Piece;
use crate::musicxml::{EncodeMode, EncodeOptions};
use crate::parser::Document;
use crate::sparse::{piece_from_sparse_map, piece_to_sparse_map, PieceData};
use serde::{Deserialize, Serialize};

/// A piece together with how it should be written
#[derive(Debug, Clone, PartialEq)]
pub struct TabFile {
    pub options: EncodeOptions,
    pub piece: Piece,
}

/// Raw tab file as written (before validation)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawTabFile {
    title: Option<String>,
    author: Option<String>,
    mode: Option<EncodeMode>,
    strings: PieceData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct TabFileOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    mode: EncodeMode,
    strings: PieceData,
}

/// Parse and validate a YAML tab file
pub fn parse_tab_file(content: &str) -> Result<TabFile, TabError> {
    let raw: RawTabFile =
        serde_yaml::from_str(content).map_err(|e| TabError::MetadataError(e.to_string()))?;

    Ok(TabFile {
        options: EncodeOptions {
            title: raw.title,
            author: raw.author,
            mode: raw.mode.unwrap_or_default(),
        },
        piece: piece_from_sparse_map(&raw.strings)?,
    })
}

impl TabFile {
    /// Interleaved tab file for a decoded document
    pub fn from_document(document: Document) -> Self {
        TabFile {
            options: EncodeOptions {
                title: document.metadata.title,
                author: document.metadata.author,
                mode: EncodeMode::Interleaved,
            },
            piece: document.piece,
        }
    }

    pub fn to_yaml(&self) -> Result<String, TabError> {
        let out = TabFileOut {
            title: self.options.title.as_deref(),
            author: self.options.author.as_deref(),
            mode: self.options.mode,
            strings: piece_to_sparse_map(&self.piece),
        };
        serde_yaml::to_string(&out).map_err(|e| TabError::MetadataError(e.to_string()))
    }
}
