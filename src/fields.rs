//! Dot-path parsing and resolution over JSON documents.
//!
//! A field path like `object.title` or `alerts.0.severity` locates a node
//! inside a decoded payload. Paths are parsed once at configuration load;
//! resolution on the hot path never errors — a missing node is `None`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Maximum length of a field path source string.
pub const MAX_SOURCE_LEN: usize = 256;

/// Maximum number of segments in a field path.
pub const MAX_DEPTH: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("field path must not be empty")]
    Empty,

    #[error("field path is {0} characters, limit is {MAX_SOURCE_LEN}")]
    TooLong(usize),

    #[error("field path has {0} segments, limit is {MAX_DEPTH}")]
    TooDeep(usize),

    #[error("field path contains an empty segment")]
    EmptySegment,
}

/// One step of a field path.
///
/// A segment whose text parses as a base-10 non-negative integer is kept in
/// both forms: the index applies to sequences, the raw text matches mapping
/// keys (so `items.0` finds both `items[0]` and `{"items": {"0": ...}}`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index { idx: usize, raw: String },
}

impl Segment {
    fn key(&self) -> &str {
        match self {
            Segment::Key(key) => key,
            Segment::Index { raw, .. } => raw,
        }
    }
}

/// A parsed dot-path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dotted source string, enforcing the path invariants.
    pub fn parse(source: &str) -> Result<Self, PathError> {
        if source.is_empty() {
            return Err(PathError::Empty);
        }
        if source.len() > MAX_SOURCE_LEN {
            return Err(PathError::TooLong(source.len()));
        }

        let raw_segments: Vec<&str> = source.split('.').collect();
        if raw_segments.len() > MAX_DEPTH {
            return Err(PathError::TooDeep(raw_segments.len()));
        }

        let mut segments = Vec::with_capacity(raw_segments.len());
        for raw in raw_segments {
            if raw.is_empty() {
                return Err(PathError::EmptySegment);
            }
            match raw.parse::<usize>() {
                Ok(idx) => segments.push(Segment::Index {
                    idx,
                    raw: raw.to_string(),
                }),
                Err(_) => segments.push(Segment::Key(raw.to_string())),
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The original dotted source string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Walk the path from `root`, returning the final node if every segment
    /// descends. Mappings match the segment text as a key; sequences match
    /// only integer segments, by index.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment.key())?,
                Value::Array(items) => match segment {
                    Segment::Index { idx, .. } => items.get(*idx)?,
                    Segment::Key(_) => return None,
                },
                _ => return None,
            };
        }
        Some(current)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
