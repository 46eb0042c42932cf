//! Decoding errors and warnings.
//!
//! Every error carries the byte offset at which it happened, and the logical path that led to
//! it (section, array index, field name). The path is built while the error bubbles up, with
//! [`DecodeResultExt`].

use serde::Serialize;
use std::{error::Error, fmt, io};

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("unexpected end of data (needed {needed} bytes, {available} available)")]
    UnexpectedEof { needed: u64, available: u64 },
    #[error("offset {offset} is outside of the source ({len} bytes)")]
    InvalidOffset { offset: u64, len: u64 },
    #[error("unknown property type tag {0}")]
    UnknownPropertyTag(u8),
    #[error("inconsistent {what}: declared {declared}, found {actual}")]
    InconsistentLength {
        what: &'static str,
        declared: u64,
        actual: u64,
    },
    #[error("invalid BSP node child {0}")]
    InvalidNodeChild(i32),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One step of the logical path of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Section { name: &'static str, offset: u64 },
    Field(&'static str),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Section { name, offset } => write!(f, "section \"{name}\" @ {offset}"),
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

#[derive(Debug)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    offset: u64,
    /// Innermost segment first
    path: Vec<PathSegment>,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, offset: u64) -> Self {
        Self {
            kind,
            offset,
            path: Vec::new(),
        }
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Byte offset in the source at which the error was detected.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Logical path of the error, outermost segment first.
    pub fn path(&self) -> impl Iterator<Item = &PathSegment> {
        self.path.iter().rev()
    }

    /// Name of the outermost section the error happened in, if any.
    pub fn section(&self) -> Option<&'static str> {
        self.path().find_map(|segment| match segment {
            PathSegment::Section { name, .. } => Some(*name),
            _ => None,
        })
    }

    /// Appends an outer path segment.
    pub fn within(mut self, segment: PathSegment) -> Self {
        self.path.push(segment);
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.offset)?;
        for (i, segment) in self.path().enumerate() {
            f.write_str(if i == 0 { ", in " } else { " > " })?;
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Annotates errors with their logical path as they propagate.
pub trait DecodeResultExt<T> {
    fn field(self, name: &'static str) -> DecodeResult<T>;
    fn index(self, index: usize) -> DecodeResult<T>;
    fn section(self, name: &'static str, offset: u64) -> DecodeResult<T>;
}

impl<T> DecodeResultExt<T> for DecodeResult<T> {
    fn field(self, name: &'static str) -> DecodeResult<T> {
        self.map_err(|e| e.within(PathSegment::Field(name)))
    }

    fn index(self, index: usize) -> DecodeResult<T> {
        self.map_err(|e| e.within(PathSegment::Index(index)))
    }

    fn section(self, name: &'static str, offset: u64) -> DecodeResult<T> {
        self.map_err(|e| e.within(PathSegment::Section { name, offset }))
    }
}

/// A recoverable anomaly found while decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeWarning {
    /// Offset of the record the warning is about
    pub offset: u64,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WarningKind {
    /// A fixed-size property declares a payload size other than its type's.
    PropertySize {
        name: String,
        tag: u8,
        declared: u16,
        expected: u16,
    },
    /// The zero word closing a section isn't zero.
    NonZeroTrailer { section: &'static str, value: u32 },
    /// A world model's total vertex index count doesn't match its polygons.
    VertexIndexCount { declared: u32, actual: u64 },
    /// A world model's texture name table holds a different number of names than declared.
    TextureNameCount { declared: u32, actual: u64 },
    /// A BSP node child points past the node array.
    DanglingNodeChild { index: u32, node_count: usize },
}

impl WarningKind {
    /// The error this warning becomes in strict mode.
    pub fn into_error_kind(self) -> DecodeErrorKind {
        match self {
            WarningKind::PropertySize {
                declared, expected, ..
            } => DecodeErrorKind::InconsistentLength {
                what: "property size",
                declared: declared.into(),
                actual: expected.into(),
            },
            WarningKind::NonZeroTrailer { value, .. } => DecodeErrorKind::InconsistentLength {
                what: "section trailer",
                declared: 0,
                actual: value.into(),
            },
            WarningKind::VertexIndexCount { declared, actual } => {
                DecodeErrorKind::InconsistentLength {
                    what: "vertex index count",
                    declared: declared.into(),
                    actual,
                }
            }
            WarningKind::TextureNameCount { declared, actual } => {
                DecodeErrorKind::InconsistentLength {
                    what: "texture name count",
                    declared: declared.into(),
                    actual,
                }
            }
            WarningKind::DanglingNodeChild { index, .. } => {
                DecodeErrorKind::InvalidNodeChild(index as i32)
            }
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::PropertySize {
                name,
                tag,
                declared,
                expected,
            } => write!(
                f,
                "property \"{name}\" (tag {tag}) declares {declared} bytes, its type has {expected}"
            ),
            WarningKind::NonZeroTrailer { section, value } => {
                write!(f, "{section} section ends with {value:#x} instead of zero")
            }
            WarningKind::VertexIndexCount { declared, actual } => write!(
                f,
                "world model declares {declared} vertex indices, its polygons use {actual}"
            ),
            WarningKind::TextureNameCount { declared, actual } => write!(
                f,
                "world model declares {declared} texture names, its name table holds {actual}"
            ),
            WarningKind::DanglingNodeChild { index, node_count } => write!(
                f,
                "BSP node child {index} is out of range ({node_count} nodes)"
            ),
        }
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind, self.offset)
    }
}
