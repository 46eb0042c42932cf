//! Reader and writer for LithTech world (`.dat`) files.
//!
//! A world file starts with a fixed header listing absolute offsets of its sections. The whole
//! file is decoded with [`WorldDocument::decode`] (or [`WorldDocument::from_bytes`]), and written
//! back with [`WorldWriter`].
//!
//! Decoding never prints anything. Anomalies that don't prevent decoding, like a property whose
//! declared size doesn't match its type, are collected in [`WorldDocument::warnings`], or turned
//! into errors with [`DecodeOptions::strict`].

// Lets `#[derive(PackedData)]` refer to this crate as `::lithdat` from the inside as well
extern crate self as lithdat;

pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod lightgrid;
pub mod object;
pub mod packed;
pub mod physics;
pub mod render;
pub mod tree;
pub mod types;
pub mod world;

pub use cursor::ByteCursor;
pub use decode::{Decode, DecodeOptions, Decoder, SectionFlags};
pub use encode::Encode;
pub use error::{DecodeError, DecodeErrorKind, DecodeResult, DecodeWarning, WarningKind};
pub use header::{SectionKind, WorldHeader};
pub use world::{DeferredSection, SectionData, WorldDocument, WorldWriter};
