//! Primitive records shared by all sections.

use crate::{
    cursor::ByteCursor,
    error::{DecodeResult, DecodeResultExt},
    packed::PackedData,
};
use anyhow::anyhow;
use byteorder::{WriteBytesExt, LE};
use glam::{Vec2, Vec3};
use lithdat_proc::PackedData;
use lithdat_utils::{ok, AnyResult, AsciiDisplay};
use serde::{Serialize, Serializer};
use std::{
    borrow::Cow,
    fmt,
    io::{Read, Seek, Write},
    ops::Deref,
};

/// Length-prefixed string: a `u16` byte length, followed by that many bytes. There's no
/// terminator, and no guarantee about the encoding, so the bytes are kept verbatim.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LString(pub Vec<u8>);

impl LString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Escaped view of the bytes, see [`AsciiDisplay`].
    pub fn display(&self) -> AsciiDisplay<'_> {
        AsciiDisplay(&self.0)
    }

    /// Case-insensitive comparison, the way the engine looks up names.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.as_bytes())
    }
}

impl PackedData for LString {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        let len = c.read_u16().field("length")?;
        Ok(Self(c.read_bytes(len.into())?))
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        let len = u16::try_from(self.0.len())
            .map_err(|_| anyhow!("string of {} bytes is too long", self.0.len()))?;
        w.write_u16::<LE>(len)?;
        w.write_all(&self.0)?;
        ok()
    }
}

impl fmt::Debug for LString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.display())
    }
}

impl fmt::Display for LString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display().fmt(f)
    }
}

impl Serialize for LString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl From<&str> for LString {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for LString {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for LString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl<'a> PartialEq<&'a str> for LString {
    fn eq(&self, other: &&'a str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Opaque blob with a `u32` byte length prefix. Used for compressed lightmap, light grid and
/// intensity data, which is kept as it is.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl PackedData for Blob {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        let len = c.read_u32().field("length")?;
        Ok(Self(c.read_bytes(len as usize)?))
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        let len = u32::try_from(self.0.len())
            .map_err(|_| anyhow!("blob of {} bytes is too long", self.0.len()))?;
        w.write_u32::<LE>(len)?;
        w.write_all(&self.0)?;
        ok()
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.0.len())
    }
}

/// Blobs are only summarized, their contents are compressed anyway.
impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{} bytes", self.0.len()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, PackedData)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, PackedData)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, PackedData)]
pub struct Surface {
    pub flags: u32,
    pub texture: u16,
    pub texture_flags: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, PackedData)]
pub struct Triangle {
    pub indices: [u32; 3],
    /// Index of the world polygon this triangle was generated from
    pub polygon: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, PackedData)]
pub struct Vertex {
    pub position: Vec3,
    pub uv0: Vec2,
    pub uv1: Vec2,
    /// Packed ARGB
    pub color: u32,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
}
