//! World objects and their properties, and blind objects.
//!
//! World objects are stored as a `u32` count followed by the objects:
//! ```c
//! struct WorldObject {
//!     u16      object_size;
//!     LString  object_type;
//!     u32      property_count;
//!     Property properties[property_count];
//! }
//!
//! struct Property {
//!     LString name;
//!     u8      type_tag;
//!     u32     flags;
//!     u16     declared_size;
//!     u8      payload[]; // layout depends on type_tag
//! }
//! ```
//!
//! How many bytes a payload takes is decided by the type tag alone. `declared_size` usually agrees
//! with it, but it's never used for decoding.

use crate::{
    decode::{Decode, Decoder},
    encode::{write_prefixed, Encode},
    error::{DecodeError, DecodeErrorKind, DecodeResult, DecodeResultExt, WarningKind},
    packed::PackedWriteExt,
    types::{Color, LString},
};
use byteorder::{WriteBytesExt, LE};
use glam::{Quat, Vec3};
use lithdat_proc::ext_repr;
use lithdat_utils::{ok, AnyResult};
use serde::Serialize;
use std::io::{Read, Seek, Write};

#[ext_repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyKind {
    String = 0,
    Vector = 1,
    Color = 2,
    Float = 3,
    Bool = 5,
    LongInt = 6,
    Rotation = 7,
}

impl PropertyKind {
    /// Width of the encoded payload. Strings are the only variable width payload.
    pub const fn payload_size(self) -> Option<u16> {
        match self {
            PropertyKind::String => None,
            PropertyKind::Vector | PropertyKind::Color => Some(12),
            PropertyKind::Float | PropertyKind::LongInt => Some(4),
            PropertyKind::Bool => Some(1),
            PropertyKind::Rotation => Some(16),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue {
    String(LString),
    Vector(Vec3),
    Color(Color),
    Float(f32),
    Bool(bool),
    LongInt(u32),
    Rotation(Quat),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Vector(_) => PropertyKind::Vector,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::LongInt(_) => PropertyKind::LongInt,
            PropertyValue::Rotation(_) => PropertyKind::Rotation,
        }
    }

    /// Size the payload takes in the file, which is what `declared_size` is expected to hold.
    pub fn encoded_size(&self) -> usize {
        match self {
            PropertyValue::String(s) => 2 + s.len(),
            other => other.kind().payload_size().map_or(0, usize::from),
        }
    }

    fn read_as<R: Read + Seek>(d: &mut Decoder<R>, kind: PropertyKind) -> DecodeResult<Self> {
        Ok(match kind {
            PropertyKind::String => PropertyValue::String(d.read()?),
            PropertyKind::Vector => PropertyValue::Vector(d.read()?),
            PropertyKind::Color => PropertyValue::Color(d.read()?),
            PropertyKind::Float => PropertyValue::Float(d.read()?),
            PropertyKind::Bool => PropertyValue::Bool(d.read()?),
            PropertyKind::LongInt => PropertyValue::LongInt(d.read()?),
            PropertyKind::Rotation => PropertyValue::Rotation(d.read()?),
        })
    }
}

impl Encode for PropertyValue {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        match self {
            PropertyValue::String(v) => w.write_packed(v),
            PropertyValue::Vector(v) => w.write_packed(v),
            PropertyValue::Color(v) => w.write_packed(v),
            PropertyValue::Float(v) => w.write_packed(v),
            PropertyValue::Bool(v) => w.write_packed(v),
            PropertyValue::LongInt(v) => w.write_packed(v),
            PropertyValue::Rotation(v) => w.write_packed(v),
        }
    }
}

/// A named, typed value of a world object. The type tag is implied by the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: LString,
    pub flags: u32,
    /// Payload size as written in the file. Informational only.
    pub declared_size: u16,
    pub value: PropertyValue,
}

impl Property {
    /// Creates a property with `declared_size` matching the value.
    pub fn new(name: impl Into<LString>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            declared_size: value.encoded_size().try_into().unwrap_or(u16::MAX),
            value,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    pub fn type_tag(&self) -> u8 {
        self.kind().into()
    }
}

impl Decode for Property {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let start = d.position();
        let name: LString = d.read().field("name")?;

        let tag_offset = d.position();
        let tag: u8 = d.read().field("type_tag")?;
        let flags = d.read().field("flags")?;
        let declared_size: u16 = d.read().field("declared_size")?;

        // An unknown tag leaves no way of telling where the payload ends
        let kind = PropertyKind::try_from(tag)
            .map_err(|_| DecodeError::new(DecodeErrorKind::UnknownPropertyTag(tag), tag_offset))
            .field("type_tag")?;
        let value = PropertyValue::read_as(d, kind).field("value")?;

        if let Some(expected) = kind.payload_size() {
            if declared_size != expected {
                d.warn(
                    start,
                    WarningKind::PropertySize {
                        name: name.to_string_lossy().into_owned(),
                        tag,
                        declared: declared_size,
                        expected,
                    },
                )?;
            }
        }

        Ok(Self {
            name,
            flags,
            declared_size,
            value,
        })
    }
}

impl Encode for Property {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_packed(&self.name)?;
        w.write_u8(self.type_tag())?;
        w.write_u32::<LE>(self.flags)?;
        w.write_u16::<LE>(self.declared_size)?;
        self.value.encode(w)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldObject {
    /// Record size as written in the file. Informational only.
    pub object_size: u16,
    pub object_type: LString,
    pub properties: Vec<Property>,
}

impl WorldObject {
    /// Looks up a property by name, ignoring case.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.eq_ignore_case(name))
    }

    /// The object's `Name` property, which every placed object has.
    pub fn name(&self) -> Option<&LString> {
        match self.property("Name").map(|p| &p.value) {
            Some(PropertyValue::String(name)) => Some(name),
            _ => None,
        }
    }
}

impl Decode for WorldObject {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            object_size: d.read().field("object_size")?,
            object_type: d.read().field("object_type")?,
            properties: d.read_prefixed_vec().field("properties")?,
        })
    }
}

impl Encode for WorldObject {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_u16::<LE>(self.object_size)?;
        w.write_packed(&self.object_type)?;
        write_prefixed(w, &self.properties)?;
        ok()
    }
}

/// Opaque, ID-tagged data blob. Its layout depends on the game code using it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlindObject {
    pub id: u32,
    pub data: Vec<u8>,
}

impl Decode for BlindObject {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let size = d.read_count().field("size")?;
        let id = d.read().field("id")?;
        Ok(Self {
            id,
            data: d.read_bytes(size).field("data")?,
        })
    }
}

impl Encode for BlindObject {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        crate::encode::write_count(w, self.data.len())?;
        w.write_u32::<LE>(self.id)?;
        w.write_all(&self.data)?;
        ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cursor::ByteCursor, decode::DecodeOptions};

    fn property_bytes(name: &str, tag: u8, declared_size: u16, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        data.extend_from_slice(name.as_bytes());
        data.push(tag);
        data.extend_from_slice(&0x10u32.to_le_bytes());
        data.extend_from_slice(&declared_size.to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    fn decode<T: Decode>(data: &[u8], options: DecodeOptions) -> DecodeResult<(T, usize)> {
        let mut d = Decoder::new(ByteCursor::from_bytes(data), options);
        let value = d.read()?;
        Ok((value, d.into_parts().1.len()))
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn payload_follows_tag() {
        let cases: [(u8, u16, Vec<u8>, PropertyValue); 7] = [
            (0, 4, vec![2, 0, b'h', b'i'], PropertyValue::String("hi".into())),
            (1, 12, floats(&[1.0, 2.0, 3.0]), PropertyValue::Vector(Vec3::new(1.0, 2.0, 3.0))),
            (
                2,
                12,
                floats(&[255.0, 0.0, 128.0]),
                PropertyValue::Color(Color {
                    r: 255.0,
                    g: 0.0,
                    b: 128.0,
                }),
            ),
            (3, 4, 0.5f32.to_le_bytes().to_vec(), PropertyValue::Float(0.5)),
            (5, 1, vec![1], PropertyValue::Bool(true)),
            (6, 4, 77u32.to_le_bytes().to_vec(), PropertyValue::LongInt(77)),
            (7, 16, floats(&[0.0, 0.0, 0.0, 1.0]), PropertyValue::Rotation(Quat::IDENTITY)),
        ];

        for (tag, size, payload, expected) in cases {
            let data = property_bytes("Prop", tag, size, &payload);
            let (property, warnings): (Property, _) =
                decode(&data, DecodeOptions::default()).unwrap();

            assert_eq!(property.type_tag(), tag);
            assert_eq!(property.value, expected);
            assert_eq!(property.flags, 0x10);
            assert_eq!(warnings, 0);
        }
    }

    #[test]
    fn unknown_tag_is_fatal() {
        for tag in [4, 8, 255] {
            let data = property_bytes("Flags", tag, 4, &[0; 4]);
            let error = decode::<Property>(&data, DecodeOptions::default()).unwrap_err();

            assert!(matches!(error.kind(), DecodeErrorKind::UnknownPropertyTag(t) if *t == tag));
            assert_eq!(error.offset(), 7);
        }
    }

    #[test]
    fn truncated_payload_is_not_zero_filled() {
        let data = property_bytes("Pos", 1, 12, &[0; 5]);
        let error = decode::<Property>(&data, DecodeOptions::default()).unwrap_err();

        assert!(matches!(error.kind(), DecodeErrorKind::UnexpectedEof { .. }));
        assert!(error.to_string().contains("in value"));
    }

    #[test]
    fn size_mismatch_is_a_warning_unless_strict() {
        let data = property_bytes("Range", 3, 8, &2.0f32.to_le_bytes());

        let (property, warnings): (Property, _) = decode(&data, DecodeOptions::default()).unwrap();
        assert_eq!(property.value, PropertyValue::Float(2.0));
        assert_eq!(property.declared_size, 8);
        assert_eq!(warnings, 1);

        let error = decode::<Property>(&data, DecodeOptions::default().strict()).unwrap_err();
        assert!(matches!(
            error.kind(),
            DecodeErrorKind::InconsistentLength { declared: 8, actual: 4, .. }
        ));
    }

    #[test]
    fn object_with_properties() {
        let mut data = vec![40, 0];
        data.extend_from_slice(&[5, 0]);
        data.extend_from_slice(b"Light");
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend(property_bytes("Name", 0, 8, &[6, 0, b'L', b'i', b'g', b'h', b't', b'0']));
        data.extend(property_bytes("LightRadius", 3, 4, &300.0f32.to_le_bytes()));

        let (object, _): (WorldObject, _) = decode(&data, DecodeOptions::default()).unwrap();
        assert_eq!(object.object_size, 40);
        assert_eq!(object.object_type, "Light");
        assert_eq!(object.properties.len(), 2);
        assert_eq!(object.name().unwrap(), "Light0");
        assert_eq!(
            object.property("lightradius").unwrap().value,
            PropertyValue::Float(300.0)
        );
    }

    #[test]
    fn blind_object() {
        let mut data = 3u32.to_le_bytes().to_vec();
        data.extend_from_slice(&0xBEEFu32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);

        let (blind, _): (BlindObject, _) = decode(&data, DecodeOptions::default()).unwrap();
        assert_eq!(blind.id, 0xBEEF);
        assert_eq!(blind.data, [1, 2, 3]);
    }

    #[test]
    fn kinds_cover_known_tags() {
        let tags: Vec<u8> = PropertyKind::ALL.iter().map(|&k| k.into()).collect();
        assert_eq!(tags, [0, 1, 2, 3, 5, 6, 7]);
    }
}
