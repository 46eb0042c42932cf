//! Polygon lists of the collision and particle blocker sections.

use crate::{
    decode::{Decode, Decoder},
    encode::{write_all, write_count, write_prefixed, Encode},
    error::{DecodeResult, DecodeResultExt, WarningKind},
    packed::PackedWriteExt,
    types::Plane,
};
use byteorder::{WriteBytesExt, LE};
use glam::Vec3;
use lithdat_utils::{ok, AnyResult};
use serde::Serialize;
use std::io::{Read, Seek, Write};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    pub plane: Plane,
    pub vertices: Vec<Vec3>,
}

impl Decode for Polygon {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            plane: d.read().field("plane")?,
            vertices: d.read_prefixed_vec().field("vertices")?,
        })
    }
}

impl Encode for Polygon {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_packed(&self.plane)?;
        write_count(w, self.vertices.len())?;
        write_all(w, &self.vertices)
    }
}

/// A `u32` count of polygons, the polygons, and a trailing zero word reserved for future use.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolygonList {
    pub polygons: Vec<Polygon>,
    pub trailer: u32,
}

impl PolygonList {
    pub(crate) fn decode_section<R: Read + Seek>(
        d: &mut Decoder<R>,
        section: &'static str,
    ) -> DecodeResult<Self> {
        let polygons = d.read_prefixed_vec().field("polygons")?;

        let trailer_offset = d.position();
        let trailer: u32 = d.read().field("trailer")?;
        if trailer != 0 {
            d.warn(
                trailer_offset,
                WarningKind::NonZeroTrailer {
                    section,
                    value: trailer,
                },
            )?;
        }

        Ok(Self { polygons, trailer })
    }
}

impl Encode for PolygonList {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_prefixed(w, &self.polygons)?;
        w.write_u32::<LE>(self.trailer)?;
        ok()
    }
}
