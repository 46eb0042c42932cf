//! Render data: the spatial tree of renderable geometry, with lightmaps and light groups.
//!
//! ```c
//! struct RenderData {
//!     u32                  node_count;
//!     RenderNode           nodes[node_count];
//!     u32                  world_model_count;
//!     WorldModelRenderNode world_models[world_model_count];
//!     u32                  light_group_count;
//!     WorldLightGroup      light_groups[light_group_count];
//! }
//! ```
//! Lightmaps and vertex intensities are compressed, and kept as opaque blobs.

use crate::{
    decode::{Decode, Decoder},
    encode::{write_all, write_prefixed, write_short_count, Encode},
    error::{DecodeError, DecodeErrorKind, DecodeResult, DecodeResultExt},
    packed::PackedWriteExt,
    types::{Blob, LString, Plane, Triangle, Vertex},
};
use anyhow::ensure;
use byteorder::{WriteBytesExt, LE};
use glam::Vec3;
use lithdat_proc::PackedData;
use lithdat_utils::{ok, AnyResult};
use serde::Serialize;
use std::io::{Read, Seek, Write};

/// Number of texture names of every render section.
pub const SECTION_TEXTURE_COUNT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderData {
    pub nodes: Vec<RenderNode>,
    pub world_models: Vec<WorldModelRenderNode>,
    pub light_groups: Vec<WorldLightGroup>,
}

impl Decode for RenderData {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            nodes: d.read_prefixed_vec().field("nodes")?,
            world_models: d.read_prefixed_vec().field("world_models")?,
            light_groups: d.read_prefixed_vec().field("light_groups")?,
        })
    }
}

impl Encode for RenderData {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_prefixed(w, &self.nodes)?;
        write_prefixed(w, &self.world_models)?;
        write_prefixed(w, &self.light_groups)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderNode {
    pub center: Vec3,
    pub half_dims: Vec3,
    pub sections: Vec<RenderSection>,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub sky_portals: Vec<SkyPortal>,
    pub occluders: Vec<Occluder>,
    pub light_groups: Vec<LightGroup>,
    /// Bit 0 and 1 tell whether the respective child index is used
    pub child_flags: u8,
    pub child_node_indices: [u32; 2],
}

impl RenderNode {
    /// Child node indices, with the ones not flagged as present left out.
    pub fn children(&self) -> [Option<u32>; 2] {
        let mut result = [None; 2];
        for (i, child) in result.iter_mut().enumerate() {
            if self.child_flags & (1 << i) != 0 {
                *child = Some(self.child_node_indices[i]);
            }
        }
        result
    }
}

impl Decode for RenderNode {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            center: d.read().field("center")?,
            half_dims: d.read().field("half_dims")?,
            sections: d.read_prefixed_vec().field("sections")?,
            vertices: d.read_prefixed_vec().field("vertices")?,
            triangles: d.read_prefixed_vec().field("triangles")?,
            sky_portals: d.read_prefixed_vec().field("sky_portals")?,
            occluders: d.read_prefixed_vec().field("occluders")?,
            light_groups: d.read_prefixed_vec().field("light_groups")?,
            child_flags: d.read().field("child_flags")?,
            child_node_indices: d.read().field("child_node_indices")?,
        })
    }
}

impl Encode for RenderNode {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_packed(&self.center)?;
        w.write_packed(&self.half_dims)?;
        write_prefixed(w, &self.sections)?;
        write_prefixed(w, &self.vertices)?;
        write_prefixed(w, &self.triangles)?;
        write_prefixed(w, &self.sky_portals)?;
        write_prefixed(w, &self.occluders)?;
        write_prefixed(w, &self.light_groups)?;
        w.write_u8(self.child_flags)?;
        w.write_packed(&self.child_node_indices)
    }
}

/// A batch of triangles sharing textures, shader and lightmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderSection {
    pub textures: [LString; SECTION_TEXTURE_COUNT],
    pub shader_code: u8,
    pub triangle_count: u32,
    pub texture_effect: LString,
    pub lightmap_width: u32,
    pub lightmap_height: u32,
    pub lightmap: Blob,
}

impl Decode for RenderSection {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            textures: [
                d.read().index(0).field("textures")?,
                d.read().index(1).field("textures")?,
            ],
            shader_code: d.read().field("shader_code")?,
            triangle_count: d.read().field("triangle_count")?,
            texture_effect: d.read().field("texture_effect")?,
            lightmap_width: d.read().field("lightmap_width")?,
            lightmap_height: d.read().field("lightmap_height")?,
            lightmap: d.read().field("lightmap")?,
        })
    }
}

impl Encode for RenderSection {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_all(w, &self.textures)?;
        w.write_u8(self.shader_code)?;
        w.write_u32::<LE>(self.triangle_count)?;
        w.write_packed(&self.texture_effect)?;
        w.write_u32::<LE>(self.lightmap_width)?;
        w.write_u32::<LE>(self.lightmap_height)?;
        w.write_packed(&self.lightmap)
    }
}

/// Convex polygon with a `u8` vertex count, shared by sky portals and occluders.
fn read_short_polygon<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Vec<Vec3>> {
    let count: u8 = d.read()?;
    d.read_vec(count.into())
}

fn write_short_polygon<W: Write>(w: &mut W, vertices: &[Vec3]) -> AnyResult {
    write_short_count(w, vertices.len())?;
    write_all(w, vertices)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkyPortal {
    pub vertices: Vec<Vec3>,
    pub plane: Plane,
}

impl Decode for SkyPortal {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            vertices: read_short_polygon(d).field("vertices")?,
            plane: d.read().field("plane")?,
        })
    }
}

impl Encode for SkyPortal {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_short_polygon(w, &self.vertices)?;
        w.write_packed(&self.plane)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Occluder {
    pub vertices: Vec<Vec3>,
    pub plane: Plane,
    pub id: u32,
}

impl Decode for Occluder {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            vertices: read_short_polygon(d).field("vertices")?,
            plane: d.read().field("plane")?,
            id: d.read().field("id")?,
        })
    }
}

impl Encode for Occluder {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_short_polygon(w, &self.vertices)?;
        w.write_packed(&self.plane)?;
        w.write_u32::<LE>(self.id)?;
        ok()
    }
}

/// Per-node data of a light group: vertex intensities and lightmap fix-ups of the node's sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightGroup {
    pub name: LString,
    pub color: Vec3,
    /// Zero compressed vertex intensities, decompressing needs the node's vertex count
    pub intensities: Blob,
    pub section_lightmaps: Vec<SectionLightmap>,
}

impl Decode for LightGroup {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            name: d.read().field("name")?,
            color: d.read().field("color")?,
            intensities: d.read().field("intensities")?,
            section_lightmaps: d.read_prefixed_vec().field("section_lightmaps")?,
        })
    }
}

impl Encode for LightGroup {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_packed(&self.name)?;
        w.write_packed(&self.color)?;
        w.write_packed(&self.intensities)?;
        write_prefixed(w, &self.section_lightmaps)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionLightmap {
    pub sub_lightmaps: Vec<SubLightmap>,
}

impl Decode for SectionLightmap {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            sub_lightmaps: d.read_prefixed_vec().field("sub_lightmaps")?,
        })
    }
}

impl Encode for SectionLightmap {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_prefixed(w, &self.sub_lightmaps)
    }
}

/// Rectangle of a section's lightmap replaced while the light group is on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, PackedData)]
pub struct SubLightmap {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// RLE compressed texels
    pub data: Blob,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldModelRenderNode {
    pub name: LString,
    pub nodes: Vec<RenderNode>,
    pub no_child_flag: u32,
}

impl Decode for WorldModelRenderNode {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            name: d.read().field("name")?,
            nodes: d.read_prefixed_vec().field("nodes")?,
            no_child_flag: d.read().field("no_child_flag")?,
        })
    }
}

impl Encode for WorldModelRenderNode {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_packed(&self.name)?;
        write_prefixed(w, &self.nodes)?;
        w.write_u32::<LE>(self.no_child_flag)?;
        ok()
    }
}

/// Light group intensity grid. The polygon data of the group lives in the render nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldLightGroup {
    pub name: LString,
    pub color: Vec3,
    pub offset: [u32; 3],
    pub size: [u32; 3],
    /// One byte per grid cell
    pub data: Vec<u8>,
}

impl WorldLightGroup {
    pub fn cell_count(&self) -> Option<u64> {
        self.size
            .iter()
            .try_fold(1u64, |acc, &n| acc.checked_mul(n.into()))
    }
}

impl Decode for WorldLightGroup {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let name = d.read().field("name")?;
        let color = d.read().field("color")?;
        let offset = d.read().field("offset")?;

        let size_offset = d.position();
        let size: [u32; 3] = d.read().field("size")?;

        let mut group = Self {
            name,
            color,
            offset,
            size,
            data: Vec::new(),
        };

        let cells = match group.cell_count().and_then(|n| usize::try_from(n).ok()) {
            Some(cells) => cells,
            None => {
                let kind = DecodeErrorKind::InconsistentLength {
                    what: "light group grid size",
                    declared: size.iter().fold(1u64, |acc, &n| acc.saturating_mul(n.into())),
                    actual: d.cursor().remaining(),
                };
                return Err(DecodeError::new(kind, size_offset)).field("size");
            }
        };
        group.data = d.read_bytes(cells).field("data")?;
        Ok(group)
    }
}

impl Encode for WorldLightGroup {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        ensure!(
            self.cell_count() == Some(self.data.len() as u64),
            "light group \"{}\" has {} bytes of data for a {:?} grid",
            self.name,
            self.data.len(),
            self.size
        );

        w.write_packed(&self.name)?;
        w.write_packed(&self.color)?;
        w.write_packed(&self.offset)?;
        w.write_packed(&self.size)?;
        w.write_all(&self.data)?;
        ok()
    }
}
