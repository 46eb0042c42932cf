//! World info, world tree and the BSP world models.
//!
//! Both are stored right after the header. The world tree owns every world model, each of them a
//! BSP decomposition of its geometry:
//! ```c
//! struct WorldModel {
//!     u32     reserved;
//!     u32     info_flags;
//!     LString name;
//!     u32     point_count, plane_count, surface_count, portal_count, polygon_count,
//!             leaf_count, polygon_vertex_count, visible_list_count, leaf_list_count,
//!             node_count;
//!     Vec3    bbox_min, bbox_max, translation;
//!     u32     texture_names_size;
//!     u32     texture_name_count;
//!     char    texture_names[texture_names_size]; // NUL-terminated names, back to back
//!     u8      polygon_vertex_counts[polygon_count];
//!     Plane   planes[plane_count];
//!     Surface surfaces[surface_count];
//!     Polygon polygons[polygon_count];
//!     Node    nodes[node_count];
//!     Vec3    points[point_count];
//!     i32     root_node;
//!     u32     section_count;
//! }
//! ```
//! Portals, leaves and visibility lists only have their counts stored.

use crate::{
    decode::{Decode, Decoder},
    encode::{write_all, write_count, write_prefixed, Encode},
    error::{DecodeError, DecodeErrorKind, DecodeResult, DecodeResultExt, WarningKind},
    packed::PackedWriteExt,
    types::{LString, Plane, Surface},
};
use anyhow::ensure;
use byteorder::{WriteBytesExt, LE};
use glam::Vec3;
use lithdat_utils::{bit_bytes, ok, AnyResult};
use serde::Serialize;
use std::io::{Read, Seek, Write};

/// World-wide information block, following the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldInfo {
    /// World properties string. Unlike other strings it has a `u32` length.
    pub properties: LString,
    pub extents_min: Vec3,
    pub extents_max: Vec3,
    pub world_offset: Vec3,
}

impl Decode for WorldInfo {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let len = d.read_count().field("properties")?;
        Ok(Self {
            properties: LString(d.read_bytes(len).field("properties")?),
            extents_min: d.read().field("extents_min")?,
            extents_max: d.read().field("extents_max")?,
            world_offset: d.read().field("world_offset")?,
        })
    }
}

impl Encode for WorldInfo {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        write_count(w, self.properties.len())?;
        w.write_all(self.properties.as_bytes())?;
        w.write_packed(&self.extents_min)?;
        w.write_packed(&self.extents_max)?;
        w.write_packed(&self.world_offset)?;
        ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldTree {
    pub root_min: Vec3,
    pub root_max: Vec3,
    pub sub_node_count: u32,
    pub terrain_depth: u32,
    /// Bit-packed layout of the tree nodes, one bit per node
    pub layout: Vec<u8>,
    pub world_models: Vec<WorldModel>,
}

impl Decode for WorldTree {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let root_min = d.read().field("root_min")?;
        let root_max = d.read().field("root_max")?;
        let sub_node_count: u32 = d.read().field("sub_node_count")?;
        let terrain_depth = d.read().field("terrain_depth")?;
        let layout = d
            .read_bytes(bit_bytes(sub_node_count.into()) as usize)
            .field("layout")?;

        Ok(Self {
            root_min,
            root_max,
            sub_node_count,
            terrain_depth,
            layout,
            world_models: d.read_prefixed_vec().field("world_models")?,
        })
    }
}

impl Encode for WorldTree {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        ensure!(
            self.layout.len() as u64 == bit_bytes(self.sub_node_count.into()),
            "world tree layout has {} bytes, {} nodes need {}",
            self.layout.len(),
            self.sub_node_count,
            bit_bytes(self.sub_node_count.into()),
        );

        w.write_packed(&self.root_min)?;
        w.write_packed(&self.root_max)?;
        w.write_u32::<LE>(self.sub_node_count)?;
        w.write_u32::<LE>(self.terrain_depth)?;
        w.write_all(&self.layout)?;
        write_prefixed(w, &self.world_models)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Leaf {
    Inside,
    Outside,
}

/// Child of a BSP node: either another node, or one of the two leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeChild {
    Node(u32),
    Leaf(Leaf),
}

impl NodeChild {
    pub const INSIDE: i32 = -1;
    pub const OUTSIDE: i32 = -2;

    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            Self::INSIDE => Some(NodeChild::Leaf(Leaf::Inside)),
            Self::OUTSIDE => Some(NodeChild::Leaf(Leaf::Outside)),
            index if index >= 0 => Some(NodeChild::Node(index as u32)),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            NodeChild::Node(index) => index as i32,
            NodeChild::Leaf(Leaf::Inside) => Self::INSIDE,
            NodeChild::Leaf(Leaf::Outside) => Self::OUTSIDE,
        }
    }

    pub const fn node_index(self) -> Option<u32> {
        match self {
            NodeChild::Node(index) => Some(index),
            NodeChild::Leaf(_) => None,
        }
    }
}

impl Decode for NodeChild {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let offset = d.position();
        let raw: i32 = d.read()?;
        NodeChild::from_raw(raw)
            .ok_or_else(|| DecodeError::new(DecodeErrorKind::InvalidNodeChild(raw), offset))
    }
}

impl Encode for NodeChild {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        if let NodeChild::Node(index) = *self {
            ensure!(
                index <= i32::MAX as u32,
                "BSP node index {index} doesn't fit a signed child reference"
            );
        }
        w.write_i32::<LE>(self.to_raw())?;
        ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WMNode {
    pub polygon: u32,
    pub reserved: u32,
    /// Front and back child
    pub children: [NodeChild; 2],
}

impl Decode for WMNode {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        Ok(Self {
            polygon: d.read().field("polygon")?,
            reserved: d.read().field("reserved")?,
            children: [
                d.read().index(0).field("children")?,
                d.read().index(1).field("children")?,
            ],
        })
    }
}

impl Encode for WMNode {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_u32::<LE>(self.polygon)?;
        w.write_u32::<LE>(self.reserved)?;
        write_all(w, &self.children)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WMPolygon {
    pub surface: u32,
    pub plane: u32,
    /// Indices into the model's points
    pub vertices: Vec<u32>,
}

impl WMPolygon {
    /// Polygons don't store their own vertex count, it comes from the model's count table.
    fn read_with_count<R: Read + Seek>(d: &mut Decoder<R>, count: u8) -> DecodeResult<Self> {
        Ok(Self {
            surface: d.read().field("surface")?,
            plane: d.read().field("plane")?,
            vertices: d.read_vec(count.into()).field("vertices")?,
        })
    }
}

impl Encode for WMPolygon {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_u32::<LE>(self.surface)?;
        w.write_u32::<LE>(self.plane)?;
        write_all(w, &self.vertices)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldModel {
    pub reserved: u32,
    pub info_flags: u32,
    pub name: LString,
    pub portal_count: u32,
    pub leaf_count: u32,
    /// Total vertex index count of all polygons, as declared
    pub polygon_vertex_count: u32,
    pub visible_list_count: u32,
    pub leaf_list_count: u32,
    pub bbox_min: Vec3,
    pub bbox_max: Vec3,
    pub translation: Vec3,
    pub texture_names: Vec<LString>,
    pub planes: Vec<Plane>,
    pub surfaces: Vec<Surface>,
    pub polygons: Vec<WMPolygon>,
    pub nodes: Vec<WMNode>,
    pub points: Vec<Vec3>,
    pub root_node: NodeChild,
    pub section_count: u32,
}

impl WorldModel {
    /// Resolves a node child. Leaves and out of range indices give `None`.
    pub fn child_node(&self, child: NodeChild) -> Option<&WMNode> {
        child
            .node_index()
            .and_then(|index| self.nodes.get(index as usize))
    }

    fn texture_names_blob(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        for name in &self.texture_names {
            blob.extend_from_slice(name.as_bytes());
            blob.push(0);
        }
        blob
    }

    /// Checks the node references against the node array.
    fn check_nodes<R: Read + Seek>(&self, d: &mut Decoder<R>, offset: u64) -> DecodeResult<()> {
        let node_count = self.nodes.len();
        let children = self.nodes.iter().flat_map(|node| node.children.iter());

        for child in children.chain(std::iter::once(&self.root_node)) {
            if let Some(index) = child.node_index() {
                if index as usize >= node_count {
                    d.warn(offset, WarningKind::DanglingNodeChild { index, node_count })?;
                }
            }
        }
        Ok(())
    }
}

/// Splits a table of NUL-terminated names. The last name may lack its terminator.
fn split_texture_names(blob: &[u8]) -> Vec<LString> {
    if blob.is_empty() {
        return Vec::new();
    }

    let mut names: Vec<LString> = blob
        .split(|&byte| byte == 0)
        .map(|name| LString(name.to_vec()))
        .collect();

    // A final terminator leaves an empty piece behind it, which isn't a name
    if blob.ends_with(&[0]) {
        names.pop();
    }
    names
}

impl Decode for WorldModel {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        let start = d.position();
        let reserved = d.read().field("reserved")?;
        let info_flags = d.read().field("info_flags")?;
        let name = d.read().field("name")?;

        let point_count = d.read_count().field("point_count")?;
        let plane_count = d.read_count().field("plane_count")?;
        let surface_count = d.read_count().field("surface_count")?;
        let portal_count = d.read().field("portal_count")?;
        let polygon_count = d.read_count().field("polygon_count")?;
        let leaf_count = d.read().field("leaf_count")?;
        let polygon_vertex_count: u32 = d.read().field("polygon_vertex_count")?;
        let visible_list_count = d.read().field("visible_list_count")?;
        let leaf_list_count = d.read().field("leaf_list_count")?;
        let node_count = d.read_count().field("node_count")?;

        let bbox_min = d.read().field("bbox_min")?;
        let bbox_max = d.read().field("bbox_max")?;
        let translation = d.read().field("translation")?;

        let names_size = d.read_count().field("texture_names_size")?;
        let name_count: u32 = d.read().field("texture_name_count")?;
        let texture_names = split_texture_names(&d.read_bytes(names_size).field("texture_names")?);
        if texture_names.len() as u64 != u64::from(name_count) {
            d.warn(
                start,
                WarningKind::TextureNameCount {
                    declared: name_count,
                    actual: texture_names.len() as u64,
                },
            )?;
        }

        let vertex_counts: Vec<u8> = d.read_vec(polygon_count).field("polygon_vertex_counts")?;
        let actual_vertex_count: u64 = vertex_counts.iter().map(|&n| u64::from(n)).sum();
        if actual_vertex_count != u64::from(polygon_vertex_count) {
            d.warn(
                start,
                WarningKind::VertexIndexCount {
                    declared: polygon_vertex_count,
                    actual: actual_vertex_count,
                },
            )?;
        }

        let planes = d.read_vec(plane_count).field("planes")?;
        let surfaces = d.read_vec(surface_count).field("surfaces")?;

        let mut counts = vertex_counts.into_iter();
        let polygons = d
            .read_vec_with(polygon_count, |d| {
                WMPolygon::read_with_count(d, counts.next().unwrap_or_default())
            })
            .field("polygons")?;

        let model = Self {
            reserved,
            info_flags,
            name,
            portal_count,
            leaf_count,
            polygon_vertex_count,
            visible_list_count,
            leaf_list_count,
            bbox_min,
            bbox_max,
            translation,
            texture_names,
            planes,
            surfaces,
            polygons,
            nodes: d.read_vec(node_count).field("nodes")?,
            points: d.read_vec(point_count).field("points")?,
            root_node: d.read().field("root_node")?,
            section_count: d.read().field("section_count")?,
        };

        model.check_nodes(d, start)?;
        Ok(model)
    }
}

impl Encode for WorldModel {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_u32::<LE>(self.reserved)?;
        w.write_u32::<LE>(self.info_flags)?;
        w.write_packed(&self.name)?;

        write_count(w, self.points.len())?;
        write_count(w, self.planes.len())?;
        write_count(w, self.surfaces.len())?;
        w.write_u32::<LE>(self.portal_count)?;
        write_count(w, self.polygons.len())?;
        w.write_u32::<LE>(self.leaf_count)?;
        w.write_u32::<LE>(self.polygon_vertex_count)?;
        w.write_u32::<LE>(self.visible_list_count)?;
        w.write_u32::<LE>(self.leaf_list_count)?;
        write_count(w, self.nodes.len())?;

        w.write_packed(&self.bbox_min)?;
        w.write_packed(&self.bbox_max)?;
        w.write_packed(&self.translation)?;

        let names = self.texture_names_blob();
        write_count(w, names.len())?;
        write_count(w, self.texture_names.len())?;
        w.write_all(&names)?;

        for polygon in &self.polygons {
            ensure!(
                polygon.vertices.len() <= u8::MAX as usize,
                "polygon with {} vertices doesn't fit the vertex count table",
                polygon.vertices.len()
            );
            w.write_u8(polygon.vertices.len() as u8)?;
        }

        write_all(w, &self.planes)?;
        write_all(w, &self.surfaces)?;
        write_all(w, &self.polygons)?;
        write_all(w, &self.nodes)?;
        write_all(w, &self.points)?;
        self.root_node.encode(w)?;
        w.write_u32::<LE>(self.section_count)?;
        ok()
    }
}
