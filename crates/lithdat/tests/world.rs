use glam::{Quat, Vec3};
use lithdat::{
    header::HEADER_SIZE,
    lightgrid::LightGrid,
    object::{BlindObject, Property, PropertyKind, PropertyValue, WorldObject},
    physics::{Polygon, PolygonList},
    render::{RenderData, RenderNode, RenderSection, WorldLightGroup, WorldModelRenderNode},
    tree::{Leaf, NodeChild, WMNode, WMPolygon, WorldInfo, WorldModel, WorldTree},
    types::{Color, Plane, Surface, Triangle, Vertex},
    DecodeErrorKind, DecodeOptions, SectionData, SectionFlags, WarningKind, WorldDocument,
    WorldHeader,
};
use std::io::Cursor;

/// Little endian byte builder for hand-made files.
#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn pos(&self) -> u32 {
        self.0.len() as u32
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn vec3(&mut self, v: [f32; 3]) -> &mut Self {
        v.iter().fold(self, |b, &c| b.f32(c))
    }

    fn string(&mut self, s: &str) -> &mut Self {
        self.u16(s.len() as u16);
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.0.extend_from_slice(data);
        self
    }

    fn patch_u32(&mut self, at: usize, v: u32) {
        self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

fn property(name: &str, tag: u8, declared_size: u16, payload: &[u8]) -> Vec<u8> {
    let mut b = Bytes::default();
    b.string(name).u8(tag).u32(0).u16(declared_size).bytes(payload);
    b.0
}

fn object(object_type: &str, properties: &[Vec<u8>]) -> Vec<u8> {
    let mut b = Bytes::default();
    b.u16(0x40).string(object_type).u32(properties.len() as u32);
    for p in properties {
        b.bytes(p);
    }
    b.0
}

/// A minimal world file with every section empty, and the world objects stored last.
fn raw_world(object_section: &[u8]) -> Vec<u8> {
    let mut b = Bytes::default();
    b.u32(1);
    b.bytes(&[0; HEADER_SIZE as usize - 4]);

    // World info and an empty world tree
    b.u32(0).vec3([-1.0; 3]).vec3([1.0; 3]).vec3([0.0; 3]);
    b.vec3([-1.0; 3]).vec3([1.0; 3]).u32(0).u32(0).u32(0);

    let blind = b.pos();
    b.u32(0);
    let light_grid = b.pos();
    b.vec3([0.0; 3]).vec3([64.0; 3]).u32(0).u32(0).u32(0).u32(0);
    let collision = b.pos();
    b.u32(0).u32(0);
    let particle_blockers = b.pos();
    b.u32(0).u32(0);
    let render = b.pos();
    b.u32(0).u32(0).u32(0);
    let objects = b.pos();
    b.bytes(object_section);

    for (i, pos) in [objects, blind, light_grid, collision, particle_blockers, render]
        .into_iter()
        .enumerate()
    {
        b.patch_u32(4 + 4 * i, pos);
    }
    b.0
}

fn two_objects() -> Vec<u8> {
    let mut section = Bytes::default();
    section.u32(2);
    section.bytes(&object(
        "Light",
        &[
            property("Name", 0, 8, &[6, 0, b'L', b'i', b'g', b'h', b't', b'0']),
            property("LightRadius", 3, 4, &300.0f32.to_le_bytes()),
        ],
    ));
    section.bytes(&object(
        "WorldProperties",
        &[property("Pos", 1, 12, &[0; 12]), property("Enabled", 5, 1, &[1])],
    ));
    section.0
}

#[test]
fn decodes_two_objects() {
    let data = raw_world(&two_objects());
    let world = WorldDocument::from_bytes(&data).unwrap();

    assert_eq!(world.header.version, 1);
    assert_eq!(world.world_objects.len(), 2);
    assert!(world.warnings.is_empty());

    let light = &world.world_objects[0];
    assert_eq!(light.object_type, "Light");
    assert_eq!(light.name().unwrap(), "Light0");
    let radius = light.property("lightradius").unwrap();
    assert_eq!(radius.kind(), PropertyKind::Float);
    assert_eq!(radius.value, PropertyValue::Float(300.0));

    let props = &world.world_objects[1];
    assert_eq!(props.property("Enabled").unwrap().value, PropertyValue::Bool(true));
    assert_eq!(props.property("Pos").unwrap().type_tag(), 1);
    assert!(props.property("Missing").is_none());
}

#[test]
fn empty_object_list() {
    let data = raw_world(&0u32.to_le_bytes());
    let world = WorldDocument::from_bytes(&data).unwrap();
    assert!(world.world_objects.is_empty());
}

#[test]
fn offset_past_the_end_is_rejected_first() {
    let mut data = raw_world(&two_objects());
    let len = data.len() as u32;
    data[4..8].copy_from_slice(&(len + 1).to_le_bytes());

    let error = WorldDocument::from_bytes(&data).unwrap_err();
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::InvalidOffset { offset, .. } if *offset == u64::from(len) + 1
    ));
    assert_eq!(error.section(), Some("world objects"));
    assert_eq!(error.offset(), 4);
}

#[test]
fn truncated_property_is_an_error() {
    let mut data = raw_world(&two_objects());
    // Cut into the payload of the last `Enabled` property
    data.truncate(data.len() - 1);

    let error = WorldDocument::from_bytes(&data).unwrap_err();
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::UnexpectedEof {
            needed: 1,
            available: 0
        }
    ));
    assert_eq!(error.section(), Some("world objects"));
    assert!(error.to_string().ends_with("> [1] > properties > [1] > value"));
}

#[test]
fn unknown_property_tag_is_an_error() {
    let mut section = Bytes::default();
    section.u32(1);
    section.bytes(&object("Flags", &[property("Bits", 4, 4, &[0; 4])]));
    let data = raw_world(&section.0);

    let error = WorldDocument::from_bytes(&data).unwrap_err();
    assert!(matches!(error.kind(), DecodeErrorKind::UnknownPropertyTag(4)));
}

#[test]
fn size_mismatch_is_a_warning_unless_strict() {
    let mut section = Bytes::default();
    section.u32(1);
    section.bytes(&object("Prop", &[property("Scale", 3, 12, &1.5f32.to_le_bytes())]));
    let data = raw_world(&section.0);

    let world = WorldDocument::from_bytes(&data).unwrap();
    assert_eq!(world.world_objects[0].properties[0].value, PropertyValue::Float(1.5));
    assert_eq!(world.warnings.len(), 1);
    assert!(matches!(
        world.warnings[0].kind,
        WarningKind::PropertySize {
            declared: 12,
            expected: 4,
            ..
        }
    ));

    let strict = DecodeOptions::default().strict();
    let error = WorldDocument::decode_with(Cursor::new(&data), strict).unwrap_err();
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::InconsistentLength { .. }
    ));
}

fn full_world() -> WorldDocument {
    let model = WorldModel {
        reserved: 0,
        info_flags: 0,
        name: "WorldModel0".into(),
        portal_count: 0,
        leaf_count: 2,
        polygon_vertex_count: 4,
        visible_list_count: 0,
        leaf_list_count: 0,
        bbox_min: Vec3::splat(-128.0),
        bbox_max: Vec3::splat(128.0),
        translation: Vec3::ZERO,
        texture_names: vec!["Tex\\Ground.dtx".into()],
        planes: vec![Plane {
            normal: Vec3::Y,
            dist: -16.0,
        }],
        surfaces: vec![Surface {
            flags: 1,
            texture: 0,
            texture_flags: 0,
        }],
        polygons: vec![WMPolygon {
            surface: 0,
            plane: 0,
            vertices: vec![0, 1, 2, 3],
        }],
        nodes: vec![WMNode {
            polygon: 0,
            reserved: 0,
            children: [NodeChild::Leaf(Leaf::Outside), NodeChild::Leaf(Leaf::Inside)],
        }],
        points: vec![
            Vec3::new(-128.0, 0.0, -128.0),
            Vec3::new(128.0, 0.0, -128.0),
            Vec3::new(128.0, 0.0, 128.0),
            Vec3::new(-128.0, 0.0, 128.0),
        ],
        root_node: NodeChild::Node(0),
        section_count: 1,
    };

    let render_node = RenderNode {
        center: Vec3::ZERO,
        half_dims: Vec3::splat(128.0),
        sections: vec![RenderSection {
            textures: ["Tex\\Ground.dtx".into(), Default::default()],
            triangle_count: 2,
            lightmap_width: 2,
            lightmap_height: 2,
            lightmap: vec![0x83, 1, 2, 3, 4].into(),
            ..Default::default()
        }],
        vertices: vec![Vertex::default(); 4],
        triangles: vec![
            Triangle {
                indices: [0, 1, 2],
                polygon: 0,
            },
            Triangle {
                indices: [0, 2, 3],
                polygon: 0,
            },
        ],
        child_flags: 0b01,
        child_node_indices: [1, 0],
        ..Default::default()
    };

    WorldDocument {
        header: WorldHeader {
            version: 85,
            packer_type: 1,
            packer_version: 2,
            ..Default::default()
        },
        info: SectionData::Decoded(WorldInfo {
            properties: "FarZ 10000; SkyFogEnabled 0".into(),
            extents_min: Vec3::splat(-128.0),
            extents_max: Vec3::splat(128.0),
            world_offset: Vec3::new(0.0, 16.0, 0.0),
        }),
        world_tree: SectionData::Decoded(WorldTree {
            root_min: Vec3::splat(-128.0),
            root_max: Vec3::splat(128.0),
            sub_node_count: 9,
            terrain_depth: 1,
            layout: vec![0b1000_0000, 0],
            world_models: vec![model],
        }),
        world_objects: vec![WorldObject {
            object_size: 0,
            object_type: "StartPoint".into(),
            properties: vec![
                Property::new("Name", PropertyValue::String("StartPoint0".into())),
                Property::new("Pos", PropertyValue::Vector(Vec3::new(1.0, 2.0, 3.0))),
                Property::new("Color", PropertyValue::Color(Color { r: 255.0, g: 255.0, b: 0.0 })),
                Property::new("Rotation", PropertyValue::Rotation(Quat::IDENTITY)),
                Property::new("Team", PropertyValue::LongInt(2)),
            ],
        }],
        blind_objects: vec![BlindObject {
            id: 0x1234,
            data: vec![9, 8, 7],
        }],
        light_grid: SectionData::Decoded(LightGrid {
            lookup_start: Vec3::splat(-128.0),
            block_size: Vec3::splat(64.0),
            lookup_size: [4, 1, 4],
            data: vec![0xFF, 15, 0x20, 0x20, 0x20].into(),
        }),
        collision: SectionData::Decoded(PolygonList {
            polygons: vec![Polygon {
                plane: Plane {
                    normal: Vec3::Y,
                    dist: 0.0,
                },
                vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            }],
            trailer: 0,
        }),
        particle_blockers: SectionData::Decoded(PolygonList::default()),
        render_data: SectionData::Decoded(RenderData {
            nodes: vec![render_node.clone(), RenderNode::default()],
            world_models: vec![WorldModelRenderNode {
                name: "Door".into(),
                nodes: vec![render_node],
                no_child_flag: 0,
            }],
            light_groups: vec![WorldLightGroup {
                name: "Torch".into(),
                color: Vec3::new(1.0, 0.6, 0.2),
                offset: [0, 0, 0],
                size: [2, 2, 1],
                data: vec![10, 20, 30, 40],
            }],
        }),
        warnings: Vec::new(),
    }
}

#[test]
fn synthetic_world_survives_encoding() {
    let world = full_world();
    let data = world.to_bytes().unwrap();

    let strict = DecodeOptions::default().strict();
    let decoded = WorldDocument::decode_with(Cursor::new(&data), strict).unwrap();

    // Offsets are filled in by the writer, everything else has to match
    assert_eq!(decoded.header.version, 85);
    assert_eq!(
        WorldDocument {
            header: world.header,
            ..decoded.clone()
        },
        world
    );
    assert_eq!(decoded.to_bytes().unwrap(), data);

    let nodes = &decoded.render_data.decoded().unwrap().nodes;
    assert_eq!(nodes[0].children(), [Some(1), None]);
}

#[test]
fn deferred_sections_skip_broken_payloads() {
    let world = full_world();
    let mut data = world.to_bytes().unwrap();
    let decoded = WorldDocument::from_bytes(&data).unwrap();

    // Corrupt the first render node's section count
    let at = decoded.header.render_data_pos as usize + 4 + 24;
    data[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());

    let error = WorldDocument::from_bytes(&data).unwrap_err();
    assert_eq!(error.section(), Some("render data"));

    let options = DecodeOptions::default().defer(SectionFlags::RENDER_DATA);
    let partial = WorldDocument::decode_with(Cursor::new(&data), options).unwrap();
    match partial.render_data {
        SectionData::Deferred(section) => {
            assert_eq!(section.offset, u64::from(decoded.header.render_data_pos));
            assert_eq!(section.prefix, Some(2));
        }
        SectionData::Decoded(_) => panic!("render data should be deferred"),
    }
    assert_eq!(partial.world_objects, world.world_objects);
    assert_eq!(partial.light_grid, world.light_grid);
}

#[test]
fn deferred_world_tree_allows_sections_after_the_header() {
    let mut b = Bytes::default();
    b.u32(1);
    b.bytes(&[0; HEADER_SIZE as usize - 4]);

    // The light grid takes the place of the world info
    let light_grid = b.pos();
    b.vec3([-512.0, -128.0, -512.0]).vec3([64.0; 3]);
    b.u32(16).u32(4).u32(16).u32(0);
    let blind = b.pos();
    b.u32(0);
    let collision = b.pos();
    b.u32(0).u32(0);
    let particle_blockers = b.pos();
    b.u32(0).u32(0);
    let render = b.pos();
    b.u32(0).u32(0).u32(0);
    let objects = b.pos();
    b.u32(0);
    for (i, pos) in [objects, blind, light_grid, collision, particle_blockers, render]
        .into_iter()
        .enumerate()
    {
        b.patch_u32(4 + 4 * i, pos);
    }
    let data = b.0;
    assert_eq!(light_grid as u64, HEADER_SIZE);

    let error = WorldDocument::from_bytes(&data).unwrap_err();
    assert_eq!(error.section(), Some("world info"));

    let options = DecodeOptions::default().defer(SectionFlags::WORLD_TREE);
    let world = WorldDocument::decode_with(Cursor::new(&data), options).unwrap();
    assert!(world.info.is_deferred());
    assert!(world.world_tree.is_deferred());
    let grid = world.light_grid.decoded().unwrap();
    assert_eq!(grid.lookup_start, Vec3::new(-512.0, -128.0, -512.0));
    assert_eq!(grid.lookup_size, [16, 4, 16]);
    assert!(world.world_objects.is_empty());

    let options = DecodeOptions::default().defer(SectionFlags::all());
    let world = WorldDocument::decode_with(Cursor::new(&data), options).unwrap();
    assert!(world.info.is_deferred());
    assert!(world.light_grid.is_deferred());
    assert!(world.render_data.is_deferred());
}
