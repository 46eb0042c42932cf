//! The whole world file: header, world info and tree, and the offset-addressed sections.

use crate::{
    cursor::ByteCursor,
    decode::{DecodeOptions, Decoder, SectionFlags},
    encode::{write_prefixed, Encode},
    error::{DecodeResult, DecodeResultExt, DecodeWarning},
    header::{SectionKind, WorldHeader, HEADER_SIZE},
    lightgrid::LightGrid,
    object::{BlindObject, WorldObject},
    packed::PackedWriteExt,
    physics::PolygonList,
    render::RenderData,
    tree::{WorldInfo, WorldTree},
};
use anyhow::anyhow;
use lithdat_utils::{AnyResult, AnyhowResultExt};
use log::{debug, trace};
use serde::Serialize;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// A section that's either fully decoded, or was deferred with [`DecodeOptions::defer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SectionData<T> {
    Decoded(T),
    Deferred(DeferredSection),
}

impl<T> SectionData<T> {
    pub fn decoded(&self) -> Option<&T> {
        match self {
            SectionData::Decoded(value) => Some(value),
            SectionData::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, SectionData::Deferred(_))
    }
}

/// Location of a section that wasn't decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeferredSection {
    pub offset: u64,
    /// The section's leading element count, for sections that start with one
    pub prefix: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldDocument {
    pub header: WorldHeader,
    /// Deferred along with the world tree. A deferred pair records the end of the header as the
    /// offset of both.
    pub info: SectionData<WorldInfo>,
    pub world_tree: SectionData<WorldTree>,
    pub world_objects: Vec<WorldObject>,
    pub blind_objects: Vec<BlindObject>,
    pub light_grid: SectionData<LightGrid>,
    pub collision: SectionData<PolygonList>,
    pub particle_blockers: SectionData<PolygonList>,
    pub render_data: SectionData<RenderData>,
    /// Anomalies found while decoding. Always empty in strict mode.
    #[serde(skip)]
    pub warnings: Vec<DecodeWarning>,
}

impl WorldDocument {
    /// Decodes a whole world with default options.
    pub fn decode<R: Read + Seek>(reader: R) -> DecodeResult<Self> {
        Self::decode_with(reader, DecodeOptions::default())
    }

    pub fn decode_with<R: Read + Seek>(reader: R, options: DecodeOptions) -> DecodeResult<Self> {
        Self::decode_from(Decoder::new(ByteCursor::new(reader)?, options))
    }

    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        Self::decode_from(Decoder::new(
            ByteCursor::from_bytes(bytes),
            DecodeOptions::default(),
        ))
    }

    /// Decodes a whole world from the start of the decoder's source.
    ///
    /// Every section offset is validated before any section is decoded. The first error aborts
    /// decoding, and is annotated with the section it happened in.
    pub fn decode_from<R: Read + Seek>(mut d: Decoder<R>) -> DecodeResult<Self> {
        d.seek(0)?;
        let header: WorldHeader = d.read().section("header", 0)?;
        header.validate(d.cursor().len())?;
        trace!(
            "world version {}, {} bytes, packer {}/{}",
            header.version,
            d.cursor().len(),
            header.packer_type,
            header.packer_version
        );

        let (info, world_tree) = if d.options().deferred.contains(SectionFlags::WORLD_TREE) {
            debug!("deferring world info and tree at {HEADER_SIZE}");
            let deferred = DeferredSection {
                offset: HEADER_SIZE,
                prefix: None,
            };
            (SectionData::Deferred(deferred), SectionData::Deferred(deferred))
        } else {
            d.seek(HEADER_SIZE).section("world info", HEADER_SIZE)?;
            let info = d.read().section("world info", HEADER_SIZE)?;
            let tree_offset = d.position();
            let tree = d.read().section("world tree", tree_offset)?;
            (SectionData::Decoded(info), SectionData::Decoded(tree))
        };

        let world_objects =
            decode_section(&mut d, &header, SectionKind::WorldObjects, |d| d.read_prefixed_vec())?;
        let blind_objects =
            decode_section(&mut d, &header, SectionKind::BlindObjects, |d| d.read_prefixed_vec())?;
        let light_grid =
            decode_deferrable(&mut d, &header, SectionKind::LightGrid, false, |d| d.read())?;
        let collision = decode_deferrable(&mut d, &header, SectionKind::Collision, true, |d| {
            PolygonList::decode_section(d, SectionKind::Collision.label())
        })?;
        let particle_blockers =
            decode_deferrable(&mut d, &header, SectionKind::ParticleBlockers, true, |d| {
                PolygonList::decode_section(d, SectionKind::ParticleBlockers.label())
            })?;
        let render_data =
            decode_deferrable(&mut d, &header, SectionKind::RenderData, true, |d| d.read())?;

        let (_, warnings) = d.into_parts();
        Ok(Self {
            header,
            info,
            world_tree,
            world_objects,
            blind_objects,
            light_grid,
            collision,
            particle_blockers,
            render_data,
            warnings,
        })
    }

    /// Encodes the document into a fresh buffer.
    pub fn to_bytes(&self) -> AnyResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        WorldWriter::new(&mut buffer).write(self)?;
        Ok(buffer.into_inner())
    }
}

fn decode_section<R, T, F>(
    d: &mut Decoder<R>,
    header: &WorldHeader,
    kind: SectionKind,
    f: F,
) -> DecodeResult<T>
where
    R: Read + Seek,
    F: FnOnce(&mut Decoder<R>) -> DecodeResult<T>,
{
    let offset = u64::from(header.section_offset(kind));
    trace!("decoding {} at {offset}", kind.label());

    d.seek(offset)
        .and_then(|()| f(d))
        .section(kind.label(), offset)
}

/// Decodes a section, unless it's deferred. A deferred section with a `prefixed` layout still has
/// its leading count read.
fn decode_deferrable<R, T, F>(
    d: &mut Decoder<R>,
    header: &WorldHeader,
    kind: SectionKind,
    prefixed: bool,
    f: F,
) -> DecodeResult<SectionData<T>>
where
    R: Read + Seek,
    F: FnOnce(&mut Decoder<R>) -> DecodeResult<T>,
{
    let deferred = kind
        .defer_flag()
        .map_or(false, |flag| d.options().deferred.contains(flag));
    if !deferred {
        return decode_section(d, header, kind, f).map(SectionData::Decoded);
    }

    let prefix = decode_section(d, header, kind, |d| {
        if prefixed {
            d.read::<u32>().field("count").map(Some)
        } else {
            Ok(None)
        }
    })?;
    let offset = u64::from(header.section_offset(kind));
    debug!("deferring {} at {offset} (prefix {prefix:?})", kind.label());

    Ok(SectionData::Deferred(DeferredSection { offset, prefix }))
}

/// Writes a [`WorldDocument`] back into its binary form.
///
/// Sections are written back to back, in the order they're decoded, and the header offsets are
/// patched once their positions are known. Deferred sections can't be written.
pub struct WorldWriter<W> {
    inner: W,
}

impl<W: Write + Seek> WorldWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes the document at the current position of the writer, returning the header as it was
    /// written. Offsets are relative to the starting position.
    pub fn write(&mut self, doc: &WorldDocument) -> AnyResult<WorldHeader> {
        let start = self.inner.stream_position()?;
        let mut header = doc.header;

        // Placeholder, patched below
        self.inner.write_packed(&header)?;
        decoded(&doc.info, "world info")?.encode(&mut self.inner)?;
        decoded(&doc.world_tree, "world tree")?.encode(&mut self.inner)?;

        for &kind in SectionKind::ALL {
            let offset = self.inner.stream_position()? - start;
            let offset = u32::try_from(offset)
                .map_err(|_| anyhow!("{} section starts past 4 GiB", kind.label()))?;
            header.set_section_offset(kind, offset);

            let w = &mut self.inner;
            match kind {
                SectionKind::WorldObjects => write_prefixed(w, &doc.world_objects)?,
                SectionKind::BlindObjects => write_prefixed(w, &doc.blind_objects)?,
                SectionKind::LightGrid => decoded(&doc.light_grid, kind.label())?.encode(w)?,
                SectionKind::Collision => decoded(&doc.collision, kind.label())?.encode(w)?,
                SectionKind::ParticleBlockers => {
                    decoded(&doc.particle_blockers, kind.label())?.encode(w)?
                }
                SectionKind::RenderData => decoded(&doc.render_data, kind.label())?.encode(w)?,
            }
        }

        let end = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(start))?;
        self.inner.write_packed(&header)?;
        self.inner.seek(SeekFrom::Start(end))?;

        debug!("wrote world of {} bytes", end - start);
        Ok(header)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn decoded<'a, T>(section: &'a SectionData<T>, label: &str) -> AnyResult<&'a T> {
    section
        .decoded()
        .otherwise(format!("{label} section is deferred, and can't be written"))
}
