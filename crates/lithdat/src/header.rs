//! World file header.
//!
//! ```c
//! struct WorldHeader {
//!     u32 version;
//!     u32 object_data_pos;
//!     u32 blind_object_data_pos;
//!     u32 light_grid_pos;
//!     u32 collision_data_pos;
//!     u32 particle_blocker_data_pos;
//!     u32 render_data_pos;
//!     u32 packer_type;
//!     u32 packer_version;
//!     u32 future[6];
//! }
//! ```
//! All positions are absolute offsets from the start of the file.

use crate::{
    decode::SectionFlags,
    error::{DecodeError, DecodeErrorKind, DecodeResult, DecodeResultExt},
};
use lithdat_proc::{ext_repr, PackedData};
use serde::Serialize;

/// Size of the header on disk. The world info block starts right after it.
pub const HEADER_SIZE: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, PackedData)]
pub struct WorldHeader {
    pub version: u32,
    pub object_data_pos: u32,
    pub blind_object_data_pos: u32,
    pub light_grid_pos: u32,
    pub collision_data_pos: u32,
    pub particle_blocker_data_pos: u32,
    pub render_data_pos: u32,
    pub packer_type: u32,
    pub packer_version: u32,
    pub future: [u32; 6],
}

/// The offset-addressed sections, in the order they're decoded and written.
#[ext_repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    WorldObjects,
    BlindObjects,
    LightGrid,
    Collision,
    ParticleBlockers,
    RenderData,
}

impl SectionKind {
    /// Human readable name, used in error paths and logs.
    pub const fn label(self) -> &'static str {
        match self {
            SectionKind::WorldObjects => "world objects",
            SectionKind::BlindObjects => "blind objects",
            SectionKind::LightGrid => "light grid",
            SectionKind::Collision => "collision",
            SectionKind::ParticleBlockers => "particle blockers",
            SectionKind::RenderData => "render data",
        }
    }

    /// Flag that defers decoding of this section. World and blind objects can't be deferred.
    pub const fn defer_flag(self) -> Option<SectionFlags> {
        match self {
            SectionKind::WorldObjects | SectionKind::BlindObjects => None,
            SectionKind::LightGrid => Some(SectionFlags::LIGHT_GRID),
            SectionKind::Collision => Some(SectionFlags::COLLISION),
            SectionKind::ParticleBlockers => Some(SectionFlags::PARTICLE_BLOCKERS),
            SectionKind::RenderData => Some(SectionFlags::RENDER_DATA),
        }
    }

    /// Position of the section's offset field within the header.
    pub const fn header_field_offset(self) -> u64 {
        4 + 4 * self as u64
    }
}

impl WorldHeader {
    pub fn section_offset(&self, kind: SectionKind) -> u32 {
        match kind {
            SectionKind::WorldObjects => self.object_data_pos,
            SectionKind::BlindObjects => self.blind_object_data_pos,
            SectionKind::LightGrid => self.light_grid_pos,
            SectionKind::Collision => self.collision_data_pos,
            SectionKind::ParticleBlockers => self.particle_blocker_data_pos,
            SectionKind::RenderData => self.render_data_pos,
        }
    }

    pub fn set_section_offset(&mut self, kind: SectionKind, offset: u32) {
        let slot = match kind {
            SectionKind::WorldObjects => &mut self.object_data_pos,
            SectionKind::BlindObjects => &mut self.blind_object_data_pos,
            SectionKind::LightGrid => &mut self.light_grid_pos,
            SectionKind::Collision => &mut self.collision_data_pos,
            SectionKind::ParticleBlockers => &mut self.particle_blocker_data_pos,
            SectionKind::RenderData => &mut self.render_data_pos,
        };
        *slot = offset;
    }

    /// Checks every section offset against the length of the file. Zero is never a valid
    /// offset, and an offset may point at the very end of the file, but not past it.
    ///
    /// The error is located at the offending header field.
    pub fn validate(&self, len: u64) -> DecodeResult<()> {
        for &kind in SectionKind::ALL {
            let offset = u64::from(self.section_offset(kind));
            if offset == 0 || offset > len {
                let error = DecodeError::new(
                    DecodeErrorKind::InvalidOffset { offset, len },
                    kind.header_field_offset(),
                );
                return Err(error).section(kind.label(), offset);
            }
        }
        Ok(())
    }
}
