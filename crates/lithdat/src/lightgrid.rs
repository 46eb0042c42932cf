//! Light grid: a coarse 3D grid of ambient light samples, used to light models.

use crate::types::Blob;
use glam::Vec3;
use lithdat_proc::PackedData;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize, PackedData)]
pub struct LightGrid {
    pub lookup_start: Vec3,
    pub block_size: Vec3,
    /// Grid dimensions, in blocks
    pub lookup_size: [u32; 3],
    /// RLE compressed samples
    pub data: Blob,
}

impl LightGrid {
    pub fn block_count(&self) -> u64 {
        self.lookup_size.iter().map(|&n| u64::from(n)).product()
    }
}
