//! Writing records back into their binary form.

use crate::packed::PackedData;
use anyhow::{anyhow, ensure};
use byteorder::{WriteBytesExt, LE};
use lithdat_utils::{ok, AnyResult};
use std::io::Write;

/// Counterpart of [`Decode`](crate::decode::Decode).
pub trait Encode {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult;
}

/// Blanket implementation of [`Encode`] for every [`PackedData`].
impl<T: PackedData> Encode for T {
    fn encode<W: Write>(&self, w: &mut W) -> AnyResult {
        self.write_packed(w)
    }
}

/// Writes a `u32` element count.
pub fn write_count<W: Write>(w: &mut W, count: usize) -> AnyResult {
    let count =
        u32::try_from(count).map_err(|_| anyhow!("{count} elements don't fit a u32 count"))?;
    w.write_u32::<LE>(count)?;
    ok()
}

/// Writes a `u8` element count, used by the few arrays with a narrow count.
pub fn write_short_count<W: Write>(w: &mut W, count: usize) -> AnyResult {
    ensure!(count <= u8::MAX as usize, "{count} elements don't fit a u8 count");
    w.write_u8(count as u8)?;
    ok()
}

pub fn write_all<W: Write, T: Encode>(w: &mut W, items: &[T]) -> AnyResult {
    for item in items {
        item.encode(w)?;
    }
    ok()
}

/// Writes a `u32` count, followed by the elements.
pub fn write_prefixed<W: Write, T: Encode>(w: &mut W, items: &[T]) -> AnyResult {
    write_count(w, items.len())?;
    write_all(w, items)
}
