//! Small utilities shared between the lithdat crates

mod ascii_display;
pub use ascii_display::*;

mod result_ext;
pub use result_ext::AnyhowResultExt;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;

/// Shorthand for `Ok(())`, cause it looks ugly
pub const fn ok<E>() -> Result<(), E> {
    Ok(())
}

/// Returned by the conversions generated by `lithdat_proc::ext_repr` for values that don't name
/// any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("value doesn't match any enum variant")]
pub struct EnumParseError;

/// Number of bytes needed to store `bits` bits.
///
/// ```
/// use lithdat_utils::bit_bytes;
/// assert_eq!(bit_bytes(0), 0);
/// assert_eq!(bit_bytes(9), 2);
/// ```
pub const fn bit_bytes(bits: u64) -> u64 {
    (bits + 7) / 8
}
