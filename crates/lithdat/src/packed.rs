//! Flat, fixed layout records.

use crate::{
    cursor::ByteCursor,
    error::{DecodeResult, DecodeResultExt},
};
use byteorder::{WriteBytesExt, LE};
use glam::{Quat, Vec2, Vec3};
use lithdat_utils::{ok, AnyResult};
use std::io::{Read, Seek, Write};

/// Trait for reading and writing packed data, always little endian and without padding.
///
/// Can be derived with `#[derive(PackedData)]` for structs whose fields are all `PackedData`.
pub trait PackedData: Sized + Clone {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self>;
    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult;
}

macro_rules! impl_data {
    ($type:ty, $reader:ident, |$w:ident, $value:ident| $writer:expr) => {
        impl PackedData for $type {
            fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
                c.$reader()
            }

            fn write_packed<W: Write>(&self, $w: &mut W) -> AnyResult {
                let $value = *self;
                $writer?;
                ok()
            }
        }
    };
}

impl_data!(u8, read_u8, |w, value| w.write_u8(value));
impl_data!(u16, read_u16, |w, value| w.write_u16::<LE>(value));
impl_data!(u32, read_u32, |w, value| w.write_u32::<LE>(value));
impl_data!(i32, read_i32, |w, value| w.write_i32::<LE>(value));
impl_data!(f32, read_f32, |w, value| w.write_f32::<LE>(value));

/// Single byte, anything other than 0 is `true`.
impl PackedData for bool {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        Ok(c.read_u8()? != 0)
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        w.write_u8(u8::from(*self))?;
        ok()
    }
}

impl<T: PackedData + Default + Copy, const N: usize> PackedData for [T; N] {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        let mut result = [T::default(); N];
        for (i, slot) in result.iter_mut().enumerate() {
            *slot = T::read_packed(c).index(i)?;
        }
        Ok(result)
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        for value in self {
            value.write_packed(w)?;
        }
        ok()
    }
}

impl PackedData for Vec2 {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        Ok(Vec2::from_array(<[f32; 2]>::read_packed(c)?))
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        self.to_array().write_packed(w)
    }
}

impl PackedData for Vec3 {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        Ok(Vec3::from_array(<[f32; 3]>::read_packed(c)?))
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        self.to_array().write_packed(w)
    }
}

/// Stored as `x, y, z, w`.
impl PackedData for Quat {
    fn read_packed<R: Read + Seek>(c: &mut ByteCursor<R>) -> DecodeResult<Self> {
        Ok(Quat::from_array(<[f32; 4]>::read_packed(c)?))
    }

    fn write_packed<W: Write>(&self, w: &mut W) -> AnyResult {
        self.to_array().write_packed(w)
    }
}

/// Trait with a `read_packed` wrapper method for [`ByteCursor`], purely for clarity.
pub trait PackedReadExt {
    /// Reads the specified [`PackedData`] type from this cursor.
    fn read_packed<T: PackedData>(&mut self) -> DecodeResult<T>;
}

impl<R: Read + Seek> PackedReadExt for ByteCursor<R> {
    fn read_packed<T: PackedData>(&mut self) -> DecodeResult<T> {
        T::read_packed(self)
    }
}

/// Trait with a `write_packed` wrapper method for any [`Write`] type, purely for clarity.
pub trait PackedWriteExt {
    /// Writes the specified [`PackedData`] object into this stream.
    fn write_packed(&mut self, t: &impl PackedData) -> AnyResult;
}

impl<T: Write> PackedWriteExt for T {
    fn write_packed(&mut self, t: &impl PackedData) -> AnyResult {
        t.write_packed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{PackedData, PackedReadExt, PackedWriteExt};
    use crate::{cursor::ByteCursor, error::DecodeErrorKind};
    use glam::{Quat, Vec3};

    #[test]
    fn vectors_are_read_in_field_order() {
        let mut data = Vec::new();
        for value in [1.0f32, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }

        let mut c = ByteCursor::from_bytes(&data[..12]);
        assert_eq!(c.read_packed::<Vec3>().unwrap(), Vec3::new(1.0, 2.0, 3.0));

        let mut c = ByteCursor::from_bytes(&data[12..]);
        assert_eq!(
            c.read_packed::<Quat>().unwrap(),
            Quat::from_xyzw(0.0, 0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn truncated_array_reports_element() {
        let data = [0u8; 10];
        let mut c = ByteCursor::from_bytes(&data);
        let error = <[u32; 3]>::read_packed(&mut c).unwrap_err();

        assert!(matches!(error.kind(), DecodeErrorKind::UnexpectedEof { .. }));
        assert_eq!(error.offset(), 8);
        assert_eq!(
            error.to_string(),
            "unexpected end of data (needed 4 bytes, 2 available) at byte 8, in [2]"
        );
    }

    #[test]
    fn bool_is_a_single_byte() {
        let mut buffer = Vec::new();
        buffer.write_packed(&true).unwrap();
        buffer.write_packed(&false).unwrap();
        assert_eq!(buffer, [1, 0]);

        let data = [7u8];
        assert!(ByteCursor::from_bytes(&data).read_packed::<bool>().unwrap());
    }
}
