//! Decoding of composite records.
//!
//! Flat records implement [`PackedData`], and can be read straight from a [`ByteCursor`].
//! Anything with variable length or options-dependent behavior implements [`Decode`] instead,
//! and is read through a [`Decoder`], which carries the [`DecodeOptions`] and collects warnings.
//! Every [`PackedData`] type is also [`Decode`].

use crate::{
    cursor::ByteCursor,
    error::{DecodeError, DecodeResult, DecodeResultExt, DecodeWarning, WarningKind},
    packed::PackedData,
};
use bitflags::bitflags;
use log::debug;
use std::io::{Read, Seek};

bitflags! {
    /// Sections that can have their payload decoding skipped.
    #[derive(Default)]
    pub struct SectionFlags: u8 {
        /// The world info and world tree following the header. Skipped together, as the tree's
        /// position depends on the length of the info.
        const WORLD_TREE = 1 << 0;
        const LIGHT_GRID = 1 << 1;
        const COLLISION = 1 << 2;
        const PARTICLE_BLOCKERS = 1 << 3;
        const RENDER_DATA = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Turns every warning into an error.
    pub strict: bool,
    /// Sections which are only located (and have their count prefix read), but not decoded.
    pub deferred: SectionFlags,
}

impl DecodeOptions {
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn defer(mut self, sections: SectionFlags) -> Self {
        self.deferred |= sections;
        self
    }
}

/// Trait for records decoded through a [`Decoder`].
pub trait Decode: Sized {
    /// Reads the record at the decoder's current position.
    ///
    /// On failure, the decoder's position is unspecified.
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self>;
}

/// Blanket implementation of [`Decode`] for every [`PackedData`].
impl<T: PackedData> Decode for T {
    fn decode<R: Read + Seek>(d: &mut Decoder<R>) -> DecodeResult<Self> {
        T::read_packed(d.cursor())
    }
}

pub struct Decoder<R> {
    cursor: ByteCursor<R>,
    options: DecodeOptions,
    warnings: Vec<DecodeWarning>,
}

impl<R: Read + Seek> Decoder<R> {
    pub fn new(cursor: ByteCursor<R>, options: DecodeOptions) -> Self {
        Self {
            cursor,
            options,
            warnings: Vec::new(),
        }
    }

    pub fn cursor(&mut self) -> &mut ByteCursor<R> {
        &mut self.cursor
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn seek(&mut self, offset: u64) -> DecodeResult<()> {
        self.cursor.seek_absolute(offset)
    }

    pub fn read<T: Decode>(&mut self) -> DecodeResult<T> {
        T::decode(self)
    }

    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<Vec<u8>> {
        self.cursor.read_bytes(n)
    }

    /// Reads a `u32` element count.
    pub fn read_count(&mut self) -> DecodeResult<usize> {
        Ok(self.cursor.read_u32()? as usize)
    }

    /// Reads `count` elements in a row.
    pub fn read_vec<T: Decode>(&mut self, count: usize) -> DecodeResult<Vec<T>> {
        self.read_vec_with(count, |d| d.read())
    }

    /// Reads `count` elements in a row, with a custom element decoder. A failing element
    /// annotates the error with its index.
    pub fn read_vec_with<T, F>(&mut self, count: usize, mut f: F) -> DecodeResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> DecodeResult<T>,
    {
        // Every element takes at least a byte, so a corrupted count can't make us allocate
        // more than the source could possibly hold
        let remaining = usize::try_from(self.cursor.remaining()).unwrap_or(usize::MAX);
        let mut result = Vec::with_capacity(count.min(remaining));

        for i in 0..count {
            result.push(f(self).index(i)?);
        }
        Ok(result)
    }

    /// Reads a `u32` count, followed by that many elements.
    pub fn read_prefixed_vec<T: Decode>(&mut self) -> DecodeResult<Vec<T>> {
        let count = self.read_count()?;
        self.read_vec(count)
    }

    /// Reports a recoverable anomaly about the record at `offset`. In strict mode it's turned
    /// into an error instead.
    pub fn warn(&mut self, offset: u64, kind: WarningKind) -> DecodeResult<()> {
        if self.options.strict {
            return Err(DecodeError::new(kind.into_error_kind(), offset));
        }

        debug!("decode warning at byte {offset}: {kind}");
        self.warnings.push(DecodeWarning { offset, kind });
        Ok(())
    }

    pub fn into_parts(self) -> (ByteCursor<R>, Vec<DecodeWarning>) {
        (self.cursor, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeOptions, Decoder};
    use crate::{
        cursor::ByteCursor,
        error::{DecodeErrorKind, WarningKind},
    };

    #[test]
    fn prefixed_vec_reads_in_order() {
        let data = [3, 0, 0, 0, 10, 20, 30, 40];
        let mut d = Decoder::new(ByteCursor::from_bytes(&data), DecodeOptions::default());

        let values: Vec<u8> = d.read_prefixed_vec().unwrap();
        assert_eq!(values, [10, 20, 30]);
        assert_eq!(d.position(), 7);
    }

    #[test]
    fn empty_vec_consumes_nothing() {
        let data = [0, 0, 0, 0];
        let mut d = Decoder::new(ByteCursor::from_bytes(&data), DecodeOptions::default());

        let values: Vec<u32> = d.read_prefixed_vec().unwrap();
        assert!(values.is_empty());
        assert_eq!(d.position(), 4);
    }

    #[test]
    fn huge_count_fails_instead_of_allocating() {
        let data = [0xff, 0xff, 0xff, 0xff, 1, 2];
        let mut d = Decoder::new(ByteCursor::from_bytes(&data), DecodeOptions::default());

        let error = d.read_prefixed_vec::<u16>().unwrap_err();
        assert!(matches!(error.kind(), DecodeErrorKind::UnexpectedEof { .. }));
        assert_eq!(error.path().count(), 1);
    }

    #[test]
    fn warnings_become_errors_in_strict_mode() {
        let kind = WarningKind::NonZeroTrailer {
            section: "collision",
            value: 1,
        };

        let mut lenient = Decoder::new(ByteCursor::from_bytes(&[]), DecodeOptions::default());
        lenient.warn(0, kind.clone()).unwrap();
        assert_eq!(lenient.into_parts().1.len(), 1);

        let options = DecodeOptions::default().strict();
        let mut strict = Decoder::new(ByteCursor::from_bytes(&[]), options);
        let error = strict.warn(0, kind).unwrap_err();
        assert!(matches!(
            error.kind(),
            DecodeErrorKind::InconsistentLength { declared: 0, actual: 1, .. }
        ));
    }
}
