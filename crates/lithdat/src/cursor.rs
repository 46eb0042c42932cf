use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use byteorder::{ReadBytesExt, LE};
use std::{
    io::{self, Cursor, Read, Seek, SeekFrom},
    mem::size_of,
};

/// Bounds-checked little endian reader with an explicit position.
///
/// The length of the source is measured once, on construction. Every read checks it against the
/// remaining byte count before touching the source, so a read never goes past the end, and a
/// failed read leaves the position unchanged.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
    len: u64,
}

macro_rules! reader_template {
    ($fn_name:ident, $ty_name:ty, |$r:ident| $read:expr) => {
        #[doc = concat!("Reads a little endian `", stringify!($ty_name), "`.")]
        pub fn $fn_name(&mut self) -> DecodeResult<$ty_name> {
            const WIDTH: u64 = size_of::<$ty_name>() as u64;
            self.reserve(WIDTH)?;

            let position = self.position;
            let $r = &mut self.inner;
            let value = $read.map_err(|e| DecodeError::new(e.into(), position))?;
            self.position += WIDTH;
            Ok(value)
        }
    };
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wraps a source, measuring its length and rewinding it to the start.
    pub fn new(mut inner: R) -> DecodeResult<Self> {
        let len = inner
            .seek(SeekFrom::End(0))
            .map_err(|e| DecodeError::new(e.into(), 0))?;
        inner
            .seek(SeekFrom::Start(0))
            .map_err(|e| DecodeError::new(e.into(), 0))?;

        Ok(Self {
            inner,
            position: 0,
            len,
        })
    }

    reader_template!(read_u8, u8, |r| r.read_u8());
    reader_template!(read_u16, u16, |r| r.read_u16::<LE>());
    reader_template!(read_u32, u32, |r| r.read_u32::<LE>());
    reader_template!(read_i32, i32, |r| r.read_i32::<LE>());
    reader_template!(read_f32, f32, |r| r.read_f32::<LE>());

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<Vec<u8>> {
        self.reserve(n as u64)?;

        let mut result = vec![0; n];
        self.inner
            .read_exact(&mut result)
            .map_err(|e| self.io_error(e))?;
        self.position += n as u64;
        Ok(result)
    }

    /// Moves to an absolute offset. Seeking right at the end of the source is allowed, any
    /// further than that isn't.
    pub fn seek_absolute(&mut self, offset: u64) -> DecodeResult<()> {
        if offset > self.len {
            return Err(self.error(DecodeErrorKind::InvalidOffset {
                offset,
                len: self.len,
            }));
        }

        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.io_error(e))?;
        self.position = offset;
        Ok(())
    }
}

impl<'a> ByteCursor<Cursor<&'a [u8]>> {
    /// Wraps an in-memory buffer. Any number of cursors can share the same buffer.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(bytes),
            position: 0,
            len: bytes.len() as u64,
        }
    }
}

impl<R> ByteCursor<R> {
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Length of the whole source.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Creates an error located at the current position.
    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn io_error(&self, e: io::Error) -> DecodeError {
        self.error(e.into())
    }

    fn reserve(&self, needed: u64) -> DecodeResult<()> {
        let available = self.remaining();
        if available < needed {
            Err(self.error(DecodeErrorKind::UnexpectedEof { needed, available }))
        } else {
            Ok(())
        }
    }
}
