use crate::ok;
use std::fmt::{self, Display};

/// Wrapper for displaying byte strings read straight out of a file, which are ASCII most of the
/// time but nothing guarantees that. Printable characters and spaces are written as they are,
/// `\` and `"` get a backslash, and anything else is written as `\xNN`.
///
/// ## Example
/// ```
/// # use lithdat_utils::AsciiDisplay;
/// let a = AsciiDisplay(b"WorldProperties 1");
/// assert_eq!(a.to_string(), "WorldProperties 1");
///
/// let b = AsciiDisplay(b"a\xABb\"c\\");
/// assert_eq!(b.to_string(), "a\\xABb\\\"c\\\\");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AsciiDisplay<'a>(pub &'a [u8]);

impl<'a> From<&'a [u8]> for AsciiDisplay<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self(value)
    }
}

impl<'a> Display for AsciiDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            match byte {
                b'\\' | b'"' => write!(f, "\\{}", byte as char)?,
                b' ' => f.write_str(" ")?,
                _ if byte.is_ascii_graphic() => write!(f, "{}", byte as char)?,
                _ => write!(f, r"\x{byte:02X}")?,
            }
        }
        ok()
    }
}
