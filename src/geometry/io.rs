//! Byte-order aware reads and writes shared by the header and body codecs.
//!
//! Every multi-byte access takes an explicit [`ByteOrder`]; nothing here uses
//! the platform's native order.

use crate::error::FormatError;
use byteorder::{BE, ByteOrder as _, LE};

/// Byte order of the multi-byte fields in a blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    /// Value of the header flag bit and of the WKB element marker.
    pub fn to_marker(self) -> u8 {
        match self {
            Self::BigEndian => 0,
            Self::LittleEndian => 1,
        }
    }

    pub fn from_marker(marker: u8) -> Result<Self, FormatError> {
        match marker {
            0 => Ok(Self::BigEndian),
            1 => Ok(Self::LittleEndian),
            other => Err(FormatError::InvalidByteOrder(other)),
        }
    }
}

/// Bounds-checked cursor over an input buffer.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_u32(&mut self, order: ByteOrder) -> Result<u32, FormatError> {
        let bytes = self.take(4)?;
        Ok(match order {
            ByteOrder::BigEndian => BE::read_u32(bytes),
            ByteOrder::LittleEndian => LE::read_u32(bytes),
        })
    }

    pub(crate) fn read_i32(&mut self, order: ByteOrder) -> Result<i32, FormatError> {
        let bytes = self.take(4)?;
        Ok(match order {
            ByteOrder::BigEndian => BE::read_i32(bytes),
            ByteOrder::LittleEndian => LE::read_i32(bytes),
        })
    }

    pub(crate) fn read_f64(&mut self, order: ByteOrder) -> Result<f64, FormatError> {
        let bytes = self.take(8)?;
        Ok(match order {
            ByteOrder::BigEndian => BE::read_f64(bytes),
            ByteOrder::LittleEndian => LE::read_f64(bytes),
        })
    }
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, order: ByteOrder, value: u32) {
    let mut bytes = [0u8; 4];
    match order {
        ByteOrder::BigEndian => BE::write_u32(&mut bytes, value),
        ByteOrder::LittleEndian => LE::write_u32(&mut bytes, value),
    }
    buf.extend_from_slice(&bytes);
}

pub(crate) fn put_i32(buf: &mut Vec<u8>, order: ByteOrder, value: i32) {
    let mut bytes = [0u8; 4];
    match order {
        ByteOrder::BigEndian => BE::write_i32(&mut bytes, value),
        ByteOrder::LittleEndian => LE::write_i32(&mut bytes, value),
    }
    buf.extend_from_slice(&bytes);
}

pub(crate) fn put_f64(buf: &mut Vec<u8>, order: ByteOrder, value: f64) {
    let mut bytes = [0u8; 8];
    match order {
        ByteOrder::BigEndian => BE::write_f64(&mut bytes, value),
        ByteOrder::LittleEndian => LE::write_f64(&mut bytes, value),
    }
    buf.extend_from_slice(&bytes);
}
