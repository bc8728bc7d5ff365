//! GeoPackage binary header prefixed to every stored geometry.
//!
//! cf. https://www.geopackage.org/spec140/index.html#gpb_format
//!
//! ```text
//! [2 bytes magic "GP"][1 byte version][1 byte flags][4 bytes srs_id][envelope]
//! ```
//!
//! Flag bits: 0 byte order, 1-3 envelope contents code, 4 empty geometry,
//! 5-7 reserved.

use super::io::{ByteOrder, Reader, put_f64, put_i32};
use crate::error::FormatError;

pub const MAGIC: [u8; 2] = *b"GP";
pub const VERSION: u8 = 0;
/// Size of the fixed part of the header.
pub const HEADER_SIZE: usize = 8;

const FLAG_BYTE_ORDER: u8 = 0b0000_0001;
const FLAG_ENVELOPE: u8 = 0b0000_1110;
const FLAG_EMPTY: u8 = 0b0001_0000;

/// Envelope contents code stored in bits 1-3 of the flag byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnvelopeType {
    #[default]
    None,
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl EnvelopeType {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Xy => 1,
            Self::Xyz => 2,
            Self::Xym => 3,
            Self::Xyzm => 4,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, FormatError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Xy),
            2 => Ok(Self::Xyz),
            3 => Ok(Self::Xym),
            4 => Ok(Self::Xyzm),
            other => Err(FormatError::InvalidEnvelopeCode(other)),
        }
    }

    /// Number of doubles following the fixed header.
    pub fn len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Xy => 4,
            Self::Xyz | Self::Xym => 6,
            Self::Xyzm => 8,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::None
    }

    pub fn has_z(self) -> bool {
        matches!(self, Self::Xyz | Self::Xyzm)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Self::Xym | Self::Xyzm)
    }
}

/// Bounding box of a geometry as cached in its header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub z: Option<(f64, f64)>,
    pub m: Option<(f64, f64)>,
}

impl Envelope {
    pub fn envelope_type(&self) -> EnvelopeType {
        match (self.z.is_some(), self.m.is_some()) {
            (false, false) => EnvelopeType::Xy,
            (true, false) => EnvelopeType::Xyz,
            (false, true) => EnvelopeType::Xym,
            (true, true) => EnvelopeType::Xyzm,
        }
    }

    /// Keep only the ranges `envelope_type` asks for. `None` drops the envelope.
    pub fn restricted_to(&self, envelope_type: EnvelopeType) -> Option<Self> {
        if envelope_type.is_empty() {
            return None;
        }
        Some(Self {
            z: self.z.filter(|_| envelope_type.has_z()),
            m: self.m.filter(|_| envelope_type.has_m()),
            ..*self
        })
    }

    // GeoPackage order: minx, maxx, miny, maxy, [minz, maxz], [minm, maxm]
    fn values(&self) -> Vec<f64> {
        let mut values = vec![self.min_x, self.max_x, self.min_y, self.max_y];
        if let Some((min, max)) = self.z {
            values.extend([min, max]);
        }
        if let Some((min, max)) = self.m {
            values.extend([min, max]);
        }
        values
    }
}

/// Decoded form of the header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryHeader {
    pub version: u8,
    pub byte_order: ByteOrder,
    pub empty: bool,
    pub srs_id: i32,
    pub envelope: Option<Envelope>,
}

impl GeometryHeader {
    pub fn new(srs_id: i32, byte_order: ByteOrder, empty: bool, envelope: Option<Envelope>) -> Self {
        Self {
            version: VERSION,
            byte_order,
            empty,
            srs_id,
            envelope,
        }
    }

    pub fn envelope_type(&self) -> EnvelopeType {
        self.envelope
            .map(|envelope| envelope.envelope_type())
            .unwrap_or_default()
    }

    /// The flag byte as it is written. The empty flag suppresses the envelope.
    pub fn flags(&self) -> u8 {
        let envelope_type = if self.empty {
            EnvelopeType::None
        } else {
            self.envelope_type()
        };
        let mut flags = self.byte_order.to_marker();
        flags |= envelope_type.code() << 1;
        if self.empty {
            flags |= FLAG_EMPTY;
        }
        flags
    }
}

/// Append the encoded header to `buf`.
pub fn encode_header(header: &GeometryHeader, buf: &mut Vec<u8>) {
    let order = header.byte_order;
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.push(header.flags());
    put_i32(buf, order, header.srs_id);
    if header.empty {
        return;
    }
    if let Some(envelope) = &header.envelope {
        for value in envelope.values() {
            put_f64(buf, order, value);
        }
    }
}

/// Decode a header and return it with the number of bytes it occupies.
pub fn decode_header(bytes: &[u8]) -> Result<(GeometryHeader, usize), FormatError> {
    let mut reader = Reader::new(bytes);
    let header = read_header(&mut reader)?;
    Ok((header, reader.position()))
}

pub(crate) fn read_header(reader: &mut Reader<'_>) -> Result<GeometryHeader, FormatError> {
    if reader.remaining() < HEADER_SIZE {
        return Err(FormatError::Truncated {
            needed: HEADER_SIZE,
            remaining: reader.remaining(),
        });
    }

    let magic = reader.read_bytes::<2>()?;
    if magic != MAGIC {
        return Err(FormatError::InvalidMagic(magic));
    }
    let version = reader.read_u8()?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let flags = reader.read_u8()?;
    let byte_order = if flags & FLAG_BYTE_ORDER == 0 {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };
    let envelope_type = EnvelopeType::from_code((flags & FLAG_ENVELOPE) >> 1)?;
    let empty = flags & FLAG_EMPTY != 0;
    let srs_id = reader.read_i32(byte_order)?;

    let needed = envelope_type.len() * 8;
    if reader.remaining() < needed {
        return Err(FormatError::Truncated {
            needed,
            remaining: reader.remaining(),
        });
    }
    let envelope = read_envelope(reader, envelope_type, byte_order)?;

    Ok(GeometryHeader {
        version,
        byte_order,
        empty,
        srs_id,
        envelope,
    })
}

fn read_envelope(
    reader: &mut Reader<'_>,
    envelope_type: EnvelopeType,
    order: ByteOrder,
) -> Result<Option<Envelope>, FormatError> {
    if envelope_type.is_empty() {
        return Ok(None);
    }
    let mut envelope = Envelope {
        min_x: reader.read_f64(order)?,
        max_x: reader.read_f64(order)?,
        min_y: reader.read_f64(order)?,
        max_y: reader.read_f64(order)?,
        z: None,
        m: None,
    };
    if envelope_type.has_z() {
        envelope.z = Some((reader.read_f64(order)?, reader.read_f64(order)?));
    }
    if envelope_type.has_m() {
        envelope.m = Some((reader.read_f64(order)?, reader.read_f64(order)?));
    }
    Ok(Some(envelope))
}

#[cfg(test)]
mod tests {
    use super::{
        ByteOrder, Envelope, EnvelopeType, GeometryHeader, HEADER_SIZE, decode_header,
        encode_header,
    };
    use crate::error::FormatError;

    fn xyzm_envelope() -> Envelope {
        Envelope {
            min_x: 1.0,
            max_x: 2.0,
            min_y: 3.0,
            max_y: 4.0,
            z: Some((5.0, 6.0)),
            m: Some((7.0, 8.0)),
        }
    }

    #[test]
    fn encodes_little_endian_header_without_envelope() {
        let header = GeometryHeader::new(4326, ByteOrder::LittleEndian, false, None);
        let mut buf = Vec::new();
        encode_header(&header, &mut buf);
        assert_eq!(buf, vec![0x47, 0x50, 0x00, 0x01, 0xE6, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn encodes_big_endian_srs_id() {
        let header = GeometryHeader::new(4326, ByteOrder::BigEndian, false, None);
        let mut buf = Vec::new();
        encode_header(&header, &mut buf);
        assert_eq!(buf, vec![0x47, 0x50, 0x00, 0x00, 0x00, 0x00, 0x10, 0xE6]);
    }

    #[test]
    fn roundtrips_every_envelope_type() -> Result<(), FormatError> {
        let full = xyzm_envelope();
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for envelope_type in [
                EnvelopeType::None,
                EnvelopeType::Xy,
                EnvelopeType::Xyz,
                EnvelopeType::Xym,
                EnvelopeType::Xyzm,
            ] {
                let envelope = full.restricted_to(envelope_type);
                let header = GeometryHeader::new(-1, order, false, envelope);
                let mut buf = Vec::new();
                encode_header(&header, &mut buf);
                assert_eq!(buf.len(), HEADER_SIZE + envelope_type.len() * 8);
                assert_eq!((buf[3] >> 1) & 0b111, envelope_type.code());

                let (decoded, consumed) = decode_header(&buf)?;
                assert_eq!(consumed, buf.len());
                assert_eq!(decoded, header);
            }
        }
        Ok(())
    }

    #[test]
    fn empty_flag_suppresses_envelope() -> Result<(), FormatError> {
        let header = GeometryHeader::new(4326, ByteOrder::LittleEndian, true, Some(xyzm_envelope()));
        let mut buf = Vec::new();
        encode_header(&header, &mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(buf[3], 0b0001_0001);

        let (decoded, _) = decode_header(&buf)?;
        assert!(decoded.empty);
        assert_eq!(decoded.envelope, None);
        Ok(())
    }

    #[test]
    fn reserved_bits_are_ignored() -> Result<(), FormatError> {
        let buf = [0x47, 0x50, 0x00, 0b1110_0001, 0x00, 0x00, 0x00, 0x00];
        let (decoded, consumed) = decode_header(&buf)?;
        assert_eq!(consumed, HEADER_SIZE);
        assert_eq!(decoded.byte_order, ByteOrder::LittleEndian);
        assert!(!decoded.empty);
        Ok(())
    }

    #[test]
    fn rejects_bad_magic_version_and_envelope_code() {
        let err = decode_header(&[0x47, 0x51, 0, 1, 0, 0, 0, 0]).expect_err("bad magic");
        assert_eq!(err, FormatError::InvalidMagic([0x47, 0x51]));

        let err = decode_header(&[0x47, 0x50, 2, 1, 0, 0, 0, 0]).expect_err("bad version");
        assert_eq!(err, FormatError::UnsupportedVersion(2));

        let mut blob = vec![0x47, 0x50, 0x00, 0x0B, 0, 0, 0, 0];
        blob.extend_from_slice(&[0; 64]);
        let err = decode_header(&blob).expect_err("bad envelope code");
        assert_eq!(err, FormatError::InvalidEnvelopeCode(5));
    }

    #[test]
    fn rejects_envelope_longer_than_input() {
        let mut blob = vec![0x47, 0x50, 0x00, 0x03, 0, 0, 0, 0];
        blob.extend_from_slice(&[0; 31]);
        let err = decode_header(&blob).expect_err("short envelope");
        assert_eq!(
            err,
            FormatError::Truncated {
                needed: 32,
                remaining: 31
            }
        );
    }

    #[test]
    fn rejects_every_truncated_prefix() {
        let header = GeometryHeader::new(3857, ByteOrder::BigEndian, false, Some(xyzm_envelope()));
        let mut buf = Vec::new();
        encode_header(&header, &mut buf);
        for len in 0..buf.len() {
            assert!(decode_header(&buf[..len]).is_err(), "prefix of {len} bytes");
        }
    }
}
