//! Well-known binary geometry bodies.
//!
//! Every element, top level or nested, is a 1 byte byte-order marker, a 4 byte
//! type code and the kind specific payload:
//!
//! - Point: one coordinate tuple.
//! - LineString: point count, then the tuples.
//! - Polygon: ring count, then per ring a point count and the tuples.
//! - Multi kinds: part count, then each part as a complete element.
//!
//! A body flagged empty in its header stops right after the type code.

use super::io::{ByteOrder, Reader, put_f64, put_u32};
use super::{Coord, Geometry, LineString, Polygon};
use crate::error::{FormatError, GpkgError, Result};
use crate::types::{Dimension, GeometryType};

// ISO offsets added to the base code.
const ISO_Z: u32 = 1000;
const ISO_M: u32 = 2000;
const ISO_ZM: u32 = 3000;

// Extended (EWKB style) flags accepted on decode.
const EXT_Z: u32 = 0x8000_0000;
const EXT_M: u32 = 0x4000_0000;
const EXT_SRID: u32 = 0x2000_0000;

/// ISO WKB type code for a kind and dimension.
pub fn type_code(geometry_type: GeometryType, dimension: Dimension) -> u32 {
    let base = match geometry_type {
        GeometryType::Point => 1,
        GeometryType::LineString => 2,
        GeometryType::Polygon => 3,
        GeometryType::MultiPoint => 4,
        GeometryType::MultiLineString => 5,
        GeometryType::MultiPolygon => 6,
    };
    let offset = match dimension {
        Dimension::Xy => 0,
        Dimension::Xyz => ISO_Z,
        Dimension::Xym => ISO_M,
        Dimension::Xyzm => ISO_ZM,
    };
    base + offset
}

/// Split a type code into kind and dimension. Accepts ISO codes and the
/// extended high bit flags.
pub fn parse_type_code(code: u32) -> std::result::Result<(GeometryType, Dimension), FormatError> {
    if code & EXT_SRID != 0 {
        return Err(FormatError::UnknownGeometryType(code));
    }
    let ext_z = code & EXT_Z != 0;
    let ext_m = code & EXT_M != 0;
    let plain = code & !(EXT_Z | EXT_M);

    let dimension = match (plain / 1000, ext_z, ext_m) {
        (0, z, m) => Dimension::from_flags(z, m),
        (1, false, false) => Dimension::Xyz,
        (2, false, false) => Dimension::Xym,
        (3, false, false) => Dimension::Xyzm,
        _ => return Err(FormatError::UnknownGeometryType(code)),
    };
    let geometry_type = match plain % 1000 {
        1 => GeometryType::Point,
        2 => GeometryType::LineString,
        3 => GeometryType::Polygon,
        4 => GeometryType::MultiPoint,
        5 => GeometryType::MultiLineString,
        6 => GeometryType::MultiPolygon,
        _ => return Err(FormatError::UnknownGeometryType(code)),
    };
    Ok((geometry_type, dimension))
}

/// Read the marker and type code of the top level element.
pub(crate) fn peek_type(bytes: &[u8]) -> std::result::Result<(u32, Dimension), FormatError> {
    let mut reader = Reader::new(bytes);
    let order = ByteOrder::from_marker(reader.read_u8()?)?;
    let code = reader.read_u32(order)?;
    let (_, dimension) = parse_type_code(code)?;
    Ok((code, dimension))
}

/// Append the body of `geometry` to `buf`.
///
/// Every coordinate must carry exactly the Z/M values `dimension` declares.
pub fn encode_body(
    geometry: &Geometry,
    dimension: Dimension,
    byte_order: ByteOrder,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let mut writer = Writer {
        buf,
        order: byte_order,
        dimension,
    };
    writer.element_header(geometry.geometry_type());
    if geometry.is_empty() {
        return Ok(());
    }

    match geometry {
        Geometry::Point(coord) => {
            if let Some(coord) = coord {
                writer.coord(coord)?;
            }
        }
        Geometry::LineString(line) => writer.line_string_payload(line)?,
        Geometry::Polygon(polygon) => writer.polygon_payload(polygon)?,
        Geometry::MultiPoint(points) => {
            writer.count(points.len())?;
            for coord in points {
                writer.element_header(GeometryType::Point);
                writer.coord(coord)?;
            }
        }
        Geometry::MultiLineString(lines) => {
            writer.count(lines.len())?;
            for line in lines {
                writer.element_header(GeometryType::LineString);
                writer.line_string_payload(line)?;
            }
        }
        Geometry::MultiPolygon(polygons) => {
            writer.count(polygons.len())?;
            for polygon in polygons {
                writer.element_header(GeometryType::Polygon);
                writer.polygon_payload(polygon)?;
            }
        }
    }
    Ok(())
}

/// Decode a body whose elements must all have `dimension`.
///
/// With `empty` set only the marker and type code are read and the empty
/// geometry of that kind is returned. Otherwise the body must be consumed
/// exactly.
pub fn decode_body(
    bytes: &[u8],
    dimension: Dimension,
    empty: bool,
) -> std::result::Result<Geometry, FormatError> {
    let mut reader = BodyReader {
        reader: Reader::new(bytes),
        dimension,
    };
    let (order, geometry_type) = reader.element_header()?;
    if empty {
        return Ok(Geometry::empty(geometry_type));
    }

    let geometry = match geometry_type {
        GeometryType::Point => Geometry::Point(Some(reader.coord(order)?)),
        GeometryType::LineString => Geometry::LineString(reader.line_string_payload(order)?),
        GeometryType::Polygon => Geometry::Polygon(reader.polygon_payload(order)?),
        GeometryType::MultiPoint => {
            let count = reader.count(order, 5 + 16)?;
            let mut points = Vec::with_capacity(count);
            for _ in 0..count {
                let order = reader.expect_element(GeometryType::Point, "POINT")?;
                points.push(reader.coord(order)?);
            }
            Geometry::MultiPoint(points)
        }
        GeometryType::MultiLineString => {
            let count = reader.count(order, 5 + 4)?;
            let mut lines = Vec::with_capacity(count);
            for _ in 0..count {
                let order = reader.expect_element(GeometryType::LineString, "LINESTRING")?;
                lines.push(reader.line_string_payload(order)?);
            }
            Geometry::MultiLineString(lines)
        }
        GeometryType::MultiPolygon => {
            let count = reader.count(order, 5 + 4)?;
            let mut polygons = Vec::with_capacity(count);
            for _ in 0..count {
                let order = reader.expect_element(GeometryType::Polygon, "POLYGON")?;
                polygons.push(reader.polygon_payload(order)?);
            }
            Geometry::MultiPolygon(polygons)
        }
    };

    let trailing = reader.reader.remaining();
    if trailing != 0 {
        return Err(FormatError::TrailingBytes(trailing));
    }
    Ok(geometry)
}

struct Writer<'a> {
    buf: &'a mut Vec<u8>,
    order: ByteOrder,
    dimension: Dimension,
}

impl Writer<'_> {
    fn element_header(&mut self, geometry_type: GeometryType) {
        self.buf.push(self.order.to_marker());
        put_u32(self.buf, self.order, type_code(geometry_type, self.dimension));
    }

    fn count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| FormatError::CountOverflow(count))?;
        put_u32(self.buf, self.order, count);
        Ok(())
    }

    fn coord(&mut self, coord: &Coord) -> Result<()> {
        if coord.dimension() != self.dimension {
            return Err(GpkgError::CoordinateDimension);
        }
        put_f64(self.buf, self.order, coord.x);
        put_f64(self.buf, self.order, coord.y);
        if let Some(z) = coord.z {
            put_f64(self.buf, self.order, z);
        }
        if let Some(m) = coord.m {
            put_f64(self.buf, self.order, m);
        }
        Ok(())
    }

    fn line_string_payload(&mut self, line: &LineString) -> Result<()> {
        self.count(line.0.len())?;
        for coord in &line.0 {
            self.coord(coord)?;
        }
        Ok(())
    }

    fn polygon_payload(&mut self, polygon: &Polygon) -> Result<()> {
        self.count(polygon.0.len())?;
        for ring in &polygon.0 {
            self.line_string_payload(ring)?;
        }
        Ok(())
    }
}

struct BodyReader<'a> {
    reader: Reader<'a>,
    dimension: Dimension,
}

impl BodyReader<'_> {
    /// Marker and type code; the code's dimension must match.
    fn element_header(&mut self) -> std::result::Result<(ByteOrder, GeometryType), FormatError> {
        let order = ByteOrder::from_marker(self.reader.read_u8()?)?;
        let code = self.reader.read_u32(order)?;
        let (geometry_type, dimension) = parse_type_code(code)?;
        if dimension != self.dimension {
            return Err(FormatError::DimensionMismatch {
                type_code: code,
                has_z: self.dimension.has_z(),
                has_m: self.dimension.has_m(),
            });
        }
        Ok((order, geometry_type))
    }

    fn expect_element(
        &mut self,
        expected: GeometryType,
        name: &'static str,
    ) -> std::result::Result<ByteOrder, FormatError> {
        let (order, geometry_type) = self.element_header()?;
        if geometry_type != expected {
            return Err(FormatError::UnexpectedElement {
                expected: name,
                type_code: type_code(geometry_type, self.dimension),
            });
        }
        Ok(order)
    }

    /// Read a count and size the allocation by what the input can still hold,
    /// `min_item_size` bytes per item at least.
    fn count(
        &mut self,
        order: ByteOrder,
        min_item_size: usize,
    ) -> std::result::Result<usize, FormatError> {
        let count = self.reader.read_u32(order)? as usize;
        let needed = count.saturating_mul(min_item_size);
        if needed > self.reader.remaining() {
            return Err(FormatError::Truncated {
                needed,
                remaining: self.reader.remaining(),
            });
        }
        Ok(count)
    }

    fn coord(&mut self, order: ByteOrder) -> std::result::Result<Coord, FormatError> {
        let x = self.reader.read_f64(order)?;
        let y = self.reader.read_f64(order)?;
        let z = if self.dimension.has_z() {
            Some(self.reader.read_f64(order)?)
        } else {
            None
        };
        let m = if self.dimension.has_m() {
            Some(self.reader.read_f64(order)?)
        } else {
            None
        };
        Ok(Coord { x, y, z, m })
    }

    fn line_string_payload(
        &mut self,
        order: ByteOrder,
    ) -> std::result::Result<LineString, FormatError> {
        let count = self.count(order, 8 * self.dimension.size())?;
        let mut coords = Vec::with_capacity(count);
        for _ in 0..count {
            coords.push(self.coord(order)?);
        }
        Ok(LineString(coords))
    }

    fn polygon_payload(&mut self, order: ByteOrder) -> std::result::Result<Polygon, FormatError> {
        let count = self.count(order, 4)?;
        let mut rings = Vec::with_capacity(count);
        for _ in 0..count {
            rings.push(self.line_string_payload(order)?);
        }
        Ok(Polygon(rings))
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_body, encode_body, parse_type_code, type_code};
    use crate::Result;
    use crate::error::FormatError;
    use crate::geometry::{ByteOrder, Coord, Geometry, LineString, Polygon};
    use crate::types::{Dimension, GeometryType};

    fn encode(geometry: &Geometry, dimension: Dimension, order: ByteOrder) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        encode_body(geometry, dimension, order, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn type_codes_follow_iso() {
        assert_eq!(type_code(GeometryType::Point, Dimension::Xy), 1);
        assert_eq!(type_code(GeometryType::LineString, Dimension::Xyz), 1002);
        assert_eq!(type_code(GeometryType::Polygon, Dimension::Xym), 2003);
        assert_eq!(type_code(GeometryType::MultiPolygon, Dimension::Xyzm), 3006);
    }

    #[test]
    fn parses_iso_and_extended_codes() {
        assert_eq!(
            parse_type_code(3004),
            Ok((GeometryType::MultiPoint, Dimension::Xyzm))
        );
        assert_eq!(
            parse_type_code(0x8000_0002),
            Ok((GeometryType::LineString, Dimension::Xyz))
        );
        assert_eq!(
            parse_type_code(0xC000_0003),
            Ok((GeometryType::Polygon, Dimension::Xyzm))
        );
        assert_eq!(
            parse_type_code(7),
            Err(FormatError::UnknownGeometryType(7))
        );
        assert_eq!(
            parse_type_code(4001),
            Err(FormatError::UnknownGeometryType(4001))
        );
        assert!(parse_type_code(0x2000_0001).is_err());
    }

    #[test]
    fn point_layout_little_endian() -> Result<()> {
        let body = encode(
            &Geometry::Point(Some(Coord::xy(1.0, 2.0))),
            Dimension::Xy,
            ByteOrder::LittleEndian,
        )?;
        let mut expected = vec![1u8, 1, 0, 0, 0];
        expected.extend_from_slice(&1.0f64.to_le_bytes());
        expected.extend_from_slice(&2.0f64.to_le_bytes());
        assert_eq!(body, expected);
        Ok(())
    }

    #[test]
    fn line_string_layout_big_endian() -> Result<()> {
        let line = Geometry::LineString(LineString(vec![
            Coord::xym(0.0, 1.0, 2.0),
            Coord::xym(3.0, 4.0, 5.0),
        ]));
        let body = encode(&line, Dimension::Xym, ByteOrder::BigEndian)?;
        let mut expected = vec![0u8];
        expected.extend_from_slice(&2002u32.to_be_bytes());
        expected.extend_from_slice(&2u32.to_be_bytes());
        for v in [0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0] {
            expected.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(body, expected);
        assert_eq!(decode_body(&body, Dimension::Xym, false)?, line);
        Ok(())
    }

    #[test]
    fn matches_independent_wkb_writer() -> Result<()> {
        use geo_types::{LineString as GeoLineString, MultiPolygon, Point, Polygon as GeoPolygon};

        fn reference<G: geo_traits::GeometryTrait<T = f64>>(geometry: &G) -> Vec<u8> {
            let mut buf = Vec::new();
            ::wkb::writer::write_geometry(&mut buf, geometry, &Default::default())
                .expect("reference wkb");
            buf
        }

        let ring = GeoLineString::from(vec![(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 0.0)]);
        let polygon = GeoPolygon::new(ring, vec![]);
        let multi = MultiPolygon::new(vec![polygon.clone(), polygon.clone()]);

        let ours = |g: &crate::GpkgGeometry| -> Result<Vec<u8>> {
            encode(&g.geometry, g.dimension, ByteOrder::LittleEndian)
        };

        let point = crate::GpkgGeometry::from_geometry(&Point::new(1.0, 2.0), 0)?;
        assert_eq!(ours(&point)?, reference(&Point::new(1.0, 2.0)));
        let polygon_value = crate::GpkgGeometry::from_geometry(&polygon, 0)?;
        assert_eq!(ours(&polygon_value)?, reference(&polygon));
        let multi_value = crate::GpkgGeometry::from_geometry(&multi, 0)?;
        assert_eq!(ours(&multi_value)?, reference(&multi));

        let bytes = ours(&multi_value)?;
        let parsed = ::wkb::reader::Wkb::try_new(&bytes).expect("parse ours");
        assert_eq!(parsed.geometry_type(), ::wkb::reader::GeometryType::MultiPolygon);
        Ok(())
    }

    #[test]
    fn honors_nested_byte_order_markers() -> Result<()> {
        // Big endian multipoint holding one little endian point.
        let mut body = vec![0u8];
        body.extend_from_slice(&4u32.to_be_bytes());
        body.extend_from_slice(&1u32.to_be_bytes());
        body.push(1);
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&5.0f64.to_le_bytes());
        body.extend_from_slice(&6.0f64.to_le_bytes());

        let decoded = decode_body(&body, Dimension::Xy, false)?;
        assert_eq!(decoded, Geometry::MultiPoint(vec![Coord::xy(5.0, 6.0)]));
        Ok(())
    }

    #[test]
    fn rejects_dimension_mismatch() -> Result<()> {
        let body = encode(
            &Geometry::Point(Some(Coord::xyz(1.0, 2.0, 3.0))),
            Dimension::Xyz,
            ByteOrder::LittleEndian,
        )?;
        let err = decode_body(&body, Dimension::Xym, false).expect_err("mismatch");
        assert_eq!(
            err,
            FormatError::DimensionMismatch {
                type_code: 1001,
                has_z: false,
                has_m: true
            }
        );
        Ok(())
    }

    #[test]
    fn rejects_wrong_nested_element() {
        // Multipolygon whose single part claims to be a point.
        let mut body = vec![1u8];
        body.extend_from_slice(&6u32.to_le_bytes());
        body.extend_from_slice(&1u32.to_le_bytes());
        body.push(1);
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&[0; 16]);

        let err = decode_body(&body, Dimension::Xy, false).expect_err("wrong element");
        assert_eq!(
            err,
            FormatError::UnexpectedElement {
                expected: "POLYGON",
                type_code: 1
            }
        );
    }

    #[test]
    fn rejects_huge_counts_and_trailing_bytes() -> Result<()> {
        let mut body = vec![1u8];
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_body(&body, Dimension::Xy, false),
            Err(FormatError::Truncated { .. })
        ));

        let mut body = encode(
            &Geometry::Point(Some(Coord::xy(0.0, 0.0))),
            Dimension::Xy,
            ByteOrder::LittleEndian,
        )?;
        body.push(0);
        assert_eq!(
            decode_body(&body, Dimension::Xy, false),
            Err(FormatError::TrailingBytes(1))
        );
        Ok(())
    }

    #[test]
    fn empty_body_has_no_counts() -> Result<()> {
        let body = encode(
            &Geometry::Polygon(Polygon::default()),
            Dimension::Xyz,
            ByteOrder::BigEndian,
        )?;
        assert_eq!(body.len(), 5);
        assert_eq!(
            decode_body(&body, Dimension::Xyz, true)?,
            Geometry::Polygon(Polygon::default())
        );
        Ok(())
    }
}
