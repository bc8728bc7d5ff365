//! Geometry values and the GeoPackage binary geometry codec.
//!
//! A stored geometry is a [header](header) followed by a [WKB body](body).
//! [`GpkgGeometry`] is the in-memory value exchanged with callers; it binds
//! directly as a SQL parameter and reads directly from a row.

pub mod header;
mod io;
pub mod body;

pub use header::{Envelope, EnvelopeType, GeometryHeader, decode_header, encode_header};
pub use io::ByteOrder;
pub use body::{decode_body, encode_body};

use crate::conversions::dimension_from_traits;
use crate::error::{FormatError, GpkgError, Result};
use crate::types::{Dimension, GeometryType};
use geo_traits::{
    CoordTrait, GeometryTrait, LineStringTrait, MultiLineStringTrait, MultiPointTrait,
    MultiPolygonTrait, PointTrait, PolygonTrait,
};
use io::Reader;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// One coordinate tuple. `z` and `m` are present exactly when the owning
/// geometry's dimension has them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            z: Some(z),
            ..Self::xy(x, y)
        }
    }

    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self {
            m: Some(m),
            ..Self::xy(x, y)
        }
    }

    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            z: Some(z),
            m: Some(m),
            ..Self::xy(x, y)
        }
    }

    pub fn dimension(&self) -> Dimension {
        Dimension::from_flags(self.z.is_some(), self.m.is_some())
    }
}

/// A sequence of coordinates; also used for polygon rings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineString(pub Vec<Coord>);

impl LineString {
    pub fn coords(&self) -> &[Coord] {
        &self.0
    }
}

impl From<Vec<Coord>> for LineString {
    fn from(coords: Vec<Coord>) -> Self {
        Self(coords)
    }
}

/// Rings of a polygon: the first is the exterior, the rest are interiors.
/// Winding order is kept as given.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon(pub Vec<LineString>);

impl Polygon {
    pub fn new(exterior: LineString, interiors: Vec<LineString>) -> Self {
        let mut rings = Vec::with_capacity(interiors.len() + 1);
        rings.push(exterior);
        rings.extend(interiors);
        Self(rings)
    }

    pub fn rings(&self) -> &[LineString] {
        &self.0
    }

    pub fn exterior(&self) -> Option<&LineString> {
        self.0.first()
    }

    pub fn interiors(&self) -> &[LineString] {
        self.0.get(1..).unwrap_or_default()
    }
}

/// Geometry kinds with their coordinate storage.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Option<Coord>),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// The empty geometry of the given kind.
    pub fn empty(geometry_type: GeometryType) -> Self {
        match geometry_type {
            GeometryType::Point => Self::Point(None),
            GeometryType::LineString => Self::LineString(LineString::default()),
            GeometryType::Polygon => Self::Polygon(Polygon::default()),
            GeometryType::MultiPoint => Self::MultiPoint(Vec::new()),
            GeometryType::MultiLineString => Self::MultiLineString(Vec::new()),
            GeometryType::MultiPolygon => Self::MultiPolygon(Vec::new()),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::Polygon(_) => GeometryType::Polygon,
            Self::MultiPoint(_) => GeometryType::MultiPoint,
            Self::MultiLineString(_) => GeometryType::MultiLineString,
            Self::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// True when the top level holds no elements: no coordinate for a point,
    /// no coordinates for a line string, no rings or parts otherwise.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Point(coord) => coord.is_none(),
            Self::LineString(line) => line.0.is_empty(),
            Self::Polygon(polygon) => polygon.0.is_empty(),
            Self::MultiPoint(points) => points.is_empty(),
            Self::MultiLineString(lines) => lines.is_empty(),
            Self::MultiPolygon(polygons) => polygons.is_empty(),
        }
    }

    /// Visit every coordinate in storage order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, mut f: F) {
        match self {
            Self::Point(coord) => coord.iter().for_each(f),
            Self::LineString(line) => line.0.iter().for_each(f),
            Self::Polygon(polygon) => polygon.0.iter().flat_map(|ring| &ring.0).for_each(f),
            Self::MultiPoint(points) => points.iter().for_each(f),
            Self::MultiLineString(lines) => lines.iter().flat_map(|line| &line.0).for_each(f),
            Self::MultiPolygon(polygons) => {
                for polygon in polygons {
                    polygon.0.iter().flat_map(|ring| &ring.0).for_each(&mut f);
                }
            }
        }
    }
}

/// A geometry value together with its dimension and spatial reference.
#[derive(Clone, Debug, PartialEq)]
pub struct GpkgGeometry {
    pub srs_id: i32,
    pub dimension: Dimension,
    pub geometry: Geometry,
}

impl GpkgGeometry {
    pub fn new(srs_id: i32, dimension: Dimension, geometry: Geometry) -> Self {
        Self {
            srs_id,
            dimension,
            geometry,
        }
    }

    /// A two dimensional point.
    pub fn point(srs_id: i32, x: f64, y: f64) -> Self {
        Self::new(srs_id, Dimension::Xy, Geometry::Point(Some(Coord::xy(x, y))))
    }

    pub fn empty(srs_id: i32, geometry_type: GeometryType, dimension: Dimension) -> Self {
        Self::new(srs_id, dimension, Geometry::empty(geometry_type))
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn has_z(&self) -> bool {
        self.dimension.has_z()
    }

    pub fn has_m(&self) -> bool {
        self.dimension.has_m()
    }

    /// Bounding box over all coordinates, including Z and M ranges when the
    /// dimension has them. `None` when there are no coordinates.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut envelope: Option<Envelope> = None;
        self.geometry.for_each_coord(|coord| add_coord(&mut envelope, coord));
        envelope
    }

    /// Encode as a GeoPackage blob.
    ///
    /// `envelope_type` selects which envelope ranges are written; ranges the
    /// geometry does not have are left out, and empty geometries never carry
    /// an envelope.
    pub fn to_gpkg_bytes(&self, envelope_type: EnvelopeType, byte_order: ByteOrder) -> Result<Vec<u8>> {
        let empty = self.is_empty();
        let envelope = if empty {
            None
        } else {
            self.envelope()
                .and_then(|envelope| envelope.restricted_to(envelope_type))
        };

        let header = GeometryHeader::new(self.srs_id, byte_order, empty, envelope);
        let mut buf = Vec::with_capacity(64);
        encode_header(&header, &mut buf);
        encode_body(&self.geometry, self.dimension, byte_order, &mut buf)?;
        Ok(buf)
    }

    /// Encode with the default write policy: little endian, no envelope for
    /// points and an XY envelope for everything else.
    pub fn to_gpkg_bytes_default(&self) -> Result<Vec<u8>> {
        let envelope_type = match self.geometry_type() {
            GeometryType::Point => EnvelopeType::None,
            _ => EnvelopeType::Xy,
        };
        self.to_gpkg_bytes(envelope_type, ByteOrder::LittleEndian)
    }

    /// Decode a GeoPackage blob. The dimension comes from the body's type code.
    pub fn from_gpkg_bytes(bytes: &[u8]) -> std::result::Result<Self, FormatError> {
        Self::decode_with_header(bytes, None).map(|(_, geometry)| geometry)
    }

    /// Decode a GeoPackage blob whose dimension must be `dimension`, as
    /// declared for the column it was read from.
    pub fn from_gpkg_bytes_with_dimension(
        bytes: &[u8],
        dimension: Dimension,
    ) -> std::result::Result<Self, FormatError> {
        Self::decode_with_header(bytes, Some(dimension)).map(|(_, geometry)| geometry)
    }

    /// Decode a GeoPackage blob and also return its header.
    pub fn decode_with_header(
        bytes: &[u8],
        dimension: Option<Dimension>,
    ) -> std::result::Result<(GeometryHeader, Self), FormatError> {
        let mut reader = Reader::new(bytes);
        let header = header::read_header(&mut reader)?;
        let body = &bytes[reader.position()..];

        let (type_code, body_dimension) = body::peek_type(body)?;
        let dimension = dimension.unwrap_or(body_dimension);
        let envelope_type = header.envelope_type();
        if (envelope_type.has_z() && !dimension.has_z())
            || (envelope_type.has_m() && !dimension.has_m())
        {
            return Err(FormatError::DimensionMismatch {
                type_code,
                has_z: dimension.has_z(),
                has_m: dimension.has_m(),
            });
        }

        let geometry = decode_body(body, dimension, header.empty)?;
        Ok((header, Self::new(header.srs_id, dimension, geometry)))
    }

    /// Convert any supported `geo_traits` geometry.
    pub fn from_geometry<G: GeometryTrait<T = f64>>(geometry: &G, srs_id: i32) -> Result<Self> {
        use geo_traits::GeometryType as GeoType;

        let dimension = dimension_from_traits(geometry.dim())?;
        let geometry = match geometry.as_type() {
            GeoType::Point(point) => Geometry::Point(point.coord().map(|c| coord_from(&c, dimension))),
            GeoType::LineString(line) => Geometry::LineString(line_string_from(line, dimension)),
            GeoType::Polygon(polygon) => Geometry::Polygon(polygon_from(polygon, dimension)),
            GeoType::MultiPoint(multi) => Geometry::MultiPoint(
                multi
                    .points()
                    .map(|point| {
                        point.coord().map(|c| coord_from(&c, dimension)).ok_or_else(|| {
                            GpkgError::UnsupportedGeometryType(
                                "MULTIPOINT with an empty point".to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            GeoType::MultiLineString(multi) => Geometry::MultiLineString(
                multi
                    .line_strings()
                    .map(|line| line_string_from(&line, dimension))
                    .collect(),
            ),
            GeoType::MultiPolygon(multi) => Geometry::MultiPolygon(
                multi
                    .polygons()
                    .map(|polygon| polygon_from(&polygon, dimension))
                    .collect(),
            ),
            GeoType::GeometryCollection(_) => {
                return Err(GpkgError::UnsupportedGeometryType(
                    "GEOMETRYCOLLECTION".to_string(),
                ));
            }
            GeoType::Rect(_) | GeoType::Triangle(_) | GeoType::Line(_) => {
                return Err(GpkgError::UnsupportedGeometryType(
                    "RECT/TRIANGLE/LINE".to_string(),
                ));
            }
        };

        Ok(Self::new(srs_id, dimension, geometry))
    }
}

fn coord_from<C: CoordTrait<T = f64>>(coord: &C, dimension: Dimension) -> Coord {
    let (x, y) = coord.x_y();
    // Z (when present) is always the third ordinate, M follows it.
    match dimension {
        Dimension::Xy => Coord::xy(x, y),
        Dimension::Xyz => Coord::xyz(x, y, coord.nth(2).unwrap_or(f64::NAN)),
        Dimension::Xym => Coord::xym(x, y, coord.nth(2).unwrap_or(f64::NAN)),
        Dimension::Xyzm => Coord::xyzm(
            x,
            y,
            coord.nth(2).unwrap_or(f64::NAN),
            coord.nth(3).unwrap_or(f64::NAN),
        ),
    }
}

fn line_string_from<L: LineStringTrait<T = f64>>(line: &L, dimension: Dimension) -> LineString {
    LineString(line.coords().map(|c| coord_from(&c, dimension)).collect())
}

fn polygon_from<P: PolygonTrait<T = f64>>(polygon: &P, dimension: Dimension) -> Polygon {
    let mut rings = Vec::with_capacity(polygon.num_interiors() + 1);
    if let Some(exterior) = polygon.exterior() {
        rings.push(line_string_from(&exterior, dimension));
    }
    for ring in polygon.interiors() {
        rings.push(line_string_from(&ring, dimension));
    }
    Polygon(rings)
}

fn add_coord(envelope: &mut Option<Envelope>, coord: &Coord) {
    fn grow(range: Option<(f64, f64)>, value: Option<f64>) -> Option<(f64, f64)> {
        match (range, value) {
            (Some((min, max)), Some(v)) => Some((min.min(v), max.max(v))),
            (None, Some(v)) => Some((v, v)),
            (range, None) => range,
        }
    }

    match envelope {
        Some(existing) => {
            existing.min_x = existing.min_x.min(coord.x);
            existing.max_x = existing.max_x.max(coord.x);
            existing.min_y = existing.min_y.min(coord.y);
            existing.max_y = existing.max_y.max(coord.y);
            existing.z = grow(existing.z, coord.z);
            existing.m = grow(existing.m, coord.m);
        }
        None => {
            *envelope = Some(Envelope {
                min_x: coord.x,
                max_x: coord.x,
                min_y: coord.y,
                max_y: coord.y,
                z: coord.z.map(|z| (z, z)),
                m: coord.m.map(|m| (m, m)),
            });
        }
    }
}

impl ToSql for GpkgGeometry {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let bytes = self
            .to_gpkg_bytes_default()
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        Ok(ToSqlOutput::from(bytes))
    }
}

impl FromSql for GpkgGeometry {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = value.as_blob()?;
        Self::from_gpkg_bytes(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ByteOrder, Coord, EnvelopeType, Geometry, GpkgGeometry, LineString, Polygon,
    };
    use crate::Result;
    use crate::error::FormatError;
    use crate::types::{Dimension, GeometryType};
    use geo_types::{LineString as GeoLineString, MultiPolygon as GeoMultiPolygon, Point};
    use std::str::FromStr;
    use wkt::Wkt;

    fn coord(dimension: Dimension, x: f64, y: f64) -> Coord {
        match dimension {
            Dimension::Xy => Coord::xy(x, y),
            Dimension::Xyz => Coord::xyz(x, y, x + y),
            Dimension::Xym => Coord::xym(x, y, x - y),
            Dimension::Xyzm => Coord::xyzm(x, y, x + y, x - y),
        }
    }

    fn ring(dimension: Dimension, offset: f64) -> LineString {
        LineString(vec![
            coord(dimension, offset, offset),
            coord(dimension, offset + 3.0, offset),
            coord(dimension, offset + 3.0, offset + 3.0),
            coord(dimension, offset, offset),
        ])
    }

    fn samples(dimension: Dimension) -> Vec<Geometry> {
        let line = LineString(vec![
            coord(dimension, 0.0, 0.0),
            coord(dimension, 1.5, 1.0),
            coord(dimension, 2.0, -0.5),
        ]);
        // Clockwise interior ring; winding must survive as is.
        let hole = LineString(vec![
            coord(dimension, 1.0, 1.0),
            coord(dimension, 1.0, 2.0),
            coord(dimension, 2.0, 2.0),
            coord(dimension, 1.0, 1.0),
        ]);
        let polygon = Polygon::new(ring(dimension, 0.0), vec![hole]);
        vec![
            Geometry::Point(Some(coord(dimension, 1.0, 2.0))),
            Geometry::LineString(line.clone()),
            Geometry::Polygon(polygon.clone()),
            Geometry::MultiPoint(vec![coord(dimension, 0.0, 0.0), coord(dimension, 1.0, 1.0)]),
            Geometry::MultiLineString(vec![line, LineString::default()]),
            Geometry::MultiPolygon(vec![polygon, Polygon::new(ring(dimension, 10.0), vec![])]),
        ]
    }

    const DIMENSIONS: [Dimension; 4] = [
        Dimension::Xy,
        Dimension::Xyz,
        Dimension::Xym,
        Dimension::Xyzm,
    ];
    const ORDERS: [ByteOrder; 2] = [ByteOrder::BigEndian, ByteOrder::LittleEndian];

    #[test]
    fn roundtrips_all_kinds_dimensions_and_orders() -> Result<()> {
        for dimension in DIMENSIONS {
            for geometry in samples(dimension) {
                for order in ORDERS {
                    for envelope_type in [EnvelopeType::None, EnvelopeType::Xyzm] {
                        let value = GpkgGeometry::new(32623, dimension, geometry.clone());
                        let bytes = value.to_gpkg_bytes(envelope_type, order)?;
                        let decoded = GpkgGeometry::from_gpkg_bytes(&bytes)?;
                        assert_eq!(decoded, value, "{dimension:?} {order:?}");

                        let strict = GpkgGeometry::from_gpkg_bytes_with_dimension(&bytes, dimension)?;
                        assert_eq!(strict, value);
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn truncated_blobs_never_decode() -> Result<()> {
        for dimension in DIMENSIONS {
            for geometry in samples(dimension) {
                let value = GpkgGeometry::new(4326, dimension, geometry);
                let bytes = value.to_gpkg_bytes(EnvelopeType::Xy, ByteOrder::BigEndian)?;
                for len in 0..bytes.len() {
                    assert!(
                        GpkgGeometry::from_gpkg_bytes(&bytes[..len]).is_err(),
                        "{:?} prefix of {len} bytes decoded",
                        value.geometry_type()
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn empty_geometries_have_no_envelope() -> Result<()> {
        for dimension in DIMENSIONS {
            for geometry_type in [
                GeometryType::Point,
                GeometryType::LineString,
                GeometryType::Polygon,
                GeometryType::MultiPoint,
                GeometryType::MultiLineString,
                GeometryType::MultiPolygon,
            ] {
                let value = GpkgGeometry::empty(0, geometry_type, dimension);
                let bytes = value.to_gpkg_bytes(EnvelopeType::Xyzm, ByteOrder::LittleEndian)?;
                // fixed header + marker + type code, nothing else
                assert_eq!(bytes.len(), 8 + 1 + 4);
                assert_eq!(bytes[3] & 0b0000_1110, 0);
                assert_eq!(bytes[3] & 0b0001_0000, 0b0001_0000);

                let (header, decoded) = GpkgGeometry::decode_with_header(&bytes, None)?;
                assert!(header.empty);
                assert_eq!(header.envelope, None);
                assert!(decoded.is_empty());
                assert_eq!(decoded.geometry_type(), geometry_type);
                assert_eq!(decoded, value);
            }
        }
        Ok(())
    }

    #[test]
    fn writes_requested_envelope() -> Result<()> {
        let line = GpkgGeometry::new(
            4326,
            Dimension::Xyz,
            Geometry::LineString(LineString(vec![
                Coord::xyz(1.0, 5.0, -2.0),
                Coord::xyz(-3.0, 2.0, 7.0),
            ])),
        );
        let bytes = line.to_gpkg_bytes(EnvelopeType::Xyzm, ByteOrder::LittleEndian)?;
        let (header, _) = GpkgGeometry::decode_with_header(&bytes, None)?;
        let envelope = header.envelope.expect("envelope");
        assert_eq!(envelope.envelope_type(), EnvelopeType::Xyz);
        assert_eq!(
            (envelope.min_x, envelope.max_x, envelope.min_y, envelope.max_y),
            (-3.0, 1.0, 2.0, 5.0)
        );
        assert_eq!(envelope.z, Some((-2.0, 7.0)));
        Ok(())
    }

    #[test]
    fn srs_id_is_carried_verbatim() -> Result<()> {
        for srs_id in [-1, 0, 4326, 32623, i32::MAX] {
            let bytes = GpkgGeometry::point(srs_id, 1.0, 2.0).to_gpkg_bytes_default()?;
            assert_eq!(GpkgGeometry::from_gpkg_bytes(&bytes)?.srs_id, srs_id);
        }
        Ok(())
    }

    #[test]
    fn strict_decode_rejects_other_dimension() -> Result<()> {
        let point = GpkgGeometry::new(4326, Dimension::Xyz, Geometry::Point(Some(Coord::xyz(1.0, 2.0, 3.0))));
        let bytes = point.to_gpkg_bytes_default()?;
        let err = GpkgGeometry::from_gpkg_bytes_with_dimension(&bytes, Dimension::Xy)
            .expect_err("dimension mismatch");
        assert!(matches!(err, FormatError::DimensionMismatch { .. }));
        Ok(())
    }

    #[test]
    fn rejects_mismatched_coordinate_on_encode() {
        let value = GpkgGeometry::new(
            4326,
            Dimension::Xyz,
            Geometry::LineString(LineString(vec![Coord::xyz(0.0, 0.0, 0.0), Coord::xy(1.0, 1.0)])),
        );
        let err = value.to_gpkg_bytes_default().expect_err("mixed coordinates");
        assert!(matches!(err, crate::GpkgError::CoordinateDimension));
    }

    #[test]
    fn converts_geo_traits_geometries() -> Result<()> {
        let point = GpkgGeometry::from_geometry(&Point::new(1.0, 2.0), 4326)?;
        assert_eq!(point, GpkgGeometry::point(4326, 1.0, 2.0));

        let line = GpkgGeometry::from_geometry(&GeoLineString::from(vec![(0.0, 0.0), (1.0, 1.0)]), 4326)?;
        assert_eq!(
            line.geometry,
            Geometry::LineString(LineString(vec![Coord::xy(0.0, 0.0), Coord::xy(1.0, 1.0)]))
        );

        let empty = GpkgGeometry::from_geometry(&GeoMultiPolygon::<f64>::new(vec![]), 4326)?;
        assert!(empty.is_empty());

        let polygon_zm = Wkt::from_str("POLYGON ZM ((0 0 1 10, 2 0 2 11, 2 2 3 12, 0 0 1 10))")
            .map_err(|err| crate::GpkgError::Message(err.to_string()))?;
        let polygon_zm = GpkgGeometry::from_geometry(&polygon_zm, 4326)?;
        assert_eq!(polygon_zm.dimension, Dimension::Xyzm);
        match &polygon_zm.geometry {
            Geometry::Polygon(polygon) => {
                let exterior = polygon.exterior().expect("exterior");
                assert_eq!(exterior.coords()[1], Coord::xyzm(2.0, 0.0, 2.0, 11.0));
            }
            other => panic!("unexpected geometry: {other:?}"),
        }

        let line_m = Wkt::from_str("LINESTRING M (0 0 5, 1 1 6)")
            .map_err(|err| crate::GpkgError::Message(err.to_string()))?;
        let line_m = GpkgGeometry::from_geometry(&line_m, 4326)?;
        assert_eq!(line_m.dimension, Dimension::Xym);
        assert_eq!(
            line_m.geometry,
            Geometry::LineString(LineString(vec![Coord::xym(0.0, 0.0, 5.0), Coord::xym(1.0, 1.0, 6.0)]))
        );
        Ok(())
    }

    #[test]
    fn rejects_geometry_collections() {
        let collection = Wkt::from_str("GEOMETRYCOLLECTION (POINT (1 2))").expect("wkt");
        let err = GpkgGeometry::from_geometry(&collection, 4326).expect_err("collection");
        assert!(matches!(err, crate::GpkgError::UnsupportedGeometryType(_)));
    }

    #[test]
    fn from_geometry_rejects_empty_point_in_multipoint() {
        use wkt::types::{Coord as WktCoord, Dimension as WktDimension, MultiPoint, Point as WktPoint};

        let multi = Wkt::MultiPoint(MultiPoint::new(
            vec![
                WktPoint::new(
                    Some(WktCoord {
                        x: 1.0,
                        y: 2.0,
                        z: None,
                        m: None,
                    }),
                    WktDimension::XY,
                ),
                WktPoint::empty(WktDimension::XY),
            ],
            WktDimension::XY,
        ));
        let err = GpkgGeometry::from_geometry(&multi, 4326).expect_err("empty member");
        assert!(matches!(err, crate::GpkgError::UnsupportedGeometryType(_)));
    }
}
