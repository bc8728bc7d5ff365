use crate::error::{GpkgError, Result};
use crate::types::{Dimension, Field, FieldType, GeometryType};

#[inline]
pub(crate) fn geometry_type_to_str(geometry_type: GeometryType) -> &'static str {
    match geometry_type {
        GeometryType::Point => "POINT",
        GeometryType::LineString => "LINESTRING",
        GeometryType::Polygon => "POLYGON",
        GeometryType::MultiPoint => "MULTIPOINT",
        GeometryType::MultiLineString => "MULTILINESTRING",
        GeometryType::MultiPolygon => "MULTIPOLYGON",
    }
}

#[inline]
pub(crate) fn geometry_type_from_str(geometry_type_str: &str) -> Result<GeometryType> {
    let s = geometry_type_str;
    if s.eq_ignore_ascii_case("POINT") {
        Ok(GeometryType::Point)
    } else if s.eq_ignore_ascii_case("LINESTRING") {
        Ok(GeometryType::LineString)
    } else if s.eq_ignore_ascii_case("POLYGON") {
        Ok(GeometryType::Polygon)
    } else if s.eq_ignore_ascii_case("MULTIPOINT") {
        Ok(GeometryType::MultiPoint)
    } else if s.eq_ignore_ascii_case("MULTILINESTRING") {
        Ok(GeometryType::MultiLineString)
    } else if s.eq_ignore_ascii_case("MULTIPOLYGON") {
        Ok(GeometryType::MultiPolygon)
    } else {
        // GEOMETRY and GEOMETRYCOLLECTION columns are valid GeoPackage, but
        // not something a feature class here can describe.
        Err(GpkgError::UnsupportedGeometryType(
            geometry_type_str.to_string(),
        ))
    }
}

#[inline]
pub(crate) fn dimension_to_zm(dimension: Dimension) -> (i64, i64) {
    (i64::from(dimension.has_z()), i64::from(dimension.has_m()))
}

#[inline]
pub(crate) fn dimension_from_zm(z: i64, m: i64) -> Result<Dimension> {
    match (z, m) {
        (0, 0) => Ok(Dimension::Xy),
        (1, 0) => Ok(Dimension::Xyz),
        (0, 1) => Ok(Dimension::Xym),
        (1, 1) => Ok(Dimension::Xyzm),
        // 2 means "optional" in gpkg_geometry_columns. A column here always
        // has a fixed dimension, so it is rejected along with garbage values.
        _ => Err(GpkgError::InvalidDimension { z, m }),
    }
}

pub(crate) fn dimension_from_traits(dimensions: geo_traits::Dimensions) -> Result<Dimension> {
    match dimensions {
        geo_traits::Dimensions::Xy => Ok(Dimension::Xy),
        geo_traits::Dimensions::Xyz => Ok(Dimension::Xyz),
        geo_traits::Dimensions::Xym => Ok(Dimension::Xym),
        geo_traits::Dimensions::Xyzm => Ok(Dimension::Xyzm),
        geo_traits::Dimensions::Unknown(n) => Err(GpkgError::Message(format!(
            "cannot infer Z/M layout of a geometry with {n} dimensions"
        ))),
    }
}

#[inline]
pub(crate) fn field_type_to_str(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Boolean => "BOOLEAN",
        FieldType::TinyInt => "TINYINT",
        FieldType::SmallInt => "SMALLINT",
        FieldType::MediumInt => "MEDIUMINT",
        FieldType::Integer => "INTEGER",
        FieldType::Float => "FLOAT",
        FieldType::Double => "DOUBLE",
        FieldType::Real => "REAL",
        FieldType::Text => "TEXT",
        FieldType::Blob => "BLOB",
        FieldType::Date => "DATE",
        FieldType::DateTime => "DATETIME",
    }
}

/// Column definition for a field, e.g. `"name" TEXT(100) NOT NULL`.
pub(crate) fn field_to_column_def(field: &Field) -> String {
    let mut def = format!("{} {}", quote_ident(&field.name), field_type_to_str(field.field_type));
    if let (FieldType::Text, Some(size)) = (field.field_type, field.size) {
        def.push_str(&format!("({size})"));
    }
    if !field.nullable {
        def.push_str(" NOT NULL");
    }
    def
}

/// Parse a declared column type as reported by `pragma_table_info`.
///
/// Returns the type and, for `TEXT(n)`, the size.
pub(crate) fn field_type_from_str(declared_type: &str) -> Option<(FieldType, Option<u32>)> {
    let declared_type = declared_type.trim();
    let (s, size) = match declared_type.split_once('(') {
        Some((base, rest)) => {
            let size = rest.strip_suffix(')')?.trim().parse::<u32>().ok()?;
            (base.trim(), Some(size))
        }
        None => (declared_type, None),
    };

    let field_type = if s.eq_ignore_ascii_case("BOOLEAN") {
        FieldType::Boolean
    } else if s.eq_ignore_ascii_case("TINYINT") {
        FieldType::TinyInt
    } else if s.eq_ignore_ascii_case("SMALLINT") {
        FieldType::SmallInt
    } else if s.eq_ignore_ascii_case("MEDIUMINT") {
        FieldType::MediumInt
    } else if s.eq_ignore_ascii_case("INTEGER") || s.eq_ignore_ascii_case("INT") {
        FieldType::Integer
    } else if s.eq_ignore_ascii_case("FLOAT") {
        FieldType::Float
    } else if s.eq_ignore_ascii_case("DOUBLE") {
        FieldType::Double
    } else if s.eq_ignore_ascii_case("REAL") {
        FieldType::Real
    } else if s.eq_ignore_ascii_case("TEXT") {
        FieldType::Text
    } else if s.eq_ignore_ascii_case("BLOB") {
        FieldType::Blob
    } else if s.eq_ignore_ascii_case("DATE") {
        FieldType::Date
    } else if s.eq_ignore_ascii_case("DATETIME") {
        FieldType::DateTime
    } else {
        return None;
    };

    match (field_type, size) {
        (FieldType::Text | FieldType::Blob, size) => Some((field_type, size)),
        (_, None) => Some((field_type, None)),
        (_, Some(_)) => None,
    }
}

/// Double-quote an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
