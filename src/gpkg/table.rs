use crate::error::{GpkgError, Result};
use crate::geometry::GpkgGeometry;
use crate::types::{Dimension, Extent, Field, GeometryColumn, GeometryType};

use super::gpkg::Gpkg;
use super::srs::SpatialReferenceSystem;

/// A table described in `gpkg_contents`.
///
/// Every table has an integer primary key `fid` in addition to its fields.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    pub(crate) gpkg: &'a Gpkg,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) fields: Vec<Field>,
}

impl<'a> Table<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Attribute fields in column order. Excludes the primary key and, for a
    /// feature class, the geometry column.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Number of rows.
    pub fn count(&self) -> Result<i64> {
        self.gpkg.catalog().count_rows(&self.name)
    }
}

/// A feature class: a table with one geometry column.
///
/// This is a view over the catalog rows. The extent is read from and written
/// to `gpkg_contents` on every call; everything else is fixed at creation.
#[derive(Debug, Clone)]
pub struct FeatureClass<'a> {
    pub(crate) table: Table<'a>,
    pub(crate) geometry_column: GeometryColumn,
    pub(crate) srs: SpatialReferenceSystem,
    pub(crate) spatial_index: bool,
}

impl<'a> FeatureClass<'a> {
    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn description(&self) -> &str {
        self.table.description()
    }

    pub fn fields(&self) -> &[Field] {
        self.table.fields()
    }

    pub fn as_table(&self) -> &Table<'a> {
        &self.table
    }

    pub fn count(&self) -> Result<i64> {
        self.table.count()
    }

    pub fn geometry_column(&self) -> &str {
        &self.geometry_column.name
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_column.geometry_type
    }

    pub fn dimension(&self) -> Dimension {
        self.geometry_column.dimension
    }

    pub fn has_z(&self) -> bool {
        self.geometry_column.dimension.has_z()
    }

    pub fn has_m(&self) -> bool {
        self.geometry_column.dimension.has_m()
    }

    pub fn srs(&self) -> &SpatialReferenceSystem {
        &self.srs
    }

    pub fn srs_id(&self) -> i32 {
        self.geometry_column.srs_id
    }

    pub fn has_spatial_index(&self) -> bool {
        self.spatial_index
    }

    /// The stored extent. All NaN until one is set.
    pub fn extent(&self) -> Result<Extent> {
        self.table.gpkg.catalog().extent(self.name())
    }

    /// Overwrite the stored extent.
    pub fn set_extent(&self, extent: Extent) -> Result<()> {
        self.table.gpkg.catalog().update_extent(self.name(), extent)
    }

    /// Check that a geometry can be stored in this feature class: same kind,
    /// same dimension and same `srs_id` as the column.
    pub fn check_geometry(&self, geometry: &GpkgGeometry) -> Result<()> {
        let mismatch = |reason: String| GpkgError::GeometryMismatch {
            table_name: self.name().to_string(),
            reason,
        };

        if geometry.geometry_type() != self.geometry_type() {
            return Err(mismatch(format!(
                "expected {:?}, got {:?}",
                self.geometry_type(),
                geometry.geometry_type()
            )));
        }
        if geometry.dimension != self.dimension() {
            return Err(mismatch(format!(
                "expected {:?} coordinates, got {:?}",
                self.dimension(),
                geometry.dimension
            )));
        }
        if geometry.srs_id != self.srs_id() {
            return Err(mismatch(format!(
                "expected srs_id {}, got {}",
                self.srs_id(),
                geometry.srs_id
            )));
        }
        Ok(())
    }

    /// Decode a blob read from the geometry column. The body must have the
    /// column's dimension.
    pub fn decode_geometry(&self, bytes: &[u8]) -> Result<GpkgGeometry> {
        Ok(GpkgGeometry::from_gpkg_bytes_with_dimension(
            bytes,
            self.dimension(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GpkgError;
    use crate::geometry::{Coord, Geometry, GpkgGeometry};
    use crate::gpkg::{Gpkg, SpatialReferenceSystem};
    use crate::types::{Dimension, Field, FieldType, GeometryType};

    #[test]
    fn check_geometry_policy() -> crate::Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let fc = gpkg
            .feature_class_builder("pts_z")
            .srs(SpatialReferenceSystem::wgs84())
            .z(true)
            .create()?;

        let good = GpkgGeometry::new(4326, Dimension::Xyz, Geometry::Point(Some(Coord::xyz(1.0, 2.0, 3.0))));
        fc.check_geometry(&good)?;

        for bad in [
            GpkgGeometry::point(4326, 1.0, 2.0),
            GpkgGeometry::new(0, Dimension::Xyz, Geometry::Point(Some(Coord::xyz(1.0, 2.0, 3.0)))),
            GpkgGeometry::empty(4326, GeometryType::LineString, Dimension::Xyz),
        ] {
            assert!(matches!(
                fc.check_geometry(&bad),
                Err(GpkgError::GeometryMismatch { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn decode_geometry_uses_column_dimension() -> crate::Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let fc = gpkg.create_feature_class("pts", &SpatialReferenceSystem::wgs84(), &[])?;

        let blob = GpkgGeometry::point(4326, 1.0, 2.0).to_gpkg_bytes_default()?;
        assert_eq!(fc.decode_geometry(&blob)?, GpkgGeometry::point(4326, 1.0, 2.0));

        let blob_z = GpkgGeometry::new(4326, Dimension::Xyz, Geometry::Point(Some(Coord::xyz(1.0, 2.0, 3.0))))
            .to_gpkg_bytes_default()?;
        assert!(matches!(fc.decode_geometry(&blob_z), Err(GpkgError::Format(_))));
        Ok(())
    }

    #[test]
    fn table_fields_and_count() -> crate::Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let table = gpkg.create_table(
            "TTT",
            &[
                Field::new("AAA", FieldType::Integer),
                Field::text_with_size("BBB", 10),
                Field::new("CCC", FieldType::Text).not_null(),
                Field::new("DDD", FieldType::Double),
            ],
        )?;
        assert_eq!(table.count()?, 0);
        assert_eq!(table.fields().len(), 4);
        assert_eq!(table.field("bbb").and_then(|f| f.size), Some(10));
        assert_eq!(table.field("CCC").map(|f| f.nullable), Some(false));

        gpkg.connection()
            .execute(r#"INSERT INTO "TTT" ("CCC") VALUES ('x')"#, [])?;
        assert_eq!(table.count()?, 1);
        Ok(())
    }
}
