//! Catalog and schema management for a GeoPackage container.
//!
//! [`Gpkg`] owns the connection. [`Catalog`] keeps the system tables
//! consistent, [`FeatureClassBuilder`] creates tables through it, and
//! [`Table`] / [`FeatureClass`] are views over the resulting catalog rows.

mod builder;
mod catalog;
mod gpkg;
mod srs;
mod table;

pub use builder::FeatureClassBuilder;
pub use catalog::Catalog;
pub use gpkg::{Gpkg, GpkgOptions};
pub use srs::SpatialReferenceSystem;
pub use table::{FeatureClass, Table};

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{Gpkg, SpatialReferenceSystem};
    use crate::error::GpkgError;
    use crate::geometry::GpkgGeometry;
    use crate::types::{Extent, Field, FieldType, GeometryType};

    const WGS_1984_UTM_ZONE_23N: &str = r#"PROJCS["WGS_1984_UTM_Zone_23N",
       GEOGCS["GCS_WGS_1984",
       DATUM["D_WGS_1984",
       SPHEROID["WGS_1984",6378137.0,298.257223563]],
       PRIMEM["Greenwich",0.0],
       UNIT["Degree",0.0174532925199433]],
       PROJECTION["Transverse_Mercator"],
       PARAMETER["False_Easting",500000.0],
       PARAMETER["False_Northing",0.0],
       PARAMETER["Central_Meridian",-45.0],
       PARAMETER["Scale_Factor",0.9996],
       PARAMETER["Latitude_Of_Origin",0.0],
       UNIT["Meter",1.0]];IsHighPrecision"#;

    const INSERT_ROWS: &str = "INSERT INTO test1 (SHAPE, int_fld, text_fld, test_fld_size, test_bool) \
                               VALUES (?1, ?2, ?3, ?4, ?5)";

    fn utm_23n() -> SpatialReferenceSystem {
        SpatialReferenceSystem::new("WGS_1984_UTM_Zone_23N", "EPSG", 32623, WGS_1984_UTM_ZONE_23N)
    }

    fn test_fields() -> Vec<Field> {
        vec![
            Field::new("int_fld", FieldType::Integer),
            Field::new("text_fld", FieldType::Text),
            Field::text_with_size("test_fld_size", 100),
            Field::new("test_bool", FieldType::Boolean),
        ]
    }

    fn insert_random_points(gpkg: &Gpkg, count: usize, srs_id: i32) -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(23);
        let tx = gpkg.connection().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_ROWS)?;
            for i in 0..count {
                let shape = GpkgGeometry::point(
                    srs_id,
                    rng.gen_range(300000.0..700000.0),
                    rng.gen_range(0.0..4000000.0),
                );
                stmt.execute(rusqlite::params![
                    shape,
                    rng.gen_range(0..1000_i64),
                    format!("row {i}"),
                    "sized",
                    rng.gen_bool(0.5),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    #[test]
    fn insert_point_rows() -> crate::Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let srs = utm_23n();
        gpkg.register_srs(&srs)?;

        let fc = gpkg.create_feature_class("test1", &srs, &test_fields())?;
        assert_eq!(fc.geometry_type(), GeometryType::Point);
        assert!(!fc.has_z());
        assert!(!fc.has_m());
        assert_eq!(fc.srs().srs_id, 32623);

        insert_random_points(&gpkg, 10_000, srs.srs_id)?;
        assert_eq!(fc.count()?, 10_000);

        let mut stmt = gpkg.connection().prepare("SELECT SHAPE FROM test1")?;
        let shapes = stmt.query_map([], |row| row.get::<_, GpkgGeometry>(0))?;
        for shape in shapes {
            let shape = shape?;
            assert_eq!(shape.srs_id, 32623);
            fc.check_geometry(&shape)?;
        }

        assert!(fc.extent()?.is_unset());
        let extent = Extent::new(300000.0, 1.0, 700000.0, 4000000.0);
        gpkg.update_extent("test1", extent)?;
        assert_eq!(fc.extent()?, extent);
        Ok(())
    }

    #[test]
    fn feature_class_survives_reopen() -> crate::Result<()> {
        let dir = tempfile::tempdir().map_err(|err| GpkgError::Message(err.to_string()))?;
        let path = dir.path().join("test.gpkg");
        let extent = Extent::new(300000.0, 1.0, 700000.0, 4000000.0);

        {
            let gpkg = Gpkg::new(&path)?;
            let fc = gpkg.create_feature_class("test1", &utm_23n(), &test_fields())?;
            insert_random_points(&gpkg, 100, 32623)?;
            fc.set_extent(extent)?;
        }

        let gpkg = Gpkg::open_read_only(&path)?;
        assert_eq!(gpkg.list_feature_classes()?, vec!["test1".to_string()]);

        let fc = gpkg.feature_class("TEST1")?;
        assert_eq!(fc.name(), "test1");
        assert_eq!(fc.fields(), test_fields().as_slice());
        assert_eq!(fc.srs(), &utm_23n());
        assert_eq!(fc.count()?, 100);
        assert_eq!(fc.extent()?, extent);

        let blob: Vec<u8> = gpkg
            .connection()
            .query_row("SELECT SHAPE FROM test1 LIMIT 1", [], |row| row.get(0))?;
        assert_eq!(fc.decode_geometry(&blob)?.srs_id, 32623);

        assert!(matches!(
            fc.set_extent(Extent::unset()),
            Err(GpkgError::ReadOnly)
        ));
        Ok(())
    }
}
