//! Rows of `gpkg_spatial_ref_sys`.

use crate::error::Result;
use crate::ogc_sql::{
    SQL_DELETE_SRS, SQL_INSERT_SRS, SQL_LIST_SRS, SQL_SELECT_SRS, SQL_SRS_EXISTS, SQL_SRS_IN_USE,
    SQL_UPDATE_SRS_DESCRIPTION,
};
use rusqlite::{Connection, OptionalExtension, Row};

const EPSG4326_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

/// A spatial reference system as stored in `gpkg_spatial_ref_sys`.
///
/// cf. https://www.geopackage.org/spec140/index.html#gpkg_spatial_ref_sys_cols
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpatialReferenceSystem {
    pub name: String,
    pub srs_id: i32,
    /// Authority name, e.g. `EPSG`.
    pub organization: String,
    /// Code assigned by the authority.
    pub organization_coordsys_id: i32,
    /// Well-known text of the reference system.
    pub definition: String,
    pub description: Option<String>,
}

impl SpatialReferenceSystem {
    /// Identifier of the undefined Cartesian reference system.
    pub const UNDEFINED_CARTESIAN_ID: i32 = -1;
    /// Identifier of the undefined geographic reference system.
    pub const UNDEFINED_GEOGRAPHIC_ID: i32 = 0;
    pub const WGS84_ID: i32 = 4326;

    pub fn new(
        name: impl Into<String>,
        organization: impl Into<String>,
        organization_coordsys_id: i32,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            srs_id: organization_coordsys_id,
            organization: organization.into(),
            organization_coordsys_id,
            definition: definition.into(),
            description: None,
        }
    }

    /// Use an `srs_id` different from the authority code.
    pub fn with_srs_id(mut self, srs_id: i32) -> Self {
        self.srs_id = srs_id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn wgs84() -> Self {
        Self::new("WGS 84", "EPSG", Self::WGS84_ID, EPSG4326_WKT).with_description("WGS 84")
    }

    pub fn undefined_cartesian() -> Self {
        Self::new("Undefined Cartesian SRS", "NONE", Self::UNDEFINED_CARTESIAN_ID, "undefined")
            .with_description("undefined Cartesian coordinate reference system")
    }

    pub fn undefined_geographic() -> Self {
        Self::new("Undefined geographic SRS", "NONE", Self::UNDEFINED_GEOGRAPHIC_ID, "undefined")
            .with_description("undefined geographic coordinate reference system")
    }

    /// Rows every new container is seeded with.
    pub fn defaults() -> [Self; 3] {
        [
            Self::undefined_cartesian(),
            Self::undefined_geographic(),
            Self::wgs84(),
        ]
    }

    /// Whether `srs_id` is one of the identifiers that always exist.
    pub fn is_reserved(srs_id: i32) -> bool {
        srs_id == Self::UNDEFINED_CARTESIAN_ID || srs_id == Self::UNDEFINED_GEOGRAPHIC_ID
    }

    /// Same authority and code. Name, definition text and description are not
    /// compared.
    pub fn same_authority(&self, other: &Self) -> bool {
        self.organization.eq_ignore_ascii_case(&other.organization)
            && self.organization_coordsys_id == other.organization_coordsys_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            srs_id: row.get(1)?,
            organization: row.get(2)?,
            organization_coordsys_id: row.get(3)?,
            definition: row.get(4)?,
            description: row.get(5)?,
        })
    }
}

pub(crate) fn insert(conn: &Connection, srs: &SpatialReferenceSystem) -> Result<()> {
    conn.execute(
        SQL_INSERT_SRS,
        rusqlite::params![
            srs.name,
            srs.srs_id,
            srs.organization,
            srs.organization_coordsys_id,
            srs.definition,
            srs.description,
        ],
    )?;
    Ok(())
}

pub(crate) fn get(conn: &Connection, srs_id: i32) -> Result<Option<SpatialReferenceSystem>> {
    let srs = conn
        .query_row(SQL_SELECT_SRS, [srs_id], SpatialReferenceSystem::from_row)
        .optional()?;
    Ok(srs)
}

pub(crate) fn list(conn: &Connection) -> Result<Vec<SpatialReferenceSystem>> {
    let mut stmt = conn.prepare(SQL_LIST_SRS)?;
    let rows = stmt
        .query_map([], SpatialReferenceSystem::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn exists(conn: &Connection, srs_id: i32) -> Result<bool> {
    Ok(conn.query_row(SQL_SRS_EXISTS, [srs_id], |row| row.get(0))?)
}

pub(crate) fn in_use(conn: &Connection, srs_id: i32) -> Result<bool> {
    Ok(conn.query_row(SQL_SRS_IN_USE, [srs_id], |row| row.get(0))?)
}

/// Returns the number of rows changed.
pub(crate) fn update_description(
    conn: &Connection,
    srs_id: i32,
    description: Option<&str>,
) -> Result<usize> {
    Ok(conn.execute(
        SQL_UPDATE_SRS_DESCRIPTION,
        rusqlite::params![srs_id, description],
    )?)
}

pub(crate) fn delete(conn: &Connection, srs_id: i32) -> Result<usize> {
    Ok(conn.execute(SQL_DELETE_SRS, [srs_id])?)
}

#[cfg(test)]
mod tests {
    use super::SpatialReferenceSystem;

    #[test]
    fn authority_comparison_ignores_text() {
        let a = SpatialReferenceSystem::new("UTM 23N", "EPSG", 32623, "PROJCS[...]");
        let b = SpatialReferenceSystem::new("other name", "epsg", 32623, "PROJCS[other]")
            .with_description("described");
        assert!(a.same_authority(&b));

        let c = SpatialReferenceSystem::new("UTM 23N", "ESRI", 32623, "PROJCS[...]");
        assert!(!a.same_authority(&c));
    }

    #[test]
    fn defaults_cover_reserved_ids() {
        let ids: Vec<i32> = SpatialReferenceSystem::defaults()
            .iter()
            .map(|srs| srs.srs_id)
            .collect();
        assert_eq!(ids, vec![-1, 0, 4326]);
        assert!(SpatialReferenceSystem::is_reserved(-1));
        assert!(SpatialReferenceSystem::is_reserved(0));
        assert!(!SpatialReferenceSystem::is_reserved(4326));
    }

    #[test]
    fn srs_id_defaults_to_authority_code() {
        let srs = SpatialReferenceSystem::new("custom", "LOCAL", 7, "LOCAL_CS[...]");
        assert_eq!(srs.srs_id, 7);
        assert_eq!(srs.with_srs_id(100_007).srs_id, 100_007);
    }
}
