//! Rows of `gpkg_contents`, `gpkg_geometry_columns` and `gpkg_extensions`.
//!
//! Every mutating operation runs as one atomic unit; a failure leaves the
//! catalog as it was. Lock contention is reported as [`GpkgError::Busy`] and
//! is never retried here.

use crate::conversions::{
    dimension_from_zm, dimension_to_zm, field_type_from_str, geometry_type_from_str,
    geometry_type_to_str,
};
use crate::error::{GpkgError, Result};
use crate::ogc_sql::{
    SQL_EXTENSION_EXISTS, SQL_GPKG_EXTENSIONS, SQL_INSERT_EXTENSION, SQL_INSERT_GPKG_CONTENTS,
    SQL_INSERT_GPKG_GEOMETRY_COLUMNS, SQL_LIST_CONTENTS, SQL_LIST_CONTENTS_OF_TYPE,
    SQL_NAME_EXISTS, SQL_SELECT_CONTENTS, SQL_SELECT_EXTENSION, SQL_SELECT_EXTENT,
    SQL_SELECT_GEOMETRY_COLUMN_META, SQL_TABLE_COLUMNS, SQL_UPDATE_EXTENT, rtree_name,
    sql_count_rows,
};
use crate::types::{Extent, Field, GeometryColumn};
use log::debug;
use rusqlite::{Connection, OptionalExtension};

use super::gpkg::Gpkg;
use super::srs::{self, SpatialReferenceSystem};
use super::table::{FeatureClass, Table};

pub(crate) const DATA_TYPE_FEATURES: &str = "features";
pub(crate) const DATA_TYPE_ATTRIBUTES: &str = "attributes";

/// An extension row: name, definition and scope.
pub(crate) struct Extension {
    pub name: &'static str,
    pub definition: &'static str,
    pub scope: &'static str,
}

pub(crate) const EXTENSION_RTREE: Extension = Extension {
    name: "gpkg_rtree_index",
    definition: "http://www.geopackage.org/spec120/#extension_rtree",
    scope: "write-only",
};

pub(crate) const EXTENSION_Z: Extension = Extension {
    name: "geopkg_z_values",
    definition: "geometry values in this column carry Z coordinates",
    scope: "read-write",
};

pub(crate) const EXTENSION_M: Extension = Extension {
    name: "geopkg_m_values",
    definition: "geometry values in this column carry M coordinates",
    scope: "read-write",
};

struct ContentsRow {
    table_name: String,
    data_type: String,
    description: String,
    srs_id: Option<i32>,
}

/// Catalog operations of one [`Gpkg`].
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    gpkg: &'a Gpkg,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(gpkg: &'a Gpkg) -> Self {
        Self { gpkg }
    }

    fn conn(&self) -> &'a Connection {
        self.gpkg.connection()
    }

    /// Insert `srs`, or confirm that an identical authority/code pair is
    /// already stored under its `srs_id`.
    pub fn register_srs(&self, srs: &SpatialReferenceSystem) -> Result<()> {
        self.gpkg.ensure_writable()?;
        self.gpkg
            .write_transaction(|conn| register_srs_in(conn, srs))
    }

    pub fn spatial_reference_system(&self, srs_id: i32) -> Result<SpatialReferenceSystem> {
        srs::get(self.conn(), srs_id)?.ok_or(GpkgError::MissingSpatialRefSys { srs_id })
    }

    pub fn list_spatial_reference_systems(&self) -> Result<Vec<SpatialReferenceSystem>> {
        srs::list(self.conn())
    }

    pub fn update_srs_description(&self, srs_id: i32, description: Option<&str>) -> Result<()> {
        self.gpkg.ensure_writable()?;
        self.gpkg.write_transaction(|conn| {
            if srs::update_description(conn, srs_id, description)? == 0 {
                return Err(GpkgError::MissingSpatialRefSys { srs_id });
            }
            debug!("updated description of srs_id {srs_id}");
            Ok(())
        })
    }

    pub fn remove_srs(&self, srs_id: i32) -> Result<()> {
        self.gpkg.ensure_writable()?;
        if SpatialReferenceSystem::is_reserved(srs_id) {
            return Err(GpkgError::ReservedSpatialRefSys { srs_id });
        }
        self.gpkg.write_transaction(|conn| {
            if !srs::exists(conn, srs_id)? {
                return Err(GpkgError::MissingSpatialRefSys { srs_id });
            }
            if srs::in_use(conn, srs_id)? {
                return Err(GpkgError::SpatialRefSysInUse { srs_id });
            }
            srs::delete(conn, srs_id)?;
            debug!("removed srs_id {srs_id}");
            Ok(())
        })
    }

    /// Whether `name` is taken by any schema object or catalog row,
    /// compared case-insensitively.
    pub fn name_exists(&self, name: &str) -> Result<bool> {
        name_exists_in(self.conn(), name)
    }

    /// Describe an existing table as plain attribute data.
    pub fn register_attributes_table(&self, table_name: &str, description: &str) -> Result<()> {
        self.gpkg.ensure_writable()?;
        self.gpkg
            .write_transaction(|conn| register_attributes_table_in(conn, table_name, description))
    }

    /// Describe an existing table as a feature class.
    ///
    /// Fails with [`GpkgError::NotFound`] if the table or its geometry column
    /// does not exist, [`GpkgError::DuplicateName`] if the table is already
    /// described, and [`GpkgError::MissingSpatialRefSys`] if the column's SRS
    /// is not registered. The contents row and the geometry column row are
    /// written together or not at all.
    pub fn register_feature_class(
        &self,
        table_name: &str,
        description: &str,
        column: &GeometryColumn,
        initial_extent: Extent,
    ) -> Result<()> {
        self.gpkg.ensure_writable()?;
        self.gpkg.write_transaction(|conn| {
            register_feature_class_in(conn, table_name, description, column, initial_extent)
        })
    }

    /// Overwrite the stored extent of a feature class. Prior bounds are not
    /// merged; use [`Extent::expanded_by`] on a read-back value for that.
    pub fn update_extent(&self, name: &str, extent: Extent) -> Result<()> {
        if !extent.is_valid() {
            return Err(GpkgError::InvalidExtent(extent.to_array()));
        }
        self.gpkg.ensure_writable()?;
        self.gpkg.write_transaction(|conn| {
            let changed = conn.execute(
                SQL_UPDATE_EXTENT,
                rusqlite::params![
                    name,
                    bound(extent.min_x),
                    bound(extent.min_y),
                    bound(extent.max_x),
                    bound(extent.max_y),
                ],
            )?;
            if changed == 0 {
                return Err(GpkgError::NotFound {
                    name: name.to_string(),
                });
            }
            debug!("updated extent of {name} to {:?}", extent.to_array());
            Ok(())
        })
    }

    /// Stored extent of a feature class. Unset bounds read back as NaN.
    pub fn extent(&self, name: &str) -> Result<Extent> {
        let bounds = self
            .conn()
            .query_row(SQL_SELECT_EXTENT, [name], |row| {
                Ok([
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ])
            })
            .optional()?
            .ok_or_else(|| GpkgError::NotFound {
                name: name.to_string(),
            })?;
        Ok(extent_from_bounds(bounds))
    }

    pub fn lookup_feature_class(&self, name: &str) -> Result<FeatureClass<'a>> {
        let contents = self.contents(name)?;
        if contents.data_type != DATA_TYPE_FEATURES {
            return Err(GpkgError::NotFound {
                name: name.to_string(),
            });
        }

        let column = self.geometry_column(&contents.table_name)?;
        if contents.srs_id.is_some_and(|srs_id| srs_id != column.srs_id) {
            return Err(GpkgError::Message(format!(
                "gpkg_contents and gpkg_geometry_columns disagree on the srs_id of {}",
                contents.table_name
            )));
        }
        let srs = self.spatial_reference_system(column.srs_id)?;
        let fields = self.fields(&contents.table_name, Some(&column.name))?;
        let spatial_index = self.has_spatial_index(&contents.table_name, &column.name)?;

        Ok(FeatureClass {
            table: Table {
                gpkg: self.gpkg,
                name: contents.table_name,
                description: contents.description,
                fields,
            },
            geometry_column: column,
            srs,
            spatial_index,
        })
    }

    /// Any table described in `gpkg_contents`.
    pub fn lookup_table(&self, name: &str) -> Result<Table<'a>> {
        let contents = self.contents(name)?;
        let geometry_column = if contents.data_type == DATA_TYPE_FEATURES {
            Some(self.geometry_column(&contents.table_name)?.name)
        } else {
            None
        };
        let fields = self.fields(&contents.table_name, geometry_column.as_deref())?;
        Ok(Table {
            gpkg: self.gpkg,
            name: contents.table_name,
            description: contents.description,
            fields,
        })
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(SQL_LIST_CONTENTS)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn list_feature_classes(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(SQL_LIST_CONTENTS_OF_TYPE)?;
        let names = stmt
            .query_map([DATA_TYPE_FEATURES], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Whether `gpkg_extensions` has a row for the table, column and extension.
    pub fn has_extension(
        &self,
        table_name: &str,
        column_name: &str,
        extension_name: &str,
    ) -> Result<bool> {
        let table_exists: bool = self
            .conn()
            .query_row(SQL_EXTENSION_EXISTS, [], |row| row.get(0))?;
        if !table_exists {
            return Ok(false);
        }
        Ok(self.conn().query_row(
            SQL_SELECT_EXTENSION,
            [table_name, column_name, extension_name],
            |row| row.get(0),
        )?)
    }

    /// Whether the R*Tree of a geometry column exists.
    pub fn has_spatial_index(&self, table_name: &str, column_name: &str) -> Result<bool> {
        Ok(self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [rtree_name(table_name, column_name)],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn count_rows(&self, table_name: &str) -> Result<i64> {
        Ok(self
            .conn()
            .query_row(&sql_count_rows(table_name), [], |row| row.get(0))?)
    }

    fn contents(&self, name: &str) -> Result<ContentsRow> {
        let row = self
            .conn()
            .query_row(SQL_SELECT_CONTENTS, [name], |row| {
                Ok(ContentsRow {
                    table_name: row.get(0)?,
                    data_type: row.get(1)?,
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    srs_id: row.get(3)?,
                })
            })
            .optional()?;
        row.ok_or_else(|| GpkgError::NotFound {
            name: name.to_string(),
        })
    }

    fn geometry_column(&self, table_name: &str) -> Result<GeometryColumn> {
        let (name, geometry_type_str, z, m, srs_id) = self
            .conn()
            .query_row(SQL_SELECT_GEOMETRY_COLUMN_META, [table_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i32>(4)?,
                ))
            })
            .optional()?
            .ok_or_else(|| {
                GpkgError::Message(format!(
                    "feature class {table_name} has no row in gpkg_geometry_columns"
                ))
            })?;

        Ok(GeometryColumn {
            name,
            geometry_type: geometry_type_from_str(&geometry_type_str)?,
            dimension: dimension_from_zm(z, m)?,
            srs_id,
        })
    }

    /// Attribute fields of a table: every column but the primary key and the
    /// geometry column.
    fn fields(&self, table_name: &str, geometry_column: Option<&str>) -> Result<Vec<Field>> {
        let mut stmt = self.conn().prepare(SQL_TABLE_COLUMNS)?;
        let columns = stmt
            .query_map([table_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut fields = Vec::with_capacity(columns.len());
        for (name, declared_type, not_null, pk) in columns {
            if pk != 0 || geometry_column.is_some_and(|g| g.eq_ignore_ascii_case(&name)) {
                continue;
            }
            let (field_type, size) = field_type_from_str(&declared_type).ok_or_else(|| {
                GpkgError::UnsupportedColumnType {
                    column: name.clone(),
                    declared_type: declared_type.clone(),
                }
            })?;
            fields.push(Field {
                name,
                field_type,
                size,
                nullable: not_null == 0,
            });
        }
        Ok(fields)
    }
}

pub(crate) fn name_exists_in(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.query_row(SQL_NAME_EXISTS, [name], |row| row.get(0))?)
}

pub(crate) fn register_srs_in(conn: &Connection, srs: &SpatialReferenceSystem) -> Result<()> {
    match srs::get(conn, srs.srs_id)? {
        Some(existing) if existing.same_authority(srs) => {
            debug!(
                "srs_id {} already registered as {}:{}",
                srs.srs_id, existing.organization, existing.organization_coordsys_id
            );
            Ok(())
        }
        Some(existing) => Err(GpkgError::SpatialRefSysConflict {
            srs_id: srs.srs_id,
            existing: (existing.organization, existing.organization_coordsys_id),
            requested: (srs.organization.clone(), srs.organization_coordsys_id),
        }),
        None => {
            srs::insert(conn, srs)?;
            debug!(
                "registered srs_id {} ({}:{})",
                srs.srs_id, srs.organization, srs.organization_coordsys_id
            );
            Ok(())
        }
    }
}

pub(crate) fn register_attributes_table_in(
    conn: &Connection,
    table_name: &str,
    description: &str,
) -> Result<()> {
    if table_columns(conn, table_name)?.is_empty() {
        return Err(GpkgError::NotFound {
            name: table_name.to_string(),
        });
    }
    ensure_not_described(conn, table_name)?;

    conn.execute(
        SQL_INSERT_GPKG_CONTENTS,
        rusqlite::params![table_name, DATA_TYPE_ATTRIBUTES, description, None::<i32>],
    )?;
    debug!("registered attributes table {table_name}");
    Ok(())
}

pub(crate) fn register_feature_class_in(
    conn: &Connection,
    table_name: &str,
    description: &str,
    column: &GeometryColumn,
    initial_extent: Extent,
) -> Result<()> {
    if !initial_extent.is_valid() {
        return Err(GpkgError::InvalidExtent(initial_extent.to_array()));
    }

    let columns = table_columns(conn, table_name)?;
    if columns.is_empty() {
        return Err(GpkgError::NotFound {
            name: table_name.to_string(),
        });
    }
    if !columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)) {
        return Err(GpkgError::NotFound {
            name: format!("{table_name}.{}", column.name),
        });
    }
    ensure_not_described(conn, table_name)?;
    if !srs::exists(conn, column.srs_id)? {
        return Err(GpkgError::MissingSpatialRefSys {
            srs_id: column.srs_id,
        });
    }

    conn.execute(
        SQL_INSERT_GPKG_CONTENTS,
        rusqlite::params![table_name, DATA_TYPE_FEATURES, description, column.srs_id],
    )?;
    if !initial_extent.is_unset() {
        conn.execute(
            SQL_UPDATE_EXTENT,
            rusqlite::params![
                table_name,
                initial_extent.min_x,
                initial_extent.min_y,
                initial_extent.max_x,
                initial_extent.max_y,
            ],
        )?;
    }

    let (z, m) = dimension_to_zm(column.dimension);
    conn.execute(
        SQL_INSERT_GPKG_GEOMETRY_COLUMNS,
        rusqlite::params![
            table_name,
            column.name,
            geometry_type_to_str(column.geometry_type),
            column.srs_id,
            z,
            m
        ],
    )?;

    if column.dimension.has_z() {
        add_extension(conn, table_name, &column.name, &EXTENSION_Z)?;
    }
    if column.dimension.has_m() {
        add_extension(conn, table_name, &column.name, &EXTENSION_M)?;
    }

    debug!(
        "registered feature class {table_name} ({} {:?}, srs_id {})",
        geometry_type_to_str(column.geometry_type),
        column.dimension,
        column.srs_id
    );
    Ok(())
}

/// Record an extension row, creating `gpkg_extensions` on first use.
pub(crate) fn add_extension(
    conn: &Connection,
    table_name: &str,
    column_name: &str,
    extension: &Extension,
) -> Result<()> {
    conn.execute_batch(SQL_GPKG_EXTENSIONS)?;
    conn.execute(
        SQL_INSERT_EXTENSION,
        rusqlite::params![
            table_name,
            column_name,
            extension.name,
            extension.definition,
            extension.scope
        ],
    )?;
    debug!("recorded extension {} on {table_name}.{column_name}", extension.name);
    Ok(())
}

fn ensure_not_described(conn: &Connection, table_name: &str) -> Result<()> {
    let described: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM gpkg_contents WHERE table_name = ?1 COLLATE NOCASE)",
        [table_name],
        |row| row.get(0),
    )?;
    if described {
        return Err(GpkgError::DuplicateName {
            name: table_name.to_string(),
        });
    }
    Ok(())
}

fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(SQL_TABLE_COLUMNS)?;
    let names = stmt
        .query_map([table_name], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

fn bound(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn extent_from_bounds(bounds: [Option<f64>; 4]) -> Extent {
    let [min_x, min_y, max_x, max_y] = bounds.map(|v| v.unwrap_or(f64::NAN));
    Extent::new(min_x, min_y, max_x, max_y)
}
