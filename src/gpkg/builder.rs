use crate::conversions::{field_to_column_def, geometry_type_to_str, quote_ident};
use crate::error::{GpkgError, Result};
use crate::ogc_sql::{PRIMARY_KEY_COLUMN, execute_rtree_sqls, sql_create_table};
use crate::types::{Dimension, Extent, Field, GeometryColumn, GeometryType};
use log::debug;
use rusqlite::Connection;

use super::catalog::{
    EXTENSION_RTREE, add_extension, name_exists_in, register_attributes_table_in,
    register_feature_class_in, register_srs_in,
};
use super::gpkg::Gpkg;
use super::srs::SpatialReferenceSystem;
use super::table::{FeatureClass, Table};

pub(crate) const DEFAULT_GEOMETRY_COLUMN: &str = "SHAPE";

const RESERVED_PREFIXES: [&str; 2] = ["gpkg_", "sqlite_"];

/// Options for a new feature class.
///
/// Defaults: point geometry without Z or M in a column named `SHAPE`, no
/// fields, no description, no spatial index, and the undefined Cartesian SRS.
///
/// ```
/// # use rusqlite_geopkg::{Gpkg, GeometryType, Field, FieldType, SpatialReferenceSystem};
/// let gpkg = Gpkg::new_in_memory()?;
/// let roads = gpkg
///     .feature_class_builder("roads")
///     .srs(SpatialReferenceSystem::wgs84())
///     .geometry_type(GeometryType::MultiLineString)
///     .z(true)
///     .field(Field::text_with_size("name", 80))
///     .spatial_index(true)
///     .create()?;
/// assert!(roads.has_z());
/// # Ok::<(), rusqlite_geopkg::GpkgError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FeatureClassBuilder<'a> {
    gpkg: &'a Gpkg,
    name: String,
    srs: Option<SpatialReferenceSystem>,
    srs_id: i32,
    geometry_type: GeometryType,
    has_z: bool,
    has_m: bool,
    geometry_column: String,
    fields: Vec<Field>,
    description: String,
    spatial_index: bool,
}

impl<'a> FeatureClassBuilder<'a> {
    pub(crate) fn new(gpkg: &'a Gpkg, name: &str) -> Self {
        Self {
            gpkg,
            name: name.to_string(),
            srs: None,
            srs_id: SpatialReferenceSystem::UNDEFINED_CARTESIAN_ID,
            geometry_type: GeometryType::Point,
            has_z: false,
            has_m: false,
            geometry_column: DEFAULT_GEOMETRY_COLUMN.to_string(),
            fields: Vec::new(),
            description: String::new(),
            spatial_index: false,
        }
    }

    /// Register `srs` (if new) and use it for the geometry column.
    pub fn srs(mut self, srs: SpatialReferenceSystem) -> Self {
        self.srs_id = srs.srs_id;
        self.srs = Some(srs);
        self
    }

    /// Use an SRS that is already registered.
    pub fn srs_id(mut self, srs_id: i32) -> Self {
        self.srs = None;
        self.srs_id = srs_id;
        self
    }

    pub fn geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = geometry_type;
        self
    }

    pub fn z(mut self, has_z: bool) -> Self {
        self.has_z = has_z;
        self
    }

    pub fn m(mut self, has_m: bool) -> Self {
        self.has_m = has_m;
        self
    }

    pub fn geometry_column(mut self, name: &str) -> Self {
        self.geometry_column = name.to_string();
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields<I: IntoIterator<Item = Field>>(mut self, fields: I) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Create an R*Tree index on the geometry column.
    pub fn spatial_index(mut self, enabled: bool) -> Self {
        self.spatial_index = enabled;
        self
    }

    /// Create the table and its catalog rows.
    ///
    /// The SRS registration, the table, the catalog rows and the optional
    /// index are created in one transaction. The extent starts unset.
    pub fn create(self) -> Result<FeatureClass<'a>> {
        self.gpkg.ensure_writable()?;
        validate_identifier(&self.name)?;
        validate_identifier(&self.geometry_column)?;
        validate_fields(&self.fields, Some(self.geometry_column.as_str()))?;

        let column = GeometryColumn {
            name: self.geometry_column.clone(),
            geometry_type: self.geometry_type,
            dimension: Dimension::from_flags(self.has_z, self.has_m),
            srs_id: self.srs_id,
        };

        self.gpkg.write_transaction(|conn| {
            validate_new_table_name(conn, &self.name)?;
            if let Some(srs) = &self.srs {
                register_srs_in(conn, srs)?;
            }

            let mut column_defs = Vec::with_capacity(self.fields.len() + 2);
            column_defs.push(format!("{PRIMARY_KEY_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT"));
            column_defs.push(format!(
                "{} {}",
                quote_ident(&column.name),
                geometry_type_to_str(column.geometry_type)
            ));
            column_defs.extend(self.fields.iter().map(field_to_column_def));
            conn.execute_batch(&sql_create_table(&self.name, &column_defs.join(", ")))?;
            debug!("created table {}", self.name);

            register_feature_class_in(conn, &self.name, &self.description, &column, Extent::unset())?;

            if self.spatial_index {
                create_spatial_index(conn, &self.name, &column.name)?;
            }
            Ok(())
        })?;

        self.gpkg.catalog().lookup_feature_class(&self.name)
    }
}

pub(crate) fn create_table<'a>(
    gpkg: &'a Gpkg,
    name: &str,
    fields: &[Field],
    description: &str,
) -> Result<Table<'a>> {
    gpkg.ensure_writable()?;
    validate_identifier(name)?;
    validate_fields(fields, None)?;

    gpkg.write_transaction(|conn| {
        validate_new_table_name(conn, name)?;
        let mut column_defs = Vec::with_capacity(fields.len() + 1);
        column_defs.push(format!("{PRIMARY_KEY_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT"));
        column_defs.extend(fields.iter().map(field_to_column_def));
        conn.execute_batch(&sql_create_table(name, &column_defs.join(", ")))?;
        debug!("created table {name}");
        register_attributes_table_in(conn, name, description)
    })?;

    gpkg.catalog().lookup_table(name)
}

fn create_spatial_index(conn: &Connection, table_name: &str, column_name: &str) -> Result<()> {
    execute_rtree_sqls(conn, table_name, column_name, PRIMARY_KEY_COLUMN)?;
    add_extension(conn, table_name, column_name, &EXTENSION_RTREE)?;
    debug!("created spatial index on {table_name}.{column_name}");
    Ok(())
}

fn validate_identifier(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GpkgError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if name.contains('\0') {
        return Err(GpkgError::InvalidName {
            name: name.to_string(),
            reason: "name contains a NUL character",
        });
    }
    Ok(())
}

/// Table names must be non-empty, unused (case-insensitively, against every
/// schema object and catalog row) and outside the reserved prefixes.
/// Must run inside the write transaction.
fn validate_new_table_name(conn: &Connection, name: &str) -> Result<()> {
    validate_identifier(name)?;
    if name_exists_in(conn, name)? {
        return Err(GpkgError::DuplicateName {
            name: name.to_string(),
        });
    }
    let lower = name.to_ascii_lowercase();
    if RESERVED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return Err(GpkgError::InvalidName {
            name: name.to_string(),
            reason: "prefix is reserved for system tables",
        });
    }
    Ok(())
}

fn validate_fields(fields: &[Field], geometry_column: Option<&str>) -> Result<()> {
    let mut taken: Vec<&str> = vec![PRIMARY_KEY_COLUMN];
    taken.extend(geometry_column);

    for field in fields {
        validate_identifier(&field.name)?;
        if taken.iter().any(|name| name.eq_ignore_ascii_case(&field.name)) {
            return Err(GpkgError::InvalidName {
                name: field.name.clone(),
                reason: "duplicate column name",
            });
        }
        if field.size.is_some_and(|size| size == 0) {
            return Err(GpkgError::InvalidName {
                name: field.name.clone(),
                reason: "size must be positive",
            });
        }
        taken.push(&field.name);
    }
    Ok(())
}
