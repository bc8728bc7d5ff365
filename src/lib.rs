//! GeoPackage geometry codec and catalog manager built on top of rusqlite.
//!
//! ## Overview
//!
//! - `GpkgGeometry` is a geometry value: a point, line string, polygon or one
//!   of their multi-part forms, with optional Z and M, tagged with an `srs_id`.
//!   It encodes to and decodes from the GeoPackage binary format (a `GP`
//!   header followed by a WKB body) and binds directly as a SQL parameter.
//! - `Gpkg` is a container. It creates and maintains the catalog tables
//!   (`gpkg_spatial_ref_sys`, `gpkg_contents`, `gpkg_geometry_columns` and,
//!   when needed, `gpkg_extensions`).
//! - `FeatureClass` is a table with one geometry column; `Table` is a plain
//!   attribute table.
//!
//! `Gpkg` supports several open modes:
//!
//! - `Gpkg::new(path)`: create a new file.
//! - `Gpkg::open(path)`: open an existing file for read/write.
//! - `Gpkg::open_read_only(path)`: open an existing file without write access.
//! - `Gpkg::new_in_memory()`: create a transient in-memory GeoPackage.
//!
//! Rows are written through `Gpkg::connection()` with plain SQL; this crate
//! decides what the schema and catalog look like, not how rows are inserted.
//!
//! ## Short usage
//!
//! ```no_run
//! use rusqlite_geopkg::{Field, FieldType, Gpkg, GpkgGeometry, SpatialReferenceSystem};
//!
//! let gpkg = Gpkg::new("data.gpkg")?;
//! let srs = SpatialReferenceSystem::new("WGS_1984_UTM_Zone_23N", "EPSG", 32623, "PROJCS[...]");
//! let fields = [
//!     Field::new("name", FieldType::Text),
//!     Field::new("value", FieldType::Integer),
//! ];
//! let points = gpkg.create_feature_class("points", &srs, &fields)?;
//!
//! gpkg.connection().execute(
//!     "INSERT INTO points (SHAPE, name, value) VALUES (?1, ?2, ?3)",
//!     rusqlite::params![GpkgGeometry::point(32623, 500000.0, 10.0), "alpha", 7],
//! )?;
//!
//! let shape: GpkgGeometry =
//!     gpkg.connection()
//!         .query_row("SELECT SHAPE FROM points", [], |row| row.get(0))?;
//! points.check_geometry(&shape)?;
//!
//! if let Some(envelope) = shape.envelope() {
//!     let extent = points
//!         .extent()?
//!         .expanded_by(envelope.min_x, envelope.min_y, envelope.max_x, envelope.max_y);
//!     points.set_extent(extent)?;
//! }
//! # Ok::<(), rusqlite_geopkg::GpkgError>(())
//! ```
//!
//! Any `geo_traits::GeometryTrait<T = f64>` value of a supported kind converts
//! with `GpkgGeometry::from_geometry`.
//!
//! ## Errors
//!
//! Everything returns `GpkgError`. Lock contention surfaces as
//! `GpkgError::Busy`, the only error for which `is_retryable()` is true; the
//! failed operation had no effect. Catalog changes are all-or-nothing.
//!
//! ## Logging
//!
//! The crate logs catalog changes at `debug` and transaction boundaries at
//! `trace` through the `log` facade.

mod conversions;
mod error;
pub mod geometry;
mod gpkg;
mod ogc_sql;
mod sql_functions;
mod types;

pub use error::{FormatError, GpkgError, Result};
pub use geometry::{
    ByteOrder, Coord, Envelope, EnvelopeType, Geometry, GeometryHeader, GpkgGeometry, LineString,
    Polygon, decode_body, decode_header, encode_body, encode_header,
};
pub use gpkg::{
    Catalog, FeatureClass, FeatureClassBuilder, Gpkg, GpkgOptions, SpatialReferenceSystem, Table,
};
pub use sql_functions::register_spatial_functions;
pub use types::{Dimension, Extent, Field, FieldType, GeometryColumn, GeometryType};
