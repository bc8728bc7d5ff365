use crate::error::{GpkgError, Result};
use crate::ogc_sql::{initialize_gpkg, is_initialized};
use crate::sql_functions::register_spatial_functions;
use crate::types::{Extent, Field};
use log::{debug, trace, warn};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use super::builder::FeatureClassBuilder;
use super::catalog::Catalog;
use super::srs::SpatialReferenceSystem;
use super::table::{FeatureClass, Table};

/// Connection settings for [`Gpkg::open_with_options`] and
/// [`Gpkg::new_with_options`].
#[derive(Clone, Debug, Default)]
pub struct GpkgOptions {
    /// How long to wait on a locked database before failing with
    /// [`GpkgError::Busy`]. `None` keeps the engine default.
    pub busy_timeout: Option<Duration>,
    /// Open without write access. Ignored when creating a container.
    pub read_only: bool,
}

#[derive(Debug)]
/// GeoPackage connection wrapper.
pub struct Gpkg {
    conn: Connection,
    read_only: bool,
}

impl Gpkg {
    /// Open an existing GeoPackage in read-only mode.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(
            path,
            GpkgOptions {
                read_only: true,
                ..Default::default()
            },
        )
    }

    /// Open an existing GeoPackage in read-write mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, GpkgOptions::default())
    }

    /// Open an existing GeoPackage.
    ///
    /// Fails when the file is missing or does not contain the GeoPackage
    /// catalog tables.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: GpkgOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GpkgError::Message(format!(
                "GeoPackage file does not exist: {}",
                path.display()
            )));
        }

        let conn = if options.read_only {
            Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        } else {
            Connection::open(path)?
        };
        if !is_initialized(&conn)? {
            return Err(GpkgError::Message(format!(
                "not a GeoPackage: {}",
                path.display()
            )));
        }

        debug!("opened {} (read_only={})", path.display(), options.read_only);
        Self::from_connection(conn, &options)
    }

    /// Create a new GeoPackage
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new_with_options(path, GpkgOptions::default())
    }

    /// Create a new GeoPackage. Fails when the file already exists.
    pub fn new_with_options<P: AsRef<Path>>(path: P, options: GpkgOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(GpkgError::Message(format!(
                "GeoPackage file already exists: {}",
                path.display()
            )));
        }

        Self::create_file(path, options, Self::initialize)
    }

    /// Open a connection on a fresh file and run `init` on it. On failure
    /// the connection is closed and the file removed, so the path stays free.
    fn create_file<F>(path: &Path, options: GpkgOptions, init: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        let options = GpkgOptions {
            read_only: false,
            ..options
        };
        let created = Connection::open(path)
            .map_err(GpkgError::from)
            .and_then(|conn| {
                let gpkg = Self::from_connection(conn, &options)?;
                init(&gpkg)?;
                Ok(gpkg)
            });

        match created {
            Ok(gpkg) => {
                debug!("created {}", path.display());
                Ok(gpkg)
            }
            Err(err) => {
                match std::fs::remove_file(path) {
                    Err(remove_err) if remove_err.kind() != std::io::ErrorKind::NotFound => {
                        warn!("failed to remove {}: {remove_err}", path.display());
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    /// Create a new GeoPackage in memory
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let gpkg = Self::from_connection(conn, &GpkgOptions::default())?;
        gpkg.initialize()?;
        Ok(gpkg)
    }

    fn from_connection(conn: Connection, options: &GpkgOptions) -> Result<Self> {
        if let Some(timeout) = options.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        register_spatial_functions(&conn)?;
        Ok(Self {
            conn,
            read_only: options.read_only,
        })
    }

    fn initialize(&self) -> Result<()> {
        self.write_transaction(|conn| Ok(initialize_gpkg(conn)?))?;
        debug!("initialized GeoPackage catalog");
        Ok(())
    }

    /// The underlying connection, e.g. for inserting rows.
    ///
    /// The spatial SQL functions are registered on it, so inserts into
    /// feature classes with a spatial index work.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Catalog operations on this container.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(GpkgError::ReadOnly);
        }
        Ok(())
    }

    /// Run `f` as one atomic unit.
    ///
    /// Starts an immediate transaction, so lock contention surfaces before
    /// anything is written. Inside an already open transaction a savepoint is
    /// used instead. Any error rolls everything back.
    pub(crate) fn write_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        if self.conn.is_autocommit() {
            trace!("begin immediate transaction");
            let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
            // Dropping `tx` without committing rolls back.
            let value = f(&tx)?;
            tx.commit()?;
            trace!("committed transaction");
            Ok(value)
        } else {
            trace!("savepoint inside caller transaction");
            self.conn.execute_batch("SAVEPOINT geopkg_write")?;
            match f(&self.conn) {
                Ok(value) => {
                    self.conn.execute_batch("RELEASE geopkg_write")?;
                    Ok(value)
                }
                Err(err) => {
                    trace!("rolling back to savepoint: {err}");
                    self.conn
                        .execute_batch("ROLLBACK TO geopkg_write; RELEASE geopkg_write")?;
                    Err(err)
                }
            }
        }
    }

    /// Register a spatial reference system in gpkg_spatial_ref_sys.
    ///
    /// Registering the same `srs_id` again with the same authority and code is
    /// a no-op; a different authority or code fails with
    /// [`GpkgError::SpatialRefSysConflict`] and leaves the stored row alone.
    ///
    /// This crate does not bundle an EPSG catalog, so callers supply the
    /// definition text themselves.
    ///
    /// Example: register EPSG:3857 (Web Mercator / Pseudo-Mercator).
    /// ```
    /// # use rusqlite_geopkg::{Gpkg, SpatialReferenceSystem};
    /// let gpkg = Gpkg::new_in_memory()?;
    /// let definition = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","3857"]]"#;
    /// let srs = SpatialReferenceSystem::new("WGS 84 / Pseudo-Mercator", "EPSG", 3857, definition)
    ///     .with_description("Web Mercator / Pseudo-Mercator (EPSG:3857)");
    /// gpkg.register_srs(&srs)?;
    /// # Ok::<(), rusqlite_geopkg::GpkgError>(())
    /// ```
    pub fn register_srs(&self, srs: &SpatialReferenceSystem) -> Result<()> {
        self.catalog().register_srs(srs)
    }

    pub fn spatial_reference_system(&self, srs_id: i32) -> Result<SpatialReferenceSystem> {
        self.catalog().spatial_reference_system(srs_id)
    }

    pub fn list_spatial_reference_systems(&self) -> Result<Vec<SpatialReferenceSystem>> {
        self.catalog().list_spatial_reference_systems()
    }

    /// Replace the description of a registered SRS. The description is the
    /// only attribute that can change after registration.
    pub fn update_srs_description(&self, srs_id: i32, description: Option<&str>) -> Result<()> {
        self.catalog().update_srs_description(srs_id, description)
    }

    /// Delete an SRS that no table references.
    pub fn remove_srs(&self, srs_id: i32) -> Result<()> {
        self.catalog().remove_srs(srs_id)
    }

    /// Create an attribute table with an integer primary key `fid` and
    /// the given fields.
    pub fn create_table(&self, name: &str, fields: &[Field]) -> Result<Table<'_>> {
        super::builder::create_table(self, name, fields, "")
    }

    /// Create a point feature class without Z or M in the geometry column
    /// `SHAPE`. Use [`Gpkg::feature_class_builder`] for other shapes.
    pub fn create_feature_class(
        &self,
        name: &str,
        srs: &SpatialReferenceSystem,
        fields: &[Field],
    ) -> Result<FeatureClass<'_>> {
        self.feature_class_builder(name)
            .srs(srs.clone())
            .fields(fields.iter().cloned())
            .create()
    }

    pub fn feature_class_builder(&self, name: &str) -> FeatureClassBuilder<'_> {
        FeatureClassBuilder::new(self, name)
    }

    /// Look up a feature class by name.
    pub fn feature_class(&self, name: &str) -> Result<FeatureClass<'_>> {
        self.catalog().lookup_feature_class(name)
    }

    /// Look up any table registered in gpkg_contents, feature classes included.
    pub fn table(&self, name: &str) -> Result<Table<'_>> {
        self.catalog().lookup_table(name)
    }

    /// Names of every table in gpkg_contents.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.catalog().list_tables()
    }

    pub fn list_feature_classes(&self) -> Result<Vec<String>> {
        self.catalog().list_feature_classes()
    }

    /// Overwrite the stored extent of a feature class.
    pub fn update_extent(&self, name: &str, extent: Extent) -> Result<()> {
        self.catalog().update_extent(name, extent)
    }
}
