use std::error::Error;
use std::fmt;

/// Problems found while decoding (or encoding) a GeoPackage geometry blob.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The first two bytes are not `GP`.
    InvalidMagic([u8; 2]),
    /// The header declares a version this crate does not understand.
    UnsupportedVersion(u8),
    /// Envelope contents code 5, 6 or 7.
    InvalidEnvelopeCode(u8),
    /// The input ended before the declared content did.
    Truncated { needed: usize, remaining: usize },
    /// A WKB element starts with something other than 0 or 1.
    InvalidByteOrder(u8),
    /// A WKB type code this crate does not support.
    UnknownGeometryType(u32),
    /// The type code's dimensionality disagrees with the surrounding context.
    DimensionMismatch {
        type_code: u32,
        has_z: bool,
        has_m: bool,
    },
    /// A nested part of a multi geometry has the wrong element type.
    UnexpectedElement { expected: &'static str, type_code: u32 },
    /// Bytes were left over after the geometry body.
    TrailingBytes(usize),
    /// A count field does not fit into the output format.
    CountOverflow(usize),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic(magic) => {
                write!(f, "invalid magic bytes: {:#04x} {:#04x}", magic[0], magic[1])
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported gpkg geometry version: {version}")
            }
            Self::InvalidEnvelopeCode(code) => write!(f, "invalid envelope contents code: {code}"),
            Self::Truncated { needed, remaining } => write!(
                f,
                "truncated geometry: needed {needed} bytes, {remaining} remaining"
            ),
            Self::InvalidByteOrder(marker) => write!(f, "invalid byte order marker: {marker}"),
            Self::UnknownGeometryType(code) => write!(f, "unknown wkb geometry type: {code}"),
            Self::DimensionMismatch {
                type_code,
                has_z,
                has_m,
            } => write!(
                f,
                "wkb type {type_code} does not match declared dimension (z={has_z}, m={has_m})"
            ),
            Self::UnexpectedElement {
                expected,
                type_code,
            } => write!(f, "expected {expected} element, got wkb type {type_code}"),
            Self::TrailingBytes(len) => write!(f, "{len} trailing bytes after geometry"),
            Self::CountOverflow(count) => write!(f, "count {count} does not fit in 32 bits"),
        }
    }
}

impl Error for FormatError {}

/// Crate error type for GeoPackage operations.
#[derive(Debug)]
pub enum GpkgError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// The engine reported lock contention. Retrying the same operation is safe;
    /// the failed attempt had no effect.
    Busy(rusqlite::Error),
    /// Malformed geometry bytes.
    Format(FormatError),
    /// A table or feature class with the same name already exists.
    DuplicateName { name: String },
    /// The name cannot be used for a table or a field.
    InvalidName { name: String, reason: &'static str },
    /// Referenced `srs_id` does not exist in `gpkg_spatial_ref_sys`.
    MissingSpatialRefSys { srs_id: i32 },
    /// An `srs_id` is already registered with a different authority/code.
    SpatialRefSysConflict {
        srs_id: i32,
        existing: (String, i32),
        requested: (String, i32),
    },
    /// The spatial reference system is still referenced by a table.
    SpatialRefSysInUse { srs_id: i32 },
    /// The undefined Cartesian and geographic systems cannot be removed.
    ReservedSpatialRefSys { srs_id: i32 },
    /// No table or feature class with this name.
    NotFound { name: String },
    /// Extent bounds must be all finite with `min <= max`, or all unset.
    InvalidExtent([f64; 4]),
    /// Invalid `z` / `m` flags in GeoPackage metadata.
    InvalidDimension { z: i64, m: i64 },
    /// A geometry type that GeoPackage feature classes in this crate cannot hold.
    UnsupportedGeometryType(String),
    /// A column type declared in SQLite metadata is not supported by this crate.
    UnsupportedColumnType {
        column: String,
        declared_type: String,
    },
    /// A coordinate's Z/M presence does not match the geometry's dimension.
    CoordinateDimension,
    /// A geometry does not fit the feature class it is meant for.
    GeometryMismatch {
        table_name: String,
        reason: String,
    },
    ReadOnly,
    Message(String),
}

impl GpkgError {
    /// Whether the identical operation may succeed if retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl fmt::Display for GpkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Busy(err) => write!(f, "database is busy: {err}"),
            Self::Format(err) => write!(f, "{err}"),
            Self::DuplicateName { name } => write!(f, "table already exists: {name}"),
            Self::InvalidName { name, reason } => write!(f, "invalid name '{name}': {reason}"),
            Self::MissingSpatialRefSys { srs_id } => {
                write!(f, "srs_id {srs_id} not found in gpkg_spatial_ref_sys")
            }
            Self::SpatialRefSysConflict {
                srs_id,
                existing,
                requested,
            } => write!(
                f,
                "srs_id {srs_id} is registered as {}:{}, not {}:{}",
                existing.0, existing.1, requested.0, requested.1
            ),
            Self::SpatialRefSysInUse { srs_id } => {
                write!(f, "srs_id {srs_id} is still referenced")
            }
            Self::ReservedSpatialRefSys { srs_id } => {
                write!(f, "srs_id {srs_id} is reserved")
            }
            Self::NotFound { name } => write!(f, "no such table: {name}"),
            Self::InvalidExtent(bounds) => write!(f, "invalid extent: {bounds:?}"),
            Self::InvalidDimension { z, m } => {
                write!(f, "invalid or mixed geometry dimension (z={z}, m={m})")
            }
            Self::UnsupportedGeometryType(ty) => write!(f, "unsupported geometry type: {ty}"),
            Self::UnsupportedColumnType {
                column,
                declared_type,
            } => write!(
                f,
                "unsupported column type for column '{column}': {declared_type}"
            ),
            Self::CoordinateDimension => {
                write!(f, "coordinate dimension does not match geometry dimension")
            }
            Self::GeometryMismatch { table_name, reason } => {
                write!(f, "geometry does not fit '{table_name}': {reason}")
            }
            Self::ReadOnly => write!(f, "operation not allowed on read-only connection"),
            Self::Message(message) => write!(f, "{message}"),
        }
    }
}

impl Error for GpkgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) | Self::Busy(err) => Some(err),
            Self::Format(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for GpkgError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                Self::Busy(err)
            }
            _ => Self::Sql(err),
        }
    }
}

impl From<FormatError> for GpkgError {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

pub type Result<T> = std::result::Result<T, GpkgError>;
