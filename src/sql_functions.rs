use crate::error::Result;
use crate::geometry::{Envelope, GpkgGeometry, decode_header};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Error};

/// Register all spatial SQL helper functions in the provided connection.
///
/// These back the triggers of the R*Tree spatial index, so every connection
/// that writes to an indexed feature class needs them.
///
/// Example:
/// ```no_run
/// use rusqlite::Connection;
/// use rusqlite_geopkg::register_spatial_functions;
///
/// let conn = Connection::open_in_memory()?;
/// register_spatial_functions(&conn)?;
/// # Ok::<(), rusqlite_geopkg::GpkgError>(())
/// ```
pub fn register_spatial_functions(conn: &Connection) -> Result<()> {
    for (name, bound) in BOUNDS {
        conn.create_scalar_function(name, 1, FunctionFlags::SQLITE_DETERMINISTIC, move |ctx| {
            match blob_from_ctx(ctx)? {
                Some(blob) => Ok(envelope_of(blob)?.as_ref().map(bound)),
                None => Ok(None),
            }
        })?;
    }

    conn.create_scalar_function("ST_IsEmpty", 1, FunctionFlags::SQLITE_DETERMINISTIC, |ctx| {
        match blob_from_ctx(ctx)? {
            Some(blob) => Ok(Some(i64::from(envelope_of(blob)?.is_none()))),
            None => Ok(None),
        }
    })?;
    Ok(())
}

type Bound = fn(&Envelope) -> f64;

const BOUNDS: [(&str, Bound); 4] = [
    ("ST_MinX", |e| e.min_x),
    ("ST_MaxX", |e| e.max_x),
    ("ST_MinY", |e| e.min_y),
    ("ST_MaxY", |e| e.max_y),
];

fn blob_from_ctx<'a>(ctx: &'a Context<'a>) -> std::result::Result<Option<&'a [u8]>, Error> {
    match ctx.get_raw(0) {
        ValueRef::Null => Ok(None),
        ValueRef::Blob(blob) => Ok(Some(blob)),
        _ => Err(Error::InvalidFunctionParameterType(0, Type::Blob)),
    }
}

/// XY bounds of a stored geometry. The header envelope is used when present;
/// otherwise the body is decoded. `None` for empty geometries.
fn envelope_of(blob: &[u8]) -> std::result::Result<Option<Envelope>, Error> {
    let (header, _) = decode_header(blob).map_err(|err| Error::UserFunctionError(Box::new(err)))?;
    if header.empty {
        return Ok(None);
    }
    if let Some(envelope) = header.envelope {
        return Ok(Some(envelope));
    }

    let geometry =
        GpkgGeometry::from_gpkg_bytes(blob).map_err(|err| Error::UserFunctionError(Box::new(err)))?;
    Ok(geometry.envelope())
}
