/// Column data types allowed in GeoPackage user tables.
///
/// cf. https://www.geopackage.org/spec140/index.html#table_column_data_types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    Float,
    Double,
    Real,
    Text,
    Blob,
    Date,
    DateTime,
}

/// An attribute column of a table or feature class.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Maximum character count. Only used for `Text`.
    pub size: Option<u32>,
    pub nullable: bool,
}

impl Field {
    /// A nullable field without a size limit.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            size: None,
            nullable: true,
        }
    }

    /// A nullable text field holding at most `size` characters.
    pub fn text_with_size(name: impl Into<String>, size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::new(name, FieldType::Text)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Geometry kinds a feature class column can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// Coordinate dimensions. X and Y are always present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    #[default]
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Dimension {
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Self::Xy,
            (true, false) => Self::Xyz,
            (false, true) => Self::Xym,
            (true, true) => Self::Xyzm,
        }
    }

    pub fn has_z(self) -> bool {
        matches!(self, Self::Xyz | Self::Xyzm)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Self::Xym | Self::Xyzm)
    }

    /// Number of doubles in one coordinate tuple.
    pub fn size(self) -> usize {
        2 + usize::from(self.has_z()) + usize::from(self.has_m())
    }
}

/// The geometry column of a feature class, as described by
/// `gpkg_geometry_columns`.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryColumn {
    pub name: String,
    pub geometry_type: GeometryType,
    pub dimension: Dimension,
    pub srs_id: i32,
}

/// Bounding box cached at the feature class level (`gpkg_contents`).
///
/// The unset state has all four values NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn unset() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn is_unset(&self) -> bool {
        self.to_array().iter().all(|v| v.is_nan())
    }

    /// Either unset, or four finite values with `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        if self.is_unset() {
            return true;
        }
        self.to_array().iter().all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Grow the extent to cover an XY box. An unset extent becomes the box.
    pub fn expanded_by(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        if self.is_unset() {
            return Self::new(min_x, min_y, max_x, max_y);
        }
        Self::new(
            self.min_x.min(min_x),
            self.min_y.min(min_y),
            self.max_x.max(max_x),
            self.max_y.max(max_y),
        )
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::unset()
    }
}

impl From<(f64, f64, f64, f64)> for Extent {
    fn from((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<Extent> for (f64, f64, f64, f64) {
    fn from(extent: Extent) -> Self {
        (extent.min_x, extent.min_y, extent.max_x, extent.max_y)
    }
}
