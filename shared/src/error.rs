use std::fmt;
use std::path::PathBuf;

/// Why a layer file could not be turned into a table.
#[derive(Debug, Clone, PartialEq)]
pub enum DataLoadReason {
    Missing,
    Unreadable(String),
    Malformed(String),
    UnsupportedCrs(String),
    WrongGeometry { feature: usize, found: String },
    InvalidGeometry { feature: usize, reason: String },
    NoTextAttribute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataLoadError {
    pub path: PathBuf,
    pub reason: DataLoadReason,
}

impl DataLoadError {
    pub fn new(path: impl Into<PathBuf>, reason: DataLoadReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

impl fmt::Display for DataLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.reason {
            DataLoadReason::Missing => write!(f, "{path}: file not found"),
            DataLoadReason::Unreadable(e) => write!(f, "{path}: cannot read file: {e}"),
            DataLoadReason::Malformed(e) => write!(f, "{path}: malformed GeoJSON: {e}"),
            DataLoadReason::UnsupportedCrs(crs) => {
                write!(f, "{path}: unsupported coordinate reference system {crs:?}")
            }
            DataLoadReason::WrongGeometry { feature, found } => {
                write!(f, "{path}: feature {feature} has unexpected geometry type {found}")
            }
            DataLoadReason::InvalidGeometry { feature, reason } => {
                write!(f, "{path}: feature {feature} has invalid geometry: {reason}")
            }
            DataLoadReason::NoTextAttribute => {
                write!(f, "{path}: no text attribute to use as facility name")
            }
        }
    }
}

impl std::error::Error for DataLoadError {}

/// The boundary layer has no polygons to center the map on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyGeometryError;

impl fmt::Display for EmptyGeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("boundary layer has no polygons to compute a map center from")
    }
}

impl std::error::Error for EmptyGeometryError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTileError {
    pub label: String,
}

impl fmt::Display for UnknownTileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown base layer {:?}", self.label)
    }
}

impl std::error::Error for UnknownTileError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNotFoundError {
    pub path: PathBuf,
}

impl fmt::Display for AssetNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "static asset not found: {}", self.path.display())
    }
}

impl std::error::Error for AssetNotFoundError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportError {
    pub artifact: &'static str,
    pub message: String,
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode {}: {}", self.artifact, self.message)
    }
}

impl std::error::Error for ExportError {}

/// Everything that can abort one render cycle of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    DataLoad(DataLoadError),
    EmptyGeometry(EmptyGeometryError),
    UnknownTile(UnknownTileError),
    Export(ExportError),
}

impl RenderError {
    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::DataLoad(_) => "data_load",
            RenderError::EmptyGeometry(_) => "empty_geometry",
            RenderError::UnknownTile(_) => "unknown_tile",
            RenderError::Export(_) => "export",
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DataLoad(e) => e.fmt(f),
            RenderError::EmptyGeometry(e) => e.fmt(f),
            RenderError::UnknownTile(e) => e.fmt(f),
            RenderError::Export(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::DataLoad(e) => Some(e),
            RenderError::EmptyGeometry(e) => Some(e),
            RenderError::UnknownTile(e) => Some(e),
            RenderError::Export(e) => Some(e),
        }
    }
}

impl From<DataLoadError> for RenderError {
    fn from(e: DataLoadError) -> Self {
        RenderError::DataLoad(e)
    }
}

impl From<EmptyGeometryError> for RenderError {
    fn from(e: EmptyGeometryError) -> Self {
        RenderError::EmptyGeometry(e)
    }
}

impl From<UnknownTileError> for RenderError {
    fn from(e: UnknownTileError) -> Self {
        RenderError::UnknownTile(e)
    }
}

impl From<ExportError> for RenderError {
    fn from(e: ExportError) -> Self {
        RenderError::Export(e)
    }
}
