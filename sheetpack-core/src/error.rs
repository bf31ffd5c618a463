//! Error types for document building and packaging

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = PackError> = std::result::Result<T, E>;

/// Why a drawing cannot be anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawingError {
    #[error("neither a column span nor a row span was given")]
    MissingSpan,
    #[error("intrinsic size {width}x{height} has a zero dimension")]
    ZeroIntrinsicSize { width: u32, height: u32 },
    #[error("anchor cell (column {col}, row {row}) lies outside the sheet grid")]
    OutOfGrid { col: u64, row: u64 },
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("duplicate sheet name '{0}'")]
    DuplicateSheetName(String),
    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),
    #[error("document has no sheets")]
    EmptyDocument,
    #[error("document has no visible sheet")]
    NoVisibleSheet,
    #[error("{location} on sheet '{sheet}' lies outside the 1048576x16384 grid")]
    OutOfGrid { sheet: String, location: String },
    #[error("invalid defined name '{name}': {reason}")]
    InvalidDefinedName { name: String, reason: String },
    #[error("invalid drawing on sheet '{sheet}': {source}")]
    InvalidDrawing {
        sheet: String,
        #[source]
        source: DrawingError,
    },
    #[error("failed to serialize {part}: {message}")]
    Serialize { part: String, message: String },
    #[error("part '{0}' was produced twice")]
    DuplicatePart(String),
    #[error("relationship from '{owner}' targets '{target}', which is not in the package")]
    DanglingRelationship { owner: String, target: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PackError {
    pub(crate) fn serialize(part: impl Into<String>, message: impl std::fmt::Display) -> Self {
        PackError::Serialize {
            part: part.into(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by the document itself rather than by
    /// serialization or the output sink.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            PackError::DuplicateSheetName(_)
                | PackError::InvalidSheetName { .. }
                | PackError::SheetNotFound(_)
                | PackError::EmptyDocument
                | PackError::NoVisibleSheet
                | PackError::OutOfGrid { .. }
                | PackError::InvalidDefinedName { .. }
                | PackError::InvalidDrawing { .. }
        )
    }
}
