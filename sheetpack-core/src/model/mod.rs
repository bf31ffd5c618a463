//! In-memory workbook model consumed by the packaging engine

pub mod document;
pub mod drawing;
pub mod sheet;

pub use document::{DefinedName, Document, Theme};
pub use drawing::{CellRef, Drawing, ImageKind, MAX_COLS, MAX_ROWS, column_letters};
pub use sheet::{Cell, CellValue, ColumnWidth, Sheet};
