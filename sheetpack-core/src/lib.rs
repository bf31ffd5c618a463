//! sheetpack-core: XLSX part assembly and packaging
//!
//! Turns an in-memory [`Document`] into the parts of a SpreadsheetML package
//! (workbook, worksheets, drawings, media, shared strings, styles, theme,
//! relationships and content types) and writes them as a ZIP archive.
//!
//! ```no_run
//! use sheetpack_core::{Document, PackConfig};
//!
//! # fn main() -> sheetpack_core::Result<()> {
//! let mut doc = Document::new();
//! doc.add_sheet("Sheet1")?.set_value(0, 0, "hello")?;
//! doc.save("hello.xlsx", &PackConfig::default())?;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod compat;
pub mod config;
pub mod drawing;
pub mod error;
pub mod model;
pub mod package;
pub mod relationships;
pub mod shared_strings;
pub mod styles;
pub mod templates;
pub mod worksheet;
mod xml;

pub use assembler::Assembler;
pub use config::{Compression, PackConfig};
pub use drawing::{TwoCellAnchor, resolve_anchor};
pub use error::{DrawingError, PackError, Result};
pub use model::{
    Cell, CellRef, CellValue, DefinedName, Document, Drawing, ImageKind, MAX_COLS, MAX_ROWS, Sheet, Theme,
};
pub use package::{PackageWriter, Part, PartMap};
pub use worksheet::{SheetContext, SpreadsheetMlSerializer, WorksheetSerializer};
