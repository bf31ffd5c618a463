//! Embedded images and the cell references they anchor to

use crate::error::DrawingError;
use std::fmt;

/// Rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Columns in a worksheet (`A` through `XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Zero-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// A1-style reference (`(0, 0)` -> `A1`).
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letters(self.col), u64::from(self.row) + 1)
    }

    /// Whether the cell exists on a worksheet.
    pub fn in_grid(&self) -> bool {
        self.col < MAX_COLS && self.row < MAX_ROWS
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Column letters for a zero-based column index (0 -> A, 26 -> AA).
pub fn column_letters(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// Raster formats that can be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Gif,
    Png,
}

impl ImageKind {
    /// Extension used when naming the media part.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
            ImageKind::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Png => "image/png",
        }
    }

    /// Guess the kind from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }
}

/// An image placed over the grid.
///
/// The top-left corner sits on `top_left`. The bottom-right corner is derived
/// from the spans: both spans pin it exactly, a single span keeps the image's
/// aspect ratio along the other axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub image: Vec<u8>,
    pub kind: ImageKind,
    pub top_left: CellRef,
    pub col_span: Option<u32>,
    pub row_span: Option<u32>,
    /// Intrinsic size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Drawing {
    pub fn new(image: Vec<u8>, kind: ImageKind, top_left: CellRef, width: u32, height: u32) -> Self {
        Self {
            image,
            kind,
            top_left,
            col_span: None,
            row_span: None,
            width,
            height,
        }
    }

    pub fn with_col_span(mut self, cols: u32) -> Self {
        self.col_span = Some(cols);
        self
    }

    pub fn with_row_span(mut self, rows: u32) -> Self {
        self.row_span = Some(rows);
        self
    }

    /// Spans that take part in anchoring as `(cols, rows)`. A zero span
    /// counts as not given.
    pub fn spans(&self) -> (Option<u32>, Option<u32>) {
        (
            self.col_span.filter(|&n| n > 0),
            self.row_span.filter(|&n| n > 0),
        )
    }

    /// Reject drawings whose geometry cannot be resolved.
    pub fn validate(&self) -> Result<(), DrawingError> {
        if self.spans() == (None, None) {
            return Err(DrawingError::MissingSpan);
        }
        if self.width == 0 || self.height == 0 {
            return Err(DrawingError::ZeroIntrinsicSize {
                width: self.width,
                height: self.height,
            });
        }
        if !self.top_left.in_grid() {
            return Err(DrawingError::OutOfGrid {
                col: self.top_left.col.into(),
                row: self.top_left.row.into(),
            });
        }
        Ok(())
    }
}
