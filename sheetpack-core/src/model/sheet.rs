//! Worksheet data structures

use super::drawing::{CellRef, Drawing, MAX_COLS};
use crate::error::{PackError, Result};
use std::collections::BTreeMap;

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    Formula(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

/// Represents a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    /// Number format code, e.g. `0.00%`. `None` means General.
    pub num_fmt: Option<String>,
}

impl Cell {
    pub fn new(row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
            num_fmt: None,
        }
    }

    pub fn with_num_fmt(mut self, code: impl Into<String>) -> Self {
        self.num_fmt = Some(code.into());
        self
    }

    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.col, self.row)
    }
}

/// Width override for an inclusive, zero-based column range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnWidth {
    pub first: u32,
    pub last: u32,
    /// Width in character units.
    pub width: f64,
}

/// Represents a worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Cells keyed by `(row, col)`, so iteration is row-major.
    pub cells: BTreeMap<(u32, u32), Cell>,
    pub columns: Vec<ColumnWidth>,
    /// Width used for columns without an override when resolving image anchors.
    pub default_column_width: Option<f64>,
    pub drawings: Vec<Drawing>,
    pub selected: bool,
    pub hidden: bool,
}

impl Sheet {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            columns: Vec::new(),
            default_column_width: None,
            drawings: Vec::new(),
            selected: false,
            hidden: false,
        }
    }

    /// Get a cell at the given position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Insert or replace a cell. Cells outside the grid are rejected.
    pub fn set_cell(&mut self, cell: Cell) -> Result<()> {
        self.check_cell(&cell)?;
        self.cells.insert((cell.row, cell.col), cell);
        Ok(())
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> Result<()> {
        self.set_cell(Cell::new(row, col, value))
    }

    /// Override the width of columns `first..=last`.
    pub fn set_column_width(&mut self, first: u32, last: u32, width: f64) -> Result<()> {
        let (first, last) = if first <= last { (first, last) } else { (last, first) };
        let range = ColumnWidth { first, last, width };
        self.check_columns(&range)?;
        self.columns.push(range);
        Ok(())
    }

    /// Attach an image. Drawings that cannot be anchored are rejected here.
    pub fn add_drawing(&mut self, drawing: Drawing) -> Result<()> {
        drawing.validate().map_err(|source| PackError::InvalidDrawing {
            sheet: self.name.clone(),
            source,
        })?;
        self.drawings.push(drawing);
        Ok(())
    }

    /// Reject any cell, column range or image anchor outside the grid.
    ///
    /// The fields are public, so the assembler runs this again before
    /// serializing anything.
    pub fn check_grid(&self) -> Result<()> {
        for (&(row, col), cell) in &self.cells {
            self.check_cell(cell)?;
            if (row, col) != (cell.row, cell.col) {
                return Err(self.out_of_grid(format!(
                    "cell ({}, {}) stored under key ({row}, {col})",
                    cell.row, cell.col
                )));
            }
        }
        for range in &self.columns {
            self.check_columns(range)?;
        }
        Ok(())
    }

    fn check_cell(&self, cell: &Cell) -> Result<()> {
        if cell.cell_ref().in_grid() {
            Ok(())
        } else {
            Err(self.out_of_grid(format!("cell (row {}, column {})", cell.row, cell.col)))
        }
    }

    fn check_columns(&self, range: &ColumnWidth) -> Result<()> {
        if range.first <= range.last && range.last < MAX_COLS {
            Ok(())
        } else {
            Err(self.out_of_grid(format!("columns {}..={}", range.first, range.last)))
        }
    }

    fn out_of_grid(&self, location: String) -> PackError {
        PackError::OutOfGrid {
            sheet: self.name.clone(),
            location,
        }
    }

    /// Number of columns in use: cells, width overrides and image anchors.
    /// Saturates instead of overflowing on coordinates outside the grid.
    pub fn max_col(&self) -> u32 {
        let from_cells = self.cells.values().map(|c| c.col.saturating_add(1)).max().unwrap_or(0);
        let from_columns = self
            .columns
            .iter()
            .map(|c| c.last.saturating_add(1))
            .max()
            .unwrap_or(0);
        let from_drawings = self
            .drawings
            .iter()
            .map(|d| d.top_left.col.saturating_add(1))
            .max()
            .unwrap_or(0);
        from_cells.max(from_columns).max(from_drawings)
    }

    /// Bounding range of non-empty cells as `(top_left, bottom_right)`.
    pub fn used_range(&self) -> Option<(CellRef, CellRef)> {
        let mut cells = self.cells.values().filter(|c| !c.value.is_empty());
        let first = cells.next()?;
        let (mut min, mut max) = (first.cell_ref(), first.cell_ref());
        for cell in cells {
            min.col = min.col.min(cell.col);
            min.row = min.row.min(cell.row);
            max.col = max.col.max(cell.col);
            max.row = max.row.max(cell.row);
        }
        Some((min, max))
    }

    /// Cells grouped by row, rows and cells both ascending.
    pub fn rows(&self) -> impl Iterator<Item = (u32, Vec<&Cell>)> + '_ {
        let mut grouped: BTreeMap<u32, Vec<&Cell>> = BTreeMap::new();
        for cell in self.cells.values() {
            grouped.entry(cell.row).or_default().push(cell);
        }
        grouped.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageKind, MAX_ROWS};

    #[test]
    fn test_rows_are_ordered() -> Result<()> {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(2, 1, "c")?;
        sheet.set_value(0, 3, "b")?;
        sheet.set_value(0, 0, "a")?;

        let rows: Vec<(u32, Vec<String>)> = sheet
            .rows()
            .map(|(r, cells)| (r, cells.iter().map(|c| c.cell_ref().to_a1()).collect()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, vec!["A1".to_string(), "D1".to_string()]),
                (2, vec!["B3".to_string()]),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_max_col_and_used_range() -> Result<()> {
        let mut sheet = Sheet::new("Data");
        assert_eq!(sheet.max_col(), 0);
        assert_eq!(sheet.used_range(), None);

        sheet.set_value(4, 2, 1.5)?;
        sheet.set_value(1, 0, true)?;
        sheet.set_column_width(5, 3, 20.0)?;
        assert_eq!(sheet.columns[0].first, 3);
        assert_eq!(sheet.max_col(), 6);
        assert_eq!(
            sheet.used_range(),
            Some((CellRef::new(0, 1), CellRef::new(2, 4)))
        );
        Ok(())
    }

    #[test]
    fn test_rejects_coordinates_outside_the_grid() -> Result<()> {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(MAX_ROWS - 1, MAX_COLS - 1, "corner")?;

        for (row, col) in [(u32::MAX, 0), (2_000_000, 20_000), (0, MAX_COLS), (MAX_ROWS, 0)] {
            let err = sheet.set_value(row, col, "x").unwrap_err();
            assert!(matches!(err, PackError::OutOfGrid { .. }), "{err}");
        }
        assert!(sheet.set_column_width(0, u32::MAX, 10.0).is_err());
        assert!(sheet.set_column_width(MAX_COLS, MAX_COLS, 10.0).is_err());
        assert_eq!(sheet.cells.len(), 1);
        assert!(sheet.columns.is_empty());

        // Direct field writes are caught later.
        sheet.columns.push(ColumnWidth { first: 0, last: u32::MAX, width: 1.0 });
        assert_eq!(sheet.max_col(), u32::MAX);
        assert!(sheet.check_grid().is_err());
        Ok(())
    }

    #[test]
    fn test_add_drawing_rejects_invalid() {
        let mut sheet = Sheet::new("Images");
        let drawing = Drawing::new(vec![0], ImageKind::Png, CellRef::new(0, 0), 0, 5).with_row_span(1);
        let err = sheet.add_drawing(drawing).unwrap_err();
        assert!(err.is_model_error());
        assert!(sheet.drawings.is_empty());
    }
}
