//! Image placement over the cell grid
//!
//! A drawing is anchored by its top-left cell and a bottom-right cell with
//! sub-cell offsets. Geometry is resolved in pixels and written in EMU.
//!
//! Which corner is computed how depends on the spans the caller gave:
//!
//! - both spans: the bottom-right cell is `top_left + spans`, no offsets;
//! - row span only: the height is fixed by the rows, the width follows the
//!   image's aspect ratio and is walked across the sheet's column widths;
//! - column span only: the width is fixed by the columns, the height follows
//!   the aspect ratio and is walked across fixed-height rows.

use crate::error::{DrawingError, Result};
use crate::model::{CellRef, Drawing, ImageKind, MAX_COLS, MAX_ROWS, Sheet};
use crate::relationships::RelId;
use crate::xml::{NS_DRAWING_MAIN, NS_REL, NS_XDR, XmlWriter};

/// Pixels per column-width character unit.
pub const PIXELS_PER_WIDTH_UNIT: f64 = 7.0;
/// Default row height in points.
pub const ROW_HEIGHT_POINTS: f64 = 15.0;
pub const PIXELS_PER_POINT: f64 = 4.0 / 3.0;
pub const ROW_HEIGHT_PIXELS: f64 = ROW_HEIGHT_POINTS * PIXELS_PER_POINT;
pub const EMU_PER_PIXEL: f64 = 9525.0;

/// Resolved placement of one drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoCellAnchor {
    pub from: CellRef,
    pub to: CellRef,
    /// Pixel offsets of the bottom-right corner inside `to`.
    pub to_col_offset: f64,
    pub to_row_offset: f64,
    /// Rendered size in pixels.
    pub width: f64,
    pub height: f64,
}

/// Pixel width of every column in `0..sheet.max_col()`, capped at the grid.
///
/// Columns without an override take the sheet's default width, or 0 when the
/// sheet has none.
pub fn column_pixel_widths(sheet: &Sheet) -> Vec<f64> {
    let default = sheet.default_column_width.unwrap_or(0.0) * PIXELS_PER_WIDTH_UNIT;
    let mut widths = vec![default; sheet.max_col().min(MAX_COLS) as usize];
    for range in &sheet.columns {
        for col in range.first..=range.last.min(MAX_COLS - 1) {
            if let Some(slot) = widths.get_mut(col as usize) {
                *slot = range.width * PIXELS_PER_WIDTH_UNIT;
            }
        }
    }
    widths
}

/// Target pixel width of a row-span-only drawing.
pub fn target_width_for_rows(drawing: &Drawing, row_span: u32) -> f64 {
    let height = f64::from(row_span) * ROW_HEIGHT_PIXELS;
    f64::from(drawing.width) / f64::from(drawing.height) * height
}

pub fn resolve_anchor(drawing: &Drawing, widths: &[f64]) -> Result<TwoCellAnchor, DrawingError> {
    drawing.validate()?;
    let from = drawing.top_left;
    let (col, row) = (u64::from(from.col), u64::from(from.row));

    let anchor = match drawing.spans() {
        (Some(cols), Some(rows)) => TwoCellAnchor {
            from,
            to: grid_cell(col + u64::from(cols), row + u64::from(rows))?,
            to_col_offset: 0.0,
            to_row_offset: 0.0,
            width: span_width(widths, from.col, cols),
            height: f64::from(rows) * ROW_HEIGHT_PIXELS,
        },
        (None, Some(rows)) => {
            let to_row = row + u64::from(rows);
            grid_cell(col, to_row)?;
            let width = target_width_for_rows(drawing, rows);
            let (to_col, offset) = walk_columns(widths, from.col, width);
            TwoCellAnchor {
                from,
                to: grid_cell(to_col, to_row)?,
                to_col_offset: offset,
                to_row_offset: 0.0,
                width,
                height: f64::from(rows) * ROW_HEIGHT_PIXELS,
            }
        }
        (Some(cols), None) => {
            let to_col = col + u64::from(cols);
            grid_cell(to_col, row)?;
            let width = span_width(widths, from.col, cols);
            let height = f64::from(drawing.height) / f64::from(drawing.width) * width;
            let whole_rows = (height / ROW_HEIGHT_PIXELS).floor();
            if row as f64 + whole_rows >= f64::from(MAX_ROWS) {
                return Err(DrawingError::OutOfGrid {
                    col: to_col,
                    row: (row as f64 + whole_rows) as u64,
                });
            }
            TwoCellAnchor {
                from,
                to: grid_cell(to_col, row + whole_rows as u64)?,
                to_col_offset: 0.0,
                to_row_offset: height - whole_rows * ROW_HEIGHT_PIXELS,
                width,
                height,
            }
        }
        (None, None) => return Err(DrawingError::MissingSpan),
    };
    Ok(anchor)
}

/// The cell at `(col, row)`, if it lies on the grid.
fn grid_cell(col: u64, row: u64) -> Result<CellRef, DrawingError> {
    if col < u64::from(MAX_COLS) && row < u64::from(MAX_ROWS) {
        Ok(CellRef::new(col as u32, row as u32))
    } else {
        Err(DrawingError::OutOfGrid { col, row })
    }
}

/// Walk right from `start` consuming `target` pixels. Returns the column the
/// walk stopped in and the width left over inside it.
///
/// Zero-width columns are always stepped over so the walk terminates. If the
/// known columns run out, the walk stops one past the last of them.
fn walk_columns(widths: &[f64], start: u32, target: f64) -> (u64, f64) {
    let mut remaining = target;
    let mut col = u64::from(start);
    loop {
        let Some(&width) = usize::try_from(col).ok().and_then(|i| widths.get(i)) else {
            log::warn!(
                "image anchor walk ran past the last known column ({}) with {remaining:.1}px left",
                widths.len()
            );
            return (col, remaining);
        };
        if width <= 0.0 {
            log::warn!("image anchor walk skipped zero-width column {}", col);
            col += 1;
            continue;
        }
        if remaining < width {
            return (col, remaining);
        }
        remaining -= width;
        col += 1;
    }
}

/// Total pixel width of `cols` columns from `start`. Unknown columns count 0.
fn span_width(widths: &[f64], start: u32, cols: u32) -> f64 {
    widths
        .iter()
        .skip(start as usize)
        .take(cols as usize)
        .sum()
}

fn to_emu(pixels: f64) -> String {
    ((pixels * EMU_PER_PIXEL).round() as i64).to_string()
}

/// Name of the media part holding the `n`th image of the workbook.
pub fn media_part_name(n: u32, kind: ImageKind) -> String {
    format!("xl/media/image{n}.{}", kind.extension())
}

pub fn drawing_part_name(n: u32) -> String {
    format!("xl/drawings/drawing{n}.xml")
}

/// One `xl/drawings/drawingN.xml` part under construction.
#[derive(Debug)]
pub struct DrawingPart {
    name: String,
    anchors: Vec<(TwoCellAnchor, RelId)>,
}

impl DrawingPart {
    pub fn new(ordinal: u32) -> Self {
        Self {
            name: drawing_part_name(ordinal),
            anchors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a picture whose image is the relationship `embed` of this part.
    pub fn push(&mut self, anchor: TwoCellAnchor, embed: RelId) {
        self.anchors.push((anchor, embed));
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut w = XmlWriter::new(self.name.as_str())?;
        w.start(
            "xdr:wsDr",
            &[("xmlns:xdr", NS_XDR), ("xmlns:a", NS_DRAWING_MAIN), ("xmlns:r", NS_REL)],
        )?;
        for (idx, (anchor, embed)) in self.anchors.iter().enumerate() {
            w.start("xdr:twoCellAnchor", &[("editAs", "oneCell")])?;
            write_marker(&mut w, "xdr:from", anchor.from, 0.0, 0.0)?;
            write_marker(&mut w, "xdr:to", anchor.to, anchor.to_col_offset, anchor.to_row_offset)?;
            write_picture(&mut w, idx as u32 + 1, embed, anchor)?;
            w.empty("xdr:clientData", &[])?;
            w.end("xdr:twoCellAnchor")?;
        }
        w.end("xdr:wsDr")?;
        w.finish()
    }
}

fn write_marker(w: &mut XmlWriter, tag: &str, cell: CellRef, col_off: f64, row_off: f64) -> Result<()> {
    w.start(tag, &[])?;
    w.text_element("xdr:col", &[], &cell.col.to_string())?;
    w.text_element("xdr:colOff", &[], &to_emu(col_off))?;
    w.text_element("xdr:row", &[], &cell.row.to_string())?;
    w.text_element("xdr:rowOff", &[], &to_emu(row_off))?;
    w.end(tag)
}

fn write_picture(w: &mut XmlWriter, object_id: u32, embed: &RelId, anchor: &TwoCellAnchor) -> Result<()> {
    let id = object_id.to_string();
    let name = format!("Picture {object_id}");
    let (cx, cy) = (to_emu(anchor.width), to_emu(anchor.height));

    w.start("xdr:pic", &[])?;
    w.start("xdr:nvPicPr", &[])?;
    w.empty("xdr:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    w.start("xdr:cNvPicPr", &[])?;
    w.empty("a:picLocks", &[("noChangeAspect", "1")])?;
    w.end("xdr:cNvPicPr")?;
    w.end("xdr:nvPicPr")?;

    w.start("xdr:blipFill", &[])?;
    w.empty("a:blip", &[("r:embed", embed.as_str())])?;
    w.start("a:stretch", &[])?;
    w.empty("a:fillRect", &[])?;
    w.end("a:stretch")?;
    w.end("xdr:blipFill")?;

    w.start("xdr:spPr", &[])?;
    w.start("a:xfrm", &[])?;
    w.empty("a:off", &[("x", "0"), ("y", "0")])?;
    w.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    w.end("a:xfrm")?;
    w.start("a:prstGeom", &[("prst", "rect")])?;
    w.empty("a:avLst", &[])?;
    w.end("a:prstGeom")?;
    w.end("xdr:spPr")?;
    w.end("xdr:pic")
}
