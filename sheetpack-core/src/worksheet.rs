//! Worksheet parts (`xl/worksheets/sheetN.xml`)

use crate::error::Result;
use crate::model::{Cell, CellValue, Sheet};
use crate::relationships::RelId;
use crate::shared_strings::SharedStringTable;
use crate::styles::StyleSheet;
use crate::xml::{NS_MAIN, NS_MC, NS_REL, XmlWriter, bool_attr};

/// Pass-scoped state a serializer writes through.
pub struct SheetContext<'a> {
    /// Part being produced, for error reporting.
    pub part: &'a str,
    pub shared_strings: &'a mut SharedStringTable,
    pub styles: &'a mut StyleSheet,
    /// Relationship id of this sheet's drawing part, if it has one.
    pub drawing: Option<&'a RelId>,
    /// Whether this sheet's tab is the active one.
    pub tab_selected: bool,
}

/// Renders one sheet into worksheet XML.
///
/// Implementations must intern every text cell through
/// `ctx.shared_strings` and take style indices from `ctx.styles`, and must
/// reference `ctx.drawing` when it is set.
pub trait WorksheetSerializer {
    fn serialize(&self, sheet: &Sheet, ctx: &mut SheetContext<'_>) -> Result<String>;
}

/// Default SpreadsheetML writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetMlSerializer;

impl WorksheetSerializer for SpreadsheetMlSerializer {
    fn serialize(&self, sheet: &Sheet, ctx: &mut SheetContext<'_>) -> Result<String> {
        let mut w = XmlWriter::new(ctx.part)?;
        w.start(
            "worksheet",
            &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL), ("xmlns:mc", NS_MC)],
        )?;

        let dimension = match sheet.used_range() {
            Some((first, last)) if first == last => first.to_a1(),
            Some((first, last)) => format!("{}:{}", first.to_a1(), last.to_a1()),
            None => "A1".to_string(),
        };
        w.empty("dimension", &[("ref", dimension.as_str())])?;

        w.start("sheetViews", &[])?;
        if ctx.tab_selected {
            w.empty("sheetView", &[("tabSelected", "1"), ("workbookViewId", "0")])?;
        } else {
            w.empty("sheetView", &[("workbookViewId", "0")])?;
        }
        w.end("sheetViews")?;

        let default_width = sheet.default_column_width.map(|width| width.to_string());
        match &default_width {
            Some(width) => w.empty(
                "sheetFormatPr",
                &[("defaultColWidth", width.as_str()), ("defaultRowHeight", "15")],
            )?,
            None => w.empty("sheetFormatPr", &[("defaultRowHeight", "15")])?,
        }

        if !sheet.columns.is_empty() {
            w.start("cols", &[])?;
            for range in &sheet.columns {
                let min = (u64::from(range.first) + 1).to_string();
                let max = (u64::from(range.last) + 1).to_string();
                let width = range.width.to_string();
                w.empty(
                    "col",
                    &[
                        ("min", min.as_str()),
                        ("max", max.as_str()),
                        ("width", width.as_str()),
                        ("customWidth", "1"),
                    ],
                )?;
            }
            w.end("cols")?;
        }

        w.start("sheetData", &[])?;
        for (row, cells) in sheet.rows() {
            let r = (u64::from(row) + 1).to_string();
            w.start("row", &[("r", r.as_str())])?;
            for cell in cells {
                write_cell(&mut w, cell, ctx)?;
            }
            w.end("row")?;
        }
        w.end("sheetData")?;

        w.empty(
            "pageMargins",
            &[
                ("left", "0.7"),
                ("right", "0.7"),
                ("top", "0.75"),
                ("bottom", "0.75"),
                ("header", "0.3"),
                ("footer", "0.3"),
            ],
        )?;

        if let Some(rel_id) = ctx.drawing {
            w.empty("drawing", &[("r:id", rel_id.as_str())])?;
        }

        w.end("worksheet")?;
        w.finish()
    }
}

fn write_cell(w: &mut XmlWriter, cell: &Cell, ctx: &mut SheetContext<'_>) -> Result<()> {
    let reference = cell.cell_ref().to_a1();
    let xf = ctx.styles.xf_for_format(cell.num_fmt.as_deref());
    let style = xf.to_string();

    let mut attrs = vec![("r", reference.as_str())];
    if xf != 0 {
        attrs.push(("s", style.as_str()));
    }

    match &cell.value {
        CellValue::Empty => {
            // Only formatted blanks are worth a record.
            if xf != 0 {
                w.empty("c", &attrs)?;
            }
            Ok(())
        }
        CellValue::Number(n) if n.is_finite() => {
            w.start("c", &attrs)?;
            w.text_element("v", &[], &n.to_string())?;
            w.end("c")
        }
        CellValue::Number(n) => {
            log::warn!("non-finite number {n} in {reference} written as #NUM!");
            attrs.push(("t", "e"));
            w.start("c", &attrs)?;
            w.text_element("v", &[], "#NUM!")?;
            w.end("c")
        }
        CellValue::Text(text) => {
            let idx = ctx.shared_strings.intern(text).to_string();
            attrs.push(("t", "s"));
            w.start("c", &attrs)?;
            w.text_element("v", &[], &idx)?;
            w.end("c")
        }
        CellValue::Boolean(b) => {
            attrs.push(("t", "b"));
            w.start("c", &attrs)?;
            w.text_element("v", &[], bool_attr(*b))?;
            w.end("c")
        }
        CellValue::Error(code) => {
            attrs.push(("t", "e"));
            w.start("c", &attrs)?;
            w.text_element("v", &[], code)?;
            w.end("c")
        }
        CellValue::Formula(formula) => {
            let formula = formula.strip_prefix('=').unwrap_or(formula);
            w.start("c", &attrs)?;
            w.text_element("f", &[], formula)?;
            w.end("c")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(sheet: &Sheet, drawing: Option<&RelId>) -> Result<(String, SharedStringTable, StyleSheet)> {
        let mut strings = SharedStringTable::new();
        let mut styles = StyleSheet::new();
        let mut ctx = SheetContext {
            part: "xl/worksheets/sheet1.xml",
            shared_strings: &mut strings,
            styles: &mut styles,
            drawing,
            tab_selected: true,
        };
        let xml = SpreadsheetMlSerializer.serialize(sheet, &mut ctx)?;
        Ok((xml, strings, styles))
    }

    #[test]
    fn test_cell_types() -> Result<()> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, "hello")?;
        sheet.set_value(0, 1, 42.5)?;
        sheet.set_value(1, 0, true)?;
        sheet.set_value(1, 1, CellValue::Error("#DIV/0!".to_string()))?;
        sheet.set_value(2, 0, CellValue::Formula("=SUM(B1:B2)".to_string()))?;
        sheet.set_value(2, 1, "hello")?;

        let (xml, strings, _) = render(&sheet, None)?;
        assert!(xml.contains(r#"<dimension ref="A1:B3"/>"#));
        assert!(xml.contains(r#"<c r="A1" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="B1"><v>42.5</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="B2" t="e"><v>#DIV/0!</v></c>"#));
        assert!(xml.contains(r#"<c r="A3"><f>SUM(B1:B2)</f></c>"#));
        assert!(xml.contains(r#"<c r="B3" t="s"><v>0</v></c>"#));
        assert!(!xml.contains("<drawing"));
        assert_eq!(strings.len(), 1);
        assert_eq!(strings.total_count(), 2);
        Ok(())
    }

    #[test]
    fn test_styles_columns_and_drawing() -> Result<()> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_cell(Cell::new(0, 0, 0.25).with_num_fmt("0.00%"))?;
        sheet.set_cell(Cell::new(0, 1, CellValue::Empty).with_num_fmt("yyyy-mm-dd"))?;
        sheet.set_value(0, 2, CellValue::Empty)?;
        sheet.set_column_width(0, 2, 12.5)?;
        let rel = RelId::from_ordinal(1);

        let (xml, _, styles) = render(&sheet, Some(&rel))?;
        assert!(xml.contains(r#"<c r="A1" s="1"><v>0.25</v></c>"#));
        assert!(xml.contains(r#"<c r="B1" s="2"/>"#));
        assert!(!xml.contains(r#"r="C1""#));
        assert!(xml.contains(r#"<col min="1" max="3" width="12.5" customWidth="1"/>"#));
        assert!(xml.contains(r#"<sheetView tabSelected="1" workbookViewId="0"/>"#));
        assert!(xml.trim_end().ends_with(r#"<drawing r:id="rId1"/></worksheet>"#));
        assert_eq!(styles.xf_count(), 3);
        Ok(())
    }

    #[test]
    fn test_formula_loses_only_one_equals_sign() -> Result<()> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, CellValue::Formula("==A2".to_string()))?;
        let (xml, _, _) = render(&sheet, None)?;
        assert!(xml.contains(r#"<c r="A1"><f>=A2</f></c>"#));
        Ok(())
    }

    #[test]
    fn test_empty_sheet() -> Result<()> {
        let sheet = Sheet::new("Blank");
        let (xml, strings, _) = render(&sheet, None)?;
        assert!(xml.contains(r#"<dimension ref="A1"/>"#));
        assert!(xml.contains("<sheetData></sheetData>"));
        assert!(strings.is_empty());
        Ok(())
    }

    #[test]
    fn test_non_finite_numbers_become_errors() -> Result<()> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, f64::NAN)?;
        let (xml, _, _) = render(&sheet, None)?;
        assert!(xml.contains(r#"<c r="A1" t="e"><v>#NUM!</v></c>"#));
        Ok(())
    }

    #[test]
    fn test_control_characters_are_replaced() -> Result<()> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, "a\u{1}b")?;
        sheet.set_value(0, 1, CellValue::Formula("\"a\u{1}b\"&A1".to_string()))?;

        let (xml, strings, _) = render(&sheet, None)?;
        assert!(!xml.contains('\u{1}'));
        assert!(xml.contains("<f>&quot;a\u{FFFD}b&quot;&amp;A1</f>"));
        assert!(!strings.to_xml()?.contains('\u{1}'));
        Ok(())
    }
}
