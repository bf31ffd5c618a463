//! Cell formats (`xl/styles.xml`)
//!
//! A `StyleSheet` is created for one packaging pass, fed every formatted cell
//! by the worksheet serializer and written once after the last sheet.

use crate::error::Result;
use crate::xml::{NS_MAIN, XmlWriter};
use std::collections::HashMap;

pub const STYLES_PART: &str = "xl/styles.xml";

/// First id available for custom number formats.
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

const BUILTIN_NUM_FMTS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

fn builtin_num_fmt_id(code: &str) -> Option<u32> {
    BUILTIN_NUM_FMTS
        .iter()
        .find(|(_, builtin)| builtin.eq_ignore_ascii_case(code))
        .map(|(id, _)| *id)
}

#[derive(Debug)]
pub struct StyleSheet {
    custom_num_fmts: Vec<(u32, String)>,
    /// `numFmtId` of each cell format record, in `s=` index order.
    xfs: Vec<u32>,
    xf_by_num_fmt: HashMap<u32, u32>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            custom_num_fmts: Vec::new(),
            xfs: vec![0],
            xf_by_num_fmt: HashMap::from([(0, 0)]),
        }
    }
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell format index (`s=`) for a number format code. `None` and
    /// `General` map to the default format 0.
    pub fn xf_for_format(&mut self, code: Option<&str>) -> u32 {
        let num_fmt_id = match code {
            None => 0,
            Some(code) => self.num_fmt_id(code),
        };
        if let Some(&xf) = self.xf_by_num_fmt.get(&num_fmt_id) {
            return xf;
        }
        let xf = self.xfs.len() as u32;
        self.xfs.push(num_fmt_id);
        self.xf_by_num_fmt.insert(num_fmt_id, xf);
        xf
    }

    fn num_fmt_id(&mut self, code: &str) -> u32 {
        if let Some(id) = builtin_num_fmt_id(code) {
            return id;
        }
        if let Some((id, _)) = self.custom_num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let id = FIRST_CUSTOM_NUM_FMT + self.custom_num_fmts.len() as u32;
        self.custom_num_fmts.push((id, code.to_string()));
        id
    }

    /// Number of cell format records.
    pub fn xf_count(&self) -> usize {
        self.xfs.len()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut w = XmlWriter::new(STYLES_PART)?;
        w.start("styleSheet", &[("xmlns", NS_MAIN)])?;

        if !self.custom_num_fmts.is_empty() {
            let count = self.custom_num_fmts.len().to_string();
            w.start("numFmts", &[("count", count.as_str())])?;
            for (id, code) in &self.custom_num_fmts {
                let id = id.to_string();
                w.empty(
                    "numFmt",
                    &[("numFmtId", id.as_str()), ("formatCode", code.as_str())],
                )?;
            }
            w.end("numFmts")?;
        }

        w.start("fonts", &[("count", "1")])?;
        w.start("font", &[])?;
        w.empty("sz", &[("val", "11")])?;
        w.empty("color", &[("theme", "1")])?;
        w.empty("name", &[("val", "Calibri")])?;
        w.empty("family", &[("val", "2")])?;
        w.empty("scheme", &[("val", "minor")])?;
        w.end("font")?;
        w.end("fonts")?;

        w.start("fills", &[("count", "2")])?;
        for pattern in ["none", "gray125"] {
            w.start("fill", &[])?;
            w.empty("patternFill", &[("patternType", pattern)])?;
            w.end("fill")?;
        }
        w.end("fills")?;

        w.start("borders", &[("count", "1")])?;
        w.start("border", &[])?;
        for side in ["left", "right", "top", "bottom", "diagonal"] {
            w.empty(side, &[])?;
        }
        w.end("border")?;
        w.end("borders")?;

        w.start("cellStyleXfs", &[("count", "1")])?;
        w.empty(
            "xf",
            &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
        )?;
        w.end("cellStyleXfs")?;

        let count = self.xfs.len().to_string();
        w.start("cellXfs", &[("count", count.as_str())])?;
        for &num_fmt_id in &self.xfs {
            let id = num_fmt_id.to_string();
            let mut attrs = vec![
                ("numFmtId", id.as_str()),
                ("fontId", "0"),
                ("fillId", "0"),
                ("borderId", "0"),
                ("xfId", "0"),
            ];
            if num_fmt_id != 0 {
                attrs.push(("applyNumberFormat", "1"));
            }
            w.empty("xf", &attrs)?;
        }
        w.end("cellXfs")?;

        w.start("cellStyles", &[("count", "1")])?;
        w.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
        w.end("cellStyles")?;

        w.end("styleSheet")?;
        w.finish()
    }
}
