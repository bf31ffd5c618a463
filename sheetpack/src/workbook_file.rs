//! TOML workbook descriptions

use anyhow::{Context, Result};
use serde::Deserialize;
use sheetpack_core::{CellRef, CellValue, DefinedName, Document, Drawing, ImageKind};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct WorkbookFile {
    #[serde(default)]
    pub date1904: bool,
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
    #[serde(default)]
    pub defined_names: Vec<DefinedNameEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SheetEntry {
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub hidden: bool,
    pub default_column_width: Option<f64>,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    /// Row-major cell values starting at A1.
    #[serde(default)]
    pub rows: Vec<Vec<toml::Value>>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnEntry {
    pub first: u32,
    pub last: u32,
    pub width: f64,
}

#[derive(Debug, Deserialize)]
pub struct ImageEntry {
    pub path: String,
    pub col: u32,
    pub row: u32,
    pub col_span: Option<u32>,
    pub row_span: Option<u32>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct DefinedNameEntry {
    pub name: String,
    pub refers_to: String,
    /// Name of the sheet the defined name is local to.
    pub sheet: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl WorkbookFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read workbook description {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid workbook description {}", path.display()))
    }

    /// Build the document. Image paths are resolved against `base_dir`.
    pub fn to_document(&self, base_dir: &Path) -> Result<Document> {
        let mut doc = Document::new();
        doc.date1904 = self.date1904;

        for entry in &self.sheets {
            let sheet = doc.add_sheet(&entry.name)?;
            sheet.hidden = entry.hidden;
            sheet.default_column_width = entry.default_column_width;
            for col in &entry.columns {
                sheet.set_column_width(col.first, col.last, col.width)?;
            }
            for (r, row) in entry.rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    let value = cell_value(value).with_context(|| {
                        format!("Sheet '{}' cell {}", entry.name, CellRef::new(c as u32, r as u32))
                    })?;
                    if !value.is_empty() {
                        sheet.set_value(r as u32, c as u32, value)?;
                    }
                }
            }
            for image in &entry.images {
                let drawing = load_image(image, base_dir)
                    .with_context(|| format!("Sheet '{}' image {}", entry.name, image.path))?;
                sheet.add_drawing(drawing)?;
            }
        }

        if let Some(selected) = self.sheets.iter().find(|s| s.selected) {
            doc.select_sheet(&selected.name)?;
        }

        for entry in &self.defined_names {
            let local_sheet = match &entry.sheet {
                Some(name) => Some(
                    doc.sheet_names()
                        .iter()
                        .position(|n| *n == name.as_str())
                        .with_context(|| format!("Defined name '{}' refers to unknown sheet '{name}'", entry.name))?,
                ),
                None => None,
            };
            doc.add_defined_name(DefinedName {
                local_sheet,
                hidden: entry.hidden,
                ..DefinedName::new(&entry.name, &entry.refers_to)
            });
        }
        Ok(doc)
    }
}

fn cell_value(value: &toml::Value) -> Result<CellValue> {
    Ok(match value {
        toml::Value::String(s) if s.is_empty() => CellValue::Empty,
        toml::Value::String(s) if s.starts_with('=') && s.len() > 1 => CellValue::Formula(s.clone()),
        toml::Value::String(s) => CellValue::Text(s.clone()),
        toml::Value::Integer(i) => CellValue::Number(*i as f64),
        toml::Value::Float(f) => CellValue::Number(*f),
        toml::Value::Boolean(b) => CellValue::Boolean(*b),
        toml::Value::Datetime(dt) => CellValue::Text(dt.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            anyhow::bail!("nested arrays and tables are not cell values")
        }
    })
}

fn load_image(image: &ImageEntry, base_dir: &Path) -> Result<Drawing> {
    let path = base_dir.join(&image.path);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let Some(kind) = ImageKind::from_extension(ext) else {
        anyhow::bail!("unsupported image format '{ext}' (expected png, jpeg or gif)");
    };
    let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut drawing = Drawing::new(bytes, kind, CellRef::new(image.col, image.row), image.width, image.height);
    drawing.col_span = image.col_span;
    drawing.row_span = image.row_span;
    Ok(drawing)
}
