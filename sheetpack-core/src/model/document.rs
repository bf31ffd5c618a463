//! The workbook being packaged

use super::sheet::Sheet;
use crate::assembler::Assembler;
use crate::config::PackConfig;
use crate::error::{PackError, Result};
use crate::package::{PackageWriter, PartMap};
use crate::templates;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// A named formula or range, optionally local to one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    pub name: String,
    pub refers_to: String,
    /// Index of the sheet the name is local to.
    pub local_sheet: Option<usize>,
    pub hidden: bool,
}

impl DefinedName {
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refers_to: refers_to.into(),
            local_sheet: None,
            hidden: false,
        }
    }
}

/// Theme part content, copied into the package as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub xml: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            xml: templates::DEFAULT_THEME.to_string(),
        }
    }
}

/// Represents a complete workbook
#[derive(Debug, Clone, Default)]
pub struct Document {
    sheets: Vec<Sheet>,
    pub defined_names: Vec<DefinedName>,
    pub theme: Theme,
    /// Use the 1904 date system.
    pub date1904: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet. The first sheet added becomes the selected one.
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        validate_sheet_name(name)?;
        // Sheet names compare case-insensitively.
        let lowered = name.to_lowercase();
        if self.sheets.iter().any(|s| s.name.to_lowercase() == lowered) {
            return Err(PackError::DuplicateSheetName(name.to_string()));
        }
        let mut sheet = Sheet::new(name);
        sheet.selected = self.sheets.is_empty();
        self.sheets.push(sheet);
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    /// Get a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Sheets in display order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Get all sheet names
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Make `name` the only selected sheet.
    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheet(name).is_none() {
            return Err(PackError::SheetNotFound(name.to_string()));
        }
        for sheet in &mut self.sheets {
            sheet.selected = sheet.name == name;
        }
        Ok(())
    }

    /// Index of the selected sheet, falling back to the first one.
    pub fn selected_index(&self) -> usize {
        self.sheets.iter().position(|s| s.selected).unwrap_or(0)
    }

    pub fn add_defined_name(&mut self, name: DefinedName) {
        self.defined_names.push(name);
    }

    /// Build every part of the package in memory.
    pub fn to_parts(&self, config: &PackConfig) -> Result<PartMap> {
        Assembler::new(config).assemble(self)
    }

    /// Package the document into an in-memory archive.
    pub fn to_bytes(&self, config: &PackConfig) -> Result<Vec<u8>> {
        let parts = self.to_parts(config)?;
        PackageWriter::new(&config.package).to_bytes(&parts)
    }

    /// Package the document into any byte sink.
    pub fn write_to<W: Write>(&self, mut sink: W, config: &PackConfig) -> Result<()> {
        let bytes = self.to_bytes(config)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Package the document into a file, creating or truncating it.
    pub fn save<P: AsRef<Path>>(&self, path: P, config: &PackConfig) -> Result<()> {
        let bytes = self.to_bytes(config)?;
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }
}

pub(crate) fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason| PackError::InvalidSheetName {
        name: name.to_string(),
        reason,
    };
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_SHEET_NAME_CHARS) {
        return Err(invalid("name contains one of [ ] : * ? / \\"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}
