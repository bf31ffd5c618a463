//! Shared string table (`xl/sharedStrings.xml`)
//!
//! Built fresh for every packaging pass so the index space matches exactly
//! the strings referenced by the worksheets produced in that pass.

use crate::error::Result;
use crate::xml::{NS_MAIN, XmlWriter};
use std::collections::HashMap;

pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

#[derive(Debug, Default)]
pub struct SharedStringTable {
    /// Distinct strings in first-occurrence order with their occurrence counts.
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, assigning the next free one on first sight.
    pub fn intern(&mut self, value: &str) -> usize {
        if let Some(&idx) = self.index.get(value) {
            self.entries[idx].1 += 1;
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push((value.to_string(), 1));
        self.index.insert(value.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of references handed out.
    pub fn total_count(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Distinct strings in index order with their occurrence counts.
    pub fn finalize(self) -> Vec<(String, usize)> {
        self.entries
    }

    pub fn to_xml(&self) -> Result<String> {
        let count = self.total_count().to_string();
        let unique = self.len().to_string();

        let mut w = XmlWriter::new(SHARED_STRINGS_PART)?;
        w.start(
            "sst",
            &[
                ("xmlns", NS_MAIN),
                ("count", count.as_str()),
                ("uniqueCount", unique.as_str()),
            ],
        )?;
        for (value, _) in &self.entries {
            w.start("si", &[])?;
            if needs_space_preserve(value) {
                w.text_element("t", &[("xml:space", "preserve")], value)?;
            } else {
                w.text_element("t", &[], value)?;
            }
            w.end("si")?;
        }
        w.end("sst")?;
        w.finish()
    }
}

fn needs_space_preserve(value: &str) -> bool {
    value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace)
}
