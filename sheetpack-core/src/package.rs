//! Part map and ZIP container output

use crate::config::{Compression, PackageConfig};
use crate::error::{PackError, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Content of one package member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Xml(String),
    Binary(Vec<u8>),
}

impl Part {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Part::Xml(xml) => xml.as_bytes(),
            Part::Binary(bytes) => bytes,
        }
    }

    pub fn as_xml(&self) -> Option<&str> {
        match self {
            Part::Xml(xml) => Some(xml),
            Part::Binary(_) => None,
        }
    }
}

/// Every member of the package keyed by part name. Iteration is sorted by
/// name, which puts `[Content_Types].xml` first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartMap {
    parts: BTreeMap<String, Part>,
}

impl PartMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. A part name may only be produced once per pass.
    pub fn insert(&mut self, name: impl Into<String>, part: Part) -> Result<()> {
        let name = name.into();
        if self.parts.contains_key(&name) {
            return Err(PackError::DuplicatePart(name));
        }
        self.parts.insert(name, part);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    /// XML content of `name`, if present and textual.
    pub fn xml(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Part::as_xml)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Part)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.parts.values().map(|p| p.as_bytes().len()).sum()
    }
}

/// Writes a `PartMap` as a ZIP archive.
#[derive(Debug, Clone)]
pub struct PackageWriter {
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub fn new(config: &PackageConfig) -> Self {
        let method = match config.compression {
            Compression::Stored => zip::CompressionMethod::Stored,
            Compression::Deflated => zip::CompressionMethod::Deflated,
        };
        // Fixed timestamp so identical documents give identical archives.
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(config.compression_level)
            .last_modified_time(zip::DateTime::default());
        Self { options }
    }

    /// Write every part as one archive member and finish the central
    /// directory. Stops at the first failure; a member whose data could not
    /// be written is removed from the archive before returning.
    pub fn write<W: Write + Seek>(&self, parts: &PartMap, sink: W) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        for (name, part) in parts.iter() {
            zip.start_file(name, self.options)?;
            if let Err(err) = zip.write_all(part.as_bytes()) {
                if let Err(abort_err) = zip.abort_file() {
                    log::warn!("could not discard partial member {name}: {abort_err}");
                }
                return Err(err.into());
            }
        }
        Ok(zip.finish()?)
    }

    pub fn to_bytes(&self, parts: &PartMap) -> Result<Vec<u8>> {
        let cursor = self.write(parts, Cursor::new(Vec::new()))?;
        let bytes = cursor.into_inner();
        log::info!(
            "packaged {} parts ({} bytes uncompressed) into {} bytes",
            parts.len(),
            parts.payload_size(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, SeekFrom};

    fn sample_parts() -> Result<PartMap> {
        let mut parts = PartMap::new();
        parts.insert("xl/workbook.xml", Part::Xml("<workbook/>".to_string()))?;
        parts.insert("[Content_Types].xml", Part::Xml("<Types/>".to_string()))?;
        parts.insert("xl/media/image1.png", Part::Binary(vec![0x89, b'P', b'N', b'G']))?;
        Ok(parts)
    }

    #[test]
    fn test_duplicate_part_rejected() -> Result<()> {
        let mut parts = sample_parts()?;
        let err = parts
            .insert("xl/workbook.xml", Part::Xml(String::new()))
            .unwrap_err();
        assert!(matches!(err, PackError::DuplicatePart(ref n) if n == "xl/workbook.xml"));
        assert_eq!(parts.xml("xl/workbook.xml"), Some("<workbook/>"));
        Ok(())
    }

    #[test]
    fn test_members_are_sorted_and_complete() -> Result<()> {
        let parts = sample_parts()?;
        let bytes = PackageWriter::new(&PackageConfig::default()).to_bytes(&parts)?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert_eq!(archive.len(), 3);
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert_eq!(archive.by_index(0)?.name(), "[Content_Types].xml");

        let mut image = Vec::new();
        archive.by_name("xl/media/image1.png")?.read_to_end(&mut image)?;
        assert_eq!(image, vec![0x89, b'P', b'N', b'G']);
        Ok(())
    }

    #[test]
    fn test_stored_and_deflated_are_deterministic() -> Result<()> {
        let parts = sample_parts()?;
        for compression in [Compression::Stored, Compression::Deflated] {
            let config = PackageConfig {
                compression,
                compression_level: None,
            };
            let writer = PackageWriter::new(&config);
            assert_eq!(writer.to_bytes(&parts)?, writer.to_bytes(&parts)?);
        }
        Ok(())
    }

    /// Sink that accepts a fixed number of bytes and then fails.
    struct FailingSink {
        inner: Cursor<Vec<u8>>,
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::other("sink full"));
            }
            self.budget -= buf.len();
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_sink_failure_is_reported() -> Result<()> {
        let mut parts = PartMap::new();
        parts.insert("xl/media/image1.png", Part::Binary(vec![7u8; 64 * 1024]))?;
        let sink = FailingSink {
            inner: Cursor::new(Vec::new()),
            budget: 256,
        };
        let config = PackageConfig {
            compression: Compression::Stored,
            compression_level: None,
        };
        let result = PackageWriter::new(&config).write(&parts, sink);
        assert!(matches!(result, Err(PackError::Io(_)) | Err(PackError::Zip(_))));
        Ok(())
    }
}
