//! Relationship sets and the content-type manifest
//!
//! Every part the assembler produces is registered here with its content
//! type, and every cross-part reference is registered as a relationship owned
//! by the referencing part. Targets are stored as absolute part names and
//! only made relative when the `.rels` part is emitted, so the final package
//! can be checked for dangling references.

use crate::error::Result;
use crate::package::PartMap;
use crate::xml::{NS_CONTENT_TYPES, NS_PACKAGE_REL, XmlWriter};
use std::collections::BTreeMap;
use std::fmt;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Owner name used for package-level relationships (`_rels/.rels`).
pub const PACKAGE_ROOT: &str = "";

pub const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
pub const CT_DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
pub const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const CT_EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_XML: &str = "application/xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelType {
    OfficeDocument,
    CoreProperties,
    ExtendedProperties,
    Worksheet,
    SharedStrings,
    Styles,
    Theme,
    Drawing,
    Image,
}

impl RelType {
    pub fn uri(self) -> &'static str {
        match self {
            RelType::OfficeDocument => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"
            }
            RelType::CoreProperties => {
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties"
            }
            RelType::ExtendedProperties => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties"
            }
            RelType::Worksheet => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"
            }
            RelType::SharedStrings => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings"
            }
            RelType::Styles => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"
            }
            RelType::Theme => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
            RelType::Drawing => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing"
            }
            RelType::Image => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
        }
    }
}

/// Relationship identifier, unique within its owning part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelId(String);

impl RelId {
    pub(crate) fn from_ordinal(n: u32) -> Self {
        RelId(format!("rId{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: RelId,
    pub rel_type: RelType,
    /// Absolute part name of the target.
    pub target: String,
}

#[derive(Debug, Default)]
struct RelationshipSet {
    entries: Vec<Relationship>,
    last_ordinal: u32,
}

/// Pass-scoped record of parts, content types and relationships.
#[derive(Debug, Default)]
pub struct Registry {
    overrides: Vec<(String, String)>,
    relationships: BTreeMap<String, RelationshipSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a part and its content type. Overrides keep registration order.
    pub fn register_part(&mut self, path: &str, content_type: &str) {
        log::debug!("registered part {path} ({content_type})");
        self.overrides.push((path.to_string(), content_type.to_string()));
    }

    /// Record a relationship from `owner` to the part `target` and return its
    /// freshly allocated identifier.
    pub fn register_relationship(&mut self, owner: &str, rel_type: RelType, target: &str) -> RelId {
        let set = self.relationships.entry(owner.to_string()).or_default();
        set.last_ordinal += 1;
        let id = RelId::from_ordinal(set.last_ordinal);
        log::debug!("registered relationship {id} from '{owner}' to {target}");
        set.entries.push(Relationship {
            id: id.clone(),
            rel_type,
            target: target.to_string(),
        });
        id
    }

    /// Content-type overrides in registration order.
    pub fn manifest(&self) -> &[(String, String)] {
        &self.overrides
    }

    pub fn relationships(&self, owner: &str) -> &[Relationship] {
        self.relationships
            .get(owner)
            .map(|set| set.entries.as_slice())
            .unwrap_or(&[])
    }

    /// Owners with at least one relationship, in part-name order.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(|(_, set)| !set.entries.is_empty())
            .map(|(owner, _)| owner.as_str())
    }

    /// `[Content_Types].xml`.
    pub fn emit_manifest(&self) -> Result<String> {
        let mut w = XmlWriter::new(CONTENT_TYPES_PART)?;
        w.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
        w.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)])?;
        w.empty("Default", &[("Extension", "xml"), ("ContentType", CT_XML)])?;
        for (path, content_type) in &self.overrides {
            let part_name = format!("/{path}");
            w.empty(
                "Override",
                &[("PartName", part_name.as_str()), ("ContentType", content_type.as_str())],
            )?;
        }
        w.end("Types")?;
        w.finish()
    }

    /// The relationship part for `owner` as `(part name, xml)`, or `None` if
    /// the owner has no relationships.
    pub fn emit_relationships(&self, owner: &str) -> Result<Option<(String, String)>> {
        let entries = self.relationships(owner);
        if entries.is_empty() {
            return Ok(None);
        }
        let path = rels_part_for(owner);
        let mut w = XmlWriter::new(path.as_str())?;
        w.start("Relationships", &[("xmlns", NS_PACKAGE_REL)])?;
        for rel in entries {
            let target = relative_target(owner, &rel.target);
            w.empty(
                "Relationship",
                &[
                    ("Id", rel.id.as_str()),
                    ("Type", rel.rel_type.uri()),
                    ("Target", target.as_str()),
                ],
            )?;
        }
        w.end("Relationships")?;
        Ok(Some((path, w.finish()?)))
    }

    /// Relationship targets and manifest entries missing from `parts`, as
    /// `(owner, target)` pairs. Manifest entries report `[Content_Types].xml`
    /// as their owner.
    pub fn dangling_targets(&self, parts: &PartMap) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for (owner, set) in &self.relationships {
            for rel in &set.entries {
                if !parts.contains(&rel.target) {
                    missing.push((owner.clone(), rel.target.clone()));
                }
            }
        }
        for (path, _) in &self.overrides {
            if !parts.contains(path) {
                missing.push((CONTENT_TYPES_PART.to_string(), path.clone()));
            }
        }
        missing
    }
}

/// Name of the `.rels` part holding the relationships of `owner`.
pub fn rels_part_for(owner: &str) -> String {
    match owner.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None if owner.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{owner}.rels"),
    }
}

/// Path of `target` relative to the directory containing `owner`.
pub fn relative_target(owner: &str, target: &str) -> String {
    let owner_dir: Vec<&str> = match owner.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target_segments: Vec<&str> = target.split('/').collect();
    let common = owner_dir
        .iter()
        .zip(&target_segments)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target_segments.len() - 1);

    let mut out: Vec<&str> = vec![".."; owner_dir.len() - common];
    out.extend(&target_segments[common..]);
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Part;

    #[test]
    fn test_rels_part_names() {
        assert_eq!(rels_part_for(PACKAGE_ROOT), "_rels/.rels");
        assert_eq!(rels_part_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_part_for("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
    }

    #[test]
    fn test_relative_targets() {
        assert_eq!(relative_target(PACKAGE_ROOT, "xl/workbook.xml"), "xl/workbook.xml");
        assert_eq!(
            relative_target("xl/workbook.xml", "xl/worksheets/sheet1.xml"),
            "worksheets/sheet1.xml"
        );
        assert_eq!(
            relative_target("xl/worksheets/sheet1.xml", "xl/drawings/drawing1.xml"),
            "../drawings/drawing1.xml"
        );
        assert_eq!(
            relative_target("xl/drawings/drawing3.xml", "xl/media/image7.png"),
            "../media/image7.png"
        );
    }

    #[test]
    fn test_ids_are_per_owner_and_monotonic() {
        let mut registry = Registry::new();
        let a = registry.register_relationship("xl/workbook.xml", RelType::Worksheet, "xl/worksheets/sheet1.xml");
        let b = registry.register_relationship("xl/workbook.xml", RelType::Styles, "xl/styles.xml");
        let c = registry.register_relationship(
            "xl/worksheets/sheet1.xml",
            RelType::Drawing,
            "xl/drawings/drawing1.xml",
        );
        assert_eq!(a.as_str(), "rId1");
        assert_eq!(b.as_str(), "rId2");
        assert_eq!(c.as_str(), "rId1");
        assert_eq!(
            registry.owners().collect::<Vec<_>>(),
            vec!["xl/workbook.xml", "xl/worksheets/sheet1.xml"]
        );
    }

    #[test]
    fn test_emit_relationships() -> Result<()> {
        let mut registry = Registry::new();
        assert!(registry.emit_relationships("xl/workbook.xml")?.is_none());

        registry.register_relationship("xl/drawings/drawing1.xml", RelType::Image, "xl/media/image1.png");
        let (path, xml) = registry
            .emit_relationships("xl/drawings/drawing1.xml")?
            .expect("drawing has relationships");
        assert_eq!(path, "xl/drawings/_rels/drawing1.xml.rels");
        assert!(xml.contains(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>"#
        ));
        Ok(())
    }

    #[test]
    fn test_manifest_order_and_dangling() -> Result<()> {
        let mut registry = Registry::new();
        registry.register_part("xl/workbook.xml", CT_WORKBOOK);
        registry.register_part("xl/media/image1.gif", "image/gif");
        registry.register_relationship(PACKAGE_ROOT, RelType::OfficeDocument, "xl/workbook.xml");

        let manifest = registry.emit_manifest()?;
        let wb = manifest.find("/xl/workbook.xml").expect("workbook override");
        let img = manifest.find("/xl/media/image1.gif").expect("image override");
        assert!(wb < img);

        let mut parts = PartMap::new();
        parts.insert("xl/workbook.xml", Part::Xml(String::new()))?;
        assert_eq!(
            registry.dangling_targets(&parts),
            vec![(CONTENT_TYPES_PART.to_string(), "xl/media/image1.gif".to_string())]
        );
        Ok(())
    }
}
