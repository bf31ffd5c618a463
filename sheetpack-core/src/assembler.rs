//! Workbook assembly: one packaging pass from `Document` to `PartMap`
//!
//! The assembler visits sheets in display order. For each sheet it resolves
//! image anchors, writes the drawing and media parts, then serializes the
//! worksheet against the pass-wide shared string table and style sheet.
//! Only after the last sheet are the shared strings, styles and workbook
//! written, since every sheet contributes to them.

use crate::compat;
use crate::config::PackConfig;
use crate::drawing::{DrawingPart, column_pixel_widths, media_part_name, resolve_anchor};
use crate::error::{PackError, Result};
use crate::model::document::validate_sheet_name;
use crate::model::{Document, Sheet};
use crate::package::{Part, PartMap};
use crate::relationships::{
    CONTENT_TYPES_PART, CT_CORE_PROPERTIES, CT_DRAWING, CT_EXTENDED_PROPERTIES, CT_SHARED_STRINGS,
    CT_STYLES, CT_THEME, CT_WORKBOOK, CT_WORKSHEET, PACKAGE_ROOT, RelId, RelType, Registry,
};
use crate::shared_strings::{SHARED_STRINGS_PART, SharedStringTable};
use crate::styles::{STYLES_PART, StyleSheet};
use crate::templates::{self, APP_PROPERTIES_PART, CORE_PROPERTIES_PART, THEME_PART};
use crate::worksheet::{SheetContext, SpreadsheetMlSerializer, WorksheetSerializer};
use crate::xml::{NS_MAIN, NS_REL, XmlWriter, bool_attr};
use std::collections::HashSet;

pub const WORKBOOK_PART: &str = "xl/workbook.xml";

pub fn worksheet_part_name(ordinal: usize) -> String {
    format!("xl/worksheets/sheet{ordinal}.xml")
}

/// Builds the parts of a package.
pub struct Assembler<'c> {
    config: &'c PackConfig,
}

impl<'c> Assembler<'c> {
    pub fn new(config: &'c PackConfig) -> Self {
        Self { config }
    }

    /// Assemble with the built-in worksheet serializer.
    pub fn assemble(&self, doc: &Document) -> Result<PartMap> {
        self.assemble_with(doc, &SpreadsheetMlSerializer)
    }

    /// Assemble with a custom worksheet serializer. Its output goes through
    /// the namespace fix-ups in [`compat`].
    pub fn assemble_with(&self, doc: &Document, serializer: &dyn WorksheetSerializer) -> Result<PartMap> {
        check_document(doc)?;
        let active = active_tab(doc);

        let mut pass = Pass::default();
        pass.registry
            .register_relationship(PACKAGE_ROOT, RelType::OfficeDocument, WORKBOOK_PART);
        pass.registry.register_part(WORKBOOK_PART, CT_WORKBOOK);

        let mut sheet_ids = Vec::with_capacity(doc.sheets().len());
        for (idx, sheet) in doc.sheets().iter().enumerate() {
            let rel_id = pass.add_sheet(sheet, idx + 1, idx == active, serializer)?;
            sheet_ids.push(rel_id);
        }

        pass.add_workbook_parts(doc)?;
        let workbook = self.workbook_xml(doc, &sheet_ids, active)?;
        pass.parts
            .insert(WORKBOOK_PART, Part::Xml(compat::normalize_workbook(&workbook)))?;
        self.add_doc_props(&mut pass, doc)?;

        pass.finish(doc)
    }

    fn workbook_xml(&self, doc: &Document, sheet_ids: &[RelId], active: usize) -> Result<String> {
        let view = &self.config.workbook;
        let mut w = XmlWriter::new(WORKBOOK_PART)?;
        w.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
        w.empty("fileVersion", &[("appName", view.app_name.as_str())])?;

        let mut pr = vec![("showObjects", view.show_objects.as_str())];
        if doc.date1904 {
            pr.push(("date1904", "1"));
        }
        w.empty("workbookPr", &pr)?;

        let x_window = view.x_window.to_string();
        let y_window = view.y_window.to_string();
        let width = view.window_width.to_string();
        let height = view.window_height.to_string();
        let tab_ratio = view.tab_ratio.to_string();
        let active_tab = active.to_string();
        w.start("bookViews", &[])?;
        w.empty(
            "workbookView",
            &[
                ("showHorizontalScroll", bool_attr(view.show_horizontal_scroll)),
                ("showVerticalScroll", bool_attr(view.show_vertical_scroll)),
                ("showSheetTabs", bool_attr(view.show_sheet_tabs)),
                ("xWindow", x_window.as_str()),
                ("yWindow", y_window.as_str()),
                ("windowWidth", width.as_str()),
                ("windowHeight", height.as_str()),
                ("tabRatio", tab_ratio.as_str()),
                ("activeTab", active_tab.as_str()),
            ],
        )?;
        w.end("bookViews")?;

        w.start("sheets", &[])?;
        for (idx, (sheet, rel_id)) in doc.sheets().iter().zip(sheet_ids).enumerate() {
            let sheet_id = (idx + 1).to_string();
            let state = if sheet.hidden { "hidden" } else { "visible" };
            w.empty(
                "sheet",
                &[
                    ("name", sheet.name.as_str()),
                    ("sheetId", sheet_id.as_str()),
                    ("state", state),
                    ("r:id", rel_id.as_str()),
                ],
            )?;
        }
        w.end("sheets")?;

        if !doc.defined_names.is_empty() {
            w.start("definedNames", &[])?;
            for defined in &doc.defined_names {
                let local = defined.local_sheet.map(|idx| idx.to_string());
                let mut attrs = vec![("name", defined.name.as_str())];
                if let Some(local) = &local {
                    attrs.push(("localSheetId", local.as_str()));
                }
                if defined.hidden {
                    attrs.push(("hidden", "1"));
                }
                w.text_element("definedName", &attrs, &defined.refers_to)?;
            }
            w.end("definedNames")?;
        }

        let iterate_count = view.iterate_count.to_string();
        let iterate_delta = view.iterate_delta.to_string();
        w.empty(
            "calcPr",
            &[
                ("iterateCount", iterate_count.as_str()),
                ("refMode", view.ref_mode.as_str()),
                ("iterate", bool_attr(view.iterate)),
                ("iterateDelta", iterate_delta.as_str()),
            ],
        )?;

        w.end("workbook")?;
        w.finish()
    }

    fn add_doc_props(&self, pass: &mut Pass, doc: &Document) -> Result<()> {
        let props = &self.config.properties;
        pass.registry
            .register_relationship(PACKAGE_ROOT, RelType::CoreProperties, CORE_PROPERTIES_PART);
        pass.registry.register_part(CORE_PROPERTIES_PART, CT_CORE_PROPERTIES);
        pass.parts.insert(
            CORE_PROPERTIES_PART,
            Part::Xml(templates::core_properties(props)?),
        )?;

        pass.registry
            .register_relationship(PACKAGE_ROOT, RelType::ExtendedProperties, APP_PROPERTIES_PART);
        pass.registry.register_part(APP_PROPERTIES_PART, CT_EXTENDED_PROPERTIES);
        pass.parts.insert(
            APP_PROPERTIES_PART,
            Part::Xml(templates::app_properties(props, &doc.sheet_names())?),
        )?;
        Ok(())
    }
}

/// Pass-scoped state. Dropped at the end of every `assemble_with` call.
#[derive(Default)]
struct Pass {
    registry: Registry,
    shared_strings: SharedStringTable,
    styles: StyleSheet,
    parts: PartMap,
    drawings: u32,
    images: u32,
}

impl Pass {
    fn add_sheet(
        &mut self,
        sheet: &Sheet,
        ordinal: usize,
        tab_selected: bool,
        serializer: &dyn WorksheetSerializer,
    ) -> Result<RelId> {
        let part = worksheet_part_name(ordinal);
        let rel_id = self
            .registry
            .register_relationship(WORKBOOK_PART, RelType::Worksheet, &part);
        self.registry.register_part(&part, CT_WORKSHEET);

        let drawing = self.add_drawings(sheet, &part)?;

        let mut ctx = SheetContext {
            part: &part,
            shared_strings: &mut self.shared_strings,
            styles: &mut self.styles,
            drawing: drawing.as_ref(),
            tab_selected,
        };
        let xml = serializer.serialize(sheet, &mut ctx)?;
        self.parts
            .insert(part, Part::Xml(compat::normalize_worksheet(&xml)))?;
        Ok(rel_id)
    }

    /// Write the drawing and media parts of `sheet`, returning the
    /// worksheet's relationship to its drawing part.
    fn add_drawings(&mut self, sheet: &Sheet, sheet_part: &str) -> Result<Option<RelId>> {
        if sheet.drawings.is_empty() {
            return Ok(None);
        }

        let widths = column_pixel_widths(sheet);
        let anchors = sheet
            .drawings
            .iter()
            .map(|drawing| resolve_anchor(drawing, &widths))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| PackError::InvalidDrawing {
                sheet: sheet.name.clone(),
                source,
            })?;

        self.drawings += 1;
        let mut part = DrawingPart::new(self.drawings);
        let rel_id = self
            .registry
            .register_relationship(sheet_part, RelType::Drawing, part.name());
        self.registry.register_part(part.name(), CT_DRAWING);

        for (drawing, anchor) in sheet.drawings.iter().zip(anchors) {
            self.images += 1;
            let media = media_part_name(self.images, drawing.kind);
            self.registry.register_part(&media, drawing.kind.content_type());
            let embed = self
                .registry
                .register_relationship(part.name(), RelType::Image, &media);
            self.parts.insert(media, Part::Binary(drawing.image.clone()))?;
            part.push(anchor, embed);
        }

        let xml = part.to_xml()?;
        self.parts.insert(part.name(), Part::Xml(xml))?;
        Ok(Some(rel_id))
    }

    /// Theme, styles and shared strings. Called once every sheet is written.
    fn add_workbook_parts(&mut self, doc: &Document) -> Result<()> {
        self.registry
            .register_relationship(WORKBOOK_PART, RelType::Theme, THEME_PART);
        self.registry.register_part(THEME_PART, CT_THEME);
        self.parts.insert(THEME_PART, Part::Xml(doc.theme.xml.clone()))?;

        self.registry
            .register_relationship(WORKBOOK_PART, RelType::Styles, STYLES_PART);
        self.registry.register_part(STYLES_PART, CT_STYLES);
        self.parts.insert(STYLES_PART, Part::Xml(self.styles.to_xml()?))?;

        self.registry
            .register_relationship(WORKBOOK_PART, RelType::SharedStrings, SHARED_STRINGS_PART);
        self.registry.register_part(SHARED_STRINGS_PART, CT_SHARED_STRINGS);
        self.parts
            .insert(SHARED_STRINGS_PART, Part::Xml(self.shared_strings.to_xml()?))?;
        Ok(())
    }

    /// Emit every relationship part and the manifest, then check that all
    /// references resolve.
    fn finish(mut self, doc: &Document) -> Result<PartMap> {
        let owners: Vec<String> = self.registry.owners().map(str::to_string).collect();
        for owner in owners {
            if let Some((path, xml)) = self.registry.emit_relationships(&owner)? {
                self.parts.insert(path, Part::Xml(xml))?;
            }
        }
        self.parts
            .insert(CONTENT_TYPES_PART, Part::Xml(self.registry.emit_manifest()?))?;

        if let Some((owner, target)) = self.registry.dangling_targets(&self.parts).into_iter().next() {
            return Err(PackError::DanglingRelationship { owner, target });
        }

        log::info!(
            "assembled {} sheets, {} drawings, {} images and {} shared strings into {} parts",
            doc.sheets().len(),
            self.drawings,
            self.images,
            self.shared_strings.len(),
            self.parts.len()
        );
        Ok(self.parts)
    }
}

/// Reject documents that cannot be packaged before anything is written.
fn check_document(doc: &Document) -> Result<()> {
    let sheets = doc.sheets();
    if sheets.is_empty() {
        return Err(PackError::EmptyDocument);
    }
    if sheets.iter().all(|s| s.hidden) {
        return Err(PackError::NoVisibleSheet);
    }

    let mut names = HashSet::new();
    for sheet in sheets {
        validate_sheet_name(&sheet.name)?;
        sheet.check_grid()?;
        if !names.insert(sheet.name.to_lowercase()) {
            return Err(PackError::DuplicateSheetName(sheet.name.clone()));
        }
        for drawing in &sheet.drawings {
            drawing.validate().map_err(|source| PackError::InvalidDrawing {
                sheet: sheet.name.clone(),
                source,
            })?;
        }
    }

    for defined in &doc.defined_names {
        let invalid = |reason: String| PackError::InvalidDefinedName {
            name: defined.name.clone(),
            reason,
        };
        if defined.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if let Some(idx) = defined.local_sheet {
            if idx >= sheets.len() {
                return Err(invalid(format!(
                    "local sheet index {idx} is out of range for {} sheets",
                    sheets.len()
                )));
            }
        }
    }
    Ok(())
}

/// Index of the tab shown on open: the selected sheet, or the first visible
/// one if the selected sheet is hidden.
fn active_tab(doc: &Document) -> usize {
    let selected = doc.selected_index();
    let sheets = doc.sheets();
    if sheets.get(selected).is_some_and(|s| !s.hidden) {
        return selected;
    }
    let fallback = sheets.iter().position(|s| !s.hidden).unwrap_or(0);
    log::warn!(
        "selected sheet {selected} is hidden, activating sheet {fallback} instead"
    );
    fallback
}
