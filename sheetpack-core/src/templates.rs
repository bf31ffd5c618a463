//! Reference parts with fixed or nearly fixed content

use crate::config::PropertiesConfig;
use crate::error::Result;
use crate::xml::XmlWriter;

pub const THEME_PART: &str = "xl/theme/theme1.xml";
pub const APP_PROPERTIES_PART: &str = "docProps/app.xml";
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

const NS_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const NS_DOC_PROPS_VTYPES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";
const NS_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

/// `docProps/app.xml` listing the worksheet titles.
pub(crate) fn app_properties(props: &PropertiesConfig, sheet_names: &[&str]) -> Result<String> {
    let count = sheet_names.len().to_string();
    let mut w = XmlWriter::new(APP_PROPERTIES_PART)?;
    w.start(
        "Properties",
        &[("xmlns", NS_EXTENDED_PROPERTIES), ("xmlns:vt", NS_DOC_PROPS_VTYPES)],
    )?;
    w.text_element("Application", &[], &props.application)?;
    w.text_element("DocSecurity", &[], "0")?;
    w.text_element("ScaleCrop", &[], "false")?;

    w.start("HeadingPairs", &[])?;
    w.start("vt:vector", &[("size", "2"), ("baseType", "variant")])?;
    w.start("vt:variant", &[])?;
    w.text_element("vt:lpstr", &[], "Worksheets")?;
    w.end("vt:variant")?;
    w.start("vt:variant", &[])?;
    w.text_element("vt:i4", &[], &count)?;
    w.end("vt:variant")?;
    w.end("vt:vector")?;
    w.end("HeadingPairs")?;

    w.start("TitlesOfParts", &[])?;
    w.start("vt:vector", &[("size", count.as_str()), ("baseType", "lpstr")])?;
    for name in sheet_names {
        w.text_element("vt:lpstr", &[], name)?;
    }
    w.end("vt:vector")?;
    w.end("TitlesOfParts")?;

    w.text_element("LinksUpToDate", &[], "false")?;
    w.text_element("SharedDoc", &[], "false")?;
    w.text_element("HyperlinksChanged", &[], "false")?;
    w.text_element("AppVersion", &[], "12.0000")?;
    w.end("Properties")?;
    w.finish()
}

/// `docProps/core.xml`. Unset properties are left out.
pub(crate) fn core_properties(props: &PropertiesConfig) -> Result<String> {
    let mut w = XmlWriter::new(CORE_PROPERTIES_PART)?;
    w.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", NS_CORE_PROPERTIES),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    if let Some(creator) = &props.creator {
        w.text_element("dc:creator", &[], creator)?;
        w.text_element("cp:lastModifiedBy", &[], creator)?;
    }
    if let Some(created) = &props.created {
        w.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], created)?;
        w.text_element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], created)?;
    }
    w.end("cp:coreProperties")?;
    w.finish()
}

/// Office theme used when the document does not bring its own.
pub const DEFAULT_THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Cambria"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="50000"/></a:schemeClr></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:shade val="80000"/></a:schemeClr></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln><a:ln w="25400" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln><a:ln w="38100" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/></a:schemeClr></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:shade val="90000"/></a:schemeClr></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_properties_lists_sheets() -> Result<()> {
        let xml = app_properties(&PropertiesConfig::default(), &["Sheet1", "R&D"])?;
        assert!(xml.contains("<Application>sheetpack</Application>"));
        assert!(xml.contains("<vt:i4>2</vt:i4>"));
        assert!(xml.contains(r#"<vt:vector size="2" baseType="lpstr"><vt:lpstr>Sheet1</vt:lpstr><vt:lpstr>R&amp;D</vt:lpstr></vt:vector>"#));
        Ok(())
    }

    #[test]
    fn test_core_properties_omit_unset_fields() -> Result<()> {
        let bare = core_properties(&PropertiesConfig::default())?;
        assert!(!bare.contains("dc:creator"));
        assert!(!bare.contains("dcterms:created"));

        let props = PropertiesConfig {
            creator: Some("Finance".to_string()),
            created: Some("2024-01-31T12:00:00Z".to_string()),
            ..PropertiesConfig::default()
        };
        let xml = core_properties(&props)?;
        assert!(xml.contains("<dc:creator>Finance</dc:creator>"));
        assert!(xml.contains(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">2024-01-31T12:00:00Z</dcterms:created>"#
        ));
        Ok(())
    }

    #[test]
    fn test_default_theme_is_declared_xml() {
        assert!(DEFAULT_THEME.starts_with("<?xml"));
        assert!(DEFAULT_THEME.trim_end().ends_with("</a:theme>"));
    }
}
