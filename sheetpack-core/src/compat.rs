//! Namespace fix-ups for strict consumers
//!
//! Some readers (Numbers, SAS) refuse documents whose relationship references
//! carry an inline `xmlns:<prefix>` declaration instead of the `r:` prefix
//! declared on the root, and refuse worksheets whose root lacks the `r` and
//! `mc` declarations. The built-in serializers already write the expected
//! form; these rewrites bring any other serializer's output in line. Every
//! function here is idempotent.

use crate::xml::{NS_MC, NS_REL};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

fn inline_relationship_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"xmlns:([A-Za-z_][\w.-]*)="{}"\s+([A-Za-z_][\w.-]*):id="#,
            regex::escape(NS_REL)
        ))
        .unwrap()
    })
}

fn first_start_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([A-Za-z_][\w.:-]*)([^>]*?)(/?)>").unwrap())
}

/// Rewrite `xmlns:p="<relationships>" p:id=` into `r:id=`.
pub fn collapse_relationship_prefix(xml: &str) -> Cow<'_, str> {
    inline_relationship_decl().replace_all(xml, |caps: &Captures<'_>| {
        if caps[1] == caps[2] && &caps[1] != "r" {
            "r:id=".to_string()
        } else {
            caps[0].to_string()
        }
    })
}

/// Add each `(prefix, uri)` declaration missing from the root element
/// `root`. Documents with a different root are returned unchanged.
pub fn ensure_root_namespaces<'a>(xml: &'a str, root: &str, namespaces: &[(&str, &str)]) -> Cow<'a, str> {
    let Some(caps) = first_start_tag().captures(xml) else {
        return Cow::Borrowed(xml);
    };
    if &caps[1] != root {
        log::debug!("root element is <{}>, expected <{root}>", &caps[1]);
        return Cow::Borrowed(xml);
    }

    let attrs = &caps[2];
    let missing: String = namespaces
        .iter()
        .filter(|(prefix, _)| !attrs.contains(&format!("xmlns:{prefix}=")))
        .map(|(prefix, uri)| format!(r#" xmlns:{prefix}="{uri}""#))
        .collect();
    if missing.is_empty() {
        return Cow::Borrowed(xml);
    }

    let Some(attrs_end) = caps.get(2).map(|m| m.end()) else {
        return Cow::Borrowed(xml);
    };
    let mut out = String::with_capacity(xml.len() + missing.len());
    out.push_str(&xml[..attrs_end]);
    out.push_str(&missing);
    out.push_str(&xml[attrs_end..]);
    Cow::Owned(out)
}

pub fn normalize_workbook(xml: &str) -> String {
    let collapsed = collapse_relationship_prefix(xml);
    ensure_root_namespaces(&collapsed, "workbook", &[("r", NS_REL)]).into_owned()
}

pub fn normalize_worksheet(xml: &str) -> String {
    let collapsed = collapse_relationship_prefix(xml);
    ensure_root_namespaces(&collapsed, "worksheet", &[("mc", NS_MC), ("r", NS_REL)]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

    #[test]
    fn test_collapse_inline_prefix() {
        let xml = format!(
            r#"<sheets><sheet name="A" sheetId="1" xmlns:relationships="{NS_REL}" relationships:id="rId1"/></sheets>"#
        );
        assert_eq!(
            collapse_relationship_prefix(&xml),
            r#"<sheets><sheet name="A" sheetId="1" r:id="rId1"/></sheets>"#
        );

        // Mismatched prefixes are not a serializer artifact.
        let other = format!(r#"<x xmlns:a="{NS_REL}" b:id="rId1"/>"#);
        assert_eq!(collapse_relationship_prefix(&other), other);
    }

    #[test]
    fn test_workbook_root_gets_r() {
        let xml = format!(
            r#"{DECL}
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets><sheet name="A" sheetId="1" xmlns:relationships="{NS_REL}" relationships:id="rId1"/></sheets></workbook>"#
        );
        let fixed = normalize_workbook(&xml);
        assert!(fixed.contains(&format!(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{NS_REL}">"#
        )));
        assert!(fixed.contains(r#"<sheet name="A" sheetId="1" r:id="rId1"/>"#));
        assert_eq!(normalize_workbook(&fixed), fixed);
    }

    #[test]
    fn test_worksheet_root_gets_mc_and_r() {
        let xml = format!(
            r#"{DECL}
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#
        );
        let fixed = normalize_worksheet(&xml);
        assert!(fixed.contains(&format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:mc="{NS_MC}" xmlns:r="{NS_REL}">"#
        )));
        assert_eq!(normalize_worksheet(&fixed), fixed);
    }

    #[test]
    fn test_self_closing_and_foreign_roots() {
        let empty = "<worksheet/>";
        assert_eq!(
            normalize_worksheet(empty),
            format!(r#"<worksheet xmlns:mc="{NS_MC}" xmlns:r="{NS_REL}"/>"#)
        );

        let foreign = "<chartsheet><sheetPr/></chartsheet>";
        assert_eq!(normalize_worksheet(foreign), foreign);
    }

    #[test]
    fn test_partial_declarations_are_completed() {
        let xml = format!(r#"<worksheet xmlns:r="{NS_REL}"></worksheet>"#);
        assert_eq!(
            normalize_worksheet(&xml),
            format!(r#"<worksheet xmlns:r="{NS_REL}" xmlns:mc="{NS_MC}"></worksheet>"#)
        );
    }
}
