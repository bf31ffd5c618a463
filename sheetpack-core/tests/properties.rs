use proptest::prelude::*;
use sheetpack_core::drawing::target_width_for_rows;
use sheetpack_core::shared_strings::SharedStringTable;
use sheetpack_core::{CellRef, Document, Drawing, ImageKind, PackConfig, resolve_anchor};
use std::collections::{HashMap, HashSet};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_shared_string_indices_are_dense(values in prop::collection::vec("[a-c ]{0,3}", 0..40)) {
        let mut table = SharedStringTable::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        for value in &values {
            let idx = table.intern(value);
            let expected = *first_seen.entry(value.clone()).or_insert(idx);
            prop_assert_eq!(idx, expected);
            prop_assert!(idx < first_seen.len());
        }

        let entries = table.finalize();
        prop_assert_eq!(entries.len(), first_seen.len());
        for (idx, (value, _)) in entries.iter().enumerate() {
            prop_assert_eq!(first_seen[value], idx);
        }
        let total: usize = entries.iter().map(|(_, n)| n).sum();
        prop_assert_eq!(total, values.len());
    }

    #[test]
    fn prop_row_span_width_is_monotone(
        width in 1u32..4000,
        height in 1u32..4000,
        rows in 1u32..50,
        extra in 0u32..50,
        widths in prop::collection::vec(prop_oneof![Just(0.0f64), 1.0f64..300.0], 0..12),
    ) {
        let base = Drawing::new(vec![0], ImageKind::Png, CellRef::new(0, 0), width, height);
        let short = base.clone().with_row_span(rows);
        let tall = base.with_row_span(rows + extra);
        prop_assert!(target_width_for_rows(&short, rows) <= target_width_for_rows(&tall, rows + extra));

        // The column walk terminates and never moves left as the image grows.
        let a = resolve_anchor(&short, &widths).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let b = resolve_anchor(&tall, &widths).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(a.to.col <= b.to.col);
        prop_assert!(a.to.col as usize <= widths.len());
        prop_assert!(a.to_col_offset >= 0.0);
    }

    #[test]
    fn prop_distinct_sheets_give_one_worksheet_each(names in prop::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,12}[A-Za-z0-9]", 1..6)) {
        let mut seen = HashSet::new();
        let mut doc = Document::new();
        for name in &names {
            let fresh = seen.insert(name.to_lowercase());
            let added = doc.add_sheet(name);
            prop_assert_eq!(added.is_ok(), fresh);
        }

        let parts = doc.to_parts(&PackConfig::default()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let worksheets = parts
            .names()
            .filter(|n| n.starts_with("xl/worksheets/sheet"))
            .count();
        prop_assert_eq!(worksheets, seen.len());
        for ordinal in 1..=seen.len() {
            let name = format!("xl/worksheets/sheet{ordinal}.xml");
            prop_assert!(parts.contains(&name));
        }
    }
}

#[test]
fn test_both_spans_resolve_exactly() {
    let drawing = Drawing::new(vec![0], ImageKind::Gif, CellRef::new(0, 0), 7, 3)
        .with_col_span(2)
        .with_row_span(3);
    let anchor = resolve_anchor(&drawing, &[]).expect("both spans always resolve");
    assert_eq!(anchor.to, CellRef::new(2, 3));
    assert_eq!((anchor.to_col_offset, anchor.to_row_offset), (0.0, 0.0));
}
