use crate::models::{FieldValue, Fields, NameVariant, RawTable};
use crate::stats::PipelineStats;
use tracing::{info, warn};

/// Trim and collapse doubled spaces; true when the text changed
pub fn clean_text(text: &mut String) -> bool {
    let mut cleaned = text.trim().to_string();
    while cleaned.contains("  ") {
        cleaned = cleaned.replace("  ", " ");
    }
    if cleaned != *text {
        *text = cleaned;
        true
    } else {
        false
    }
}

fn clean_one(text: &mut String, table: &str, field: &str, stats: &PipelineStats) {
    let before = text.contains("  ").then(|| text.clone());
    if clean_text(text) {
        stats.inc_cleaned();
        if let Some(original) = before {
            warn!(table, field, value = %original, "Collapsed doubled space");
        }
    }
}

fn clean_variant(variant: &mut NameVariant, table: &str, stats: &PipelineStats) {
    for text in [
        variant.significance.as_mut(),
        variant.unique_name.as_mut(),
        variant.step_bible_first_link.as_mut(),
    ]
    .into_iter()
    .flatten()
    {
        clean_one(text, table, "names", stats);
    }
    if let Some(translations) = variant.translations.as_mut() {
        for text in translations.values_mut() {
            clean_one(text, table, "translations", stats);
        }
    }
}

pub fn clean_fields(fields: &mut Fields, table: &str, stats: &PipelineStats) {
    for (field, value) in fields.iter_mut() {
        match value {
            FieldValue::Text(text) => clean_one(text, table, field, stats),
            FieldValue::List(items) => {
                for item in items.iter_mut() {
                    clean_one(item, table, field, stats);
                }
            }
            FieldValue::Names(names) => {
                for variant in names.iter_mut() {
                    clean_variant(variant, table, stats);
                }
            }
            FieldValue::Null | FieldValue::Int(_) => {}
        }
    }
}

/// Clean every row and flag values of `closed` fields outside their allowed set
pub fn clean_table(table: &mut RawTable, closed: &[(&str, &[&str])], stats: &PipelineStats) {
    let before = stats.cleaned();
    for (row, fields) in table.rows.iter_mut().enumerate() {
        clean_fields(fields, &table.name, stats);
        for (field, allowed) in closed {
            if let Some(value) = fields.get(*field).and_then(FieldValue::as_text) {
                if !allowed.contains(&value) {
                    warn!(table = %table.name, row, field, value, "Unexpected value for closed field");
                }
            }
        }
    }
    info!(
        table = %table.name,
        cleaned = stats.cleaned() - before,
        "Cleaned table"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses() {
        let mut s = "  Hanochite  clan ".to_string();
        assert!(clean_text(&mut s));
        assert_eq!(s, "Hanochite clan");

        let mut s = "a   b".to_string();
        assert!(clean_text(&mut s));
        assert_eq!(s, "a b");

        let mut s = "fine".to_string();
        assert!(!clean_text(&mut s));
    }

    #[test]
    fn cleans_text_lists_and_variants() {
        let stats = PipelineStats::new();
        let mut fields = Fields::new();
        fields.insert("Gender".to_string(), " Male".into());
        fields.insert(
            "siblings".to_string(),
            FieldValue::List(vec!["Moses ".into(), "Miriam".into()]),
        );
        fields.insert(
            "names".to_string(),
            FieldValue::Names(vec![NameVariant {
                significance: Some("- Named  ".into()),
                ..Default::default()
            }]),
        );
        clean_fields(&mut fields, "people", &stats);

        assert_eq!(fields["Gender"], FieldValue::from("Male"));
        assert_eq!(fields["siblings"].as_list().unwrap()[0], "Moses");
        match &fields["names"] {
            FieldValue::Names(n) => assert_eq!(n[0].significance.as_deref(), Some("- Named")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stats.cleaned(), 3);
    }
}
