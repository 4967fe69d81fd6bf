//! Cross-reference rewriting.
//!
//! Link fields arrive in the source dataset's own naming (`Amram@Exo.6.18`,
//! `amram_1`). After every category has its final identifiers, each link is
//! looked up in the target category's [`NameIndex`] and replaced. A miss is
//! replaced by a visible `<<<ERROR_name_>>>` marker so broken links survive
//! into the output instead of disappearing.

use crate::config::{ERROR_SENTINEL_PREFIX, ERROR_SENTINEL_SUFFIX, XREF_DECORATIONS};
use crate::index::NameIndex;
use crate::models::{CategoryTable, FieldValue};
use crate::stats::PipelineStats;
use rustc_hash::FxHashMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    List,
}

/// A field of one category that names records of `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefField {
    pub field: &'static str,
    pub target: &'static str,
    pub arity: Arity,
}

impl XrefField {
    pub const fn single(field: &'static str, target: &'static str) -> Self {
        Self {
            field,
            target,
            arity: Arity::Single,
        }
    }

    pub const fn list(field: &'static str, target: &'static str) -> Self {
        Self {
            field,
            target,
            arity: Arity::List,
        }
    }
}

pub fn sentinel(name: &str) -> String {
    format!("{ERROR_SENTINEL_PREFIX}{name}{ERROR_SENTINEL_SUFFIX}")
}

pub fn is_sentinel(value: &str) -> bool {
    value.starts_with(ERROR_SENTINEL_PREFIX) && value.ends_with(ERROR_SENTINEL_SUFFIX)
}

/// Split `Fred@Gen.1.1(d?)` into `("Fred@Gen.1.1", "(d?)")`
pub fn split_decoration(value: &str) -> (&str, &str) {
    for decoration in XREF_DECORATIONS {
        if let Some(name) = value.strip_suffix(decoration) {
            return (name, &value[name.len()..]);
        }
    }
    (value, "")
}

/// Resolve one link value; `Err` carries the sentinel that replaces it
fn resolve_value(value: &str, index: &NameIndex) -> Result<String, String> {
    let (name, decoration) = split_decoration(value);
    match index.resolve(name) {
        Some(id) => Ok(format!("{id}{decoration}")),
        None => Err(sentinel(value)),
    }
}

/// Rewrite the declared link fields of `table` in place.
///
/// `indexes` maps category name to its index. A field whose target category
/// was not loaded is left untouched. Returns the number of broken links.
pub fn rewrite_references(
    table: &mut CategoryTable,
    fields: &[XrefField],
    indexes: &FxHashMap<String, NameIndex>,
    stats: &PipelineStats,
) -> usize {
    let mut rewritten = 0usize;
    let mut broken = 0usize;

    for xref in fields {
        let Some(index) = indexes.get(xref.target) else {
            warn!(
                category = %table.name,
                field = xref.field,
                target = xref.target,
                "Target category not loaded; leaving links as they are"
            );
            continue;
        };

        for record in table.records.values_mut() {
            let owner = record.fgid.clone();
            let Some(value) = record.fields.get_mut(xref.field) else {
                continue;
            };
            let mut rewrite = |name: &mut String| {
                if name.is_empty() {
                    return;
                }
                match resolve_value(name, index) {
                    Ok(id) => {
                        stats.inc_links();
                        rewritten += 1;
                        *name = id;
                    }
                    Err(marker) => {
                        stats.inc_broken_links();
                        broken += 1;
                        error!(
                            record = %owner,
                            field = xref.field,
                            target = xref.target,
                            name = %name,
                            "Unable to resolve cross reference"
                        );
                        *name = marker;
                    }
                }
            };
            match value {
                FieldValue::Text(name) => rewrite(name),
                FieldValue::List(names) => names.iter_mut().for_each(rewrite),
                _ => {}
            }
        }
    }

    info!(category = %table.name, rewritten, broken, "Rewrote cross references");
    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fields, Record};

    fn people() -> CategoryTable {
        let mut table = CategoryTable::new("people", vec![]);
        let rows = [
            ("Amram", "PAmram", "Amram@Exo.6.18", FieldValue::Null, FieldValue::Null),
            (
                "Aaron",
                "PAaron",
                "Aaron@Exo.4.14",
                FieldValue::from("Amram@Exo.6.18(d)"),
                FieldValue::List(vec!["Moses@Exo.2.10".into(), "Miriam@Exo.15.20(?)".into()]),
            ),
            ("Moses", "PMoses", "Moses@Exo.2.10", FieldValue::from("Nobody@Gen.1.1"), FieldValue::Null),
        ];
        for (key, fgid, name, father, siblings) in rows {
            let mut fields = Fields::new();
            fields.insert("unifiedNameTIPNR".to_string(), name.into());
            fields.insert("father".to_string(), father);
            fields.insert("siblings".to_string(), siblings);
            table.records.insert(key.to_string(), Record::new(fgid, fields));
        }
        table
    }

    const FIELDS: [XrefField; 2] = [
        XrefField::single("father", "people"),
        XrefField::list("siblings", "people"),
    ];

    #[test]
    fn decorations() {
        assert_eq!(split_decoration("Fred@Gen.1.1(d?)"), ("Fred@Gen.1.1", "(d?)"));
        assert_eq!(split_decoration("Fred@Gen.1.1(?)"), ("Fred@Gen.1.1", "(?)"));
        assert_eq!(split_decoration("Fred@Gen.1.1(d)"), ("Fred@Gen.1.1", "(d)"));
        assert_eq!(split_decoration("Fred@Gen.1.1"), ("Fred@Gen.1.1", ""));
    }

    #[test]
    fn sentinel_shape() {
        assert_eq!(sentinel("Nobody"), "<<<ERROR_Nobody_>>>");
        assert!(is_sentinel("<<<ERROR_Nobody_>>>"));
        assert!(!is_sentinel("PNobody"));
    }

    #[test]
    fn rewrites_single_and_list_fields() {
        let mut table = people();
        let mut indexes = FxHashMap::default();
        indexes.insert("people".to_string(), NameIndex::build(&table, "unifiedNameTIPNR"));
        let stats = PipelineStats::new();

        let broken = rewrite_references(&mut table, &FIELDS, &indexes, &stats);

        let aaron = &table.records["Aaron"];
        assert_eq!(aaron.text("father"), Some("PAmram(d)"));
        assert_eq!(
            aaron.list("siblings").unwrap(),
            ["PMoses".to_string(), "<<<ERROR_Miriam@Exo.15.20(?)_>>>".to_string()]
        );
        assert_eq!(
            table.records["Moses"].text("father"),
            Some("<<<ERROR_Nobody@Gen.1.1_>>>")
        );
        assert_eq!(table.records["Amram"].get("father"), Some(&FieldValue::Null));
        assert_eq!(broken, 2);
        assert_eq!(stats.links(), 2);
        assert_eq!(stats.broken_links(), 2);
    }

    #[test]
    fn unloaded_target_is_skipped() {
        let mut table = people();
        let indexes = FxHashMap::default();
        let broken = rewrite_references(
            &mut table,
            &[XrefField::single("father", "places")],
            &indexes,
            &PipelineStats::new(),
        );
        assert_eq!(broken, 0);
        assert_eq!(table.records["Aaron"].text("father"), Some("Amram@Exo.6.18(d)"));
    }
}
