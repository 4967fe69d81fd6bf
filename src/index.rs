use crate::models::CategoryTable;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Source-dataset name to final identifier, for one category
pub struct NameIndex {
    name_to_id: FxHashMap<String, String>,
}

impl NameIndex {
    /// Index every record by the text of `key_field`.
    ///
    /// Records without the field are skipped. A repeated name keeps its first
    /// identifier so lookups stay deterministic.
    pub fn build(table: &CategoryTable, key_field: &str) -> Self {
        let mut name_to_id =
            FxHashMap::with_capacity_and_hasher(table.len(), Default::default());

        for record in table.records.values() {
            let Some(name) = record.text(key_field).filter(|n| !n.is_empty()) else {
                debug!(category = %table.name, id = %record.fgid, field = key_field, "No name to index");
                continue;
            };
            if let Some(existing) = name_to_id.get(name) {
                warn!(
                    category = %table.name,
                    name,
                    kept = %existing,
                    ignored = %record.fgid,
                    "Name is not unique; keeping first identifier"
                );
                continue;
            }
            name_to_id.insert(name.to_string(), record.fgid.clone());
        }

        info!(category = %table.name, names = name_to_id.len(), "Name index built");
        Self { name_to_id }
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, Fields, Record};

    fn make_table(entries: Vec<(&str, &str)>) -> CategoryTable {
        let mut table = CategoryTable::new("people", vec![]);
        for (key, fgid) in entries {
            let mut fields = Fields::new();
            fields.insert("unifiedNameTIPNR".to_string(), FieldValue::from(key));
            table.records.insert(key.to_string(), Record::new(fgid, fields));
        }
        table
    }

    #[test]
    fn resolve_source_names() {
        let index = NameIndex::build(
            &make_table(vec![("Aaron@Exo.4.14", "PAaron"), ("Amram@Exo.6.18", "PAmram")]),
            "unifiedNameTIPNR",
        );
        assert_eq!(index.resolve("Aaron@Exo.4.14"), Some("PAaron"));
        assert_eq!(index.resolve("Amram@Exo.6.18"), Some("PAmram"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn resolve_missing() {
        let index = NameIndex::build(&make_table(vec![("Aaron@Exo.4.14", "PAaron")]), "unifiedNameTIPNR");
        assert_eq!(index.resolve("Moses@Exo.2.10"), None);
    }

    #[test]
    fn duplicate_name_keeps_first() {
        let mut table = make_table(vec![("Fred@Gen.1.1", "PFred")]);
        let mut fields = Fields::new();
        fields.insert("unifiedNameTIPNR".to_string(), FieldValue::from("Fred@Gen.1.1"));
        table.records.insert("Fred2".to_string(), Record::new("PFred2", fields));

        let index = NameIndex::build(&table, "unifiedNameTIPNR");
        assert_eq!(index.resolve("Fred@Gen.1.1"), Some("PFred"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_table() {
        let index = NameIndex::build(&CategoryTable::new("people", vec![]), "unifiedNameTIPNR");
        assert!(index.is_empty());
    }
}
