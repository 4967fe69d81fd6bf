//! Consistency checks run on the finished tables.

use crate::error::PipelineError;
use crate::models::{CategoryTable, FieldValue};
use crate::prefix::CategoryLetter;
use crate::xref::{is_sentinel, split_decoration, XrefField};
use indexmap::IndexMap;
use tracing::{info, warn};

/// Keys match identifiers, and no identifier holds whitespace.
///
/// With `letters`, every identifier must also start with one of them.
pub fn check_identifiers(
    table: &CategoryTable,
    letters: Option<&[CategoryLetter]>,
) -> Result<(), PipelineError> {
    for (key, record) in &table.records {
        if *key != record.fgid {
            return Err(PipelineError::DuplicateIdentifier {
                category: table.name.clone(),
                identifier: record.fgid.clone(),
            });
        }
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(PipelineError::InvalidIdentifier {
                category: table.name.clone(),
                identifier: key.clone(),
            });
        }
        if let Some(letters) = letters {
            let first = key.chars().next();
            if !letters.iter().any(|l| Some(l.as_char()) == first) {
                return Err(PipelineError::MissingPrefix {
                    category: table.name.clone(),
                    identifier: key.clone(),
                    allowed: letters.iter().map(|l| l.as_char()).collect(),
                });
            }
        }
    }
    Ok(())
}

/// Every link value must be a key of its target table or an error marker.
///
/// Returns how many markers were found. Fields whose target was not loaded
/// are skipped, as the rewriter leaves them alone.
pub fn check_references(
    table: &CategoryTable,
    fields: &[XrefField],
    tables: &IndexMap<String, CategoryTable>,
) -> Result<usize, PipelineError> {
    let mut markers = 0;
    for xref in fields {
        let Some(target) = tables.get(xref.target) else {
            continue;
        };
        for record in table.records.values() {
            let values: &[String] = match record.get(xref.field) {
                Some(FieldValue::Text(value)) => std::slice::from_ref(value),
                Some(FieldValue::List(values)) => values,
                _ => continue,
            };
            for value in values.iter().filter(|v| !v.is_empty()) {
                if is_sentinel(value) {
                    markers += 1;
                    continue;
                }
                let (id, _) = split_decoration(value);
                if !target.records.contains_key(id) {
                    return Err(PipelineError::UnresolvedReference {
                        category: table.name.clone(),
                        record: record.fgid.clone(),
                        field: xref.field.to_string(),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    if markers > 0 {
        warn!(category = %table.name, markers, "Broken cross references remain in output");
    } else {
        info!(category = %table.name, "Cross references complete");
    }
    Ok(markers)
}
