use crate::error::PipelineError;
use crate::models::{CategoryTable, Record};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Re-key a table by each record's current identifier, keeping record order.
///
/// A shrinking table means two records now share an identifier.
pub fn rekey(table: &mut CategoryTable) -> Result<(), PipelineError> {
    let before = table.records.len();
    let records = std::mem::take(&mut table.records);
    table.records = records
        .into_values()
        .map(|record| (record.fgid.clone(), record))
        .collect();

    let after = table.records.len();
    if after != before {
        return Err(PipelineError::RekeyCountMismatch {
            category: table.name.clone(),
            before,
            after,
        });
    }
    debug!(category = %table.name, records = after, "Re-keyed table");
    Ok(())
}

/// Union the given tables into one read-only view keyed by identifier.
///
/// Records are borrowed, not copied. The union must hold exactly as many
/// entries as the tables together; prefixes are what keep them apart.
pub fn merge<'a, I>(tables: I) -> Result<IndexMap<&'a str, &'a Record>, PipelineError>
where
    I: IntoIterator<Item = &'a CategoryTable>,
{
    let mut merged = IndexMap::new();
    let mut expected = 0;
    for table in tables {
        expected += table.records.len();
        for (key, record) in &table.records {
            merged.insert(key.as_str(), record);
        }
    }

    if merged.len() != expected {
        return Err(PipelineError::MergeCountMismatch {
            expected,
            actual: merged.len(),
        });
    }
    info!(records = merged.len(), "Merged categories");
    Ok(merged)
}
