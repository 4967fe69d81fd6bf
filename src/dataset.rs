//! Declarative description of a source dataset and its categories.
//!
//! The pipeline is the same for every dataset; what differs is captured
//! here: where each category's name lives, how its identifier is cut out,
//! what counts as popularity, which letter it gets, and which of its fields
//! point at other records.

use crate::config::MAX_FAMILY_SUFFIX;
use crate::error::PipelineError;
use crate::identity::ExtractionRule;
use crate::loader::TableFormat;
use crate::models::{CategoryTable, FieldValue};
use crate::prefix::{CategoryLetter, PrefixRule};
use crate::resolve::Popularity;
use crate::verse::BookScheme;
use crate::xref::XrefField;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// One delimited file per category
    Tables(TableFormat),
    /// A single block-structured proper-names file holding every category
    ProperNames(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub name: &'static str,
    /// Source file, for [`Source::Tables`] datasets
    pub file: &'static str,
    /// Lines to drop before the header row
    pub skip_lines: usize,
    /// Field the identifier is extracted from
    pub id_field: &'static str,
    pub extraction: ExtractionRule,
    pub renames: &'static [(&'static str, &'static str)],
    /// Fields converted to integers; a non-integer is fatal
    pub int_fields: &'static [&'static str],
    /// Comma-separated fields split into lists
    pub list_fields: &'static [&'static str],
    /// `(count field, list field)` pairs that should agree
    pub count_checks: &'static [(&'static str, &'static str)],
    /// Fields whose values must come from a fixed set
    pub closed_sets: &'static [(&'static str, &'static [&'static str])],
    /// Records carry TIPNR-style `names` variants
    pub name_variants: bool,
    /// List fields holding verse references
    pub verse_fields: &'static [&'static str],
    /// `None` skips best-known-name resolution
    pub popularity: Option<Popularity>,
    pub family_limit: usize,
    /// Trailing separator removed from identifiers after resolution
    pub family_marker: Option<char>,
    pub prefix: Option<PrefixRule>,
    /// Field holding the name other records use to refer to this one
    pub name_key: Option<&'static str>,
    pub xrefs: &'static [XrefField],
    /// Included in the `all` union
    pub merged: bool,
}

impl CategorySpec {
    pub const BASE: CategorySpec = CategorySpec {
        name: "",
        file: "",
        skip_lines: 0,
        id_field: "",
        extraction: ExtractionRule::Verbatim,
        renames: &[],
        int_fields: &[],
        list_fields: &[],
        count_checks: &[],
        closed_sets: &[],
        name_variants: false,
        verse_fields: &[],
        popularity: None,
        family_limit: MAX_FAMILY_SUFFIX,
        family_marker: None,
        prefix: None,
        name_key: None,
        xrefs: &[],
        merged: false,
    };

    /// Table layout for this category within a [`Source::Tables`] dataset
    pub fn table_format(&self, base: TableFormat) -> TableFormat {
        TableFormat {
            skip_lines: self.skip_lines,
            ..base
        }
    }

    /// Turn the declared integer and list columns from text into typed values.
    ///
    /// Blank integers become null; anything else that does not parse is fatal.
    /// A count that disagrees with the length of its list is only logged.
    pub fn convert_fields(&self, table: &mut CategoryTable) -> Result<(), PipelineError> {
        for record in table.records.values_mut() {
            for field in self.int_fields {
                let Some(value) = record.fields.get_mut(*field) else {
                    continue;
                };
                let FieldValue::Text(text) = value else {
                    continue;
                };
                let text = text.trim();
                let converted = if text.is_empty() {
                    FieldValue::Null
                } else {
                    let n = text.parse::<i64>().map_err(|_| PipelineError::MalformedField {
                        category: table.name.clone(),
                        record: record.fgid.clone(),
                        field: field.to_string(),
                        value: text.to_string(),
                    })?;
                    FieldValue::Int(n)
                };
                *value = converted;
            }

            for field in self.list_fields {
                let Some(value) = record.fields.get_mut(*field) else {
                    continue;
                };
                let FieldValue::Text(text) = value else {
                    continue;
                };
                let items = split_list(text);
                *value = FieldValue::List(items);
            }

            for (count_field, list_field) in self.count_checks {
                let count = record.get(count_field).and_then(FieldValue::as_int);
                let listed = record.list(list_field).map(<[String]>::len);
                if let (Some(count), Some(listed)) = (count, listed) {
                    if count != listed as i64 {
                        warn!(
                            category = %table.name,
                            record = %record.fgid,
                            field = *count_field,
                            count,
                            listed,
                            "Count disagrees with list length"
                        );
                    }
                }
            }
        }
        debug!(category = %table.name, "Converted typed fields");
        Ok(())
    }
}

/// Comma-separated cell into trimmed, non-empty items
fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub struct Dataset {
    /// Short name used on the command line and in logs
    pub name: &'static str,
    /// Label used in the source-name index file name
    pub index_label: &'static str,
    /// Conventional input folder, probed relative to the working directory
    pub default_input: &'static str,
    pub downloaded: &'static str,
    pub format_version: &'static str,
    /// Every letter a prefixed identifier of this dataset may start with
    pub letters: &'static [CategoryLetter],
    pub verse_scheme: BookScheme,
    pub source: Source,
    pub categories: &'static [CategorySpec],
}

impl Dataset {
    pub fn category(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// `peopleGroups` gives `Peoplegroups`, matching the published file names
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_lowers_the_rest() {
        assert_eq!(title_case("peopleGroups"), "Peoplegroups");
        assert_eq!(title_case("all"), "All");
        assert_eq!(title_case("Easton"), "Easton");
        assert_eq!(title_case(""), "");
    }

    fn table_with(fields: &[(&str, &str)]) -> CategoryTable {
        let mut table = CategoryTable::new("people", vec![]);
        let mut record = crate::models::Record::default();
        record.fgid = "aaron".to_string();
        for (k, v) in fields {
            record.fields.insert(k.to_string(), FieldValue::from(*v));
        }
        table.records.insert("aaron".to_string(), record);
        table
    }

    #[test]
    fn converts_counts_and_lists() {
        let spec = CategorySpec {
            int_fields: &["verseCount", "birthYear"],
            list_fields: &["verses", "siblings"],
            count_checks: &[("verseCount", "verses")],
            ..CategorySpec::BASE
        };
        let mut table = table_with(&[
            ("verseCount", "3"),
            ("birthYear", ""),
            ("verses", "Exod.4.14, Exod.4.27,Num.20.28"),
            ("siblings", ""),
        ]);
        spec.convert_fields(&mut table).unwrap();

        let aaron = &table.records["aaron"];
        assert_eq!(aaron.get("verseCount"), Some(&FieldValue::Int(3)));
        assert_eq!(aaron.get("birthYear"), Some(&FieldValue::Null));
        assert_eq!(aaron.list("verses").unwrap(), ["Exod.4.14", "Exod.4.27", "Num.20.28"]);
        assert_eq!(aaron.list("siblings").unwrap().len(), 0);
    }

    #[test]
    fn non_integer_count_is_fatal() {
        let spec = CategorySpec {
            int_fields: &["Max Speakers"],
            ..CategorySpec::BASE
        };
        let mut table = table_with(&[("Max Speakers", "several")]);
        let err = spec.convert_fields(&mut table).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedField { field, .. } if field == "Max Speakers"));
    }

    #[test]
    fn table_format_keeps_delimiter() {
        let spec = CategorySpec {
            skip_lines: 1,
            ..CategorySpec::BASE
        };
        let format = spec.table_format(TableFormat::TSV);
        assert_eq!(format.delimiter, b'\t');
        assert_eq!(format.skip_lines, 1);
    }
}
