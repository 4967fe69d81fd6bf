use crate::error::PipelineError;
use crate::models::{CategoryTable, FieldValue, Fields, RawTable, Record};
use crate::stats::PipelineStats;
use crate::verse::{convert_book, BookScheme};
use rustc_hash::FxHashMap;
use tracing::info;

/// How the raw candidate identifier is cut out of a record's name-bearing field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Text before the first space or comma, or the whole value with spaces
    /// turned into underscores when that word is a possessive, lower-case,
    /// numeric, or one of the collective nouns `Jews`/`Israelite`.
    FirstWord,
    /// `<BOS book>_<C>:<V>~` from the `B`, `C` and `V` columns; `#` rows become `Comment`
    VerseKey(BookScheme),
    /// Text before `@` (`Aaron@Exo.4.14` gives `Aaron`)
    BeforeAt,
    /// Lookup key with its trailing `_<digits>` removed (`aaron_1` gives `aaron`)
    LookupStem,
    /// `Gen.1.1` gives `Gen_1:1`, `Gen.1` gives `Gen_1`
    OsisRef,
    /// Whole value, spaces turned into underscores
    Underscored,
    Verbatim,
}

const COLLECTIVE_WORDS: [&str; 2] = ["Jews", "Israelite"];

fn first_word(value: &str) -> String {
    let end = value.find([' ', ',']).unwrap_or(value.len());
    let word = &value[..end];
    let whole_value = word.contains('\'')
        || word.chars().next().is_some_and(char::is_lowercase)
        || COLLECTIVE_WORDS.contains(&word)
        || (!word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()));
    if whole_value {
        value.replace(' ', "_")
    } else {
        word.to_string()
    }
}

fn lookup_stem(value: &str) -> &str {
    match value.rsplit_once('_') {
        Some((stem, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => stem,
        _ => value,
    }
}

fn text_field<'a>(
    fields: &'a Fields,
    field: &str,
    category: &str,
    row: usize,
) -> Result<&'a str, PipelineError> {
    match fields.get(field) {
        Some(FieldValue::Text(s)) => Ok(s),
        Some(FieldValue::Null) | None => Err(PipelineError::MissingField {
            category: category.to_string(),
            record: format!("row {row}"),
            field: field.to_string(),
        }),
        Some(other) => Err(PipelineError::MalformedField {
            category: category.to_string(),
            record: format!("row {row}"),
            field: field.to_string(),
            value: format!("{other:?}"),
        }),
    }
}

impl ExtractionRule {
    pub fn candidate(
        self,
        fields: &Fields,
        field: &str,
        category: &str,
        row: usize,
    ) -> Result<String, PipelineError> {
        let value = text_field(fields, field, category, row)?;
        let candidate = match self {
            ExtractionRule::FirstWord => first_word(value),
            ExtractionRule::VerseKey(scheme) => {
                if value.starts_with('#') {
                    "Comment".to_string()
                } else {
                    let code = convert_book(value, scheme, BookScheme::Bos).ok_or_else(|| {
                        PipelineError::UnknownBookCode {
                            code: value.to_string(),
                            reference: format!("row {row}"),
                        }
                    })?;
                    let chapter = text_field(fields, "C", category, row)?;
                    let verse = text_field(fields, "V", category, row)?;
                    format!("{code}_{chapter}:{verse}~")
                }
            }
            ExtractionRule::BeforeAt => value.split('@').next().unwrap_or_default().to_string(),
            ExtractionRule::LookupStem => lookup_stem(value).to_string(),
            ExtractionRule::OsisRef => value.replacen('.', "_", 1).replacen('.', ":", 1),
            ExtractionRule::Underscored => value.replace(' ', "_"),
            ExtractionRule::Verbatim => value.to_string(),
        };
        Ok(candidate)
    }
}

fn rename_fields(fields: Fields, renames: &[(&str, &str)]) -> Fields {
    if renames.is_empty() {
        return fields;
    }
    fields
        .into_iter()
        .map(|(k, v)| match renames.iter().find(|(from, _)| *from == k) {
            Some((_, to)) => (to.to_string(), v),
            None => (k, v),
        })
        .collect()
}

/// Give every raw row a unique identifier, numbering collisions in first-seen order.
///
/// The first record with a given candidate keeps it bare; the n-th gets suffix n
/// (`Fred`, `Fred2`, `Fred3`). Columns listed in `renames` are renamed on the way
/// through and `FGid` is prepended to the column headers.
pub fn assign_identities(
    raw: RawTable,
    field: &str,
    rule: ExtractionRule,
    renames: &[(&str, &str)],
    stats: &PipelineStats,
) -> Result<CategoryTable, PipelineError> {
    let mut headers = Vec::with_capacity(raw.column_headers.len() + 1);
    headers.push("FGid".to_string());
    headers.extend(raw.column_headers.iter().map(|h| {
        renames
            .iter()
            .find(|(from, _)| from == h)
            .map_or_else(|| h.clone(), |(_, to)| to.to_string())
    }));

    let mut table = CategoryTable::new(raw.name.clone(), headers);
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut max_suffix = 0;
    let mut max_name = String::new();

    for (row, fields) in raw.rows.into_iter().enumerate() {
        let candidate = rule.candidate(&fields, field, &raw.name, row)?;
        if candidate.is_empty() {
            return Err(PipelineError::EmptyIdentifier {
                category: raw.name.clone(),
                row,
            });
        }
        if candidate.chars().any(char::is_whitespace) {
            return Err(PipelineError::InvalidIdentifier {
                category: raw.name.clone(),
                identifier: candidate,
            });
        }

        let count = seen.entry(candidate.clone()).or_insert(0);
        *count += 1;
        let fgid = if *count > 1 {
            stats.inc_disambiguated();
            if *count > max_suffix {
                max_suffix = *count;
                max_name.clone_from(&candidate);
            }
            format!("{candidate}{count}")
        } else {
            candidate
        };

        if table.records.contains_key(&fgid) {
            return Err(PipelineError::DuplicateIdentifier {
                category: raw.name.clone(),
                identifier: fgid,
            });
        }
        let record = Record::new(fgid.clone(), rename_fields(fields, renames));
        table.records.insert(fgid, record);
    }

    stats.add_identified(table.len() as u64);
    info!(
        category = %table.name,
        records = table.len(),
        max_suffix,
        max_name = %max_name,
        "Assigned identifiers"
    );
    Ok(table)
}
