//! Best-known-name resolution.
//!
//! Identity assignment numbers colliding names in file order, so the bare
//! `Joshua` is simply whichever Joshua came first. This pass gives the bare
//! name to the family member with the most verse references instead:
//! `Joshua, Joshua2, Joshua3` with Joshua2 most referenced becomes
//! `Joshua1, Joshua, Joshua3`.
//!
//! Only the `fgid` inside each record changes. Table keys keep their
//! first-pass values until the rebuilder re-keys the table.

use crate::error::PipelineError;
use crate::models::{CategoryTable, FieldValue, Record};
use crate::stats::PipelineStats;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

static MORE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{1,4}) more\)").unwrap());

/// Where a record's verse-reference count comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popularity {
    /// A free-text reference annotation: `A & B & C` counts 3,
    /// `EST 2:2 <-(3 more)-> EST 6:5` counts 5, anything else counts 1
    Annotation(&'static str),
    /// Combined verse list when present, else the first name variant's list
    NameVerses,
    /// Length of a verse list, else an integer count field
    VerseList {
        list: &'static str,
        count: &'static str,
    },
    /// Every record scores zero, so every family is a tie
    Uniform,
}

/// Count the references described by an annotation; `None` for a `more)`
/// annotation without a readable number
pub fn annotation_count(annotation: &str) -> Option<u64> {
    if annotation.contains('&') {
        Some(annotation.matches('&').count() as u64 + 1)
    } else if annotation.contains("more)") {
        let caps = MORE_COUNT.captures(annotation)?;
        caps[1].parse::<u64>().ok().map(|n| n + 2)
    } else {
        Some(1)
    }
}

impl Popularity {
    pub fn score(self, record: &Record, category: &str) -> Result<u64, PipelineError> {
        match self {
            Popularity::Annotation(field) => {
                let annotation = record.text(field).unwrap_or_default();
                annotation_count(annotation).ok_or_else(|| PipelineError::MalformedField {
                    category: category.to_string(),
                    record: record.fgid.clone(),
                    field: field.to_string(),
                    value: annotation.to_string(),
                })
            }
            Popularity::NameVerses => {
                if let Some(combined) = record.list("combinedIndividualVerseReferences") {
                    return Ok(combined.len() as u64);
                }
                Ok(record
                    .names()
                    .first()
                    .map_or(0, |n| n.verse_references.len() as u64))
            }
            Popularity::VerseList { list, count } => match record.get(list) {
                Some(FieldValue::List(items)) => Ok(items.len() as u64),
                _ => Ok(record
                    .get(count)
                    .and_then(FieldValue::as_int)
                    .map_or(0, |n| n.max(0) as u64)),
            },
            Popularity::Uniform => Ok(0),
        }
    }
}

/// One identifier change made by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub key: String,
    pub from: String,
    pub to: String,
}

/// Decide the renames for one family given `(key, score)` with the base first.
///
/// A unique maximum held by a suffixed member takes the bare name and the base
/// becomes `base1`. A unique maximum already on the base changes nothing. A
/// tie at the maximum demotes the base to `base1` even when the base is among
/// the tied members.
pub fn decide(base: &str, members: &[(String, u64)]) -> Vec<Rename> {
    let Some(max) = members.iter().map(|(_, s)| *s).max() else {
        return Vec::new();
    };
    let num_maxes = members.iter().filter(|(_, s)| *s == max).count();
    let demote_base = Rename {
        key: base.to_string(),
        from: base.to_string(),
        to: format!("{base}1"),
    };

    if num_maxes > 1 {
        return vec![demote_base];
    }
    match members.iter().position(|(_, s)| *s == max) {
        Some(0) | None => Vec::new(),
        Some(ix) => {
            let winner = &members[ix].0;
            vec![
                demote_base,
                Rename {
                    key: winner.clone(),
                    from: winner.clone(),
                    to: base.to_string(),
                },
            ]
        }
    }
}

/// `Name2` where the character before the `2` is not a digit
fn family_base(fgid: &str) -> Option<&str> {
    let stem = fgid.strip_suffix('2')?;
    match stem.chars().last() {
        Some(c) if !c.is_ascii_digit() => Some(stem),
        _ => None,
    }
}

/// Re-rank every disambiguation family in the table by popularity.
///
/// Families are probed as `base2`, `base3`, … until a key is missing; a member
/// at `limit` or beyond is a fatal "family too large".
pub fn resolve_best_known(
    table: &mut CategoryTable,
    popularity: Popularity,
    limit: usize,
    stats: &PipelineStats,
) -> Result<Vec<Rename>, PipelineError> {
    let bases: Vec<String> = table
        .records
        .values()
        .filter_map(|r| family_base(&r.fgid).map(str::to_string))
        .collect();

    let mut renames = Vec::new();
    for base in bases {
        let base_record =
            table
                .records
                .get(&base)
                .ok_or_else(|| PipelineError::MissingFamilyBase {
                    category: table.name.clone(),
                    member: format!("{base}2"),
                    base: base.clone(),
                })?;

        let mut members = vec![(base.clone(), popularity.score(base_record, &table.name)?)];
        for suffix in 2.. {
            let key = format!("{base}{suffix}");
            let Some(record) = table.records.get(&key) else {
                break;
            };
            if suffix >= limit {
                return Err(PipelineError::FamilyTooLarge {
                    category: table.name.clone(),
                    base,
                    limit,
                });
            }
            members.push((key, popularity.score(record, &table.name)?));
        }

        let decided = decide(&base, &members);
        stats.inc_families();
        if decided.len() == 1 {
            stats.inc_ties();
        }
        debug!(
            category = %table.name,
            base = %base,
            scores = ?members.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            renames = decided.len(),
            "Resolved family"
        );

        for rename in decided {
            if let Some(record) = table.records.get_mut(&rename.key) {
                record.fgid.clone_from(&rename.to);
            }
            renames.push(rename);
        }
    }

    stats.add_renamed(renames.len() as u64);
    info!(category = %table.name, renames = renames.len(), "Ensured best known names");
    Ok(renames)
}

/// Drop a trailing family separator (`GEN_1:1~` to `GEN_1:1`) from identifiers that kept it
pub fn trim_family_marker(table: &mut CategoryTable, marker: char) {
    for record in table.records.values_mut() {
        if record.fgid.ends_with(marker) {
            record.fgid.pop();
        }
    }
}
