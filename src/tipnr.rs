//! Shaping of TIPNR proper-name blocks into records.
//!
//! Each block's cells are first put into a named checklist. Shaping takes
//! cells out of the checklist as it uses them; anything still there at the
//! end is a fatal [`PipelineError::LeftoverFields`], so a new column in the
//! source cannot be silently ignored.

use crate::config::{TIPNR_DOWNLOADED, TIPNR_FILE, TIPNR_FORMAT_VERSION, TIPNR_INPUT_FOLDER};
use crate::dataset::{CategorySpec, Dataset, Source};
use crate::error::PipelineError;
use crate::identity::ExtractionRule;
use crate::models::{CategoryTable, FieldValue, Fields, NameVariant, OneOrMany, RawTable};
use crate::parser::{BlockKind, ProperNamesFile, RawBlock};
use crate::prefix::{CategoryLetter, PrefixRule};
use crate::resolve::Popularity;
use crate::stats::PipelineStats;
use crate::translations::parse_translations;
use crate::verse::BookScheme;
use crate::xref::XrefField;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{error, info, warn};

const PERSON_COLUMNS: [&str; 8] = [
    "UnifiedName",
    "Description",
    "Parents",
    "Siblings",
    "Partners",
    "Offspring",
    "Tribe/Nation",
    "SummaryDescription",
];
const PLACE_COLUMNS: [&str; 8] = [
    "UnifiedName",
    "OpenBibleName",
    "Founder",
    "People",
    "GoogleMapsURL",
    "PalopenMapsURL",
    "GeographicalArea",
    "Comment",
];
const OTHER_COLUMNS: [&str; 2] = ["UnifiedName", "Description"];
const NAME_COLUMNS: [&str; 6] = [
    "Significance",
    "UniqueName",
    "Strongs",
    "Translations",
    "STEPBibleFirstLink",
    "AllRefs",
];

/// Cell value meaning "nothing here"
const NO_VALUE: &str = ">";

pub const UNIFIED_NAME: &str = "unifiedNameTIPNR";
pub const COMBINED_REFERENCES: &str = "combinedIndividualVerseReferences";

const PEOPLE_LINKS: &[XrefField] = &[
    XrefField::single("father", "people"),
    XrefField::single("mother", "people"),
    XrefField::list("siblings", "people"),
    XrefField::list("partners", "people"),
    XrefField::list("offspring", "people"),
];

const PROPER_NAMES: CategorySpec = CategorySpec {
    id_field: UNIFIED_NAME,
    extraction: ExtractionRule::BeforeAt,
    name_variants: true,
    verse_fields: &[COMBINED_REFERENCES],
    popularity: Some(Popularity::NameVerses),
    name_key: Some(UNIFIED_NAME),
    merged: true,
    ..CategorySpec::BASE
};

/// Tyndale Individualised Proper Names with all References
pub static TIPNR: Dataset = Dataset {
    name: "tipnr",
    index_label: "TIPNR",
    default_input: TIPNR_INPUT_FOLDER,
    downloaded: TIPNR_DOWNLOADED,
    format_version: TIPNR_FORMAT_VERSION,
    letters: &[
        CategoryLetter::Person,
        CategoryLetter::Location,
        CategoryLetter::Deity,
    ],
    verse_scheme: BookScheme::TitleCase,
    source: Source::ProperNames(TIPNR_FILE),
    categories: &[
        CategorySpec {
            name: "people",
            prefix: Some(PrefixRule::Static(CategoryLetter::Person)),
            xrefs: PEOPLE_LINKS,
            ..PROPER_NAMES
        },
        CategorySpec {
            name: "places",
            prefix: Some(PrefixRule::Static(CategoryLetter::Location)),
            ..PROPER_NAMES
        },
        CategorySpec {
            name: "others",
            prefix: Some(PrefixRule::Static(CategoryLetter::Deity)),
            ..PROPER_NAMES
        },
    ],
};

type Checklist = IndexMap<&'static str, String>;

fn checklist(columns: &[&'static str], cells: &[String], owner: &str, kind: &str) -> Checklist {
    let (used, unused) = cells.split_at(columns.len().min(cells.len()));
    for (n, lost) in unused.iter().enumerate().filter(|(_, c)| !c.is_empty()) {
        error!(
            owner,
            kind,
            column = columns.len() + n,
            value = %lost,
            "Losing data from an unused column"
        );
    }
    columns.iter().copied().zip(used.iter().cloned()).collect()
}

/// Remove a cell from the checklist, `None` when empty or `>`
fn take(list: &mut Checklist, column: &str) -> Option<String> {
    list.shift_remove(column)
        .filter(|v| !v.is_empty() && v != NO_VALUE)
}

fn ensure_consumed(list: Checklist, category: &str, record: &str) -> Result<(), PipelineError> {
    if list.is_empty() {
        return Ok(());
    }
    Err(PipelineError::LeftoverFields {
        category: category.to_string(),
        record: record.to_string(),
        fields: list.into_keys().map(str::to_string).collect(),
    })
}

/// `d«e=word` Strong's parts for one name variant
#[derive(Debug, Default, PartialEq)]
pub struct Strongs {
    pub d: Option<OneOrMany>,
    pub e: Option<OneOrMany>,
    pub word: Option<OneOrMany>,
}

fn word_parts(part: &str) -> Option<(String, String, String)> {
    match part.split_once('«') {
        Some((d, rest)) => {
            let (e, word) = rest.split_once('=')?;
            Some((d.to_string(), e.to_string(), word.to_string()))
        }
        None => {
            let (e, word) = part.split_once('=')?;
            Some((e.to_string(), e.to_string(), word.to_string()))
        }
    }
}

/// Split a Strong's cell.
///
/// `H0175«H0175=אַהֲרֹן` is the usual single word. Compound names join words
/// with `+` and give parallel lists. A cell without `«` is `d=word`.
pub fn split_strongs(raw: &str) -> Option<Strongs> {
    if raw == "G1673«G1673=Ἑλληνικός=Ἑλληνικός" {
        return Some(Strongs {
            d: Some(OneOrMany::One("G1673".into())),
            e: Some(OneOrMany::One("G1673".into())),
            word: Some(OneOrMany::One("Ἑλληνικός".into())),
        });
    }
    let raw = raw.strip_suffix('+').unwrap_or(raw);

    if raw.contains('+') {
        let (mut d, mut e, mut word) = (Vec::new(), Vec::new(), Vec::new());
        for part in raw.split('+') {
            let (pd, pe, pw) = word_parts(part)?;
            d.push(pd);
            e.push(pe);
            word.push(pw);
        }
        return Some(Strongs {
            d: Some(OneOrMany::Many(d)),
            e: Some(OneOrMany::Many(e)),
            word: Some(OneOrMany::Many(word)),
        });
    }

    if raw.contains('«') {
        let (d, e, word) = word_parts(raw)?;
        return Some(Strongs {
            d: Some(OneOrMany::One(d)),
            e: Some(OneOrMany::One(e)),
            word: Some(OneOrMany::One(word)),
        });
    }

    let mut bits = raw.split('=');
    let d = bits.next().filter(|b| !b.is_empty());
    let word = bits.next()?;
    Some(Strongs {
        d: d.map(|b| OneOrMany::One(b.to_string())),
        e: None,
        word: (!word.is_empty()).then(|| OneOrMany::One(word.to_string())),
    })
}

/// Tidy a `;`-separated reference list into individual references
pub fn split_refs(refs: &str) -> Vec<String> {
    let tidied = refs
        .trim_end_matches(';')
        .replace(' ', "")
        .replace("Eze", "Ezk")
        .replace("Gen.1:1", "Gen.1.1")
        .replace(";Etc.00", "")
        .replace(";Etc.0.0", "");
    if tidied.is_empty() {
        return Vec::new();
    }
    tidied.split(';').map(str::to_string).collect()
}

/// `(father, mother)` from a parents cell
fn split_parents(
    parents: &str,
    category: &str,
    owner: &str,
) -> Result<(Option<String>, Option<String>), PipelineError> {
    if parents == "=+" {
        return Ok((None, None));
    }
    if let Some((father, mother)) = parents.split_once(" + ") {
        return Ok((Some(father.to_string()), Some(mother.to_string())));
    }
    if let Some(mother) = parents.strip_prefix("=+ ") {
        return Ok((None, Some(mother.to_string())));
    }
    if let Some(father) = parents.strip_suffix(" +") {
        return Ok((Some(father.to_string()), None));
    }
    if parents == "#ERROR!" {
        error!(owner, "Ignoring spreadsheet error in parents");
        return Ok((None, None));
    }
    Err(PipelineError::MalformedField {
        category: category.to_string(),
        record: owner.to_string(),
        field: "Parents".to_string(),
        value: parents.to_string(),
    })
}

fn split_list(value: &str) -> FieldValue {
    FieldValue::List(value.split(", ").map(str::to_string).collect())
}

fn shape_name(
    cells: &[String],
    category: &str,
    owner: &str,
    stats: &PipelineStats,
) -> Result<Option<NameVariant>, PipelineError> {
    let mut list = checklist(&NAME_COLUMNS, cells, owner, "name");
    let mut variant = NameVariant {
        significance: take(&mut list, "Significance"),
        unique_name: take(&mut list, "UniqueName"),
        ..Default::default()
    };

    if let Some(raw) = take(&mut list, "Strongs") {
        let strongs = split_strongs(&raw).ok_or_else(|| PipelineError::MalformedField {
            category: category.to_string(),
            record: owner.to_string(),
            field: "Strongs".to_string(),
            value: raw.clone(),
        })?;
        variant.d_strongs = strongs.d;
        variant.e_strongs = strongs.e;
        variant.source_word = strongs.word;
    }

    if let Some(raw) = list.shift_remove("Translations") {
        variant.translations = match parse_translations(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(owner, error = %e, "Keeping translation annotation unparsed");
                stats.inc_translation_fallbacks();
                Some(IndexMap::from([("raw".to_string(), raw)]))
            }
        };
    }

    variant.step_bible_first_link = take(&mut list, "STEPBibleFirstLink");
    if let Some(refs) = take(&mut list, "AllRefs") {
        variant.verse_references = split_refs(&refs);
    }
    ensure_consumed(list, category, owner)?;

    Ok((variant != NameVariant::default()).then_some(variant))
}

/// Shape one block into the ordered fields of a raw record
pub fn shape_block(
    block: &RawBlock,
    category: &str,
    stats: &PipelineStats,
) -> Result<Fields, PipelineError> {
    let owner = block.header[0].clone();
    let columns: &[&'static str] = match block.kind {
        BlockKind::Person => &PERSON_COLUMNS,
        BlockKind::Place => &PLACE_COLUMNS,
        BlockKind::Other => &OTHER_COLUMNS,
    };
    let mut list = checklist(columns, &block.header, &owner, category);
    let mut fields = Fields::new();

    let unified = list.shift_remove("UnifiedName").unwrap_or_default();
    let (unified_name, u_strongs) = match unified.split_once('=') {
        Some((name, strongs)) => (name.to_string(), Some(strongs.to_string())),
        None if block.kind == BlockKind::Other => (unified.clone(), None),
        None => {
            return Err(PipelineError::MalformedField {
                category: category.to_string(),
                record: owner,
                field: "UnifiedName".to_string(),
                value: unified,
            })
        }
    };
    let name = unified_name.split('@').next().unwrap_or_default().to_string();
    fields.insert("name".to_string(), name.into());
    fields.insert(UNIFIED_NAME.to_string(), unified_name.into());
    if let Some(strongs) = u_strongs {
        fields.insert("uStrongs".to_string(), strongs.into());
    }

    match block.kind {
        BlockKind::Person => {
            if let Some(v) = take(&mut list, "Description") {
                fields.insert("description".to_string(), v.into());
            }
            if let Some(v) = take(&mut list, "SummaryDescription") {
                let v = v.strip_prefix('#').map(str::to_string).unwrap_or(v);
                fields.insert("summaryDescription".to_string(), v.into());
            }
            if let Some(parents) = take(&mut list, "Parents") {
                let (father, mother) = split_parents(&parents, category, &owner)?;
                if let Some(father) = father {
                    fields.insert("father".to_string(), father.into());
                }
                if let Some(mother) = mother {
                    fields.insert("mother".to_string(), mother.into());
                }
            }
            for (column, field) in [
                ("Siblings", "siblings"),
                ("Partners", "partners"),
                ("Offspring", "offspring"),
            ] {
                if let Some(v) = take(&mut list, column) {
                    fields.insert(field.to_string(), split_list(&v));
                }
            }
            if let Some(v) = take(&mut list, "Tribe/Nation") {
                fields.insert("tribe/nation".to_string(), v.into());
            }
        }
        BlockKind::Place => {
            for (column, field) in [
                ("OpenBibleName", "OpenBibleName"),
                ("Founder", "founder"),
                ("People", "people"),
                ("GoogleMapsURL", "GoogleMapsURL"),
                ("PalopenMapsURL", "PalopenMapsURL"),
                ("GeographicalArea", "geographicalArea"),
            ] {
                if let Some(v) = take(&mut list, column) {
                    fields.insert(field.to_string(), v.into());
                }
            }
            if let Some(v) = take(&mut list, "Comment") {
                match v.strip_prefix('#') {
                    Some(comment) => {
                        fields.insert("comment".to_string(), comment.into());
                    }
                    None => error!(owner = %owner, value = %v, "Losing place column without comment marker"),
                }
            }
        }
        BlockKind::Other => {
            if let Some(v) = take(&mut list, "Description") {
                fields.insert("description".to_string(), v.into());
            }
        }
    }
    ensure_consumed(list, category, &owner)?;

    let mut names = Vec::with_capacity(block.names.len());
    for cells in &block.names {
        if let Some(variant) = shape_name(cells, category, &owner, stats)? {
            names.push(variant);
        }
    }
    fields.insert("names".to_string(), FieldValue::Names(names));
    Ok(fields)
}

/// Category name for each block kind
pub fn category_of(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Person => "people",
        BlockKind::Place => "places",
        BlockKind::Other => "others",
    }
}

/// Shape every block into one raw table per kind.
///
/// A record repeating an earlier unified name is dropped, since it would make
/// the name index ambiguous.
pub fn shape_file(file: &ProperNamesFile, stats: &PipelineStats) -> Result<Vec<RawTable>, PipelineError> {
    let mut tables: Vec<RawTable> = [BlockKind::Person, BlockKind::Place, BlockKind::Other]
        .into_iter()
        .map(|kind| RawTable {
            name: category_of(kind).to_string(),
            ..Default::default()
        })
        .collect();
    let mut seen: FxHashSet<(BlockKind, String)> = FxHashSet::default();

    for block in &file.blocks {
        let category = category_of(block.kind);
        let fields = shape_block(block, category, stats)?;
        let unified = fields
            .get(UNIFIED_NAME)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string();
        if !seen.insert((block.kind, unified.clone())) {
            error!(category, unified_name = %unified, line = block.line, "Dropping duplicate record");
            stats.inc_dropped();
            continue;
        }
        let table = match block.kind {
            BlockKind::Person => &mut tables[0],
            BlockKind::Place => &mut tables[1],
            BlockKind::Other => &mut tables[2],
        };
        table.rows.push(fields);
    }

    for table in &tables {
        stats.add_rows(table.rows.len() as u64);
        info!(category = %table.name, records = table.rows.len(), "Shaped proper names");
    }
    Ok(tables)
}

fn normalise_significance(significance: &str) -> Option<&'static str> {
    Some(match significance {
        "- Named" | "- Name" => "named",
        "- Name Combined" => "name combined",
        "- Mentioned" => "mentioned",
        "- Spelled" | "- Spelling" => "spelled",
        "- Spelled Combined" => "spelled combined",
        "- Form" => "form",
        "- Group" => "group",
        "- (same as previous)" => "(same as previous)",
        "- Aramaic" => "Aramaic",
        "- Aramaic+Combined" => "Aramaic combined",
        "- Greek" | "Greek" => "Greek",
        _ => return None,
    })
}

/// Normalise significance labels and build combined verse lists for multi-name records
pub fn normalise_names(table: &mut CategoryTable) {
    let mut combined = 0usize;
    for record in table.records.values_mut() {
        let Some(FieldValue::Names(names)) = record.fields.get_mut("names") else {
            continue;
        };
        for variant in names.iter_mut() {
            let Some(significance) = variant.significance.as_mut() else {
                continue;
            };
            match normalise_significance(significance) {
                Some(normal) => *significance = normal.to_string(),
                None => warn!(
                    category = %table.name,
                    record = %record.fgid,
                    significance = %significance,
                    "Unknown significance"
                ),
            }
        }

        if names.len() > 1 {
            let all: Vec<String> = names
                .iter()
                .flat_map(|n| n.verse_references.iter().cloned())
                .collect();
            record
                .fields
                .insert(COMBINED_REFERENCES.to_string(), FieldValue::List(all));
            combined += 1;
        }
    }
    info!(category = %table.name, combined, "Normalised name variants");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIPNR_COLUMNS;
    use crate::models::Record;

    fn cells(values: &[&str]) -> Vec<String> {
        let mut all: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        all.resize(TIPNR_COLUMNS, String::new());
        all
    }

    fn person(header: &[&str], names: &[&[&str]]) -> RawBlock {
        RawBlock {
            kind: BlockKind::Person,
            line: 1,
            header: cells(header),
            names: names.iter().map(|n| cells(n)).collect(),
        }
    }

    #[test]
    fn shapes_person_fields_in_order() {
        let block = person(
            &[
                "Aaron@Exo.4.14=H0175",
                "brother of Moses",
                "Amram@Exo.6.18 + Jochebed@Exo.6.20",
                "Moses@Exo.2.10, Miriam@Exo.15.20",
                "Elisheba@Exo.6.23",
                "",
                ">",
                "#Aaron was the first high priest",
            ],
            &[&[
                "- Named",
                "Aaron@Exo.4.14",
                "H0175«H0175=אַהֲרֹן",
                "Aaron",
                "Exo.4.14",
                "Exo.4.14; Exo.4.27;",
            ]],
        );
        let fields = shape_block(&block, "people", &PipelineStats::new()).unwrap();
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "unifiedNameTIPNR",
                "uStrongs",
                "description",
                "summaryDescription",
                "father",
                "mother",
                "siblings",
                "partners",
                "names"
            ]
        );
        assert_eq!(fields["name"], FieldValue::from("Aaron"));
        assert_eq!(fields["father"], FieldValue::from("Amram@Exo.6.18"));
        assert_eq!(fields["summaryDescription"], FieldValue::from("Aaron was the first high priest"));
        assert_eq!(fields["siblings"].as_list().unwrap().len(), 2);

        let FieldValue::Names(names) = &fields["names"] else {
            panic!("names missing");
        };
        assert_eq!(names[0].verse_references, vec!["Exo.4.14", "Exo.4.27"]);
        assert_eq!(names[0].d_strongs, Some(OneOrMany::One("H0175".into())));
        assert_eq!(names[0].translations.as_ref().unwrap()["KJB"], "Aaron");
    }

    #[test]
    fn parents_forms() {
        assert_eq!(split_parents("=+", "people", "x").unwrap(), (None, None));
        assert_eq!(
            split_parents("=+ Hagar@Gen.16.1", "people", "x").unwrap(),
            (None, Some("Hagar@Gen.16.1".into()))
        );
        assert_eq!(
            split_parents("Terah@Gen.11.24 +", "people", "x").unwrap(),
            (Some("Terah@Gen.11.24".into()), None)
        );
        assert_eq!(split_parents("#ERROR!", "people", "x").unwrap(), (None, None));
        assert!(split_parents("Terah", "people", "x").is_err());
    }

    #[test]
    fn strongs_forms() {
        let compound = split_strongs("H1323«H1323=בַּת+H7770«H7770=שׁוּעַ").unwrap();
        assert_eq!(
            compound.d,
            Some(OneOrMany::Many(vec!["H1323".into(), "H7770".into()]))
        );

        let trailing = split_strongs("H5911«H5911=עָכוֹר+").unwrap();
        assert_eq!(trailing.e, Some(OneOrMany::One("H5911".into())));

        let bare_first = split_strongs("H6010=עֵמֶק+H5911«H5911=עָכוֹר").unwrap();
        assert_eq!(
            bare_first.d,
            Some(OneOrMany::Many(vec!["H6010".into(), "H5911".into()]))
        );

        let two_part = split_strongs("H9999=.").unwrap();
        assert_eq!(two_part.d, Some(OneOrMany::One("H9999".into())));
        assert_eq!(two_part.e, None);

        let greek = split_strongs("G1673«G1673=Ἑλληνικός=Ἑλληνικός").unwrap();
        assert_eq!(greek.word, Some(OneOrMany::One("Ἑλληνικός".into())));

        assert_eq!(split_strongs("H0001"), None);
    }

    #[test]
    fn refs_are_tidied() {
        assert_eq!(
            split_refs("Gen.1:1; Eze.1.1;Etc.0.0;"),
            vec!["Gen.1.1".to_string(), "Ezk.1.1".to_string()]
        );
        assert!(split_refs("").is_empty());
    }

    #[test]
    fn unparsed_translation_falls_back_to_raw() {
        let stats = PipelineStats::new();
        let block = person(
            &["Fred@Gen.1.1=H0001", "someone", "=+"],
            &[&["- Named", "Fred@Gen.1.1", "", "Fred (ESV= odd)", "", "Gen.1.1"]],
        );
        let fields = shape_block(&block, "people", &stats).unwrap();
        let FieldValue::Names(names) = &fields["names"] else {
            panic!("names missing");
        };
        assert_eq!(names[0].translations.as_ref().unwrap()["raw"], "Fred (ESV= odd)");
        assert_eq!(stats.translation_fallbacks(), 1);
    }

    #[test]
    fn other_without_strongs_and_duplicates_dropped() {
        let other = RawBlock {
            kind: BlockKind::Other,
            line: 9,
            header: cells(&["Herodian@Mat.22.16", "party"]),
            names: vec![],
        };
        let file = ProperNamesFile {
            blocks: vec![
                person(&["Fred@Gen.1.1=H0001", "a"], &[]),
                person(&["Fred@Gen.1.1=H0001", "b"], &[]),
                other,
            ],
            preamble: vec![],
        };
        let stats = PipelineStats::new();
        let tables = shape_file(&file, &stats).unwrap();
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[2].rows[0][UNIFIED_NAME], FieldValue::from("Herodian@Mat.22.16"));
        assert!(!tables[2].rows[0].contains_key("uStrongs"));
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn significance_and_combined_references() {
        let mut table = CategoryTable::new("places", vec![]);
        let mut fields = Fields::new();
        fields.insert(
            "names".to_string(),
            FieldValue::Names(vec![
                NameVariant {
                    significance: Some("- Named".into()),
                    verse_references: vec!["Gen.12.8".into()],
                    ..Default::default()
                },
                NameVariant {
                    significance: Some("- Spelling".into()),
                    verse_references: vec!["Gen.28.19".into(), "Jdg.1.23".into()],
                    ..Default::default()
                },
            ]),
        );
        table.records.insert("Bethel".into(), Record::new("Bethel", fields));

        normalise_names(&mut table);

        let bethel = &table.records["Bethel"];
        assert_eq!(bethel.names()[0].significance.as_deref(), Some("named"));
        assert_eq!(bethel.names()[1].significance.as_deref(), Some("spelled"));
        assert_eq!(bethel.list(COMBINED_REFERENCES).unwrap().len(), 3);
    }
}
