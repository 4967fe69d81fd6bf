//! JSON and XML output.
//!
//! Every JSON document is an object that opens with the `__HEADERS__`
//! envelope, then `__COLUMN_HEADERS__` when the source had column headers,
//! then the body. Files are written to a temporary name and renamed into
//! place so an interrupted run never leaves half a document behind.

use crate::config::{LAST_MODIFIED_DATE, PROGRAM_VERSION};
use crate::dataset::{title_case, CategorySpec, Dataset};
use crate::models::{CategoryTable, FieldValue, Fields, NameVariant, OneOrMany, RawTable, Record};
use crate::tipnr::COMBINED_REFERENCES;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct Headers {
    pub conversion_software: String,
    pub conversion_software_last_modified_date: &'static str,
    pub source_data_last_downloaded_date: &'static str,
    pub conversion_date: String,
    pub conversion_format_version: &'static str,
}

impl Headers {
    pub fn new(dataset: &Dataset) -> Self {
        Self {
            conversion_software: format!("onomasticon v{PROGRAM_VERSION}"),
            conversion_software_last_modified_date: LAST_MODIFIED_DATE,
            source_data_last_downloaded_date: dataset.downloaded,
            conversion_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            conversion_format_version: dataset.format_version,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("conversion_software", &self.conversion_software),
            (
                "conversion_software_last_modified_date",
                self.conversion_software_last_modified_date,
            ),
            (
                "source_data_last_downloaded_date",
                self.source_data_last_downloaded_date,
            ),
            ("conversion_date", &self.conversion_date),
            ("conversion_format_version", self.conversion_format_version),
        ]
    }
}

#[derive(Serialize)]
struct Document<'a, T: Serialize> {
    #[serde(rename = "__HEADERS__")]
    headers: &'a Headers,
    #[serde(rename = "__COLUMN_HEADERS__", skip_serializing_if = "Option::is_none")]
    column_headers: Option<&'a [String]>,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct DataList<'a> {
    #[serde(rename = "dataList")]
    rows: &'a [Fields],
}

/// Writes every artefact of one dataset run into one directory
pub struct Exporter<'a> {
    dataset: &'a Dataset,
    dir: PathBuf,
    headers: Headers,
}

impl<'a> Exporter<'a> {
    pub fn new(dataset: &'a Dataset, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self {
            dataset,
            dir: dir.to_path_buf(),
            headers: Headers::new(dataset),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_json<T: Serialize>(
        &self,
        file_name: &str,
        column_headers: &[String],
        body: T,
    ) -> Result<PathBuf> {
        let document = Document {
            headers: &self.headers,
            column_headers: (!column_headers.is_empty()).then_some(column_headers),
            body,
        };

        let path = self.dir.join(file_name);
        let tmp_path = path.with_extension("json.tmp");
        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document)
            .with_context(|| format!("Failed to serialize {file_name}"))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;

        debug!(path = %path.display(), "Wrote JSON");
        Ok(path)
    }

    /// `raw_<Title>.json`: rows as loaded, or keyed by `key_field` when given
    pub fn raw(&self, table: &RawTable, key_field: Option<&str>) -> Result<PathBuf> {
        let file_name = format!("raw_{}.json", title_case(&table.name));
        let path = match key_field {
            Some(field) => {
                let keyed: IndexMap<&str, &Fields> = table
                    .rows
                    .iter()
                    .map(|row| {
                        let key = row.get(field).and_then(FieldValue::as_text).unwrap_or_default();
                        (key, row)
                    })
                    .collect();
                self.write_json(&file_name, &table.column_headers, keyed)?
            }
            None => self.write_json(
                &file_name,
                &table.column_headers,
                DataList { rows: &table.rows },
            )?,
        };
        info!(table = %table.name, rows = table.rows.len(), "Exported raw snapshot");
        Ok(path)
    }

    /// `<stage>_<Title>.json` holding the table's records by key
    pub fn table(&self, stage: &str, table: &CategoryTable) -> Result<PathBuf> {
        let file_name = format!("{stage}_{}.json", title_case(&table.name));
        let path = self.write_json(&file_name, &table.column_headers, &table.records)?;
        info!(stage, table = %table.name, records = table.len(), "Exported snapshot");
        Ok(path)
    }

    /// `normalised_All.json` from the merged view
    pub fn all(&self, merged: &IndexMap<&str, &Record>) -> Result<PathBuf> {
        let path = self.write_json("normalised_All.json", &[], merged)?;
        info!(records = merged.len(), "Exported merged snapshot");
        Ok(path)
    }

    /// `normalised_<Title>_verseRef_index.json` and, when given,
    /// `normalised_<Title>_<label>_index.json`
    pub fn indexes<'r, I>(
        &self,
        title: &str,
        records: I,
        names: Option<&IndexMap<String, String>>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let verses = verse_index(records);
        self.write_json(&format!("normalised_{title}_verseRef_index.json"), &[], &verses)?;
        if let Some(names) = names {
            let file_name = format!("normalised_{title}_{}_index.json", self.dataset.index_label);
            self.write_json(&file_name, &[], names)?;
        }
        info!(
            title,
            verses = verses.len(),
            names = names.map_or(0, IndexMap::len),
            "Exported indexes"
        );
        Ok(())
    }

    /// `normalised_<Title>.xml`, with `comments` written ahead of the records
    pub fn xml(&self, table: &CategoryTable, comments: &[String]) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("normalised_{}.xml", title_case(&table.name)));
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);
        write_document(&mut writer, &self.headers, self.dataset, table, comments)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer
            .into_inner()
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        info!(table = %table.name, records = table.len(), "Exported XML");
        Ok(path)
    }
}

/// The verse references a record is indexed under
pub fn record_verses(record: &Record) -> &[String] {
    if let Some(combined) = record.list(COMBINED_REFERENCES) {
        return combined;
    }
    if let Some(first) = record.names().first() {
        return &first.verse_references;
    }
    record.list("verses").unwrap_or_default()
}

/// Canonical verse to identifiers, both in first-seen order
pub fn verse_index<'r, I>(records: I) -> IndexMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut index: IndexMap<String, Vec<String>> = IndexMap::new();
    for record in records {
        for verse in record_verses(record) {
            let ids = index.entry(verse.clone()).or_default();
            if !ids.contains(&record.fgid) {
                ids.push(record.fgid.clone());
            }
        }
    }
    index
}

fn add_name(index: &mut IndexMap<String, String>, name: &str, id: &str, category: &str) {
    match index.get(name) {
        Some(existing) if existing != id => warn!(
            category,
            name,
            kept = %existing,
            ignored = id,
            "Source name maps to two identifiers"
        ),
        Some(_) => {}
        None => {
            index.insert(name.to_string(), id.to_string());
        }
    }
}

/// Source name to final identifier for one category.
///
/// Proper-names records are also indexed under each unique name of their
/// variants. `None` when the category has no name key.
pub fn name_index(table: &CategoryTable, spec: &CategorySpec) -> Option<IndexMap<String, String>> {
    let key_field = spec.name_key?;
    let mut index = IndexMap::with_capacity(table.len());
    for record in table.records.values() {
        let key = record.text(key_field).filter(|k| !k.is_empty());
        if let Some(key) = key {
            add_name(&mut index, key, &record.fgid, &table.name);
        }
        if spec.name_variants {
            for unique in record.names().iter().filter_map(|n| n.unique_name.as_deref()) {
                if Some(unique) != key {
                    add_name(&mut index, unique, &record.fgid, &table.name);
                }
            }
        }
    }
    Some(index)
}

/// Concatenate per-category name indexes, keeping the first of any conflict
pub fn combine_name_indexes<'i, I>(indexes: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = &'i IndexMap<String, String>>,
{
    let mut all = IndexMap::new();
    for index in indexes {
        for (name, id) in index {
            add_name(&mut all, name, id, "all");
        }
    }
    all
}

fn write_document<W: Write>(
    writer: &mut Writer<W>,
    headers: &Headers,
    dataset: &Dataset,
    table: &CategoryTable,
    comments: &[String],
) -> quick_xml::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    for comment in comments {
        let text = format!(" {} ", comment.replace("--", "- -"));
        writer.write_event(Event::Comment(BytesText::from_escaped(text)))?;
    }

    writer
        .create_element(table.name.as_str())
        .with_attribute(("dataset", dataset.index_label))
        .write_inner_content(|w| {
            w.create_element("headers").write_inner_content(|w| {
                for (name, value) in headers.entries() {
                    w.create_element(name)
                        .write_text_content(BytesText::new(value))?;
                }
                Ok::<(), quick_xml::Error>(())
            })?;
            for record in table.records.values() {
                w.create_element("record")
                    .with_attribute(("FGid", record.fgid.as_str()))
                    .write_inner_content(|w| {
                        for (name, value) in &record.fields {
                            write_field(w, name, value)?;
                        }
                        Ok::<(), quick_xml::Error>(())
                    })?;
            }
            Ok::<(), quick_xml::Error>(())
        })?;
    Ok(())
}

fn write_text<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> quick_xml::Result<()> {
    writer
        .create_element("field")
        .with_attribute(("name", name))
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_items<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    items: &[String],
) -> quick_xml::Result<()> {
    writer
        .create_element("field")
        .with_attribute(("name", name))
        .write_inner_content(|w| {
            for item in items {
                w.create_element("item")
                    .write_text_content(BytesText::new(item))?;
            }
            Ok::<(), quick_xml::Error>(())
        })?;
    Ok(())
}

fn write_field<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &FieldValue,
) -> quick_xml::Result<()> {
    match value {
        FieldValue::Null => {
            writer
                .create_element("field")
                .with_attribute(("name", name))
                .write_empty()?;
        }
        FieldValue::Int(n) => write_text(writer, name, &n.to_string())?,
        FieldValue::Text(text) => write_text(writer, name, text)?,
        FieldValue::List(items) => write_items(writer, name, items)?,
        FieldValue::Names(names) => {
            writer
                .create_element("field")
                .with_attribute(("name", name))
                .write_inner_content(|w| {
                    for variant in names {
                        w.create_element("name")
                            .write_inner_content(|w| write_variant(w, variant))?;
                    }
                    Ok::<(), quick_xml::Error>(())
                })?;
        }
    }
    Ok(())
}

fn write_one_or_many<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Option<OneOrMany>,
) -> quick_xml::Result<()> {
    match value {
        Some(OneOrMany::One(text)) => write_text(writer, name, text),
        Some(OneOrMany::Many(items)) => write_items(writer, name, items),
        None => Ok(()),
    }
}

fn write_variant<W: Write>(writer: &mut Writer<W>, variant: &NameVariant) -> quick_xml::Result<()> {
    if let Some(significance) = &variant.significance {
        write_text(writer, "significance", significance)?;
    }
    if let Some(unique) = &variant.unique_name {
        write_text(writer, "uniqueNameTIPNR", unique)?;
    }
    write_one_or_many(writer, "dStrongs", &variant.d_strongs)?;
    write_one_or_many(writer, "eStrongs", &variant.e_strongs)?;
    write_one_or_many(writer, "sourceWord", &variant.source_word)?;
    if let Some(translations) = &variant.translations {
        writer
            .create_element("field")
            .with_attribute(("name", "translations"))
            .write_inner_content(|w| {
                for (version, text) in translations {
                    w.create_element("item")
                        .with_attribute(("version", version.as_str()))
                        .write_text_content(BytesText::new(text))?;
                }
                Ok::<(), quick_xml::Error>(())
            })?;
    }
    if let Some(link) = &variant.step_bible_first_link {
        write_text(writer, "STEPBibleFirstLink", link)?;
    }
    if !variant.verse_references.is_empty() {
        write_items(writer, "individualVerseReferences", &variant.verse_references)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{COLUMN_HEADERS_KEY, HEADERS_KEY};
    use crate::glyssen::GLYSSEN;
    use crate::tipnr::TIPNR;

    fn record(id: &str, verses: &[&str]) -> Record {
        let mut fields = Fields::new();
        fields.insert(
            "verses".to_string(),
            FieldValue::List(verses.iter().map(|v| v.to_string()).collect()),
        );
        Record::new(id, fields)
    }

    #[test]
    fn verse_index_keeps_first_seen_order() {
        let records = [
            record("PAaron", &["EXO_4:14", "EXO_4:27", "EXO_4:14"]),
            record("PMoses", &["EXO_4:14"]),
        ];
        let index = verse_index(&records);
        assert_eq!(index.keys().collect::<Vec<_>>(), ["EXO_4:14", "EXO_4:27"]);
        assert_eq!(index["EXO_4:14"], ["PAaron", "PMoses"]);
    }

    #[test]
    fn combined_references_win_over_variants() {
        let mut aaron = Record::new("PAaron", Fields::new());
        aaron.fields.insert(
            "names".to_string(),
            FieldValue::Names(vec![NameVariant {
                verse_references: vec!["EXO_4:14".into()],
                ..Default::default()
            }]),
        );
        assert_eq!(record_verses(&aaron), ["EXO_4:14"]);

        aaron.fields.insert(
            COMBINED_REFERENCES.to_string(),
            FieldValue::List(vec!["EXO_4:14".into(), "NUM_20:28".into()]),
        );
        assert_eq!(record_verses(&aaron).len(), 2);
    }

    #[test]
    fn name_index_adds_unique_names() {
        let mut table = CategoryTable::new("people", vec![]);
        let mut fields = Fields::new();
        fields.insert("unifiedNameTIPNR".to_string(), "Abram@Gen.11.26".into());
        fields.insert(
            "names".to_string(),
            FieldValue::Names(vec![
                NameVariant {
                    unique_name: Some("Abram@Gen.11.26".into()),
                    ..Default::default()
                },
                NameVariant {
                    unique_name: Some("Abraham@Gen.17.5".into()),
                    ..Default::default()
                },
            ]),
        );
        table
            .records
            .insert("PAbraham".to_string(), Record::new("PAbraham", fields));

        let spec = TIPNR.category("people").unwrap();
        let index = name_index(&table, spec).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["Abraham@Gen.17.5"], "PAbraham");

        let verses = GLYSSEN.category("verses").unwrap();
        assert!(name_index(&table, verses).is_none());
    }

    #[test]
    fn combined_index_keeps_first_conflict() {
        let a = IndexMap::from([("Fred".to_string(), "PFred".to_string())]);
        let b = IndexMap::from([
            ("Fred".to_string(), "LFred".to_string()),
            ("Jericho".to_string(), "LJericho".to_string()),
        ]);
        let all = combine_name_indexes([&a, &b]);
        assert_eq!(all["Fred"], "PFred");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn json_document_starts_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(&GLYSSEN, dir.path()).unwrap();
        let mut table = CategoryTable::new("characters", vec!["FGid".into(), "Character ID".into()]);
        let mut fields = Fields::new();
        fields.insert("Character ID".to_string(), "Fred".into());
        table.records.insert("PFred".to_string(), Record::new("PFred", fields));

        let path = exporter.table("normalised", &table).unwrap();
        assert!(path.ends_with("normalised_Characters.json"));
        let text = fs::read_to_string(&path).unwrap();
        let headers_at = text.find(HEADERS_KEY).unwrap();
        let columns_at = text.find(COLUMN_HEADERS_KEY).unwrap();
        let record_at = text.find("\"PFred\"").unwrap();
        assert!(headers_at < columns_at && columns_at < record_at);
        assert!(text.contains("onomasticon v"));
    }

    #[test]
    fn xml_escapes_text_and_keeps_comments() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(&TIPNR, dir.path()).unwrap();
        let mut table = CategoryTable::new("others", vec![]);
        let mut fields = Fields::new();
        fields.insert("description".to_string(), "Ruler & <judge>".into());
        table.records.insert("DBaal".to_string(), Record::new("DBaal", fields));

        let path = exporter
            .xml(&table, &["Copyright -- Tyndale House".to_string()])
            .unwrap();
        let xml = fs::read_to_string(path).unwrap();
        assert!(xml.contains("<!-- Copyright - - Tyndale House -->"));
        assert!(xml.contains(r#"<record FGid="DBaal">"#));
        assert!(xml.contains("Ruler &amp; &lt;judge&gt;"));
    }
}
