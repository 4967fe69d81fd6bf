use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered field map; insertion order is the source column order and is preserved through export
pub type Fields = IndexMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Text(String),
    List(Vec<String>),
    Names(Vec<NameVariant>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Null, empty text, or an empty list
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Names(names) => names.is_empty(),
            FieldValue::Int(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Strong's numbers and source words are single for one-word names and parallel lists for compounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// One historical or linguistic name of a proper-names entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameVariant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significance: Option<String>,
    #[serde(rename = "uniqueNameTIPNR", skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(rename = "dStrongs", skip_serializing_if = "Option::is_none")]
    pub d_strongs: Option<OneOrMany>,
    #[serde(rename = "eStrongs", skip_serializing_if = "Option::is_none")]
    pub e_strongs: Option<OneOrMany>,
    #[serde(rename = "sourceWord", skip_serializing_if = "Option::is_none")]
    pub source_word: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<IndexMap<String, String>>,
    #[serde(rename = "STEPBibleFirstLink", skip_serializing_if = "Option::is_none")]
    pub step_bible_first_link: Option<String>,
    #[serde(
        rename = "individualVerseReferences",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verse_references: Vec<String>,
}

/// An entity record; `fgid` is the identifier the pipeline assigns and rewrites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "FGid")]
    pub fgid: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(fgid: impl Into<String>, fields: Fields) -> Self {
        Self {
            fgid: fgid.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    pub fn list(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).and_then(FieldValue::as_list)
    }

    pub fn names(&self) -> &[NameVariant] {
        match self.fields.get("names") {
            Some(FieldValue::Names(names)) => names,
            _ => &[],
        }
    }
}

/// Rows exactly as the loader produced them, before identifiers exist
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub column_headers: Vec<String>,
    pub rows: Vec<Fields>,
}

/// One category's records keyed by identifier, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    pub name: String,
    pub column_headers: Vec<String>,
    pub records: IndexMap<String, Record>,
}

impl CategoryTable {
    pub fn new(name: impl Into<String>, column_headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            column_headers,
            records: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
