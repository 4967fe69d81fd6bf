use crate::error::PipelineError;
use crate::models::{CategoryTable, FieldValue};
use std::fmt;
use tracing::info;

/// Semantic tag prepended to every final identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryLetter {
    /// A single human person
    Person,
    /// A place or location
    Location,
    /// A group of people (Glyssen speaker groups)
    Group,
    /// A group of people (Theographic people groups)
    PeopleGroup,
    /// A tribe or all citizens of a nation
    TribeNation,
    /// A deity, and the catch-all for TIPNR "other" names
    Deity,
    Event,
}

impl CategoryLetter {
    pub fn as_char(self) -> char {
        match self {
            CategoryLetter::Person => 'P',
            CategoryLetter::Location => 'L',
            CategoryLetter::Group => 'G',
            CategoryLetter::PeopleGroup => 'Q',
            CategoryLetter::TribeNation => 'T',
            CategoryLetter::Deity => 'D',
            CategoryLetter::Event => 'E',
        }
    }
}

impl fmt::Display for CategoryLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// How a category chooses its letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule {
    Static(CategoryLetter),
    /// Speaker count field: `1` is a person, `-1` (unknown size) a tribe or nation, anything else a group
    SpeakerCount(&'static str),
}

impl PrefixRule {
    pub fn letter_for(speakers: i64) -> CategoryLetter {
        match speakers {
            1 => CategoryLetter::Person,
            -1 => CategoryLetter::TribeNation,
            _ => CategoryLetter::Group,
        }
    }
}

/// Prepend the category letter to every record's identifier; keys stay as they are
pub fn prefix_identifiers(table: &mut CategoryTable, rule: PrefixRule) -> Result<(), PipelineError> {
    for record in table.records.values_mut() {
        let letter = match rule {
            PrefixRule::Static(letter) => letter,
            PrefixRule::SpeakerCount(field) => match record.get(field) {
                Some(FieldValue::Int(n)) => PrefixRule::letter_for(*n),
                Some(other) => {
                    return Err(PipelineError::MalformedField {
                        category: table.name.clone(),
                        record: record.fgid.clone(),
                        field: field.to_string(),
                        value: format!("{other:?}"),
                    })
                }
                None => {
                    return Err(PipelineError::MissingField {
                        category: table.name.clone(),
                        record: record.fgid.clone(),
                        field: field.to_string(),
                    })
                }
            },
        };
        record.fgid.insert(0, letter.as_char());
    }
    info!(category = %table.name, records = table.len(), "Prefixed identifiers");
    Ok(())
}
