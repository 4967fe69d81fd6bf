use thiserror::Error;

/// Structural failures that abort a run.
///
/// Everything here means the input broke an assumption the identifier space
/// depends on; data-quality problems are logged and patched instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{category}: record {row} produced an empty identifier")]
    EmptyIdentifier { category: String, row: usize },

    #[error("{category}: identifier '{identifier}' contains whitespace")]
    InvalidIdentifier { category: String, identifier: String },

    #[error("{category}: identifier '{identifier}' is not unique")]
    DuplicateIdentifier { category: String, identifier: String },

    #[error("{category}: record '{record}' is missing required field '{field}'")]
    MissingField {
        category: String,
        record: String,
        field: String,
    },

    #[error("{category}: field '{field}' of '{record}' is malformed: {value:?}")]
    MalformedField {
        category: String,
        record: String,
        field: String,
        value: String,
    },

    #[error("{category}: record '{record}' has unconsumed fields {fields:?}")]
    LeftoverFields {
        category: String,
        record: String,
        fields: Vec<String>,
    },

    #[error("malformed verse reference {0:?}")]
    MalformedVerseReference(String),

    #[error("unknown book code {code:?} in verse reference {reference:?}")]
    UnknownBookCode { code: String, reference: String },

    #[error("{category}: family member '{member}' has no base record '{base}'")]
    MissingFamilyBase {
        category: String,
        member: String,
        base: String,
    },

    #[error("{category}: family '{base}' reaches the suffix limit of {limit}")]
    FamilyTooLarge {
        category: String,
        base: String,
        limit: usize,
    },

    #[error("{category}: re-keying changed the record count from {before} to {after}")]
    RekeyCountMismatch {
        category: String,
        before: usize,
        after: usize,
    },

    #[error("merging {expected} records produced {actual} unique identifiers")]
    MergeCountMismatch { expected: usize, actual: usize },

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{category}: identifier '{identifier}' does not carry a letter from {allowed:?}")]
    MissingPrefix {
        category: String,
        identifier: String,
        allowed: String,
    },

    #[error("{category}: field '{field}' of '{record}' still holds unresolved name {value:?}")]
    UnresolvedReference {
        category: String,
        record: String,
        field: String,
        value: String,
    },
}
