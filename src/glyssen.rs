use crate::config::{
    GLYSSEN_CHARACTERS_FILE, GLYSSEN_DOWNLOADED, GLYSSEN_FORMAT_VERSION, GLYSSEN_INPUT_FOLDER,
    GLYSSEN_VERSES_FILE, GLYSSEN_VERSE_FAMILY_LIMIT,
};
use crate::dataset::{CategorySpec, Dataset, Source};
use crate::identity::ExtractionRule;
use crate::loader::TableFormat;
use crate::prefix::{CategoryLetter, PrefixRule};
use crate::resolve::Popularity;
use crate::verse::BookScheme;

const GENDERS: &[&str] = &["Male", "Female", "", "PreferMale", "PreferFemale", "Either", "Neuter"];

/// Glyssen dramatised-reading control files: who speaks, and where
pub static GLYSSEN: Dataset = Dataset {
    name: "glyssen",
    index_label: "GlyssenData",
    default_input: GLYSSEN_INPUT_FOLDER,
    downloaded: GLYSSEN_DOWNLOADED,
    format_version: GLYSSEN_FORMAT_VERSION,
    letters: &[
        CategoryLetter::Person,
        CategoryLetter::Group,
        CategoryLetter::TribeNation,
    ],
    verse_scheme: BookScheme::Usfm,
    source: Source::Tables(TableFormat::TSV),
    categories: &[
        CategorySpec {
            name: "characters",
            file: GLYSSEN_CHARACTERS_FILE,
            id_field: "Character ID",
            extraction: ExtractionRule::FirstWord,
            int_fields: &["Max Speakers"],
            closed_sets: &[("Gender", GENDERS)],
            popularity: Some(Popularity::Annotation("Reference")),
            prefix: Some(PrefixRule::SpeakerCount("Max Speakers")),
            name_key: Some("Character ID"),
            merged: true,
            ..CategorySpec::BASE
        },
        CategorySpec {
            name: "verses",
            file: GLYSSEN_VERSES_FILE,
            skip_lines: 1,
            id_field: "B",
            extraction: ExtractionRule::VerseKey(BookScheme::Usfm),
            popularity: Some(Popularity::Uniform),
            family_limit: GLYSSEN_VERSE_FAMILY_LIMIT,
            family_marker: Some('~'),
            ..CategorySpec::BASE
        },
    ],
};
