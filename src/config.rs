/// How many parent directories are probed when looking for an input file
pub const INPUT_PROBE_DEPTH: usize = 4;

/// Exclusive upper bound on disambiguation suffixes within one family
pub const MAX_FAMILY_SUFFIX: usize = 30;

/// Marker wrapped around an unresolvable cross reference
pub const ERROR_SENTINEL_PREFIX: &str = "<<<ERROR_";
pub const ERROR_SENTINEL_SUFFIX: &str = "_>>>";

/// Uncertainty/death annotations carried on cross-reference values.
/// Longest first so `(d?)` is not mistaken for `(?)`.
pub const XREF_DECORATIONS: [&str; 3] = ["(d?)", "(?)", "(d)"];

/// Key of the metadata envelope at the top of every JSON document
pub const HEADERS_KEY: &str = "__HEADERS__";
pub const COLUMN_HEADERS_KEY: &str = "__COLUMN_HEADERS__";

/// Subdirectory (under the input folder) that receives derived files by default
pub const DERIVED_SUBDIR: &str = "derivedFiles";

/// Tick the loading spinner every N lines
pub const PROGRESS_INTERVAL: usize = 500;

/// Last date the conversion logic itself was changed
pub const LAST_MODIFIED_DATE: &str = "2022-08-10";

pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const GLYSSEN_CHARACTERS_FILE: &str = "CharacterDetail.tsv";
pub const GLYSSEN_VERSES_FILE: &str = "CharacterVerse.tsv";
pub const GLYSSEN_DOWNLOADED: &str = "2022-07-25";
pub const GLYSSEN_FORMAT_VERSION: &str = "0.1";

pub const TIPNR_FILE: &str = "TIPNR - Tyndale Individualised Proper Names with all References - TyndaleHouse.com STEPBible.org CC BY.tsv";
pub const TIPNR_DOWNLOADED: &str = "2022-07-20";
pub const TIPNR_FORMAT_VERSION: &str = "0.5";

/// Every line of the proper-names file has exactly this many tab-separated cells
pub const TIPNR_COLUMNS: usize = 13;

pub const THEOGRAPHIC_DOWNLOADED: &str = "2022-07-24";
pub const THEOGRAPHIC_FORMAT_VERSION: &str = "0.1";

/// Glyssen verse identifiers repeat once per speaking character and every
/// `#` comment row shares one identifier family, so that family is larger
pub const GLYSSEN_VERSE_FAMILY_LIMIT: usize = 2000;

pub const GLYSSEN_INPUT_FOLDER: &str = "../outsideSources/GlyssenData/";
pub const TIPNR_INPUT_FOLDER: &str = "../outsideSources/STEPBible/";
pub const THEOGRAPHIC_INPUT_FOLDER: &str = "../outsideSources/TheographicBibleData/";
