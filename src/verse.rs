//! Verse-reference canonicalisation.
//!
//! Sources spell books three different ways. Everything is rewritten into the
//! BOS scheme as `CODE_chapter:verse`, e.g. OSIS `2Chr.1.14` becomes `CH2_1:14`.

use crate::error::PipelineError;
use crate::models::{CategoryTable, FieldValue};
use crate::stats::PipelineStats;
use tracing::info;

const USFM: [&str; 66] = [
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "1SA", "2SA", "1KI", "2KI", "1CH",
    "2CH", "EZR", "NEH", "EST", "JOB", "PSA", "PRO", "ECC", "SNG", "ISA", "JER", "LAM", "EZK",
    "DAN", "HOS", "JOL", "AMO", "OBA", "JON", "MIC", "NAM", "HAB", "ZEP", "HAG", "ZEC", "MAL",
    "MAT", "MRK", "LUK", "JHN", "ACT", "ROM", "1CO", "2CO", "GAL", "EPH", "PHP", "COL", "1TH",
    "2TH", "1TI", "2TI", "TIT", "PHM", "HEB", "JAS", "1PE", "2PE", "1JN", "2JN", "3JN", "JUD",
    "REV",
];

const OSIS: [&str; 66] = [
    "Gen", "Exod", "Lev", "Num", "Deut", "Josh", "Judg", "Ruth", "1Sam", "2Sam", "1Kgs", "2Kgs",
    "1Chr", "2Chr", "Ezra", "Neh", "Esth", "Job", "Ps", "Prov", "Eccl", "Song", "Isa", "Jer",
    "Lam", "Ezek", "Dan", "Hos", "Joel", "Amos", "Obad", "Jonah", "Mic", "Nah", "Hab", "Zeph",
    "Hag", "Zech", "Mal", "Matt", "Mark", "Luke", "John", "Acts", "Rom", "1Cor", "2Cor", "Gal",
    "Eph", "Phil", "Col", "1Thess", "2Thess", "1Tim", "2Tim", "Titus", "Phlm", "Heb", "Jas",
    "1Pet", "2Pet", "1John", "2John", "3John", "Jude", "Rev",
];

const TITLE_CASE: [&str; 66] = [
    "Gen", "Exo", "Lev", "Num", "Deu", "Jos", "Jdg", "Rut", "1Sa", "2Sa", "1Ki", "2Ki", "1Ch",
    "2Ch", "Ezr", "Neh", "Est", "Job", "Psa", "Pro", "Ecc", "Sng", "Isa", "Jer", "Lam", "Ezk",
    "Dan", "Hos", "Jol", "Amo", "Oba", "Jon", "Mic", "Nam", "Hab", "Zep", "Hag", "Zec", "Mal",
    "Mat", "Mrk", "Luk", "Jhn", "Act", "Rom", "1Co", "2Co", "Gal", "Eph", "Php", "Col", "1Th",
    "2Th", "1Ti", "2Ti", "Tit", "Phm", "Heb", "Jas", "1Pe", "2Pe", "1Jn", "2Jn", "3Jn", "Jud",
    "Rev",
];

const BOS: [&str; 66] = [
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "SA1", "SA2", "KI1", "KI2", "CH1",
    "CH2", "EZR", "NEH", "EST", "JOB", "PSA", "PRO", "ECC", "SNG", "ISA", "JER", "LAM", "EZK",
    "DAN", "HOS", "JOL", "AMO", "OBA", "JNA", "MIC", "NAH", "HAB", "ZEP", "HAG", "ZEC", "MAL",
    "MAT", "MRK", "LUK", "JHN", "ACT", "ROM", "CO1", "CO2", "GAL", "EPH", "PHP", "COL", "TH1",
    "TH2", "1TI", "2TI", "TIT", "PHM", "HEB", "JAS", "PE1", "PE2", "JN1", "JN2", "JN3", "JDE",
    "REV",
];

/// A source vocabulary of 66 book codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookScheme {
    /// Upper-case USFM (`GEN`, `1SA`), used by the Glyssen control files
    Usfm,
    /// OSIS (`Gen`, `Exod`, `2Chr`, `Ps`), used by the Theographic tables
    Osis,
    /// Title-case three letter codes (`Gen`, `1Sa`, `Ezk`), used by TIPNR
    TitleCase,
    /// The canonical BOS codes (`SA1`, `CH2`, `JNA`)
    Bos,
}

impl BookScheme {
    fn table(self) -> &'static [&'static str; 66] {
        match self {
            BookScheme::Usfm => &USFM,
            BookScheme::Osis => &OSIS,
            BookScheme::TitleCase => &TITLE_CASE,
            BookScheme::Bos => &BOS,
        }
    }

    /// Zero-based book index for a code in this scheme
    pub fn index_of(self, code: &str) -> Option<usize> {
        self.table().iter().position(|c| *c == code)
    }

    pub fn code(self, index: usize) -> Option<&'static str> {
        self.table().get(index).copied()
    }

    /// Shortest plausible `<book>.<c>.<v>` for this scheme
    fn min_reference_len(self) -> usize {
        match self {
            BookScheme::Osis => 6,
            _ => 7,
        }
    }
}

/// Translate a bare book code between schemes
pub fn convert_book(code: &str, from: BookScheme, to: BookScheme) -> Option<&'static str> {
    from.index_of(code).and_then(|ix| to.code(ix))
}

fn split_wrapper(reference: &str) -> (&str, &str, &str) {
    let bytes = reference.as_bytes();
    if bytes.len() >= 2
        && matches!(bytes[0], b'(' | b'[')
        && matches!(bytes[bytes.len() - 1], b')' | b']')
    {
        let n = reference.len();
        (&reference[..1], &reference[1..n - 1], &reference[n - 1..])
    } else {
        ("", reference, "")
    }
}

fn is_chapter(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Digits, optionally followed by one part letter (`14`, `14a`)
fn is_verse(s: &str) -> bool {
    let digits = s.trim_end_matches(|c: char| c.is_ascii_lowercase());
    is_chapter(digits) && s.len() - digits.len() <= 1
}

/// Rewrite `<book>.<chapter>.<verse>` from `scheme` into `BOS_chapter:verse`.
///
/// A `(…)` or `[…]` wrapper is kept around the result. Input that already
/// contains `:` (including canonical output) is rejected.
pub fn canonicalize(reference: &str, scheme: BookScheme) -> Result<String, PipelineError> {
    let malformed = || PipelineError::MalformedVerseReference(reference.to_string());

    if reference.len() < scheme.min_reference_len()
        || reference.contains([';', ':', ' '])
        || reference.matches('.').count() != 2
    {
        return Err(malformed());
    }

    let (pre, inner, post) = split_wrapper(reference);
    let (book, rest) = inner.split_once('.').ok_or_else(malformed)?;
    let (chapter, verse) = rest.split_once('.').ok_or_else(malformed)?;
    if !is_chapter(chapter) || !is_verse(verse) {
        return Err(malformed());
    }

    let code = convert_book(book, scheme, BookScheme::Bos).ok_or_else(|| {
        PipelineError::UnknownBookCode {
            code: book.to_string(),
            reference: reference.to_string(),
        }
    })?;

    Ok(format!("{pre}{code}_{chapter}:{verse}{post}"))
}

/// Inverse of [`canonicalize`]: `CH2_1:14` back to `2Chr.1.14` for OSIS
pub fn render(canonical: &str, scheme: BookScheme) -> Result<String, PipelineError> {
    let malformed = || PipelineError::MalformedVerseReference(canonical.to_string());

    let (pre, inner, post) = split_wrapper(canonical);
    let (code, rest) = inner.split_once('_').ok_or_else(malformed)?;
    let (chapter, verse) = rest.split_once(':').ok_or_else(malformed)?;
    if !is_chapter(chapter) || !is_verse(verse) {
        return Err(malformed());
    }

    let book = convert_book(code, BookScheme::Bos, scheme).ok_or_else(|| {
        PipelineError::UnknownBookCode {
            code: code.to_string(),
            reference: canonical.to_string(),
        }
    })?;

    Ok(format!("{pre}{book}.{chapter}.{verse}{post}"))
}

fn canonicalize_all(refs: &mut [String], scheme: BookScheme) -> Result<u64, PipelineError> {
    for reference in refs.iter_mut() {
        *reference = canonicalize(reference, scheme)?;
    }
    Ok(refs.len() as u64)
}

/// Canonicalise every reference in the listed fields, and in each name
/// variant's own list when `name_variants` is set
pub fn canonicalize_table(
    table: &mut CategoryTable,
    fields: &[&str],
    name_variants: bool,
    scheme: BookScheme,
    stats: &PipelineStats,
) -> Result<(), PipelineError> {
    let mut count = 0;
    for record in table.records.values_mut() {
        for field in fields {
            if let Some(FieldValue::List(refs)) = record.fields.get_mut(*field) {
                count += canonicalize_all(refs, scheme)?;
            }
        }
        if name_variants {
            if let Some(FieldValue::Names(names)) = record.fields.get_mut("names") {
                for variant in names.iter_mut() {
                    count += canonicalize_all(&mut variant.verse_references, scheme)?;
                }
            }
        }
    }
    stats.add_verses(count);
    info!(category = %table.name, references = count, "Canonicalised verse references");
    Ok(())
}
