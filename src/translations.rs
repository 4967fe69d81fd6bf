//! Matcher for the TIPNR "Translations" column.
//!
//! The column records how the ESV, NIV and KJV render a name, in a loose
//! notation such as `Hadoram (KJV= Joram)` or `Birsha (=Qere, KJV= Bersha)`.
//! Known one-off annotations are looked up verbatim; everything else goes
//! through an ordered list of patterns. The KJV is stored under `KJB`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

pub type Translations = IndexMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised translation annotation {0:?}")]
pub struct TranslationError(pub String);

/// Annotations that follow no general pattern, after normalisation
const SPECIAL_CASES: &[(&str, &[(&str, &str)])] = &[
    ("Joda (Var, KJV= Juda)", &[("ESV", "Joda (variant)"), ("NIV", "Joda (variant)"), ("Variant", "Joda"), ("KJB", "Juda")]),
    ("Moses (=LXX; KJV= Manasseh)", &[("ESV", "Moses"), ("NIV", "Moses"), ("LXX", "Moses"), ("KJB", "Manasseh")]),
    ("Birzaith (=Qere. Ketiv= Birzoth; KJV= Birzavith)", &[("ESV", "Birzaith"), ("NIV", "Birzaith"), ("Ketiv", "Birzoth"), ("KJB", "Birzavith")]),
    ("Ammi/-nadib (ESV= my kinsman, a prince; NIV= royal of my people)", &[("ESV", "Ammi-nadib (my kinsman, a prince)"), ("NIV", "Ammi-nadib (royal of my people)"), ("KJB", "Ammi-nadib")]),
    ("Rapha (KJV, ESV= \"giant\")", &[("ESV", "\"giant\""), ("NIV", "Rapha"), ("KJB", "\"giant\"")]),
    ("Raphaite (KJV, ESV= \"giant\")", &[("ESV", "\"giant\""), ("NIV", "Raphaite"), ("KJB", "\"giant\"")]),
    ("Misgab (ESV= fortress; NIV= stronghold)", &[("ESV", "\"fortress\""), ("NIV", "\"stronghold\""), ("KJB", "Misgab")]),
    ("Achshaph NIV= Akshaph)", &[("ESV", "Achshaph"), ("NIV", "Akshaph"), ("KJB", "Achshaph")]),
    ("city (=Ketiv. Qere, KJV, NIV= Ai)", &[("ESV", "\"city\""), ("Ketiv", "\"city\""), ("Qere", "Ai"), ("NIV", "Ai"), ("KJB", "Ai")]),
    ("Bajith (ESV, NIV= temple)", &[("ESV", "\"temple\""), ("NIV", "\"temple\""), ("KJB", "Bajith")]),
    ("Beth-merchak (ESV= the last house; KJV= a place that was far off; NIV= the edge of the city)", &[("ESV", "\"the last house\""), ("NIV", "\"the edge of the city\""), ("KJB", "\"a place that was far off\"")]),
    ("Chephar/-ammoni (=Ketiv. Qere= Chephar-ammonah; KJV= Chephar-haammonai; NIV= Kephar Ammoni)", &[("ESV", "Chephar-ammoni"), ("Qere", "Chephar-ammonah"), ("NIV", "Kephar Ammoni"), ("KJB", "Chephar-haammonai")]),
    ("Geruth/ Chimham (=Qere. Ketiv= Geruth like.them; KJV= habitation of Chimham; NIV= Geruth Kimham)", &[("ESV", "Geruth Chimham"), ("Ketiv", "Geruth like them"), ("NIV", "Geruth Kimham"), ("KJB", "habitation of Chimham")]),
    ("Great( Sea) (=Qere. Ketiv= border; KJV= the great sea; NIV= Mediterranean Sea)", &[("ESV", "Great (Sea)"), ("Qere", "Great (Sea)"), ("Ketiv", "\"border\""), ("NIV", "Mediterranean Sea"), ("KJB", "the great sea")]),
    ("Jaan (ESV= Dan they went)", &[("ESV", "Dan they went"), ("NIV", "Jaan"), ("KJB", "Jaan")]),
    ("Tamar (=Ketiv. Qere, KJV, NIV= Tadmor)", &[("ESV", "Tamar"), ("Ketiv", "Tamar"), ("Qere", "Tadmor"), ("NIV", "Tadmor"), ("KJB", "Tadmor")]),
    ("Zaanannim (=Qere. Ketiv, KJV= Zaanaim)", &[("ESV", "Zaanannim"), ("NIV", "Zaanannim"), ("Ketiv", "Zaanaim"), ("KJB", "Zaanaim")]),
    ("Zaphon (KJV, ESV= north)", &[("ESV", "\"north\""), ("NIV", "Zaphon"), ("KJB", "\"north\"")]),
    ("Gentiles (ESV, NIV= nations)", &[("ESV", "\"nations\""), ("NIV", "\"nations\""), ("KJB", "Gentiles")]),
    ("Gentiles (ESV, NIV= pagans)", &[("ESV", "\"pagans\""), ("NIV", "\"pagans\""), ("KJB", "Gentiles")]),
    ("Gentiles (ESV, NIV= people)", &[("ESV", "\"people\""), ("NIV", "\"people\""), ("KJB", "Gentiles")]),
    ("Gentiles (ESV, NIV= peoples)", &[("ESV", "\"peoples\""), ("NIV", "\"peoples\""), ("KJB", "Gentiles")]),
    ("Gentiles (ESV= peoples; KJV= heathen)", &[("ESV", "\"peoples\""), ("NIV", "Gentiles"), ("KJB", "\"heathen\"")]),
    ("Gentiles (ESV= nations)", &[("ESV", "\"nations\""), ("NIV", "Gentiles"), ("KJB", "Gentiles")]),
    ("Peor (ESV, NIV= Baal of Peor)", &[("ESV", "Baal of Peor"), ("NIV", "Baal of Peor"), ("KJB", "Peor")]),
];

type Build = fn(&Captures) -> Vec<(&'static str, String)>;

fn cap(c: &Captures, i: usize) -> String {
    c.get(i).map_or_else(String::new, |m| m.as_str().to_string())
}

/// Ordered general patterns; the first match wins
static RULES: Lazy<Vec<(Regex, Build)>> = Lazy::new(|| {
    let rules: [(&str, Build); 11] = [
        (r"^(.+) \(ESV, NIV= \[ \]\)$", |c| {
            vec![("ESV", String::new()), ("NIV", String::new()), ("KJB", cap(c, 1))]
        }),
        (r"^(.+) \(=Var, KJV\)$", |c| {
            let variant = format!("{} (variant)", cap(c, 1));
            vec![("ESV", variant.clone()), ("NIV", variant), ("KJB", cap(c, 1))]
        }),
        (r"^(.+?) \(Var, KJV= (.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 1)), ("variant", cap(c, 2)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) \(Var, KJV, NIV= (.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("variant", cap(c, 2)), ("NIV", cap(c, 2)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) \(=Qere, KJV= (.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 1)), ("Qere", cap(c, 1)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) \(=Ketiv\. Qere, KJV= (.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 1)), ("Ketiv", cap(c, 1)), ("Qere", cap(c, 2)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) ?\(KJV, NIV= ?(.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 2)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) ?\(KJV= ?(.+?)[;,] NIV= ?(.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 3)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) \(NIV= ?(.+?); KJV= ?(.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 2)), ("KJB", cap(c, 3))]
        }),
        (r"^(.+?) ?\(KJV= ?(.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 1)), ("KJB", cap(c, 2))]
        }),
        (r"^(.+?) ?\(NIV= ?(.+)\)$", |c| {
            vec![("ESV", cap(c, 1)), ("NIV", cap(c, 2)), ("KJB", cap(c, 1))]
        }),
    ];
    rules
        .into_iter()
        .map(|(pattern, build)| (Regex::new(pattern).unwrap(), build))
        .collect()
});

/// Fix known typos before matching
fn normalize(raw: &str) -> String {
    let mut text = raw.replace("JKV", "KJV");
    while text.contains("  ") {
        text = text.replace("  ", " ");
    }
    if text == "Put (KJV=Phut" {
        text.push(')');
    }
    text.replace("(Mount )Baalah", "(Mount) Baalah")
}

fn collect<'a, I>(pairs: I) -> Translations
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Parse one annotation. Empty cells and `[ ]` mean no translations.
pub fn parse_translations(raw: &str) -> Result<Option<Translations>, TranslationError> {
    if raw.is_empty() || raw == "[ ]" {
        return Ok(None);
    }
    let text = normalize(raw);

    if let Some((_, pairs)) = SPECIAL_CASES.iter().find(|(key, _)| *key == text) {
        return Ok(Some(collect(pairs.iter().map(|(k, v)| (*k, v.to_string())))));
    }

    for (pattern, build) in RULES.iter() {
        if let Some(caps) = pattern.captures(&text) {
            return Ok(Some(collect(build(&caps))));
        }
    }

    if !["ESV", "NIV", "KJV"].iter().any(|v| text.contains(v)) {
        return Ok(Some(collect(
            ["ESV", "NIV", "KJB"].into_iter().map(|k| (k, text.clone())),
        )));
    }

    Err(TranslationError(raw.to_string()))
}
