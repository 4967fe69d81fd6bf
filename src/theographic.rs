use crate::config::{THEOGRAPHIC_DOWNLOADED, THEOGRAPHIC_FORMAT_VERSION, THEOGRAPHIC_INPUT_FOLDER};
use crate::dataset::{CategorySpec, Dataset, Source};
use crate::identity::ExtractionRule;
use crate::loader::TableFormat;
use crate::prefix::{CategoryLetter, PrefixRule};
use crate::resolve::Popularity;
use crate::verse::BookScheme;
use crate::xref::XrefField;

/// Source columns renamed on load so they cannot be mistaken for our identifiers
const RENAMES: &[(&str, &str)] = &[
    ("personLookup", "TBDPersonLookup"),
    ("personID", "TBDPersonNumber"),
    ("placeLookup", "TBDPlaceLookup"),
    ("placeID", "TBDPlaceNumber"),
    ("ID", "TBDEventNumber"),
];

const VERSES: &[&str] = &["verses"];

const BY_VERSES: Option<Popularity> = Some(Popularity::VerseList {
    list: "verses",
    count: "verseCount",
});

const PEOPLE_LINKS: &[XrefField] = &[
    XrefField::single("father", "people"),
    XrefField::single("mother", "people"),
    XrefField::list("partners", "people"),
    XrefField::list("children", "people"),
    XrefField::list("siblings", "people"),
    XrefField::list("halfSiblingsSameMother", "people"),
    XrefField::list("halfSiblingsSameFather", "people"),
    XrefField::single("birthPlace", "places"),
    XrefField::single("deathPlace", "places"),
    XrefField::list("memberOf", "peopleGroups"),
    XrefField::list("events", "events"),
];

const GROUP_LINKS: &[XrefField] = &[
    XrefField::list("members", "people"),
    XrefField::list("events", "events"),
];

const PLACE_LINKS: &[XrefField] = &[
    XrefField::list("peopleBorn", "people"),
    XrefField::list("peopleDied", "people"),
    XrefField::list("eventsHere", "events"),
];

const EVENT_LINKS: &[XrefField] = &[
    XrefField::list("participants", "people"),
    XrefField::list("locations", "places"),
    XrefField::list("groups", "peopleGroups"),
    XrefField::single("predecessor", "events"),
    XrefField::single("partOf", "events"),
];

const VERSE_LINKS: &[XrefField] = &[
    XrefField::list("people", "people"),
    XrefField::list("places", "places"),
    XrefField::list("peopleGroups", "peopleGroups"),
];

const TABLE: CategorySpec = CategorySpec {
    renames: RENAMES,
    ..CategorySpec::BASE
};

/// Theographic Bible Data: the Airtable grid exports, one CSV per category
pub static THEOGRAPHIC: Dataset = Dataset {
    name: "theographic",
    index_label: "TheographicBibleData",
    default_input: THEOGRAPHIC_INPUT_FOLDER,
    downloaded: THEOGRAPHIC_DOWNLOADED,
    format_version: THEOGRAPHIC_FORMAT_VERSION,
    letters: &[
        CategoryLetter::Person,
        CategoryLetter::Location,
        CategoryLetter::PeopleGroup,
        CategoryLetter::Event,
    ],
    verse_scheme: BookScheme::Osis,
    source: Source::Tables(TableFormat::CSV),
    categories: &[
        CategorySpec {
            name: "books",
            file: "books-Grid view.csv",
            id_field: "osisName",
            list_fields: &["chapters"],
            ..TABLE
        },
        CategorySpec {
            name: "chapters",
            file: "chapters-Grid view.csv",
            id_field: "osisRef",
            extraction: ExtractionRule::OsisRef,
            list_fields: &["verses"],
            verse_fields: VERSES,
            ..TABLE
        },
        CategorySpec {
            name: "verses",
            file: "verses-Grid view.csv",
            id_field: "osisRef",
            extraction: ExtractionRule::OsisRef,
            int_fields: &["peopleCount", "placesCount"],
            list_fields: &["people", "places", "peopleGroups"],
            count_checks: &[("peopleCount", "people"), ("placesCount", "places")],
            xrefs: VERSE_LINKS,
            ..TABLE
        },
        CategorySpec {
            name: "people",
            file: "people-Grid view.csv",
            id_field: "personLookup",
            extraction: ExtractionRule::LookupStem,
            int_fields: &["verseCount"],
            list_fields: &[
                "partners",
                "children",
                "siblings",
                "halfSiblingsSameMother",
                "halfSiblingsSameFather",
                "memberOf",
                "events",
                "verses",
            ],
            count_checks: &[("verseCount", "verses")],
            verse_fields: VERSES,
            popularity: BY_VERSES,
            prefix: Some(PrefixRule::Static(CategoryLetter::Person)),
            name_key: Some("TBDPersonLookup"),
            xrefs: PEOPLE_LINKS,
            merged: true,
            ..TABLE
        },
        CategorySpec {
            name: "peopleGroups",
            file: "peopleGroups-Grid view.csv",
            id_field: "groupName",
            extraction: ExtractionRule::Underscored,
            list_fields: &["members", "events", "verses"],
            verse_fields: VERSES,
            popularity: BY_VERSES,
            prefix: Some(PrefixRule::Static(CategoryLetter::PeopleGroup)),
            name_key: Some("groupName"),
            xrefs: GROUP_LINKS,
            merged: true,
            ..TABLE
        },
        CategorySpec {
            name: "places",
            file: "places-Grid view.csv",
            id_field: "placeLookup",
            extraction: ExtractionRule::LookupStem,
            int_fields: &["verseCount"],
            list_fields: &["peopleBorn", "peopleDied", "eventsHere", "verses"],
            count_checks: &[("verseCount", "verses")],
            verse_fields: VERSES,
            popularity: BY_VERSES,
            prefix: Some(PrefixRule::Static(CategoryLetter::Location)),
            name_key: Some("TBDPlaceLookup"),
            xrefs: PLACE_LINKS,
            merged: true,
            ..TABLE
        },
        CategorySpec {
            name: "periods",
            file: "periods-Grid view.csv",
            id_field: "yearNum",
            list_fields: &["events"],
            ..TABLE
        },
        CategorySpec {
            name: "events",
            file: "events-Grid view.csv",
            id_field: "title",
            extraction: ExtractionRule::Underscored,
            list_fields: &["participants", "locations", "groups", "verses"],
            verse_fields: VERSES,
            popularity: BY_VERSES,
            prefix: Some(PrefixRule::Static(CategoryLetter::Event)),
            name_key: Some("title"),
            xrefs: EVENT_LINKS,
            merged: true,
            ..TABLE
        },
        CategorySpec {
            name: "Easton",
            file: "Easton-Grid view.csv",
            id_field: "dictLookup",
            extraction: ExtractionRule::Underscored,
            ..TABLE
        },
    ],
};
