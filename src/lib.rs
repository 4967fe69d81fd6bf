//! Onomasticon: Bible proper-name dataset normalisation
//!
//! This crate takes third-party Bible reference datasets (Glyssen character
//! and verse control files, the STEPBible TIPNR proper-names list, and the
//! Theographic Bible Data tables) and rewrites each into one identifier space:
//!
//! 1. **Load** -- Read delimited tables or the TIPNR block file into ordered raw rows
//! 2. **Identify** -- Cut a candidate identifier out of each row and number collisions
//!    in first-seen order (`Fred`, `Fred2`, `Fred3`)
//! 3. **Canonicalise** -- Rewrite verse references into the BOS book scheme (`CH2_1:14`)
//! 4. **Resolve** -- Give the bare name of each family to its most referenced member
//! 5. **Prefix** -- Tag each identifier with its category letter (`PFred`, `LJericho`)
//! 6. **Link** -- Rewrite parent, sibling, place and event links to final identifiers
//! 7. **Rebuild** -- Re-key every table by final identifier and merge the main categories
//! 8. **Export** -- JSON snapshots with a metadata envelope, optional XML, verse and name indexes
//!
//! # Architecture
//!
//! - **Declarative datasets** -- Each dataset is a static [`dataset::Dataset`] listing its
//!   categories; the pipeline itself has no dataset-specific branches
//! - **Ordered tables** -- `IndexMap` everywhere row order matters, since numbering and
//!   tie-breaking are defined by file order
//! - **Visible defects** -- Unresolvable links become `<<<ERROR_name_>>>` markers and
//!   unparseable annotations are passed through; structural breakage aborts the run
//!
//! # Key Modules
//!
//! - [`pipeline`] -- Stage orchestration over one dataset
//! - [`loader`] -- Delimited-file ingestion and input discovery
//! - [`parser`] -- TIPNR block reader
//! - [`tipnr`] -- TIPNR record shaping and dataset definition
//! - [`translations`] -- TIPNR translation-annotation matcher
//! - [`glyssen`], [`theographic`] -- Table dataset definitions
//! - [`identity`] -- Identifier extraction and disambiguation
//! - [`verse`] -- Book-code schemes and reference canonicalisation
//! - [`resolve`] -- Best-known-name resolution
//! - [`prefix`] -- Category letters
//! - [`xref`] -- Cross-reference rewriting
//! - [`rebuild`] -- Re-keying and merging
//! - [`check`] -- Post-normalisation consistency checks
//! - [`export`] -- JSON/XML writers and indexes
//! - [`stats`] -- Run counters
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! # Normalise TIPNR found under ../outsideSources/STEPBible/
//! onomasticon -v tipnr
//!
//! # Theographic data from an explicit folder, with XML copies
//! onomasticon theographic --input data/theographic --output out/ --xml
//! ```

pub mod check;
pub mod clean;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod glyssen;
pub mod identity;
pub mod index;
pub mod loader;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prefix;
pub mod rebuild;
pub mod resolve;
pub mod stats;
pub mod theographic;
pub mod tipnr;
pub mod translations;
pub mod verse;
pub mod xref;

pub use error::PipelineError;
pub use pipeline::{run, RunConfig};
