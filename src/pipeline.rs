//! One normalisation run over one dataset.
//!
//! The [`Pipeline`] owns every category table for the whole run and takes
//! them through the stages in a fixed order: load, identify, re-key, type and
//! canonicalise, resolve best-known names, prefix, rewrite cross references,
//! re-key again, check, and export. Each stage finishes over every category
//! before the next one starts, so a cross reference may point into any
//! category of the same dataset.

use crate::check::{check_identifiers, check_references};
use crate::clean::clean_table;
use crate::dataset::{title_case, CategorySpec, Dataset, Source};
use crate::export::{combine_name_indexes, name_index, Exporter};
use crate::identity::assign_identities;
use crate::index::NameIndex;
use crate::loader::{locate_input, read_delimited};
use crate::models::{CategoryTable, RawTable};
use crate::parser::read_proper_names;
use crate::prefix::prefix_identifiers;
use crate::rebuild::{merge, rekey};
use crate::resolve::{resolve_best_known, trim_family_marker};
use crate::stats::PipelineStats;
use crate::tipnr::{normalise_names, shape_file, UNIFIED_NAME};
use crate::verse::canonicalize_table;
use crate::xref::rewrite_references;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Prepend category letters and produce the merged `All` outputs
    pub prefix: bool,
    /// Also write an XML copy of each normalised table
    pub xml: bool,
    /// Write the `raw_` and `mid_` snapshots
    pub snapshots: bool,
}

pub struct Pipeline<'d> {
    dataset: &'d Dataset,
    tables: IndexMap<String, CategoryTable>,
    /// Free text found outside the records, carried into the XML output
    preamble: Vec<String>,
    stats: PipelineStats,
}

fn spec_for<'d>(dataset: &'d Dataset, category: &str) -> Result<&'d CategorySpec> {
    dataset
        .category(category)
        .with_context(|| format!("{} has no category named {category}", dataset.name))
}

/// Read every category the dataset declares, skipping table files that are absent
fn read_sources(
    dataset: &Dataset,
    config: &RunConfig,
    stats: &PipelineStats,
) -> Result<(Vec<RawTable>, Vec<String>)> {
    match dataset.source {
        Source::Tables(format) => {
            let mut raw = Vec::with_capacity(dataset.categories.len());
            for spec in dataset.categories {
                let Some(path) = locate_input(&config.input_dir, spec.file) else {
                    warn!(
                        category = spec.name,
                        file = spec.file,
                        folder = %config.input_dir.display(),
                        "Input file not found; skipping category"
                    );
                    continue;
                };
                info!(category = spec.name, path = %path.display(), "Loading table");
                raw.push(read_delimited(spec.name, &path, spec.table_format(format), stats)?);
            }
            Ok((raw, Vec::new()))
        }
        Source::ProperNames(file) => {
            let path = locate_input(&config.input_dir, file).with_context(|| {
                format!(
                    "Unable to find {file} in or above {}",
                    config.input_dir.display()
                )
            })?;
            info!(path = %path.display(), "Loading proper names");
            let parsed = read_proper_names(&path)?;
            let raw = shape_file(&parsed, stats)?;
            Ok((raw, parsed.preamble))
        }
    }
}

impl<'d> Pipeline<'d> {
    /// Load and identify every category, writing the raw and mid snapshots on the way
    pub fn load(dataset: &'d Dataset, config: &RunConfig, exporter: &Exporter) -> Result<Self> {
        let stats = PipelineStats::new();
        let (raw_tables, preamble) = read_sources(dataset, config, &stats)?;
        if raw_tables.is_empty() {
            bail!(
                "No {} input found in or above {}",
                dataset.name,
                config.input_dir.display()
            );
        }

        let raw_key = match dataset.source {
            Source::ProperNames(_) => Some(UNIFIED_NAME),
            Source::Tables(_) => None,
        };

        let mut tables = IndexMap::with_capacity(raw_tables.len());
        for mut raw in raw_tables {
            let spec = spec_for(dataset, &raw.name)?;
            clean_table(&mut raw, spec.closed_sets, &stats);
            if config.snapshots {
                exporter.raw(&raw, raw_key)?;
            }

            let mut table =
                assign_identities(raw, spec.id_field, spec.extraction, spec.renames, &stats)?;
            rekey(&mut table)?;
            if config.snapshots {
                exporter.table("mid", &table)?;
            }
            tables.insert(table.name.clone(), table);
        }

        Ok(Self {
            dataset,
            tables,
            preamble,
            stats,
        })
    }

    pub fn tables(&self) -> &IndexMap<String, CategoryTable> {
        &self.tables
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Type conversion, verse canonicalisation, best-known names and prefixes
    pub fn normalise(&mut self, prefix: bool) -> Result<()> {
        let dataset = self.dataset;
        for table in self.tables.values_mut() {
            let spec = spec_for(dataset, &table.name)?;
            spec.convert_fields(table)?;
            if spec.name_variants {
                normalise_names(table);
            }
            canonicalize_table(
                table,
                spec.verse_fields,
                spec.name_variants,
                dataset.verse_scheme,
                &self.stats,
            )?;

            if let Some(popularity) = spec.popularity {
                resolve_best_known(table, popularity, spec.family_limit, &self.stats)?;
            }
            if let Some(marker) = spec.family_marker {
                trim_family_marker(table, marker);
            }
            if prefix {
                if let Some(rule) = spec.prefix {
                    prefix_identifiers(table, rule)?;
                }
            }
        }
        Ok(())
    }

    /// Point every declared link at its final identifier, then re-key by it
    pub fn link(&mut self) -> Result<()> {
        let dataset = self.dataset;
        let mut indexes: FxHashMap<String, NameIndex> = FxHashMap::default();
        for table in self.tables.values() {
            if let Some(key_field) = spec_for(dataset, &table.name)?.name_key {
                indexes.insert(table.name.clone(), NameIndex::build(table, key_field));
            }
        }

        for table in self.tables.values_mut() {
            let spec = spec_for(dataset, &table.name)?;
            if !spec.xrefs.is_empty() {
                rewrite_references(table, spec.xrefs, &indexes, &self.stats);
            }
            rekey(table)?;
        }
        Ok(())
    }

    /// Returns the number of broken links left in the output
    pub fn check(&self, prefix: bool) -> Result<usize> {
        let mut broken = 0;
        for table in self.tables.values() {
            let spec = spec_for(self.dataset, &table.name)?;
            let letters = (prefix && spec.prefix.is_some()).then_some(self.dataset.letters);
            check_identifiers(table, letters)?;
            broken += check_references(table, spec.xrefs, &self.tables)?;
        }
        info!(dataset = self.dataset.name, broken, "Checks passed");
        Ok(broken)
    }

    /// Normalised tables, the merged view, XML copies and indexes
    pub fn export(&self, config: &RunConfig, exporter: &Exporter) -> Result<()> {
        let mut name_indexes = Vec::new();
        for table in self.tables.values() {
            let spec = spec_for(self.dataset, &table.name)?;
            exporter.table("normalised", table)?;
            if config.xml {
                exporter.xml(table, &self.preamble)?;
            }
            let names = name_index(table, spec);
            exporter.indexes(&title_case(&table.name), table.records.values(), names.as_ref())?;
            if spec.merged {
                name_indexes.extend(names);
            }
        }

        if !config.prefix {
            info!("Identifiers are not prefixed; skipping merged outputs");
            return Ok(());
        }
        let merged_tables = self.tables.values().filter(|t| {
            self.dataset
                .category(&t.name)
                .is_some_and(|spec| spec.merged)
        });
        let merged = merge(merged_tables)?;
        exporter.all(&merged)?;
        let all_names = combine_name_indexes(&name_indexes);
        exporter.indexes("All", merged.values().copied(), Some(&all_names))?;
        Ok(())
    }
}

/// Run every stage for `dataset`, returning the run's counters
pub fn run(dataset: &Dataset, config: &RunConfig) -> Result<PipelineStats> {
    let start = Instant::now();
    let exporter = Exporter::new(dataset, &config.output_dir)?;
    info!(
        dataset = dataset.name,
        input = %config.input_dir.display(),
        output = %exporter.dir().display(),
        "Starting normalisation"
    );

    let mut pipeline = Pipeline::load(dataset, config, &exporter)?;
    pipeline.normalise(config.prefix)?;
    pipeline.link()?;
    let broken = pipeline.check(config.prefix)?;
    pipeline.export(config, &exporter)?;

    info!(
        dataset = dataset.name,
        categories = pipeline.tables().len(),
        broken,
        duration_secs = start.elapsed().as_secs_f64(),
        "Normalisation complete"
    );
    Ok(pipeline.stats)
}
