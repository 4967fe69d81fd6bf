use crate::config::INPUT_PROBE_DEPTH;
use crate::models::{FieldValue, Fields, RawTable};
use crate::stats::PipelineStats;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// How a delimited source file is laid out
#[derive(Debug, Clone, Copy)]
pub struct TableFormat {
    pub delimiter: u8,
    /// Lines before the header row (e.g. a control-file version line)
    pub skip_lines: usize,
}

impl TableFormat {
    pub const TSV: TableFormat = TableFormat {
        delimiter: b'\t',
        skip_lines: 0,
    };
    pub const CSV: TableFormat = TableFormat {
        delimiter: b',',
        skip_lines: 0,
    };
}

/// Look for `file` under `folder`, then under successive `../` parents of it
pub fn locate_input(folder: &Path, file: &str) -> Option<PathBuf> {
    let mut candidates = vec![folder.join(file)];
    let mut up = PathBuf::new();
    for _ in 1..INPUT_PROBE_DEPTH {
        up.push("..");
        candidates.push(up.join(folder).join(file));
    }
    candidates.push(PathBuf::from(file));

    for candidate in candidates {
        debug!(path = %candidate.display(), "Probing for input file");
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Drop the BOM, any leading lines, and the `#` marker on the header row
fn normalize_text(text: &str, skip_lines: usize) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n').skip(skip_lines);
    let mut out = String::with_capacity(text.len());

    if let Some(header) = lines.next() {
        if let Some(rest) = header.strip_prefix("#\t") {
            out.push_str("B\t");
            out.push_str(rest);
        } else if let Some(rest) = header.strip_prefix('#') {
            out.push_str(rest);
        } else {
            out.push_str(header);
        }
    }
    for line in lines {
        out.push_str(line);
    }
    out
}

/// Parse delimited text into ordered rows.
///
/// A row whose field count differs from the header is logged and kept:
/// missing cells become null and surplus cells are dropped.
pub fn parse_delimited(
    name: &str,
    text: &str,
    format: TableFormat,
    stats: &PipelineStats,
) -> Result<RawTable> {
    let normalized = normalize_text(text, format.skip_lines);
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_bytes());

    let column_headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read column headers for {name}"))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (n, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read {name} row {n}"))?;
        if record.len() != column_headers.len() {
            stats.inc_malformed_rows();
            error!(
                table = name,
                row = n,
                found = record.len(),
                expected = column_headers.len(),
                "Row has the wrong number of columns"
            );
        }

        let mut fields = Fields::with_capacity(column_headers.len());
        for (i, header) in column_headers.iter().enumerate() {
            let value = match record.get(i) {
                Some(cell) => FieldValue::Text(cell.to_string()),
                None => FieldValue::Null,
            };
            fields.insert(header.clone(), value);
        }
        rows.push(fields);
    }

    stats.add_rows(rows.len() as u64);
    info!(table = name, rows = rows.len(), columns = column_headers.len(), "Loaded table");

    Ok(RawTable {
        name: name.to_string(),
        column_headers,
        rows,
    })
}

pub fn read_delimited(
    name: &str,
    path: &Path,
    format: TableFormat,
    stats: &PipelineStats,
) -> Result<RawTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {name} table from {}", path.display()))?;
    parse_delimited(name, &text, format, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_bom_and_hash_tab_header() {
        let text = "\u{feff}#\tC\tV\tCharacter\nGEN\t1\t1\tGod\n";
        let table = parse_delimited("verses", text, TableFormat::TSV, &PipelineStats::new()).unwrap();
        assert_eq!(table.column_headers, vec!["B", "C", "V", "Character"]);
        assert_eq!(table.rows[0]["B"], FieldValue::from("GEN"));
        assert_eq!(table.rows[0]["Character"], FieldValue::from("God"));
    }

    #[test]
    fn strips_bare_hash_and_skips_version_line() {
        let text = "Control file version 170\n#Character ID\tMax Speakers\nFred\t1\n";
        let format = TableFormat {
            delimiter: b'\t',
            skip_lines: 1,
        };
        let table = parse_delimited("characters", text, format, &PipelineStats::new()).unwrap();
        assert_eq!(table.column_headers, vec!["Character ID", "Max Speakers"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn short_row_is_kept_with_nulls() {
        let stats = PipelineStats::new();
        let text = "a,b,c\n1,2\n4,5,6\n";
        let table = parse_delimited("t", text, TableFormat::CSV, &stats).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["c"], FieldValue::Null);
        assert_eq!(stats.malformed_rows(), 1);
        assert_eq!(stats.rows(), 2);
    }

    #[test]
    fn preserves_row_order() {
        let text = "Name\nFred\nFred\nJoshua\nFred\n";
        let table = parse_delimited("t", text, TableFormat::TSV, &PipelineStats::new()).unwrap();
        let names: Vec<_> = table
            .rows
            .iter()
            .map(|r| r["Name"].as_text().unwrap())
            .collect();
        assert_eq!(names, vec!["Fred", "Fred", "Joshua", "Fred"]);
    }

    #[test]
    fn locate_finds_file_in_folder() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.tsv"), "a\n").unwrap();
        assert_eq!(
            locate_input(dir.path(), "x.tsv"),
            Some(dir.path().join("x.tsv"))
        );
        assert_eq!(locate_input(dir.path(), "missing.tsv"), None);
    }
}
