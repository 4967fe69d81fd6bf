//! Block reader for the TIPNR proper-names file.
//!
//! The file is a spreadsheet export where every line has exactly 13 tab
//! separated cells. Records come in blocks:
//!
//! ```text
//! $========== PERSON(s)
//! Aaron@Exo.4.14=H0175    Description    Amram@Exo.6.18 + Jochebed@Exo.6.20    ...
//! - Named    Aaron@Exo.4.14    H0175«H0175=אַהֲרֹן    Aaron    ...
//! ```
//!
//! The first line after the sentinel is the record header and every following
//! line is one name variant, until the next `$=====` line or a line with an
//! empty first cell. Everything outside a block is kept as preamble text.

use crate::config::{PROGRESS_INTERVAL, TIPNR_COLUMNS};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const END_OF_DATA: &str = "ANNOTATED EXAMPLES";
const BLOCK_BREAK: &str = "$=====";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Person,
    Place,
    Other,
}

impl BlockKind {
    fn from_sentinel(line: &str) -> Option<Self> {
        match line.trim_end_matches('\t') {
            "$========== PERSON(s)" => Some(BlockKind::Person),
            "$========== PLACE" => Some(BlockKind::Place),
            "$========== OTHER" => Some(BlockKind::Other),
            _ => None,
        }
    }

    /// First header cell of the column-description block that opens each section
    fn heading(self) -> &'static str {
        match self {
            BlockKind::Person => "UnifiedName=uStrong",
            BlockKind::Place | BlockKind::Other => "UniqueName=uStrong",
        }
    }
}

/// One record: its header cells and one cell row per name variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub kind: BlockKind,
    /// One-based line number of the header line
    pub line: usize,
    pub header: Vec<String>,
    pub names: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct ProperNamesFile {
    pub blocks: Vec<RawBlock>,
    pub preamble: Vec<String>,
}

impl ProperNamesFile {
    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }
}

enum State {
    Outside,
    Header(BlockKind),
    Names(RawBlock),
}

fn cells(line: &str, number: usize) -> Result<Vec<String>, PipelineError> {
    let cells: Vec<String> = line.split('\t').map(str::to_string).collect();
    if cells.len() != TIPNR_COLUMNS {
        return Err(PipelineError::ColumnCount {
            line: number,
            expected: TIPNR_COLUMNS,
            found: cells.len(),
        });
    }
    Ok(cells)
}

fn finish(block: RawBlock, file: &mut ProperNamesFile) {
    if block.header[0] == block.kind.heading() {
        debug!(line = block.line, kind = ?block.kind, "Skipping column heading block");
    } else {
        file.blocks.push(block);
    }
}

/// Split the file into record blocks and preamble lines
pub fn parse_proper_names(text: &str, pb: &ProgressBar) -> Result<ProperNamesFile, PipelineError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut file = ProperNamesFile::default();
    let mut state = State::Outside;
    let mut lines_read = 0;

    for (ix, line) in text.lines().enumerate() {
        let number = ix + 1;
        lines_read = number;
        if number % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("Reading proper names ... {number} lines"));
        }
        if line.starts_with(END_OF_DATA) {
            break;
        }

        let ends_block = line.starts_with(BLOCK_BREAK) || line.starts_with('\t');
        if ends_block && matches!(state, State::Names(_)) {
            if let State::Names(block) = std::mem::replace(&mut state, State::Outside) {
                finish(block, &mut file);
            }
        }

        state = match state {
            State::Header(kind) => State::Names(RawBlock {
                kind,
                line: number,
                header: cells(line, number)?,
                names: Vec::new(),
            }),
            State::Names(mut block) => {
                block.names.push(cells(line, number)?);
                State::Names(block)
            }
            State::Outside => match BlockKind::from_sentinel(line) {
                Some(kind) => State::Header(kind),
                None => {
                    let note = line.trim_end_matches('\t');
                    if !note.trim().is_empty() {
                        file.preamble.push(note.to_string());
                    }
                    State::Outside
                }
            },
        };
    }

    if let State::Names(block) = state {
        finish(block, &mut file);
    }

    info!(
        lines = lines_read,
        people = file.count(BlockKind::Person),
        places = file.count(BlockKind::Place),
        others = file.count(BlockKind::Other),
        preamble = file.preamble.len(),
        "Read proper-names blocks"
    );
    Ok(file)
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

pub fn read_proper_names(path: &Path) -> Result<ProperNamesFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read proper names from {}", path.display()))?;

    let pb = make_spinner("Reading proper names ...");
    let parsed = parse_proper_names(&text, &pb);
    pb.finish_and_clear();

    parsed.with_context(|| format!("Malformed proper-names file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let mut all: Vec<&str> = cells.to_vec();
        all.resize(TIPNR_COLUMNS, "");
        all.join("\t")
    }

    fn sentinel(kind: &str) -> String {
        format!("$========== {kind}{}", "\t".repeat(TIPNR_COLUMNS - 1))
    }

    fn sample() -> String {
        [
            "TIPNR header text".to_string(),
            sentinel("PERSON(s)"),
            row(&["UnifiedName=uStrong", "Description"]),
            row(&["Significance", "UniqueName"]),
            sentinel("PERSON(s)"),
            row(&["Aaron@Exo.4.14=H0175", "brother of Moses", "Amram@Exo.6.18 + Jochebed@Exo.6.20"]),
            row(&["- Named", "Aaron@Exo.4.14", "H0175«H0175=אַהֲרֹן", "Aaron", "Exo.4.14", "Exo.4.14; Exo.4.27"]),
            row(&[]),
            sentinel("PLACE"),
            row(&["Bethel@Gen.12.8=H1008", "Bethel"]),
            row(&["- Named", "Bethel@Gen.12.8", "H1008«H1008=בֵּית־אֵל", "Bethel", "Gen.12.8", "Gen.12.8"]),
            row(&["- Named", "Luz@Gen.28.19", "H3870«H3870=לוּז", "Luz", "Gen.28.19", "Gen.28.19"]),
            "ANNOTATED EXAMPLES".to_string(),
            sentinel("OTHER"),
            row(&["Ignored@Gen.1.1=H0001"]),
        ]
        .join("\n")
    }

    #[test]
    fn reads_blocks_and_skips_headings() {
        let file = parse_proper_names(&sample(), &ProgressBar::hidden()).unwrap();
        assert_eq!(file.blocks.len(), 2);

        let aaron = &file.blocks[0];
        assert_eq!(aaron.kind, BlockKind::Person);
        assert_eq!(aaron.header[0], "Aaron@Exo.4.14=H0175");
        assert_eq!(aaron.names.len(), 1);
        assert_eq!(aaron.line, 6);

        let bethel = &file.blocks[1];
        assert_eq!(bethel.kind, BlockKind::Place);
        assert_eq!(bethel.names.len(), 2);
        assert_eq!(bethel.names[1][1], "Luz@Gen.28.19");
    }

    #[test]
    fn stops_at_annotated_examples() {
        let file = parse_proper_names(&sample(), &ProgressBar::hidden()).unwrap();
        assert_eq!(file.count(BlockKind::Other), 0);
    }

    #[test]
    fn keeps_preamble_lines() {
        let file = parse_proper_names(&sample(), &ProgressBar::hidden()).unwrap();
        assert_eq!(file.preamble, vec!["TIPNR header text".to_string()]);
    }

    #[test]
    fn wrong_column_count_is_fatal() {
        let text = [sentinel("OTHER"), "Herodian@Mat.22.16\tparty".to_string()].join("\n");
        let err = parse_proper_names(&text, &ProgressBar::hidden()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ColumnCount {
                line: 2,
                expected: TIPNR_COLUMNS,
                found: 2
            }
        );
    }
}
