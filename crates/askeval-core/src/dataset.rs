//! Dataset access: column names, byte size and splitting of CSV files
//!
//! Probing never fails. An unreadable dataset yields no columns and an
//! unknown size, which only lowers the scores that depend on them.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EvalError, Result};

/// What the scorers need to know about a turn's dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Path or name recorded in the metrics record
    pub reference: Option<String>,
    pub columns: Vec<String>,
    pub size_bytes: Option<u64>,
}

impl DatasetInfo {
    /// No dataset attached to the turn
    pub fn none() -> Self {
        Self::default()
    }

    /// Columns supplied by the caller, size unknown
    pub fn from_columns(reference: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            columns,
            size_bytes: None,
        }
    }

    /// Read the header row and file size of a CSV file
    pub fn probe(path: &Path) -> Self {
        let reference = Some(path.display().to_string());

        let size_bytes = match fs::metadata(path) {
            Ok(meta) => Some(meta.len()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dataset size unavailable");
                None
            }
        };

        let columns = match read_header(path) {
            Ok(columns) => columns,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dataset columns unavailable");
                Vec::new()
            }
        };

        debug!(path = %path.display(), columns = columns.len(), ?size_bytes, "probed dataset");

        Self {
            reference,
            columns,
            size_bytes,
        }
    }
}

fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)
        .map_err(|e| EvalError::io_operation("open dataset", path.display(), e))?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']).trim_start_matches('\u{feff}');
    Ok(parse_header(line))
}

/// Split one CSV line on commas, honouring double quotes and `""` escapes
pub fn parse_header(line: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Split CSV text after the header into records; quoted fields may span lines
fn records(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                let record = body[start..i].trim_end_matches('\r');
                if !record.is_empty() {
                    out.push(record);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim_end_matches('\r');
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Split a CSV file into `parts` row-contiguous files written next to it as
/// `<stem>_split_<i>.csv`, each repeating the header. The last part takes the
/// remainder. A file with fewer rows than `parts` is returned unsplit.
pub fn split_csv(path: &Path, parts: usize) -> Result<Vec<PathBuf>> {
    if parts == 0 {
        return Err(EvalError::invalid_value("split parts", 0));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| EvalError::io_operation("read dataset", path.display(), e))?;
    let (header, body) = match content.split_once('\n') {
        Some((header, body)) => (header.trim_end_matches('\r'), body),
        None => (content.trim_end_matches('\r'), ""),
    };
    let rows = records(body);

    if rows.len() < parts {
        debug!(rows = rows.len(), parts, "dataset too small to split");
        return Ok(vec![path.to_path_buf()]);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| EvalError::invalid_input(path, "dataset path has no file name"))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let chunk = rows.len() / parts;

    let mut written = Vec::with_capacity(parts);
    for i in 0..parts {
        let start = i * chunk;
        let end = if i + 1 == parts { rows.len() } else { start + chunk };

        let mut out = String::with_capacity(header.len() + 1);
        out.push_str(header);
        out.push('\n');
        for row in &rows[start..end] {
            out.push_str(row);
            out.push('\n');
        }

        let target = dir.join(format!("{}_split_{}.csv", stem, i + 1));
        fs::write(&target, out)
            .map_err(|e| EvalError::io_operation("write split", target.display(), e))?;
        written.push(target);
    }

    debug!(path = %path.display(), parts, rows = rows.len(), "split dataset");
    Ok(written)
}
