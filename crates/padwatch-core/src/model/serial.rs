// ── Display name → serial number lookup ──
//
// Backed by a CSV export maintained by a separate sync job. Loaded once
// per cycle and never written here; staleness is tolerated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Read-only lookup from a device's display name to its hardware serial.
pub trait SerialLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Error)]
pub enum SerialMapError {
    #[error("cannot read serial map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serial map is empty (expected a `name,serial` header)")]
    Empty,

    #[error("serial map header has no `{column}` column")]
    MissingColumn { column: &'static str },

    #[error("line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

const NAME_HEADERS: &[&str] = &["name", "display_name", "device_name", "device"];
const SERIAL_HEADERS: &[&str] = &["serial", "serial_number", "serialnumber"];

/// In-memory serial map decoded from CSV.
#[derive(Debug, Clone, Default)]
pub struct SerialMap {
    by_name: HashMap<String, String>,
}

impl SerialMap {
    /// Build a map directly from `(name, serial)` pairs.
    pub fn from_pairs<I, N, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            by_name: pairs
                .into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect(),
        }
    }

    /// Load and decode the CSV file at `path`.
    pub fn load(path: &Path) -> Result<Self, SerialMapError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SerialMapError::Io {
            path: path.to_owned(),
            source,
        })?;
        let map = Self::parse(&raw)?;
        debug!(path = %path.display(), entries = map.len(), "loaded serial map");
        Ok(map)
    }

    /// Decode CSV text with a header row naming the name and serial columns.
    ///
    /// Blank lines and lines starting with `#` are skipped. Extra columns
    /// are ignored. A later row for the same name replaces an earlier one.
    pub fn parse(raw: &str) -> Result<Self, SerialMapError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let mut rows = raw
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| {
                let t = line.trim();
                !t.is_empty() && !t.starts_with('#')
            });

        let (header_line, header) = rows.next().ok_or(SerialMapError::Empty)?;
        let header = split_fields(header, header_line)?;
        let name_col = find_column(&header, NAME_HEADERS)
            .ok_or(SerialMapError::MissingColumn { column: "name" })?;
        let serial_col = find_column(&header, SERIAL_HEADERS)
            .ok_or(SerialMapError::MissingColumn { column: "serial" })?;
        let needed = name_col.max(serial_col) + 1;

        let mut by_name = HashMap::new();
        for (line, text) in rows {
            let fields = split_fields(text, line)?;
            if fields.len() < needed {
                return Err(SerialMapError::ShortRow {
                    line,
                    expected: needed,
                    found: fields.len(),
                });
            }
            let name = fields[name_col].trim();
            let serial = fields[serial_col].trim();
            if name.is_empty() {
                return Err(SerialMapError::EmptyField { line, field: "name" });
            }
            if serial.is_empty() {
                return Err(SerialMapError::EmptyField {
                    line,
                    field: "serial",
                });
            }
            if let Some(previous) = by_name.insert(name.to_owned(), serial.to_owned()) {
                warn!(
                    line,
                    name,
                    previous = %previous,
                    serial,
                    "duplicate name in serial map, keeping later row"
                );
            }
        }

        Ok(Self { by_name })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<_> = self
            .by_name
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();
        out.sort_unstable();
        out
    }
}

impl SerialLookup for SerialMap {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }
}

fn find_column(header: &[String], candidates: &[&str]) -> Option<usize> {
    header.iter().position(|h| {
        let h = h.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        candidates.contains(&h.as_str())
    })
}

/// Split one CSV line, honouring double-quoted fields and `""` escapes.
fn split_fields(line: &str, line_no: usize) -> Result<Vec<String>, SerialMapError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    if in_quotes {
        return Err(SerialMapError::UnterminatedQuote { line: line_no });
    }
    fields.push(current);
    Ok(fields)
}
