/*!
 * Rubric loading.
 *
 * A rubric is a table whose first row is the header. Each following row is one
 * criterion; the criterion label lives in the column named by `RubricSchema`.
 * Rubrics are read from CSV or from the first worksheet of a spreadsheet.
 */

use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::RubricError;

/// Rubric column expectations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RubricSchema {
    /// Header of the column holding criterion labels, matched case-insensitively
    #[serde(default = "default_criterion_column")]
    pub criterion_column: String,
}

fn default_criterion_column() -> String {
    "Criterion".to_string()
}

impl Default for RubricSchema {
    fn default() -> Self {
        Self {
            criterion_column: default_criterion_column(),
        }
    }
}

/// Tabular encoding a rubric was uploaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubricFormat {
    /// Comma separated values
    Csv,
    /// Excel or OpenDocument workbook
    Spreadsheet,
}

impl RubricFormat {
    /// Determine the rubric format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RubricError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(RubricError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A loaded rubric: header plus criterion rows, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    criterion_column: usize,
}

impl Rubric {
    /// Build a rubric from a header row and data rows
    ///
    /// Rows may be ragged; only the criterion column has to be present in the header.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        schema: &RubricSchema,
    ) -> Result<Self, RubricError> {
        if headers.is_empty() {
            return Err(RubricError::Empty);
        }

        let wanted = schema.criterion_column.trim();
        let criterion_column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RubricError::MissingCriterionColumn {
                expected: wanted.to_string(),
                found: headers.join(", "),
            })?;

        Ok(Self {
            headers,
            rows,
            criterion_column,
        })
    }

    /// Load a rubric file, picking the parser from its extension
    pub fn load<P: AsRef<Path>>(path: P, schema: &RubricSchema) -> Result<Self, RubricError> {
        let path = path.as_ref();
        let format = RubricFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;

        let rubric = match format {
            RubricFormat::Csv => Self::from_csv_bytes(&bytes, schema)?,
            RubricFormat::Spreadsheet => Self::from_spreadsheet_bytes(bytes, schema)?,
        };

        debug!(
            "Loaded rubric {:?}: {} columns, {} criteria",
            path,
            rubric.headers.len(),
            rubric.rows.len()
        );
        Ok(rubric)
    }

    /// Parse a CSV rubric
    pub fn from_csv_bytes(bytes: &[u8], schema: &RubricSchema) -> Result<Self, RubricError> {
        Self::from_csv_reader(bytes, schema)
    }

    /// Parse a CSV rubric from any reader
    pub fn from_csv_reader<R: Read>(reader: R, schema: &RubricSchema) -> Result<Self, RubricError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = reader.records();

        let mut headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(RubricError::Empty),
        };

        // Spreadsheet exports often lead with a UTF-8 byte order mark
        if let Some(first) = headers.first_mut() {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        // Blank lines never reach us; a separator-only record like "," is still a row
        let rows = records
            .map(|record| -> Result<Vec<String>, RubricError> {
                Ok(record?.iter().map(str::to_string).collect())
            })
            .collect::<Result<Vec<Vec<String>>, RubricError>>()?;

        Self::new(headers, rows, schema)
    }

    /// Parse the first worksheet of an xlsx/xls/ods workbook
    pub fn from_spreadsheet_bytes(bytes: Vec<u8>, schema: &RubricSchema) -> Result<Self, RubricError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| RubricError::Parse("workbook has no worksheets".to_string()))??;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()));

        let headers = rows.next().ok_or(RubricError::Empty)?;
        let rows: Vec<Vec<String>> = rows.collect();

        Self::new(headers, rows, schema)
    }

    /// Header cells, in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Criterion rows, in file order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of criterion rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the criterion column
    pub fn criterion_column(&self) -> usize {
        self.criterion_column
    }

    /// Criterion labels, verbatim, one per row in order
    pub fn criteria(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(|row| row.get(self.criterion_column).map(String::as_str).unwrap_or(""))
    }

    /// Render the table as aligned plain text, header first
    ///
    /// Each column is right-aligned to its widest cell and columns are
    /// separated by two spaces.
    pub fn render_table(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| {
                (0..columns)
                    .map(|i| {
                        let cell = row.get(i).map(String::as_str).unwrap_or("");
                        format!("{:>width$}", cell, width = widths[i])
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Spreadsheet cell as rubric text; whole numbers drop their ".0"
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
