use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{FormatError, LoadError};
use crate::layout::MIN_COLUMNS;

/// One source row. Cells keep the header's column order; empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Respondent {
    pub cells: Vec<Option<String>>,
}

impl Respondent {
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    #[cfg(test)]
    pub fn field<'a>(&'a self, table: &SurveyTable, name: &str) -> Option<&'a str> {
        table.column_index(name).and_then(|i| self.cell(i))
    }
}

#[derive(Debug, Clone)]
pub struct SurveyTable {
    pub headers: Vec<String>,
    pub rows: Vec<Respondent>,
}

impl SurveyTable {
    pub fn new(headers: Vec<String>, rows: Vec<Respondent>) -> Result<Self, FormatError> {
        if headers.len() < MIN_COLUMNS {
            return Err(FormatError::TooFewColumns {
                found: headers.len(),
                required: MIN_COLUMNS,
            });
        }
        Ok(Self { headers, rows })
    }

    #[cfg(test)]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Reads a survey export, choosing the decoder from the file extension.
pub fn load_table(path: &Path) -> Result<SurveyTable, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let table = match extension.as_deref() {
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(|e| LoadError::Csv {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            parse_csv(file, path)?
        }
        Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => load_spreadsheet(path)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded survey table"
    );
    Ok(table)
}

pub fn parse_csv<R: Read>(input: R, path: &Path) -> Result<SurveyTable, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let cells = record
            .iter()
            .map(|value| (!value.is_empty()).then(|| value.to_string()))
            .collect();
        rows.push(Respondent { cells });
    }

    Ok(SurveyTable::new(headers, rows)?)
}

fn load_spreadsheet(path: &Path) -> Result<SurveyTable, LoadError> {
    let sheet_err = |source| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(sheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(sheet_err)?;

    // The range begins at the first non-empty cell; columns are counted from A.
    let offset = range.start().map_or(0, |(_, col)| col as usize);
    let padded = |row: &[Data]| -> Vec<Option<String>> {
        std::iter::repeat(None)
            .take(offset)
            .chain(row.iter().map(cell_text))
            .collect()
    };

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|row| padded(row).into_iter().map(Option::unwrap_or_default).collect())
        .unwrap_or_default();

    let rows = sheet_rows
        .map(|row| Respondent {
            cells: padded(row),
        })
        .collect();

    Ok(SurveyTable::new(headers, rows)?)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        other => Some(other.to_string()),
    }
}
