use std::path::PathBuf;

use thiserror::Error;

/// The source table cannot be mapped onto the survey's columns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected at least {required} columns, found {found}")]
    TooFewColumns { found: usize, required: usize },

    #[error("school column `{name}` not found in header")]
    MissingSchoolColumn { name: String },

    #[error("layout names {found} question columns, expected 20")]
    QuestionCount { found: usize },

    #[error("question {number} column `{name}` not found in header")]
    MissingQuestion { number: usize, name: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported input format: {path} (expected .csv, .xlsx, .xlsm, .xls or .ods)")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read spreadsheet {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {path} has no worksheets")]
    NoWorksheet { path: PathBuf },

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("failed to read template {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("template is missing token [{0}]")]
    MissingToken(&'static str),

    #[error("template contains unknown token [{0}]")]
    UnknownToken(String),

    #[error("token [{inner}] is contained in token [{outer}]")]
    OverlappingTokens {
        inner: &'static str,
        outer: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response contained no candidate text")]
    EmptyResponse,

    #[error("response is not a narrative object: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error writing archive: {0}")]
    Io(#[from] std::io::Error),
}
