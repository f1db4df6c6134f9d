use crate::weather_data::error::FetchError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanillaError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems with a user selection, raised before anything is fetched.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("A station must be selected")]
    MissingStation,

    #[error("A date must be selected")]
    MissingDate,

    #[error("Invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Cannot compare station '{0}' with itself")]
    SameStation(String),

    #[error("No data found for station '{station}' between {start} and {end}")]
    NoData {
        station: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse template workbook '{0}'")]
    Workbook(PathBuf, #[source] calamine::XlsxError),

    #[error("Failed to open template '{0}' for writing")]
    Spreadsheet(PathBuf, #[source] umya_spreadsheet::XlsxError),

    #[error("Worksheet '{sheet}' not found in template '{path}'")]
    MissingWorksheet { path: PathBuf, sheet: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid merged range '{0}' in template")]
    MergedRange(String),

    #[error("Failed to write workbook")]
    Write(#[source] umya_spreadsheet::XlsxError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),
}
