use crate::types::cell::CellValue;
use crate::types::station_name::normalize_label;
use crate::weather_data::error::FetchError;
use crate::weather_data::fetch::RemoteStore;
use calamine::{Data, Range, Reader, Xlsx};
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use tokio::task;
use umya_spreadsheet::helper::coordinate::{column_index_from_string, string_from_column_index};

/// Which part of a worksheet becomes a table: the sheet, the columns, where the
/// header sits and how many data rows follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSpec {
    /// Sheet name; the first sheet when `None`.
    pub sheet: Option<String>,
    /// Excel column letters such as `"A,C:F"`; every used column when `None`.
    pub columns: Option<String>,
    /// Zero-based sheet row holding the (first) header row.
    pub header_row: u32,
    /// Number of stacked header rows. With two, the first row is forward-filled and
    /// columns are named `GROUP|SUB`.
    pub header_depth: u32,
    /// Maximum number of data rows below the header.
    pub max_rows: Option<usize>,
}

impl SheetSpec {
    pub fn new(sheet: Option<&str>) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            columns: None,
            header_row: 0,
            header_depth: 1,
            max_rows: None,
        }
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn header_row(mut self, row: u32) -> Self {
        self.header_row = row;
        self
    }

    pub fn header_depth(mut self, depth: u32) -> Self {
        self.header_depth = depth.max(1);
        self
    }

    pub fn max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }
}

/// Downloads workbooks from a [`RemoteStore`] and turns sheet ranges into polars
/// `DataFrame`s.
///
/// Header labels are normalized (upper case, no accents) so extractors can look
/// columns up by their canonical names. A column whose non-empty cells are all
/// numeric becomes `Float64`; any other column becomes `String`.
pub struct WorkbookLoader<S> {
    store: S,
}

impl<S: RemoteStore> WorkbookLoader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches a workbook and parses one sheet of it.
    pub async fn fetch_table(&self, path: &str, spec: &SheetSpec) -> Result<DataFrame, FetchError> {
        let mut tables = self.fetch_tables(path, std::slice::from_ref(spec)).await?;
        tables.pop().ok_or_else(|| FetchError::SheetNotFound {
            path: path.to_string(),
            sheet: spec.sheet.clone().unwrap_or_else(|| "<first>".to_string()),
        })
    }

    /// Fetches a workbook once and parses several sheets of it, in the order given.
    pub async fn fetch_tables(
        &self,
        path: &str,
        specs: &[SheetSpec],
    ) -> Result<Vec<DataFrame>, FetchError> {
        let bytes = self.store.fetch(path).await?;
        let path_owned = path.to_string();
        let specs = specs.to_vec();
        let tables = task::spawn_blocking(move || parse_tables(bytes, &path_owned, &specs)).await??;
        info!("Parsed {} table(s) from {}", tables.len(), path);
        Ok(tables)
    }
}

/// Parses sheets out of in-memory workbook bytes.
pub fn parse_tables(
    bytes: Vec<u8>,
    path: &str,
    specs: &[SheetSpec],
) -> Result<Vec<DataFrame>, FetchError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|source| FetchError::WorkbookOpen {
            path: path.to_string(),
            source,
        })?;
    let sheet_names = workbook.sheet_names();

    specs
        .iter()
        .map(|spec| {
            let sheet = match &spec.sheet {
                Some(wanted) => sheet_names
                    .iter()
                    .find(|name| normalize_label(name) == normalize_label(wanted))
                    .cloned()
                    .ok_or_else(|| FetchError::SheetNotFound {
                        path: path.to_string(),
                        sheet: wanted.clone(),
                    })?,
                None => sheet_names
                    .first()
                    .cloned()
                    .ok_or_else(|| FetchError::SheetNotFound {
                        path: path.to_string(),
                        sheet: "<first>".to_string(),
                    })?,
            };
            let range = workbook
                .worksheet_range(&sheet)
                .map_err(|source| FetchError::WorkbookOpen {
                    path: path.to_string(),
                    source,
                })?;
            range_to_dataframe(&range, spec, path)
        })
        .collect()
}

fn range_to_dataframe(
    range: &Range<Data>,
    spec: &SheetSpec,
    path: &str,
) -> Result<DataFrame, FetchError> {
    let Some((_, end_col)) = range.end() else {
        return Ok(DataFrame::empty());
    };
    let end_row = range.end().map(|(r, _)| r).unwrap_or(0);

    let columns: Vec<u32> = match &spec.columns {
        Some(letters) => parse_column_spec(letters)?,
        None => (0..=end_col).collect(),
    };

    let first_data_row = spec.header_row + spec.header_depth;
    let mut last_data_row = end_row;
    if let Some(max) = spec.max_rows {
        if max == 0 {
            last_data_row = first_data_row.saturating_sub(1);
        } else {
            last_data_row = last_data_row.min(first_data_row + max as u32 - 1);
        }
    }
    debug!(
        "Reading rows {}..={} of {} column(s) from {}",
        first_data_row,
        last_data_row,
        columns.len(),
        path
    );

    let names = header_names(range, spec, &columns);
    let mut frame_columns = Vec::with_capacity(columns.len());
    for (col, name) in columns.iter().zip(names) {
        let cells: Vec<Option<CellValue>> = if first_data_row > last_data_row {
            Vec::new()
        } else {
            (first_data_row..=last_data_row)
                .map(|row| range.get_value((row, *col)).and_then(cell_value))
                .collect()
        };
        frame_columns.push(Column::from(cells_to_series(&name, cells)));
    }

    DataFrame::new(frame_columns).map_err(|source| FetchError::DataFrame {
        path: path.to_string(),
        source,
    })
}

fn header_names(range: &Range<Data>, spec: &SheetSpec, columns: &[u32]) -> Vec<String> {
    let label = |row: u32, col: u32| -> String {
        range
            .get_value((row, col))
            .and_then(cell_value)
            .map(|v| normalize_label(&v.to_string()))
            .unwrap_or_default()
    };

    let mut seen = HashSet::new();
    let mut group = String::new();
    columns
        .iter()
        .map(|&col| {
            let mut name = if spec.header_depth >= 2 {
                let top = label(spec.header_row, col);
                let sub = label(spec.header_row + 1, col);
                if top.is_empty() && sub.is_empty() {
                    String::new()
                } else {
                    if !top.is_empty() {
                        group = top;
                    }
                    format!("{}|{}", group, sub)
                }
            } else {
                label(spec.header_row, col)
            };
            if name.is_empty() {
                name = format!("column_{}", column_letters(col));
            }
            let base = name.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                n += 1;
                name = format!("{}_{}", base, n);
            }
            name
        })
        .collect()
}

fn cells_to_series(name: &str, cells: Vec<Option<CellValue>>) -> Series {
    let all_numeric = cells
        .iter()
        .flatten()
        .all(|cell| matches!(cell, CellValue::Number(_)));
    if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|c| c.as_ref().and_then(CellValue::as_f64)).collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| c.as_ref().map(|v| v.to_string()))
            .collect();
        Series::new(name.into(), values)
    }
}

/// Converts a calamine cell; blank and error cells are absent.
pub(crate) fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::String(s) => CellValue::text(s),
        Data::Bool(b) => Some(CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string())),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Parses `"A,C:F"` into zero-based column indices `[0, 2, 3, 4, 5]`.
pub fn parse_column_spec(spec: &str) -> Result<Vec<u32>, FetchError> {
    let invalid = || FetchError::InvalidColumnSpec(spec.to_string());
    let mut columns = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once(':') {
            Some((start, end)) => {
                let start = column_index(start).ok_or_else(invalid)?;
                let end = column_index(end).ok_or_else(invalid)?;
                if end < start {
                    return Err(invalid());
                }
                columns.extend(start..=end);
            }
            None => columns.push(column_index(part).ok_or_else(invalid)?),
        }
    }
    if columns.is_empty() {
        return Err(invalid());
    }
    Ok(columns)
}

/// Zero-based index of a column given as Excel letters, `None` unless it is one to three letters.
fn column_index(letters: &str) -> Option<u32> {
    let letters = letters.trim();
    let valid = (1..=3).contains(&letters.len()) && letters.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| column_index_from_string(letters.to_ascii_uppercase()) - 1)
}

/// Zero-based column index to Excel letters (`0` → `A`, `27` → `AB`).
pub fn column_letters(index: u32) -> String {
    string_from_column_index(&(index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{workbook_bytes, SheetFixture};

    #[test]
    fn test_parse_column_spec() {
        assert_eq!(parse_column_spec("A,C:F").unwrap(), vec![0, 2, 3, 4, 5]);
        assert_eq!(parse_column_spec("L:N").unwrap(), vec![11, 12, 13]);
        assert_eq!(parse_column_spec("FU").unwrap(), vec![176]);
        assert!(parse_column_spec("F:C").is_err());
        assert!(parse_column_spec("1:3").is_err());
        assert_eq!(parse_column_spec("c:f").unwrap(), vec![2, 3, 4, 5]);
        assert!(parse_column_spec("ABCD").is_err());
        assert!(parse_column_spec("A$").is_err());
        assert!(parse_column_spec("").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(176), "FU");
    }

    #[test]
    fn test_range_to_dataframe_types_and_headers() {
        let sheet = SheetFixture::new("Datos")
            .row(3, vec!["ZONA".into(), "x".into(), "ESTACIÓN".into(), "TMAX".into()])
            .row(4, vec!["NORTE".into(), "".into(), "Azángaro".into(), 17.5.into()])
            .row(5, vec!["".into(), "".into(), "Lampa".into(), "S/D".into()])
            .row(6, vec!["".into(), "".into(), "Putina".into(), 14.0.into()]);
        let bytes = workbook_bytes(&[sheet]);
        let spec = SheetSpec::new(Some("datos")).columns("A,C:D").header_row(3).max_rows(2);
        let df = parse_tables(bytes, "mem.xlsx", &[spec]).unwrap().remove(0);

        assert_eq!(df.height(), 2);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["ZONA", "ESTACION", "TMAX"]);
        // "S/D" makes TMAX a text column
        assert_eq!(df.column("TMAX").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("ZONA").unwrap().str().unwrap().get(1), None);
    }

    #[test]
    fn test_two_header_rows_forward_fill() {
        let sheet = SheetFixture::new("METEO")
            .row(0, vec!["TMAX".into(), "".into(), "PP".into()])
            .row(1, vec!["ARAPA".into(), "AYAVIRI".into(), "ARAPA".into()])
            .row(2, vec![15.0.into(), 16.0.into(), 2.5.into()]);
        let bytes = workbook_bytes(&[sheet]);
        let spec = SheetSpec::new(Some("METEO")).header_depth(2);
        let df = parse_tables(bytes, "mem.xlsx", &[spec]).unwrap().remove(0);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["TMAX|ARAPA", "TMAX|AYAVIRI", "PP|ARAPA"]);
        assert_eq!(df.column("PP|ARAPA").unwrap().f64().unwrap().get(0), Some(2.5));
    }

    #[test]
    fn test_missing_sheet() {
        let bytes = workbook_bytes(&[SheetFixture::new("Sheet1").row(0, vec!["A".into()])]);
        let err = parse_tables(bytes, "mem.xlsx", &[SheetSpec::new(Some("TMAX"))]).unwrap_err();
        assert!(matches!(err, FetchError::SheetNotFound { .. }));
    }

    #[test]
    fn test_garbage_bytes() {
        let err = parse_tables(vec![0, 1, 2], "x.xlsx", &[SheetSpec::new(None)]).unwrap_err();
        assert!(matches!(err, FetchError::WorkbookOpen { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
