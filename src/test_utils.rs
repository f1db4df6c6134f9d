//! Workbook fixtures built in memory for unit tests.

use crate::types::cell::CellValue;
use crate::types::observation::RawObservationRow;
use crate::weather_data::data_extractor::OBSERVATION_COLUMNS;
use std::io::Cursor;

pub(crate) struct SheetFixture {
    name: String,
    rows: Vec<(u32, Vec<CellValue>)>,
}

impl SheetFixture {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    /// Sets a zero-based sheet row starting at column A. Empty strings leave cells blank.
    pub(crate) fn row(mut self, index: u32, values: Vec<CellValue>) -> Self {
        self.rows.push((index, values));
        self
    }
}

pub(crate) fn workbook_bytes(sheets: &[SheetFixture]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for sheet in sheets {
        let worksheet = book.new_sheet(sheet.name.as_str()).unwrap();
        for (row, values) in &sheet.rows {
            for (col, value) in values.iter().enumerate() {
                let coordinate = (col as u32 + 1, row + 1);
                match value {
                    CellValue::Number(n) => {
                        worksheet.get_cell_mut(coordinate).set_value_number(*n);
                    }
                    CellValue::Text(s) if !s.is_empty() => {
                        worksheet.get_cell_mut(coordinate).set_value_string(s.as_str());
                    }
                    CellValue::Text(_) => {}
                }
            }
        }
    }
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).unwrap();
    out.into_inner()
}

fn cell(value: &Option<CellValue>) -> CellValue {
    value.clone().unwrap_or_else(|| CellValue::from(""))
}

fn number(value: Option<f64>) -> CellValue {
    value.map(CellValue::Number).unwrap_or_else(|| CellValue::from(""))
}

/// An observation sheet with the standard headers on row 0 and one row per reading.
pub(crate) fn observation_sheet(name: &str, rows: &[RawObservationRow]) -> SheetFixture {
    let header = OBSERVATION_COLUMNS.iter().map(|h| CellValue::from(*h)).collect();
    let mut sheet = SheetFixture::new(name).row(0, header);
    for (i, r) in rows.iter().enumerate() {
        // Same order as OBSERVATION_COLUMNS.
        let values = vec![
            number(r.dry_bulb),
            number(r.wet_bulb),
            number(r.max_temperature),
            number(r.min_temperature),
            cell(&r.wind_direction),
            number(r.wind_speed),
            cell(&r.low_clouds.form),
            number(r.low_clouds.amount),
            cell(&r.low_cloud_height),
            cell(&r.mid_clouds.form),
            number(r.mid_clouds.amount),
            cell(&r.high_clouds.form),
            number(r.high_clouds.amount),
            number(r.visibility),
            number(r.precipitation),
        ];
        sheet = sheet.row(i as u32 + 1, values);
    }
    sheet
}
