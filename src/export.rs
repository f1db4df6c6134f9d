//! Writes a filled form into the formatting-preserving template workbook.

use crate::error::{ExportError, TemplateError};
use crate::form::generator::FilledForm;
use crate::types::cell::CellValue;
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{reader, writer, Range, Spreadsheet, Worksheet};

/// An exported form, ready to be saved or sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedForm {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `Planilla_<station>_<MonthName>_<year>.xlsx`
pub fn export_filename(form: &FilledForm) -> String {
    format!(
        "Planilla_{}_{}_{}.xlsx",
        form.station,
        form.period.name(),
        form.period.year()
    )
}

/// A merged region in 1-based sheet coordinates, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MergedRegion {
    first_col: u32,
    first_row: u32,
    last_col: u32,
    last_row: u32,
}

impl MergedRegion {
    /// Bounds of a merge range. A single-cell range has no end; whole-row or
    /// whole-column ranges are rejected.
    fn from_range(range: &Range) -> Result<Self, ExportError> {
        let invalid = || ExportError::MergedRange(range.get_range());
        let first_col = *range.get_coordinate_start_col().ok_or_else(invalid)?.get_num();
        let first_row = *range.get_coordinate_start_row().ok_or_else(invalid)?.get_num();
        let last_col = range
            .get_coordinate_end_col()
            .map_or(first_col, |c| *c.get_num());
        let last_row = range
            .get_coordinate_end_row()
            .map_or(first_row, |r| *r.get_num());
        Ok(Self {
            first_col: first_col.min(last_col),
            first_row: first_row.min(last_row),
            last_col: first_col.max(last_col),
            last_row: first_row.max(last_row),
        })
    }

    fn contains(&self, col: u32, row: u32) -> bool {
        (self.first_col..=self.last_col).contains(&col)
            && (self.first_row..=self.last_row).contains(&row)
    }

    fn is_anchor(&self, col: u32, row: u32) -> bool {
        col == self.first_col && row == self.first_row
    }
}

fn worksheet_mut<'a>(
    book: &'a mut Spreadsheet,
    path: &Path,
    sheet: Option<&str>,
) -> Result<&'a mut Worksheet, TemplateError> {
    let missing = || TemplateError::MissingWorksheet {
        path: path.to_path_buf(),
        sheet: sheet.unwrap_or("<first>").to_string(),
    };
    match sheet {
        Some(name) => book.get_sheet_by_name_mut(name).ok_or_else(missing),
        None => book.get_sheet_mut(&0).ok_or_else(missing),
    }
}

/// Copies the cells generation set, grid `(r, c)` into sheet cell `(r + 1, c + 1)`,
/// skipping cells covered by a merged region other than its top-left anchor.
/// Cells that came from the template are left as they are in the workbook.
/// Returns the number of cells written.
fn write_grid(worksheet: &mut Worksheet, form: &FilledForm) -> Result<usize, ExportError> {
    let merged = worksheet
        .get_merge_cells()
        .iter()
        .map(MergedRegion::from_range)
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = 0;
    for (row, col, value) in form.grid.written_cells() {
        let sheet_col = col.index() as u32 + 1;
        let sheet_row = row as u32 + 1;
        let covered = merged
            .iter()
            .any(|m| m.contains(sheet_col, sheet_row) && !m.is_anchor(sheet_col, sheet_row));
        if covered {
            debug!("Skipping merged cell ({}, {})", sheet_row, sheet_col);
            continue;
        }
        let cell = worksheet.get_cell_mut((sheet_col, sheet_row));
        match value {
            CellValue::Number(n) => {
                cell.set_value_number(*n);
            }
            CellValue::Text(s) => {
                cell.set_value_string(s.as_str());
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Exports `form` into a copy of the template at `template_path`. The template on
/// disk is never modified.
pub fn export_form(
    form: &FilledForm,
    template_path: &Path,
    sheet: Option<&str>,
) -> Result<ExportedForm, ExportError> {
    let bytes = std::fs::read(template_path)
        .map_err(|e| TemplateError::Read(template_path.to_path_buf(), e))?;
    export_form_bytes(form, &bytes, template_path, sheet)
}

/// Same as [`export_form`] with the template already in memory; `template_path`
/// only labels errors.
pub fn export_form_bytes(
    form: &FilledForm,
    template: &[u8],
    template_path: &Path,
    sheet: Option<&str>,
) -> Result<ExportedForm, ExportError> {
    let mut book = reader::xlsx::read_reader(Cursor::new(template), true)
        .map_err(|e| TemplateError::Spreadsheet(template_path.to_path_buf(), e))?;
    let worksheet = worksheet_mut(&mut book, template_path, sheet)?;
    let written = write_grid(worksheet, form)?;

    let mut out = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut out).map_err(ExportError::Write)?;
    let exported = ExportedForm {
        filename: export_filename(form),
        bytes: out.into_inner(),
    };
    info!(
        "Exported {} ({} cells, {} bytes)",
        exported.filename,
        written,
        exported.bytes.len()
    );
    Ok(exported)
}
