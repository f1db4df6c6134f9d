use crate::error::TemplateError;
use crate::form::columns::{Column, COLUMN_COUNT};
use crate::form::grid::TemplateGrid;
use crate::form::layout::ROW_COUNT;
use crate::weather_data::data_loader::cell_value;
use calamine::{Reader, Xlsx};
use log::debug;
use std::io::Cursor;
use std::path::Path;

/// Reads the static content of the form template into a grid.
///
/// Cells are read at absolute sheet positions from A1, whatever the first used
/// cell is, so grid `(r, c)` is sheet cell `(r + 1, c + 1)`.
pub fn load_template(path: &Path, sheet: Option<&str>) -> Result<TemplateGrid, TemplateError> {
    let bytes = std::fs::read(path).map_err(|e| TemplateError::Read(path.to_path_buf(), e))?;
    load_template_bytes(bytes, path, sheet)
}

/// Same as [`load_template`] for a workbook already in memory; `path` is only used in errors.
pub fn load_template_bytes(
    bytes: Vec<u8>,
    path: &Path,
    sheet: Option<&str>,
) -> Result<TemplateGrid, TemplateError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| TemplateError::Workbook(path.to_path_buf(), e))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| TemplateError::MissingWorksheet {
                path: path.to_path_buf(),
                sheet: "<first>".to_string(),
            })?,
    };
    if !workbook.sheet_names().contains(&sheet_name) {
        return Err(TemplateError::MissingWorksheet {
            path: path.to_path_buf(),
            sheet: sheet_name,
        });
    }
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| TemplateError::Workbook(path.to_path_buf(), e))?;

    let mut grid = TemplateGrid::blank();
    for row in 0..ROW_COUNT {
        for index in 0..COLUMN_COUNT {
            let value = range
                .get_value((row as u32, index as u32))
                .and_then(cell_value);
            if let (Some(value), Some(col)) = (value, Column::from_index(index)) {
                grid.preload(row, col, value);
            }
        }
    }
    debug!(
        "Loaded template sheet '{}' with {} filled cells",
        sheet_name,
        grid.filled_cells().count()
    );
    Ok(grid)
}
