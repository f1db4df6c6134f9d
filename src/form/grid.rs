use crate::form::columns::{Column, COLUMN_COUNT};
use crate::form::layout::ROW_COUNT;
use crate::types::cell::{round2, CellValue};

/// The 53×49 cell grid of a climatological form.
///
/// A fresh grid is built per generation, pre-populated with the template's static
/// text, then filled in. Absent values are `None`; numbers are stored rounded to
/// two decimals.
///
/// Cells keep track of whether they were set after loading, so an export only
/// touches what generation produced and leaves the template's own cells alone.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateGrid {
    cells: Vec<Option<CellValue>>,
    written: Vec<bool>,
}

impl Default for TemplateGrid {
    fn default() -> Self {
        Self::blank()
    }
}

impl TemplateGrid {
    pub fn blank() -> Self {
        Self {
            cells: vec![None; ROW_COUNT * COLUMN_COUNT],
            written: vec![false; ROW_COUNT * COLUMN_COUNT],
        }
    }

    fn offset(row: usize, col: Column) -> Option<usize> {
        (row < ROW_COUNT).then(|| row * COLUMN_COUNT + col.index())
    }

    pub fn get(&self, row: usize, col: Column) -> Option<&CellValue> {
        Self::offset(row, col).and_then(|i| self.cells[i].as_ref())
    }

    /// Numeric value of a cell; text cells read as `None`.
    pub fn number(&self, row: usize, col: Column) -> Option<f64> {
        self.get(row, col).and_then(CellValue::as_f64)
    }

    /// Writes a cell. Rows outside the grid are ignored.
    pub fn set(&mut self, row: usize, col: Column, value: Option<CellValue>) {
        if let Some(i) = Self::offset(row, col) {
            self.cells[i] = value;
            self.written[i] = true;
        }
    }

    /// Stores a cell read from the template. It is not reported by [`Self::written_cells`].
    pub(crate) fn preload(&mut self, row: usize, col: Column, value: CellValue) {
        if let Some(i) = Self::offset(row, col) {
            self.cells[i] = Some(value);
        }
    }

    pub fn is_written(&self, row: usize, col: Column) -> bool {
        Self::offset(row, col).is_some_and(|i| self.written[i])
    }

    pub fn set_number(&mut self, row: usize, col: Column, value: Option<f64>) {
        self.set(row, col, value.map(|v| CellValue::Number(round2(v))));
    }

    pub fn set_text(&mut self, row: usize, col: Column, value: impl Into<String>) {
        self.set(row, col, CellValue::text(value.into()));
    }

    /// One row of cells, left to right.
    pub fn row(&self, row: usize) -> &[Option<CellValue>] {
        if row >= ROW_COUNT {
            return &[];
        }
        &self.cells[row * COLUMN_COUNT..(row + 1) * COLUMN_COUNT]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<CellValue>]> {
        self.cells.chunks(COLUMN_COUNT)
    }

    /// Every non-empty cell as `(row, column, value)`, row by row.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, Column, &CellValue)> {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            let value = cell.as_ref()?;
            let col = Column::from_index(i % COLUMN_COUNT)?;
            Some((i / COLUMN_COUNT, col, value))
        })
    }

    /// Non-empty cells set since the template was loaded, row by row.
    pub fn written_cells(&self) -> impl Iterator<Item = (usize, Column, &CellValue)> {
        self.filled_cells()
            .filter(|&(row, col, _)| self.written[row * COLUMN_COUNT + col.index()])
    }
}
