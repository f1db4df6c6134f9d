//! SUMA, TOTAL and MEDIA rows.
//!
//! Sums are taken over day rows only, never over other summary rows. Textual
//! columns are left empty, as is any column without a single number in its
//! source rows.

use crate::form::columns::{Column, LABEL};
use crate::form::grid::TemplateGrid;
use crate::form::layout::{MEAN_LABEL, MEAN_ROW, SUM_LABEL, TOTAL_LABEL, TOTAL_ROW};

fn column_values(grid: &TemplateGrid, col: Column, rows: &[usize]) -> Vec<f64> {
    rows.iter().filter_map(|&row| grid.number(row, col)).collect()
}

/// Writes a labelled sum row over `source_rows`.
pub(crate) fn write_sum_row(grid: &mut TemplateGrid, target_row: usize, source_rows: &[usize]) {
    grid.set_text(target_row, LABEL, SUM_LABEL);
    for col in Column::all().filter(|c| c.index() != LABEL.index()) {
        if !col.is_aggregable() {
            grid.set(target_row, col, None);
            continue;
        }
        let values = column_values(grid, col, source_rows);
        let sum = (!values.is_empty()).then(|| values.iter().sum::<f64>());
        grid.set_number(target_row, col, sum);
    }
}

/// Writes the TOTAL and MEDIA rows over the month's day rows.
pub(crate) fn write_total_and_mean(grid: &mut TemplateGrid, day_rows: &[usize]) {
    grid.set_text(TOTAL_ROW, LABEL, TOTAL_LABEL);
    grid.set_text(MEAN_ROW, LABEL, MEAN_LABEL);
    for col in Column::all().filter(|c| c.index() != LABEL.index()) {
        if !col.is_aggregable() {
            grid.set(TOTAL_ROW, col, None);
            grid.set(MEAN_ROW, col, None);
            continue;
        }
        let values = column_values(grid, col, day_rows);
        if values.is_empty() {
            grid.set(TOTAL_ROW, col, None);
            grid.set(MEAN_ROW, col, None);
            continue;
        }
        let total: f64 = values.iter().sum();
        grid.set_number(TOTAL_ROW, col, Some(total));
        grid.set_number(MEAN_ROW, col, Some(total / values.len() as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::columns::{TMAX, TMIN, WIND_DIRECTION};
    use crate::types::cell::CellValue;
    use crate::types::observation::Hour;

    #[test]
    fn test_sum_skips_text_and_empty() {
        let mut grid = TemplateGrid::blank();
        grid.set_number(17, TMAX, Some(15.0));
        grid.set_number(18, TMAX, Some(16.25));
        grid.set_text(17, WIND_DIRECTION.at(Hour::H7), "NE");
        // Stray text in a numeric column is not summed.
        grid.set(19, TMAX, Some(CellValue::from("S/D")));

        write_sum_row(&mut grid, 27, &[17, 18, 19]);
        assert_eq!(grid.number(27, TMAX), Some(31.25));
        assert_eq!(grid.get(27, TMIN), None);
        assert_eq!(grid.get(27, WIND_DIRECTION.at(Hour::H7)), None);
        assert_eq!(grid.get(27, LABEL), Some(&CellValue::from("Suma")));
    }

    #[test]
    fn test_mean_counts_present_values_only() {
        let mut grid = TemplateGrid::blank();
        grid.set_number(17, TMAX, Some(10.0));
        grid.set_number(18, TMAX, Some(11.0));
        grid.set_number(27, TMAX, Some(21.0)); // a SUMA row, not a day row
        grid.set_number(28, TMAX, None);
        grid.set_number(29, TMAX, Some(12.5));

        write_total_and_mean(&mut grid, &[17, 18, 28, 29]);
        assert_eq!(grid.number(TOTAL_ROW, TMAX), Some(33.5));
        assert_eq!(grid.number(MEAN_ROW, TMAX), Some(11.17));
        assert_eq!(grid.get(TOTAL_ROW, LABEL), Some(&CellValue::from("Total")));
        assert_eq!(grid.get(MEAN_ROW, TMIN), None);
    }
}
