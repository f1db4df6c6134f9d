use crate::form::aggregate::{write_sum_row, write_total_and_mean};
use crate::form::columns::{self, Column, COLUMN_COUNT};
use crate::form::grid::TemplateGrid;
use crate::form::layout::{self, template_row, Decade};
use crate::types::cell::CellValue;
use crate::types::observation::{DayReadings, Hour, RawObservationRow};
use crate::types::period::YearMonth;
use crate::types::station::StationMetadata;
use crate::types::station_name::normalize_station_name;
use log::{debug, info, warn};
use serde_json::{Map, Value};

/// A generated climatological form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledForm {
    /// Normalized station name.
    pub station: String,
    pub period: YearMonth,
    pub grid: TemplateGrid,
    /// Grid rows that received a day of observations, in day order.
    pub data_rows: Vec<usize>,
}

impl FilledForm {
    pub fn day_rows(&self) -> &[usize] {
        &self.data_rows
    }

    /// Number of days that had a full set of three readings.
    pub fn days_filled(&self) -> usize {
        self.data_rows.len()
    }

    /// One JSON object per grid row, keyed `"0"`..`"48"`. Empty cells are `""`, the
    /// way the dashboard table expects them.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.grid
            .rows()
            .map(|row| {
                (0..COLUMN_COUNT)
                    .map(|i| {
                        let value = match row.get(i).and_then(Option::as_ref) {
                            Some(CellValue::Number(n)) => serde_json::Number::from_f64(*n)
                                .map(Value::Number)
                                .unwrap_or(Value::Null),
                            Some(CellValue::Text(s)) => Value::String(s.clone()),
                            None => Value::String(String::new()),
                        };
                        (i.to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

fn mean_of_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn hourly(readings: &DayReadings<'_>, field: impl Fn(&RawObservationRow) -> Option<f64>) -> [Option<f64>; 3] {
    Hour::ALL.map(|hour| field(readings.at(hour)))
}

fn write_header(
    grid: &mut TemplateGrid,
    station: &str,
    period: YearMonth,
    metadata: Option<&StationMetadata>,
) {
    let (row, col) = layout::STATION_CELL;
    grid.set_text(row, col, station);
    let (row, col) = layout::MONTH_CELL;
    grid.set_text(row, col, period.name());
    let (row, col) = layout::YEAR_CELL;
    grid.set(row, col, Some(CellValue::Number(f64::from(period.year()))));

    let Some(meta) = metadata else {
        return;
    };
    let mut put = |(row, col): layout::HeaderCell, value: Option<CellValue>| {
        if value.is_some() {
            grid.set(row, col, value);
        }
    };
    put(layout::LATITUDE_CELL, meta.latitude.clone());
    put(layout::LONGITUDE_CELL, meta.longitude.clone());
    put(layout::ALTITUDE_CELL, meta.altitude.clone());
    put(layout::DEPARTMENT_CELL, meta.department.as_deref().and_then(CellValue::text));
    put(layout::PROVINCE_CELL, meta.province.as_deref().and_then(CellValue::text));
    put(layout::DISTRICT_CELL, meta.district.as_deref().and_then(CellValue::text));
}

fn write_day(grid: &mut TemplateGrid, row: usize, readings: &DayReadings<'_>) {
    let morning = readings.at(Hour::H7);
    let evening = readings.at(Hour::H19);

    let tmax = evening.max_temperature;
    let tmin = morning.min_temperature;
    grid.set_number(row, columns::TMAX, tmax);
    grid.set_number(row, columns::TMIN, tmin);
    let extremes_mean = tmax.zip(tmin).map(|(max, min)| (max + min) / 2.0);
    grid.set_number(row, columns::TEMPERATURE_MEAN, extremes_mean);

    let dry = hourly(readings, |r| r.dry_bulb);
    let wet = hourly(readings, |r| r.wet_bulb);
    let speed = hourly(readings, |r| r.wind_speed);
    for hour in Hour::ALL {
        let reading = readings.at(hour);
        let i = hour.index();
        grid.set_number(row, columns::DRY_BULB.at(hour), dry[i]);
        grid.set_number(row, columns::WET_BULB.at(hour), wet[i]);
        grid.set(row, columns::WIND_DIRECTION.at(hour), reading.wind_direction.clone());
        grid.set_number(row, columns::WIND_SPEED.at(hour), speed[i]);
        grid.set_number(row, columns::CLOUD_COVER.at(hour), reading.total_cloud_cover());
        grid.set_number(row, columns::VISIBILITY.at(hour), reading.visibility);

        let clouds = columns::CLOUD_DETAIL.at(hour);
        grid.set(row, clouds.low_form, reading.low_clouds.form.clone());
        grid.set_number(row, clouds.low_amount, reading.low_clouds.amount);
        grid.set(row, clouds.low_height, reading.low_cloud_height.clone());
        grid.set(row, clouds.mid_form, reading.mid_clouds.form.clone());
        grid.set_number(row, clouds.mid_amount, reading.mid_clouds.amount);
        grid.set(row, clouds.high_form, reading.high_clouds.form.clone());
        grid.set_number(row, clouds.high_amount, reading.high_clouds.amount);
    }
    grid.set_number(row, columns::DRY_BULB_MEAN, mean_of_present(&dry));
    grid.set_number(row, columns::WET_BULB_MEAN, mean_of_present(&wet));
    grid.set_number(row, columns::WIND_SPEED_MEAN, mean_of_present(&speed));

    grid.set_number(row, columns::PRECIPITATION_7H, morning.precipitation);
    grid.set_number(row, columns::PRECIPITATION_19H, evening.precipitation);
}

/// Fills the form for one station-month.
///
/// `template` is the grid read from the template workbook; it is consumed and
/// returned filled. Days are taken from `rows` three at a time (7h, 13h, 19h).
/// Processing stops at the first day with fewer than three rows left, and the
/// remaining days of the month stay empty. Missing values never abort
/// generation: they leave their cells, and anything derived from them, empty.
pub fn generate(
    template: TemplateGrid,
    station: &str,
    period: YearMonth,
    rows: &[RawObservationRow],
    metadata: Option<&StationMetadata>,
) -> FilledForm {
    let station = normalize_station_name(station);
    let days_in_month = period.days_in_month();
    let mut grid = template;
    write_header(&mut grid, &station, period, metadata);

    let mut data_rows = Vec::with_capacity(days_in_month as usize);
    let mut days = Vec::with_capacity(days_in_month as usize);
    for day in 1..=days_in_month {
        let Some(readings) = DayReadings::for_day(rows, day) else {
            warn!(
                "Observations for {} {} stop before day {} ({} rows)",
                station,
                period,
                day,
                rows.len()
            );
            break;
        };
        let row = template_row(day);
        debug!("Day {} -> row {}", day, row);
        write_day(&mut grid, row, &readings);
        data_rows.push(row);
        days.push(readings);
    }

    // The day's total runs from 19h to 7h of the next morning, so it needs the next
    // day's readings; the last day of the month never has one.
    for pair in days.windows(2) {
        let (today, tomorrow) = (&pair[0], &pair[1]);
        let evening = today.at(Hour::H19).precipitation;
        let next_morning = tomorrow.at(Hour::H7).precipitation;
        let total = evening.zip(next_morning).map(|(a, b)| a + b);
        grid.set_number(template_row(today.day), columns::PRECIPITATION_TOTAL, total);
    }

    for decade in Decade::ALL {
        if !decade.has_sum_row(days_in_month) {
            continue;
        }
        let decade_days = decade.days(days_in_month);
        let source_rows: Vec<usize> = days
            .iter()
            .filter(|d| decade_days.contains(&d.day))
            .map(|d| template_row(d.day))
            .collect();
        write_sum_row(&mut grid, decade.sum_row(), &source_rows);
    }
    write_total_and_mean(&mut grid, &data_rows);

    info!(
        "Generated form for {} {} with {}/{} days",
        station,
        period,
        data_rows.len(),
        days_in_month
    );
    FilledForm {
        station,
        period,
        grid,
        data_rows,
    }
}

/// Grid rows holding a value in `col` among the form's day rows.
pub fn filled_day_count(form: &FilledForm, col: Column) -> usize {
    form.data_rows
        .iter()
        .filter(|&&row| form.grid.number(row, col).is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::columns::*;
    use crate::form::layout::{MEAN_ROW, TOTAL_ROW};
    use crate::types::observation::CloudLayer;

    fn reading(hour: Hour, day: u32) -> RawObservationRow {
        let base = day as f64;
        RawObservationRow {
            dry_bulb: Some(base + hour.index() as f64),
            wet_bulb: Some(base),
            max_temperature: (hour == Hour::H19).then_some(15.0 + base / 10.0),
            min_temperature: (hour == Hour::H7).then_some(-2.0),
            wind_direction: Some(CellValue::from("NE")),
            wind_speed: Some(2.0),
            low_clouds: CloudLayer {
                form: Some(CellValue::from("Cu")),
                amount: Some(3.0),
            },
            low_cloud_height: Some(CellValue::Number(600.0)),
            mid_clouds: CloudLayer {
                form: None,
                amount: Some(6.0),
            },
            high_clouds: CloudLayer::default(),
            visibility: Some(10.0),
            precipitation: match hour {
                Hour::H7 => Some(1.0),
                Hour::H13 => None,
                Hour::H19 => Some(0.5),
            },
        }
    }

    fn month_rows(days: u32) -> Vec<RawObservationRow> {
        (1..=days)
            .flat_map(|d| Hour::ALL.map(|h| reading(h, d)))
            .collect()
    }

    #[test]
    fn test_day_mapping() {
        let period = YearMonth::new(2024, 4).unwrap();
        let form = generate(TemplateGrid::blank(), "Juliaca", period, &month_rows(30), None);
        let g = &form.grid;
        let row = template_row(12);
        assert_eq!(row, 29);

        assert_eq!(g.number(row, TMAX), Some(16.2));
        assert_eq!(g.number(row, TMIN), Some(-2.0));
        assert_eq!(g.number(row, TEMPERATURE_MEAN), Some(7.1));
        assert_eq!(g.number(row, DRY_BULB.at(Hour::H13)), Some(13.0));
        assert_eq!(g.number(row, DRY_BULB_MEAN), Some(13.0));
        assert_eq!(g.get(row, WIND_DIRECTION.at(Hour::H19)), Some(&CellValue::from("NE")));
        assert_eq!(g.number(row, CLOUD_COVER.at(Hour::H7)), Some(8.0));
        assert_eq!(g.number(row, CLOUD_DETAIL.at(Hour::H13).low_height), Some(600.0));
        assert_eq!(g.get(row, CLOUD_DETAIL.at(Hour::H13).mid_form), None);
        assert_eq!(g.number(row, PRECIPITATION_7H), Some(1.0));
        assert_eq!(g.number(row, PRECIPITATION_19H), Some(0.5));
        assert_eq!(g.number(row, PRECIPITATION_TOTAL), Some(1.5));
        assert_eq!(g.number(row, VISIBILITY.at(Hour::H19)), Some(10.0));

        assert_eq!(g.get(layout::STATION_CELL.0, layout::STATION_CELL.1), Some(&CellValue::from("JULIACA")));
        assert_eq!(g.get(layout::MONTH_CELL.0, layout::MONTH_CELL.1), Some(&CellValue::from("ABRIL")));
        assert_eq!(g.number(layout::YEAR_CELL.0, layout::YEAR_CELL.1), Some(2024.0));
    }

    #[test]
    fn test_precipitation_total_needs_both_readings() {
        let period = YearMonth::new(2024, 4).unwrap();
        let mut rows = month_rows(30);
        // Day 5 has no 19h reading, day 8 has no 7h reading.
        rows[4 * 3 + 2].precipitation = None;
        rows[7 * 3].precipitation = None;
        let form = generate(TemplateGrid::blank(), "PUNO", period, &rows, None);
        let g = &form.grid;

        assert_eq!(g.get(template_row(5), PRECIPITATION_TOTAL), None);
        assert_eq!(g.get(template_row(7), PRECIPITATION_TOTAL), None);
        assert_eq!(g.number(template_row(6), PRECIPITATION_TOTAL), Some(1.5));
        // Carries across the decade boundary.
        assert_eq!(g.number(template_row(10), PRECIPITATION_TOTAL), Some(1.5));
        assert_eq!(g.get(template_row(30), PRECIPITATION_TOTAL), None);
    }

    #[test]
    fn test_metadata_header() {
        let meta = StationMetadata {
            station: "JULIACA".into(),
            latitude: Some(CellValue::from("15°28'S")),
            longitude: None,
            altitude: Some(CellValue::Number(3826.0)),
            department: Some("PUNO".into()),
            province: Some("SAN ROMAN".into()),
            district: None,
        };
        let mut template = TemplateGrid::blank();
        template.set_text(layout::DISTRICT_CELL.0, layout::DISTRICT_CELL.1, "template");
        let period = YearMonth::new(2023, 1).unwrap();
        let form = generate(template, "JULIACA", period, &[], Some(&meta));
        let g = &form.grid;

        assert_eq!(g.get(5, Column::new(7)), Some(&CellValue::from("15°28'S")));
        assert_eq!(g.number(7, Column::new(7)), Some(3826.0));
        assert_eq!(g.get(6, Column::new(7)), None);
        assert_eq!(g.get(6, Column::new(12)), Some(&CellValue::from("SAN ROMAN")));
        assert_eq!(g.get(7, Column::new(12)), Some(&CellValue::from("template")));
        assert!(form.data_rows.is_empty());
    }

    #[test]
    fn test_summary_rows_hold_no_text_columns() {
        let period = YearMonth::new(2024, 1).unwrap();
        let form = generate(TemplateGrid::blank(), "PUNO", period, &month_rows(31), None);
        for row in [27, 38, 50, TOTAL_ROW, MEAN_ROW] {
            for col in EXCLUDED {
                assert_eq!(form.grid.get(row, col), None, "row {} col {:?}", row, col);
            }
        }
    }

    #[test]
    fn test_to_records_shape() {
        let period = YearMonth::new(2024, 2).unwrap();
        let form = generate(TemplateGrid::blank(), "PUNO", period, &month_rows(29), None);
        let records = form.to_records();
        assert_eq!(records.len(), 53);
        assert_eq!(records[0].len(), 49);
        assert_eq!(records[27]["0"], Value::String("Suma".into()));
        assert_eq!(records[17]["19"], serde_json::json!(1.0));
        assert_eq!(records[0]["5"], Value::String(String::new()));
        assert_eq!(filled_day_count(&form, TMAX), 29);
    }
}
