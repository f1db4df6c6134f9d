//! Turns parsed sheets into the typed rows the rest of the crate works with.

use crate::types::cell::CellValue;
use crate::types::data_source::Variable;
use crate::types::normals::NormalsTable;
use crate::types::observation::{CloudLayer, RawObservationRow};
use crate::types::period::month_from_name;
use crate::types::register::{DailyRecord, DailyRegister};
use crate::types::station::{StationDirectory, StationMetadata};
use crate::types::station_name::{normalize_label, normalize_station_name};
use crate::weather_data::error::FetchError;
use chrono::NaiveDate;
use polars::prelude::*;

pub const DRY_BULB: &str = "TEMPERATURA DEL BULBO SECO DIARIO";
pub const WET_BULB: &str = "TEMPERATURA BULBO HUMEDO DIARIA";
pub const MAX_TEMPERATURE: &str = "TEMPERATURA MAXIMA DIARIA";
pub const MIN_TEMPERATURE: &str = "TEMPERATURA MINIMA DIARIA";
pub const WIND_DIRECTION: &str = "DIRECCION VIENTO DIARIA";
pub const WIND_SPEED: &str = "VELOCIDAD DEL VIENTO DIARIO";
pub const LOW_CLOUD_FORM: &str = "FORMA DE NUBES BAJAS DIARIAS";
pub const LOW_CLOUD_AMOUNT: &str = "CANTIDAD DE NUBES BAJAS DIARIAS";
pub const LOW_CLOUD_HEIGHT: &str = "ALTURA DE NUBES BAJAS DIARIAS";
pub const MID_CLOUD_FORM: &str = "FORMA DE NUBES MEDIAS DIARIAS";
pub const MID_CLOUD_AMOUNT: &str = "CANTIDAD DE NUBES MEDIAS DIARIAS";
pub const HIGH_CLOUD_FORM: &str = "FORMA DE NUBES ALTAS DIARIAS";
pub const HIGH_CLOUD_AMOUNT: &str = "CANTIDAD DE NUBES ALTAS DIARIAS";
pub const VISIBILITY: &str = "VISIBILIDAD PREVALECIENTE DIARIA";
pub const PRECIPITATION: &str = "PRECIPITACION";

/// Every header the observation sheet must carry.
pub const OBSERVATION_COLUMNS: [&str; 15] = [
    DRY_BULB,
    WET_BULB,
    MAX_TEMPERATURE,
    MIN_TEMPERATURE,
    WIND_DIRECTION,
    WIND_SPEED,
    LOW_CLOUD_FORM,
    LOW_CLOUD_AMOUNT,
    LOW_CLOUD_HEIGHT,
    MID_CLOUD_FORM,
    MID_CLOUD_AMOUNT,
    HIGH_CLOUD_FORM,
    HIGH_CLOUD_AMOUNT,
    VISIBILITY,
    PRECIPITATION,
];

/// Numeric read that tolerates text columns: text that parses as a number (a decimal
/// comma is accepted) is used, anything else is absent.
fn get_opt_float(column: &Column, idx: usize) -> Option<f64> {
    match column.dtype() {
        DataType::String => column
            .str()
            .ok()
            .and_then(|ca| ca.get(idx))
            .and_then(|s| s.trim().replace(',', ".").parse::<f64>().ok())
            .filter(|v| v.is_finite()),
        _ => column
            .cast(&DataType::Float64)
            .ok()
            .and_then(|c| c.f64().ok().and_then(|ca| ca.get(idx))),
    }
}

fn get_opt_cell(column: &Column, idx: usize) -> Option<CellValue> {
    match column.dtype() {
        DataType::String => column
            .str()
            .ok()
            .and_then(|ca| ca.get(idx))
            .and_then(CellValue::text),
        _ => get_opt_float(column, idx).map(CellValue::Number),
    }
}

fn get_opt_string(column: &Column, idx: usize) -> Option<String> {
    get_opt_cell(column, idx).map(|c| c.to_string())
}

fn required<'a>(df: &'a DataFrame, name: &str, path: &str) -> Result<&'a Column, FetchError> {
    df.column(&normalize_label(name))
        .map_err(|_| FetchError::MissingColumn {
            path: path.to_string(),
            column: name.to_string(),
        })
}

fn optional<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.column(&normalize_label(name)).ok()
}

/// Reads a station-month observation sheet into one row per (day, hour).
pub fn extract_observations(
    df: &DataFrame,
    path: &str,
) -> Result<Vec<RawObservationRow>, FetchError> {
    macro_rules! get_column {
        ($name:expr) => {
            required(df, $name, path)?
        };
    }

    let dry_bulb = get_column!(DRY_BULB);
    let wet_bulb = get_column!(WET_BULB);
    let max_temperature = get_column!(MAX_TEMPERATURE);
    let min_temperature = get_column!(MIN_TEMPERATURE);
    let wind_direction = get_column!(WIND_DIRECTION);
    let wind_speed = get_column!(WIND_SPEED);
    let low_form = get_column!(LOW_CLOUD_FORM);
    let low_amount = get_column!(LOW_CLOUD_AMOUNT);
    let low_height = get_column!(LOW_CLOUD_HEIGHT);
    let mid_form = get_column!(MID_CLOUD_FORM);
    let mid_amount = get_column!(MID_CLOUD_AMOUNT);
    let high_form = get_column!(HIGH_CLOUD_FORM);
    let high_amount = get_column!(HIGH_CLOUD_AMOUNT);
    let visibility = get_column!(VISIBILITY);
    let precipitation = get_column!(PRECIPITATION);

    let rows = (0..df.height())
        .map(|i| RawObservationRow {
            dry_bulb: get_opt_float(dry_bulb, i),
            wet_bulb: get_opt_float(wet_bulb, i),
            max_temperature: get_opt_float(max_temperature, i),
            min_temperature: get_opt_float(min_temperature, i),
            wind_direction: get_opt_cell(wind_direction, i),
            wind_speed: get_opt_float(wind_speed, i),
            low_clouds: CloudLayer {
                form: get_opt_cell(low_form, i),
                amount: get_opt_float(low_amount, i),
            },
            low_cloud_height: get_opt_cell(low_height, i),
            mid_clouds: CloudLayer {
                form: get_opt_cell(mid_form, i),
                amount: get_opt_float(mid_amount, i),
            },
            high_clouds: CloudLayer {
                form: get_opt_cell(high_form, i),
                amount: get_opt_float(high_amount, i),
            },
            visibility: get_opt_float(visibility, i),
            precipitation: get_opt_float(precipitation, i),
        })
        .collect();
    Ok(rows)
}

/// Reads a daily register. Columns are taken by position (zone, station, TMAX, TMIN,
/// PP) because the sheet's own headers vary between years. The zone is only written
/// on the first station of each block and is carried down.
pub fn extract_daily_register(
    df: &DataFrame,
    date: NaiveDate,
    path: &str,
) -> Result<DailyRegister, FetchError> {
    let columns = df.get_columns();
    if columns.len() < 5 {
        return Err(FetchError::MissingColumn {
            path: path.to_string(),
            column: ["ZONA", "ESTACION", "TMAX", "TMIN", "PP"][columns.len()].to_string(),
        });
    }
    let (zone, station, tmax, tmin, pp) =
        (&columns[0], &columns[1], &columns[2], &columns[3], &columns[4]);

    let mut current_zone: Option<String> = None;
    let mut records = Vec::new();
    for i in 0..df.height() {
        if let Some(z) = get_opt_string(zone, i) {
            current_zone = Some(normalize_label(&z));
        }
        let Some(name) = get_opt_string(station, i) else {
            continue;
        };
        records.push(DailyRecord {
            zone: current_zone.clone().unwrap_or_default(),
            station: normalize_station_name(&name),
            tmax: get_opt_float(tmax, i),
            tmin: get_opt_float(tmin, i),
            pp: get_opt_float(pp, i),
        });
    }
    Ok(DailyRegister { date, records })
}

/// Reads the station metadata workbook. Only `ESTACION` is required.
pub fn extract_station_directory(
    df: &DataFrame,
    path: &str,
) -> Result<StationDirectory, FetchError> {
    let station = required(df, "ESTACION", path)?;
    let latitude = optional(df, "LATITUD");
    let longitude = optional(df, "LONGITUD");
    let altitude = optional(df, "ALTITUD");
    let department = optional(df, "DEPARTAMENTO");
    let province = optional(df, "PROVINCIA");
    let district = optional(df, "DISTRITO");

    let cell = |column: Option<&Column>, i: usize| column.and_then(|c| get_opt_cell(c, i));
    let text = |column: Option<&Column>, i: usize| column.and_then(|c| get_opt_string(c, i));

    let entries = (0..df.height()).filter_map(|i| {
        let name = get_opt_string(station, i)?;
        Some(StationMetadata {
            station: name,
            latitude: cell(latitude, i),
            longitude: cell(longitude, i),
            altitude: cell(altitude, i),
            department: text(department, i),
            province: text(province, i),
            district: text(district, i),
        })
    });
    Ok(StationDirectory::new(entries.collect::<Vec<_>>()))
}

/// Reads one sheet of the normals workbook, keeping only stations of `department`.
/// Month columns are recognized by their header (`ENERO` … `DICIEMBRE`, `SETIEMBRE`
/// included); other columns are ignored.
pub fn extract_normals(
    df: &DataFrame,
    variable: Variable,
    department: &str,
    path: &str,
) -> Result<NormalsTable, FetchError> {
    let departments = required(df, "DEPARTAMENTO", path)?;
    let stations = required(df, "NOMBRE ESTACION", path)?;
    let months: Vec<(u32, &Column)> = df
        .get_columns()
        .iter()
        .filter_map(|c| month_from_name(c.name()).map(|m| (m, c)))
        .collect();
    if months.is_empty() {
        return Err(FetchError::MissingColumn {
            path: path.to_string(),
            column: "ENERO".to_string(),
        });
    }

    let wanted = normalize_label(department);
    let mut table = NormalsTable::new(variable);
    for i in 0..df.height() {
        let in_department = get_opt_string(departments, i)
            .map(|d| normalize_label(&d) == wanted)
            .unwrap_or(false);
        if !in_department {
            continue;
        }
        let Some(station) = get_opt_string(stations, i) else {
            continue;
        };
        for (month, column) in &months {
            table.insert(&station, *month, get_opt_float(column, i));
        }
    }
    Ok(table)
}
