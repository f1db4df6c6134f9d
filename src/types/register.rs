//! Typed forms of the daily and monthly registers.

use crate::types::data_source::Variable;
use crate::types::period::YearMonth;
use crate::types::station_name::normalize_station_name;
use chrono::NaiveDate;
use polars::prelude::DataFrame;

/// The dashboard's four climatic zones of the Puno region, in display order.
pub const ZONES: [&str; 4] = [
    "SELVA Y VALLES INTERANDINOS",
    "ALTIPLANO NORTE",
    "ALTIPLANO CENTRO",
    "ALTIPLANO SUR",
];

/// One station's line in a daily register.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub zone: String,
    /// Normalized station name.
    pub station: String,
    pub tmax: Option<f64>,
    pub tmin: Option<f64>,
    pub pp: Option<f64>,
}

impl DailyRecord {
    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Tmax => self.tmax,
            Variable::Tmin => self.tmin,
            Variable::Pp => self.pp,
        }
    }
}

/// All station records for one day, in sheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRegister {
    pub date: NaiveDate,
    pub records: Vec<DailyRecord>,
}

impl DailyRegister {
    /// First record for a station, matched on its normalized name.
    pub fn record(&self, station: &str) -> Option<&DailyRecord> {
        let key = normalize_station_name(station);
        self.records.iter().find(|r| r.station == key)
    }

    /// Records of one zone, in sheet order.
    pub fn zone<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a DailyRecord> + 'a {
        let zone = zone.trim();
        self.records
            .iter()
            .filter(move |r| r.zone.eq_ignore_ascii_case(zone))
    }
}

/// The METEO sheet of a monthly register. Columns are named `GROUP|SUB` after its
/// two header rows.
#[derive(Debug, Clone)]
pub struct MonthlyRegister {
    pub period: YearMonth,
    pub frame: DataFrame,
}

impl MonthlyRegister {
    /// Column name for a (group, sub-header) pair.
    pub fn column_name(group: &str, sub: &str) -> String {
        format!("{}|{}", group.trim(), sub.trim())
    }

    /// Header groups in sheet order, without duplicates. Unlabelled columns are skipped.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for name in self.frame.get_column_names() {
            let Some((group, _)) = name.split_once('|') else {
                continue;
            };
            let group = group.to_string();
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }
}
