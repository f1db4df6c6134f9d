//! Data behind the daily and multi-day dashboards: recorded values next to the
//! station's monthly normal.

use crate::types::data_source::Variable;
use crate::types::normals::{NormalsTable, ReferenceNormals};
use crate::types::period::YearMonth;
use crate::types::register::{DailyRecord, DailyRegister, ZONES};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationValue {
    pub station: String,
    pub value: Option<f64>,
    pub normal: Option<f64>,
}

/// One zone's stations for a single day and variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneComparison {
    pub zone: String,
    pub variable: Variable,
    pub stations: Vec<StationValue>,
}

/// Pairs each station of the four zones with its normal for the register's month.
/// Zones come out in the dashboard's order; zones absent from the register are
/// returned with no stations.
pub fn compare_zones(
    register: &DailyRegister,
    normals: &NormalsTable,
    variable: Variable,
) -> Vec<ZoneComparison> {
    let month = register.date.month();
    ZONES
        .iter()
        .map(|zone| ZoneComparison {
            zone: zone.to_string(),
            variable,
            stations: register
                .zone(zone)
                .map(|record| StationValue {
                    station: record.station.clone(),
                    value: record.value(variable),
                    normal: normals.lookup_month(&record.station, month),
                })
                .collect(),
        })
        .collect()
}

/// A station's register values for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub tmax: Option<f64>,
    pub tmin: Option<f64>,
    pub pp: Option<f64>,
}

impl DailyPoint {
    pub fn from_record(date: NaiveDate, record: &DailyRecord) -> Self {
        Self {
            date,
            tmax: record.tmax,
            tmin: record.tmin,
            pp: record.pp,
        }
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Tmax => self.tmax,
            Variable::Tmin => self.tmin,
            Variable::Pp => self.pp,
        }
    }
}

/// A monthly normal drawn as a flat line over the part of its month inside the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalSegment {
    pub variable: Variable,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableStats {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

impl VariableStats {
    /// `None` when no value is present.
    pub fn from_values(values: impl IntoIterator<Item = Option<f64>>) -> Option<Self> {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        if present.is_empty() {
            return None;
        }
        let total: f64 = present.iter().sum();
        Some(Self {
            count: present.len(),
            total,
            mean: total / present.len() as f64,
            max: present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: present.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

/// Headline numbers of the multi-day view: mean TMAX, mean TMIN, total PP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub tmax: Option<VariableStats>,
    pub tmin: Option<VariableStats>,
    pub pp: Option<VariableStats>,
}

impl PeriodSummary {
    pub fn from_days(days: &[DailyPoint]) -> Self {
        let stats = |variable| VariableStats::from_values(days.iter().map(|d| d.value(variable)));
        Self {
            tmax: stats(Variable::Tmax),
            tmin: stats(Variable::Tmin),
            pp: stats(Variable::Pp),
        }
    }

    pub fn tmax_mean(&self) -> Option<f64> {
        self.tmax.as_ref().map(|s| s.mean)
    }

    pub fn tmin_mean(&self) -> Option<f64> {
        self.tmin.as_ref().map(|s| s.mean)
    }

    pub fn pp_total(&self) -> Option<f64> {
        self.pp.as_ref().map(|s| s.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSeries {
    pub station: String,
    pub days: Vec<DailyPoint>,
    pub normals: Vec<NormalSegment>,
    pub summary: PeriodSummary,
}

impl StationSeries {
    pub fn new(
        station: String,
        days: Vec<DailyPoint>,
        normals: &ReferenceNormals,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        let normals = normal_segments(normals, &station, start, end);
        let summary = PeriodSummary::from_days(&days);
        Self {
            station,
            days,
            normals,
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub primary: StationSeries,
    pub secondary: Option<StationSeries>,
}

/// Calendar months touched by `start..=end`, each clipped to the range.
pub fn month_spans(start: NaiveDate, end: NaiveDate) -> Vec<(YearMonth, NaiveDate, NaiveDate)> {
    let mut spans = Vec::new();
    let mut period = YearMonth::from_date(start);
    while period.first_day() <= end {
        let span_start = period.first_day().max(start);
        let span_end = period.last_day().min(end);
        spans.push((period, span_start, span_end));
        let (year, month) = if period.month() == 12 {
            (period.year() + 1, 1)
        } else {
            (period.year(), period.month() + 1)
        };
        match YearMonth::new(year, month) {
            Ok(next) => period = next,
            Err(_) => break,
        }
    }
    spans
}

/// Normal segments of every variable the station has a normal for.
pub fn normal_segments(
    normals: &ReferenceNormals,
    station: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NormalSegment> {
    let spans = month_spans(start, end);
    Variable::ALL
        .iter()
        .flat_map(|&variable| {
            spans.iter().filter_map(move |(period, span_start, span_end)| {
                Some(NormalSegment {
                    variable,
                    start: *span_start,
                    end: *span_end,
                    value: normals.lookup_month(variable, station, period.month())?,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normals() -> ReferenceNormals {
        let mut tmax = NormalsTable::new(Variable::Tmax);
        tmax.insert("JULIACA", 1, Some(16.8));
        tmax.insert("JULIACA", 2, Some(16.5));
        tmax.insert("AZANGARO", 2, Some(17.0));
        let mut pp = NormalsTable::new(Variable::Pp);
        pp.insert("JULIACA", 2, Some(4.1));
        ReferenceNormals {
            tmax: Arc::new(tmax),
            tmin: Arc::new(NormalsTable::new(Variable::Tmin)),
            pp: Arc::new(pp),
        }
    }

    #[test]
    fn test_month_spans_clip_and_wrap() {
        let spans = month_spans(date(2023, 12, 20), date(2024, 2, 3));
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].1, date(2023, 12, 20));
        assert_eq!(spans[0].2, date(2023, 12, 31));
        assert_eq!(spans[1].0, YearMonth::new(2024, 1).unwrap());
        assert_eq!(spans[2].1, date(2024, 2, 1));
        assert_eq!(spans[2].2, date(2024, 2, 3));
        assert_eq!(month_spans(date(2024, 5, 5), date(2024, 5, 5)).len(), 1);
    }

    #[test]
    fn test_normal_segments_skip_missing() {
        let segments = normal_segments(&normals(), "Juliaca", date(2024, 1, 25), date(2024, 2, 10));
        let tmax: Vec<_> = segments.iter().filter(|s| s.variable == Variable::Tmax).collect();
        assert_eq!(tmax.len(), 2);
        assert_eq!(tmax[1].value, 16.5);
        assert_eq!(tmax[1].end, date(2024, 2, 10));
        let pp: Vec<_> = segments.iter().filter(|s| s.variable == Variable::Pp).collect();
        assert_eq!(pp.len(), 1);
        assert_eq!(pp[0].start, date(2024, 2, 1));
        assert!(segments.iter().all(|s| s.variable != Variable::Tmin));
    }

    #[test]
    fn test_summary() {
        let days = vec![
            DailyPoint { date: date(2024, 2, 1), tmax: Some(16.0), tmin: Some(1.0), pp: Some(2.0) },
            DailyPoint { date: date(2024, 2, 2), tmax: Some(18.0), tmin: None, pp: Some(0.0) },
            DailyPoint { date: date(2024, 2, 3), tmax: None, tmin: Some(-1.0), pp: Some(5.5) },
        ];
        let summary = PeriodSummary::from_days(&days);
        assert_eq!(summary.tmax_mean(), Some(17.0));
        assert_eq!(summary.tmin_mean(), Some(0.0));
        assert_eq!(summary.pp_total(), Some(7.5));
        assert_eq!(summary.pp.as_ref().unwrap().max, 5.5);
        assert_eq!(PeriodSummary::from_days(&[]).tmax, None);
    }

    #[test]
    fn test_compare_zones_order_and_normals() {
        let register = DailyRegister {
            date: date(2024, 2, 14),
            records: vec![
                DailyRecord {
                    zone: "ALTIPLANO NORTE".into(),
                    station: "AZANGARO".into(),
                    tmax: Some(18.2),
                    tmin: None,
                    pp: None,
                },
                DailyRecord {
                    zone: "ALTIPLANO NORTE".into(),
                    station: "PUTINA".into(),
                    tmax: None,
                    tmin: None,
                    pp: None,
                },
            ],
        };
        let nt = normals();
        let zones = compare_zones(&register, &nt.tmax, Variable::Tmax);
        assert_eq!(zones.len(), 4);
        assert_eq!(zones[0].zone, "SELVA Y VALLES INTERANDINOS");
        assert!(zones[0].stations.is_empty());
        assert_eq!(zones[1].stations[0].value, Some(18.2));
        assert_eq!(zones[1].stations[0].normal, Some(17.0));
        assert_eq!(zones[1].stations[1].normal, None);
    }
}
