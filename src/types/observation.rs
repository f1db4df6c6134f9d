use crate::types::cell::CellValue;
use std::fmt;

/// The three synoptic observation times of a conventional station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hour {
    H7,
    H13,
    H19,
}

impl Hour {
    pub const ALL: [Hour; 3] = [Hour::H7, Hour::H13, Hour::H19];

    /// Position of the reading within a day's block of three rows.
    pub fn index(self) -> usize {
        match self {
            Hour::H7 => 0,
            Hour::H13 => 1,
            Hour::H19 => 2,
        }
    }

    pub fn clock_hour(self) -> u32 {
        match self {
            Hour::H7 => 7,
            Hour::H13 => 13,
            Hour::H19 => 19,
        }
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.clock_hour())
    }
}

/// Cloud observations for one sky layer at one observation time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudLayer {
    /// Genus/form as written by the observer (e.g. `"Cu"`, `"Sc"`).
    pub form: Option<CellValue>,
    /// Amount in oktas, 0–8.
    pub amount: Option<f64>,
}

/// One row of the raw monthly observation sheet: a single (day, hour) reading.
///
/// Rows arrive in blocks of three per day, ordered 7h, 13h, 19h. Not every field is
/// meaningful at every hour: the daily maximum is only read at 19h, the minimum
/// only at 7h, and precipitation only at 7h and 19h.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservationRow {
    pub dry_bulb: Option<f64>,
    pub wet_bulb: Option<f64>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    /// As observed; usually a compass point, sometimes a number of degrees.
    pub wind_direction: Option<CellValue>,
    pub wind_speed: Option<f64>,
    pub low_clouds: CloudLayer,
    /// Base height code of the low layer, kept as observed.
    pub low_cloud_height: Option<CellValue>,
    pub mid_clouds: CloudLayer,
    pub high_clouds: CloudLayer,
    pub visibility: Option<f64>,
    pub precipitation: Option<f64>,
}

impl RawObservationRow {
    /// Total sky cover in oktas: the sum of the layer amounts that were observed,
    /// capped at 8. `None` when no layer amount was recorded.
    pub fn total_cloud_cover(&self) -> Option<f64> {
        let amounts = [
            self.low_clouds.amount,
            self.mid_clouds.amount,
            self.high_clouds.amount,
        ];
        let present: Vec<f64> = amounts.into_iter().flatten().collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>().min(8.0))
    }
}

/// The three readings of one calendar day.
#[derive(Debug, Clone, Copy)]
pub struct DayReadings<'a> {
    pub day: u32,
    rows: &'a [RawObservationRow],
}

impl<'a> DayReadings<'a> {
    /// Slices day `day` (1-based) out of a month's rows; `None` when fewer than three rows remain.
    pub fn for_day(rows: &'a [RawObservationRow], day: u32) -> Option<Self> {
        let start = (day.checked_sub(1)? as usize) * 3;
        let block = rows.get(start..start + 3)?;
        Some(Self { day, rows: block })
    }

    pub fn at(&self, hour: Hour) -> &'a RawObservationRow {
        &self.rows[hour.index()]
    }
}
