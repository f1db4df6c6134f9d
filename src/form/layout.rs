//! Row positions of the climatological form.
//!
//! Days run down the sheet from row 17. A SUMA row closes each decade, so days
//! 11–20 sit one row lower than their position would suggest and days 21–31 two
//! rows lower:
//!
//! | rows  | content            |
//! |-------|--------------------|
//! | 17–26 | days 1–10          |
//! | 27    | SUMA, decade 1     |
//! | 28–37 | days 11–20         |
//! | 38    | SUMA, decade 2     |
//! | 39–49 | days 21–31         |
//! | 50    | SUMA, decade 3     |
//! | 51    | TOTAL              |
//! | 52    | MEDIA              |

use crate::form::columns::Column;
use std::ops::RangeInclusive;

/// Number of rows in the form grid.
pub const ROW_COUNT: usize = 53;

pub const FIRST_DAY_ROW: usize = 17;
pub const TOTAL_ROW: usize = 51;
pub const MEAN_ROW: usize = 52;

pub const SUM_LABEL: &str = "Suma";
pub const TOTAL_LABEL: &str = "Total";
pub const MEAN_LABEL: &str = "Media";

/// A ten-day block of the month. The third decade holds days 21 to the end of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decade {
    First,
    Second,
    Third,
}

impl Decade {
    pub const ALL: [Decade; 3] = [Decade::First, Decade::Second, Decade::Third];

    pub fn of_day(day: u32) -> Decade {
        match day {
            0..=10 => Decade::First,
            11..=20 => Decade::Second,
            _ => Decade::Third,
        }
    }

    /// Rows inserted above this decade by earlier SUMA rows.
    pub fn offset(self) -> usize {
        match self {
            Decade::First => 0,
            Decade::Second => 1,
            Decade::Third => 2,
        }
    }

    pub fn sum_row(self) -> usize {
        match self {
            Decade::First => 27,
            Decade::Second => 38,
            Decade::Third => 50,
        }
    }

    /// Calendar days of this decade in a month of `days_in_month` days; empty when the
    /// month is too short to reach it.
    pub fn days(self, days_in_month: u32) -> RangeInclusive<u32> {
        match self {
            Decade::First => 1..=days_in_month.min(10),
            Decade::Second => 11..=days_in_month.min(20),
            Decade::Third => 21..=days_in_month,
        }
    }

    /// Whether the form carries this decade's SUMA row for a month of the given length.
    pub fn has_sum_row(self, days_in_month: u32) -> bool {
        match self {
            Decade::First => true,
            Decade::Second => days_in_month > 10,
            Decade::Third => days_in_month > 20,
        }
    }
}

pub fn decade_offset(day: u32) -> usize {
    Decade::of_day(day).offset()
}

/// Grid row of calendar day `day` (1-based).
///
/// ```
/// use planilla::form::layout::template_row;
///
/// assert_eq!(template_row(1), 17);
/// assert_eq!(template_row(10), 26);
/// assert_eq!(template_row(11), 28);
/// assert_eq!(template_row(31), 49);
/// ```
pub fn template_row(day: u32) -> usize {
    FIRST_DAY_ROW + day.saturating_sub(1) as usize + decade_offset(day)
}

/// A fixed header cell of the form.
pub type HeaderCell = (usize, Column);

pub const STATION_CELL: HeaderCell = (5, Column::new(2));
pub const MONTH_CELL: HeaderCell = (6, Column::new(17));
pub const YEAR_CELL: HeaderCell = (7, Column::new(17));
pub const LATITUDE_CELL: HeaderCell = (5, Column::new(7));
pub const DEPARTMENT_CELL: HeaderCell = (5, Column::new(12));
pub const LONGITUDE_CELL: HeaderCell = (6, Column::new(7));
pub const PROVINCE_CELL: HeaderCell = (6, Column::new(12));
pub const ALTITUDE_CELL: HeaderCell = (7, Column::new(7));
pub const DISTRICT_CELL: HeaderCell = (7, Column::new(12));
