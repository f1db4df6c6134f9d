use crate::error::ValidationError;
use crate::types::station_name::normalize_label;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Spanish month names as they appear in the registers, normals workbook and form header.
pub const MONTH_NAMES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// A calendar month of a specific year.
///
/// The month number is validated on construction, so every `YearMonth` in
/// circulation has a name and a day count.
///
/// # Examples
///
/// ```
/// use planilla::YearMonth;
///
/// let feb = YearMonth::new(2023, 2).unwrap();
/// assert_eq!(feb.days_in_month(), 28);
/// assert_eq!(feb.name(), "FEBRERO");
/// assert_eq!(feb.to_string(), "2023-02");
/// assert!(YearMonth::new(2023, 13).is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Upper-case Spanish month name, e.g. `"MARZO"`.
    pub fn name(self) -> &'static str {
        month_name(self.month).unwrap_or_default()
    }

    pub fn first_day(self) -> NaiveDate {
        // Validated in `new`/`from_date`.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    pub fn last_day(self) -> NaiveDate {
        self.first_day()
            .with_day(self.days_in_month())
            .unwrap_or_else(|| self.first_day())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Name of month `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Parses a month label in any case, with or without accents. The Peruvian
/// spelling `SETIEMBRE` is accepted for September.
pub fn month_from_name(name: &str) -> Option<u32> {
    let label = normalize_label(name);
    let label = if label == "SETIEMBRE" {
        "SEPTIEMBRE".to_string()
    } else {
        label
    };
    MONTH_NAMES
        .iter()
        .position(|m| *m == label)
        .map(|idx| idx as u32 + 1)
}
