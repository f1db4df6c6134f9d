//! Defines the climate variables compared against normals and the remote workbooks
//! the client knows how to fetch, including how their drive paths are built.

use crate::types::period::YearMonth;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A variable that has a 1991–2020 monthly normal and appears in the daily register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Variable {
    /// Daily maximum temperature (°C).
    Tmax,
    /// Daily minimum temperature (°C).
    Tmin,
    /// Daily precipitation (mm).
    Pp,
}

impl Variable {
    pub const ALL: [Variable; 3] = [Variable::Tmax, Variable::Tmin, Variable::Pp];

    /// Sheet name in the normals workbook and column name in the daily register.
    pub fn code(&self) -> &'static str {
        match self {
            Variable::Tmax => "TMAX",
            Variable::Tmin => "TMIN",
            Variable::Pp => "PP",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variable::Tmax => "temperatura máxima",
            Variable::Tmin => "temperatura mínima",
            Variable::Pp => "precipitación",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Tmax | Variable::Tmin => "°C",
            Variable::Pp => "mm",
        }
    }
}

/// Formats a `Variable` using its sheet code.
///
/// # Examples
///
/// ```
/// use planilla::Variable;
///
/// assert_eq!(Variable::Tmax.to_string(), "TMAX");
/// assert_eq!("pp".parse::<Variable>().unwrap(), Variable::Pp);
/// ```
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TMAX" => Ok(Variable::Tmax),
            "TMIN" => Ok(Variable::Tmin),
            "PP" => Ok(Variable::Pp),
            other => Err(format!("unknown variable '{}', expected TMAX, TMIN or PP", other)),
        }
    }
}

/// The remote workbooks, each resolving to one deterministic drive path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// One station's thrice-daily observations for a month, the planilla input.
    Observations { station: String, period: YearMonth },
    /// All stations' TMAX/TMIN/PP for one day.
    DailyRegister(NaiveDate),
    /// The METEO sheet covering every station for a month.
    MonthlyRegister(YearMonth),
}

impl DataSource {
    /// Builds the drive path below `folder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use planilla::{DataSource, YearMonth};
    /// use chrono::NaiveDate;
    ///
    /// let daily = DataSource::DailyRegister(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    /// assert_eq!(
    ///     daily.path("REGISTRO DIARIO"),
    ///     "REGISTRO DIARIO/2024/MARZO/SENAMHI_DZ13_Datos_05_MARZO_2024.xlsx"
    /// );
    ///
    /// let monthly = DataSource::MonthlyRegister(YearMonth::new(2024, 11).unwrap());
    /// assert_eq!(monthly.path("MENSUAL"), "MENSUAL/2024/11. NOVIEMBRE 2024.xlsx");
    /// ```
    pub fn path(&self, folder: &str) -> String {
        let folder = folder.trim_end_matches('/');
        match self {
            DataSource::Observations { station, period } => format!(
                "{}/{}/{}. {}/{}.xlsx",
                folder,
                period.year(),
                zero_pad(period.month()),
                period.name(),
                station
            ),
            DataSource::DailyRegister(date) => {
                let period = YearMonth::from_date(*date);
                format!(
                    "{}/{}/{}/SENAMHI_DZ13_Datos_{}_{}_{}.xlsx",
                    folder,
                    date.year(),
                    period.name(),
                    zero_pad(date.day()),
                    period.name(),
                    date.year()
                )
            }
            DataSource::MonthlyRegister(period) => format!(
                "{}/{}/{}. {} {}.xlsx",
                folder,
                period.year(),
                zero_pad(period.month()),
                period.name(),
                period.year()
            ),
        }
    }
}

/// Day and month numbers below 10 are written with a leading zero in file names.
fn zero_pad(number: u32) -> String {
    format!("{:02}", number)
}
