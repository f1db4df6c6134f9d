//! Column positions of the climatological form.
//!
//! The form is a 49-column sheet. Column 0 holds row labels; columns 1–48 hold
//! the day's readings. No other module uses raw column numbers.

use crate::types::observation::Hour;

/// Number of columns in the form grid.
pub const COLUMN_COUNT: usize = 49;

/// A zero-based column of the form grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(usize);

impl Column {
    /// Panics when `index` is outside the grid. The named constants below are
    /// evaluated at compile time, so a typo there fails the build.
    pub(crate) const fn new(index: usize) -> Self {
        assert!(index < COLUMN_COUNT);
        Column(index)
    }

    /// Checked constructor for positions that come from data (e.g. template cells).
    pub fn from_index(index: usize) -> Option<Self> {
        (index < COLUMN_COUNT).then_some(Column(index))
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Whether SUMA/TOTAL/MEDIA rows carry a value in this column. The label column
    /// and the textual columns (wind direction, cloud forms, low-cloud height) do not.
    pub fn is_aggregable(self) -> bool {
        self.0 != LABEL.0 && !EXCLUDED.contains(&self)
    }

    /// Every column, label column included.
    pub fn all() -> impl Iterator<Item = Column> {
        (0..COLUMN_COUNT).map(Column)
    }
}

/// Three columns holding the same reading at 7h, 13h and 19h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyColumns {
    h7: Column,
    h13: Column,
    h19: Column,
}

impl HourlyColumns {
    const fn new(h7: usize, h13: usize, h19: usize) -> Self {
        Self {
            h7: Column::new(h7),
            h13: Column::new(h13),
            h19: Column::new(h19),
        }
    }

    pub const fn at(self, hour: Hour) -> Column {
        match hour {
            Hour::H7 => self.h7,
            Hour::H13 => self.h13,
            Hour::H19 => self.h19,
        }
    }
}

/// The seven cloud columns written for one observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudColumns {
    pub low_form: Column,
    pub low_amount: Column,
    pub low_height: Column,
    pub mid_form: Column,
    pub mid_amount: Column,
    pub high_form: Column,
    pub high_amount: Column,
}

impl CloudColumns {
    const fn starting_at(first: usize) -> Self {
        Self {
            low_form: Column::new(first),
            low_amount: Column::new(first + 1),
            low_height: Column::new(first + 2),
            mid_form: Column::new(first + 3),
            mid_amount: Column::new(first + 4),
            high_form: Column::new(first + 5),
            high_amount: Column::new(first + 6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudDetail {
    h7: CloudColumns,
    h13: CloudColumns,
    h19: CloudColumns,
}

impl CloudDetail {
    pub const fn at(self, hour: Hour) -> CloudColumns {
        match hour {
            Hour::H7 => self.h7,
            Hour::H13 => self.h13,
            Hour::H19 => self.h19,
        }
    }
}

pub const LABEL: Column = Column::new(0);

pub const TMAX: Column = Column::new(1);
pub const TMIN: Column = Column::new(2);
pub const TEMPERATURE_MEAN: Column = Column::new(3);

pub const DRY_BULB: HourlyColumns = HourlyColumns::new(4, 5, 6);
pub const DRY_BULB_MEAN: Column = Column::new(7);

pub const WET_BULB: HourlyColumns = HourlyColumns::new(8, 9, 10);
pub const WET_BULB_MEAN: Column = Column::new(11);

pub const WIND_DIRECTION: HourlyColumns = HourlyColumns::new(12, 14, 16);
pub const WIND_SPEED: HourlyColumns = HourlyColumns::new(13, 15, 17);
pub const WIND_SPEED_MEAN: Column = Column::new(18);

pub const PRECIPITATION_7H: Column = Column::new(19);
pub const PRECIPITATION_19H: Column = Column::new(20);
/// 19h of the day plus 7h of the following day.
pub const PRECIPITATION_TOTAL: Column = Column::new(21);

/// Total sky cover in oktas.
pub const CLOUD_COVER: HourlyColumns = HourlyColumns::new(22, 23, 24);

pub const CLOUD_DETAIL: CloudDetail = CloudDetail {
    h7: CloudColumns::starting_at(25),
    h13: CloudColumns::starting_at(32),
    h19: CloudColumns::starting_at(39),
};

pub const VISIBILITY: HourlyColumns = HourlyColumns::new(46, 47, 48);

/// Textual columns, left empty on SUMA, TOTAL and MEDIA rows.
pub const EXCLUDED: [Column; 15] = [
    WIND_DIRECTION.h7,
    WIND_DIRECTION.h13,
    WIND_DIRECTION.h19,
    CLOUD_DETAIL.h7.low_form,
    CLOUD_DETAIL.h7.low_height,
    CLOUD_DETAIL.h7.mid_form,
    CLOUD_DETAIL.h7.high_form,
    CLOUD_DETAIL.h13.low_form,
    CLOUD_DETAIL.h13.low_height,
    CLOUD_DETAIL.h13.mid_form,
    CLOUD_DETAIL.h13.high_form,
    CLOUD_DETAIL.h19.low_form,
    CLOUD_DETAIL.h19.low_height,
    CLOUD_DETAIL.h19.mid_form,
    CLOUD_DETAIL.h19.high_form,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_positions() {
        let mut positions: Vec<usize> = EXCLUDED.iter().map(|c| c.index()).collect();
        positions.sort();
        assert_eq!(
            positions,
            vec![12, 14, 16, 25, 27, 28, 30, 32, 34, 35, 37, 39, 41, 42, 44]
        );
    }

    #[test]
    fn test_cloud_blocks() {
        assert_eq!(CLOUD_DETAIL.at(Hour::H7).low_amount.index(), 26);
        assert_eq!(CLOUD_DETAIL.at(Hour::H13).mid_amount.index(), 36);
        assert_eq!(CLOUD_DETAIL.at(Hour::H19).high_amount.index(), 45);
    }

    #[test]
    fn test_aggregable() {
        assert!(!LABEL.is_aggregable());
        assert!(TMAX.is_aggregable());
        assert!(!WIND_DIRECTION.at(Hour::H13).is_aggregable());
        assert!(CLOUD_COVER.at(Hour::H19).is_aggregable());
        assert_eq!(Column::all().filter(|c| c.is_aggregable()).count(), 33);
        assert_eq!(Column::from_index(49), None);
    }
}
