//! Defines the static attributes of a weather station as listed in the station
//! metadata workbook, and the directory that indexes them by normalized name.

use crate::types::cell::CellValue;
use crate::types::station_name::normalize_station_name;
use serde::Serialize;
use std::collections::HashMap;

/// Location and administrative attributes of one station.
///
/// Every field is optional because the metadata workbook has gaps; the form
/// header leaves the corresponding cell untouched when a value is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationMetadata {
    /// Normalized station name (see [`crate::normalize_station_name`]).
    pub station: String,
    /// Latitude as written in the workbook; often a sexagesimal string such as `15°29'S`.
    pub latitude: Option<CellValue>,
    /// Longitude, same conventions as `latitude`.
    pub longitude: Option<CellValue>,
    /// Altitude above sea level in metres.
    pub altitude: Option<CellValue>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
}

/// All stations of the metadata workbook keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: HashMap<String, StationMetadata>,
}

impl StationDirectory {
    pub fn new(entries: impl IntoIterator<Item = StationMetadata>) -> Self {
        let stations = entries
            .into_iter()
            .map(|mut meta| {
                meta.station = normalize_station_name(&meta.station);
                (meta.station.clone(), meta)
            })
            .collect();
        Self { stations }
    }

    /// Looks up a station by any spelling of its name.
    pub fn get(&self, station: &str) -> Option<&StationMetadata> {
        self.stations.get(&normalize_station_name(station))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stations.keys().cloned().collect();
        names.sort();
        names
    }
}
