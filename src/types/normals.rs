//! 1991–2020 monthly normals, one table per variable.

use crate::types::data_source::Variable;
use crate::types::period::month_from_name;
use crate::types::station_name::normalize_station_name;
use std::collections::HashMap;
use std::sync::Arc;

/// Monthly normals of one variable, indexed by station then month.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalsTable {
    variable: Variable,
    /// Stations in workbook order.
    stations: Vec<String>,
    values: HashMap<String, [Option<f64>; 12]>,
}

impl NormalsTable {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            stations: Vec::new(),
            values: HashMap::new(),
        }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    /// Sets the normal of `station` for `month` (1-based). Out-of-range months are ignored.
    pub fn insert(&mut self, station: &str, month: u32, value: Option<f64>) {
        if !(1..=12).contains(&month) {
            return;
        }
        let key = normalize_station_name(station);
        if !self.values.contains_key(&key) {
            self.stations.push(key.clone());
        }
        let months = self.values.entry(key).or_insert([None; 12]);
        months[(month - 1) as usize] = value;
    }

    /// Normal for a station and a month given by name (`"ENERO"`, `"Setiembre"`, …).
    /// Unknown stations and months resolve to `None`.
    pub fn lookup(&self, station: &str, month_name: &str) -> Option<f64> {
        self.lookup_month(station, month_from_name(month_name)?)
    }

    pub fn lookup_month(&self, station: &str, month: u32) -> Option<f64> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.values
            .get(&normalize_station_name(station))
            .and_then(|months| months[(month - 1) as usize])
    }

    /// Station names in workbook order.
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn contains(&self, station: &str) -> bool {
        self.values.contains_key(&normalize_station_name(station))
    }
}

/// The three normals tables, as loaded into the process cache.
#[derive(Debug, Clone)]
pub struct ReferenceNormals {
    pub tmax: Arc<NormalsTable>,
    pub tmin: Arc<NormalsTable>,
    pub pp: Arc<NormalsTable>,
}

impl ReferenceNormals {
    pub fn table(&self, variable: Variable) -> &NormalsTable {
        match variable {
            Variable::Tmax => &self.tmax,
            Variable::Tmin => &self.tmin,
            Variable::Pp => &self.pp,
        }
    }

    pub fn lookup(&self, variable: Variable, station: &str, month_name: &str) -> Option<f64> {
        self.table(variable).lookup(station, month_name)
    }

    pub fn lookup_month(&self, variable: Variable, station: &str, month: u32) -> Option<f64> {
        self.table(variable).lookup_month(station, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_number() {
        let mut table = NormalsTable::new(Variable::Tmax);
        table.insert("Juliaca", 1, Some(16.8));
        table.insert("Juliaca", 9, Some(16.1));
        table.insert("Puno", 1, None);

        assert_eq!(table.lookup("JULIACA", "enero"), Some(16.8));
        assert_eq!(table.lookup("juliaca", "SETIEMBRE"), Some(16.1));
        assert_eq!(table.lookup_month("Juliaca", 9), Some(16.1));
        assert_eq!(table.lookup("PUNO", "ENERO"), None);
        assert_eq!(table.lookup("ATLANTIS", "ENERO"), None);
        assert_eq!(table.lookup("JULIACA", "SMARCH"), None);
        assert_eq!(table.lookup_month("JULIACA", 13), None);
        assert_eq!(table.stations(), &["JULIACA".to_string(), "PUNO".to_string()]);
    }
}
