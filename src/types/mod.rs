pub mod cell;
pub mod data_source;
pub mod normals;
pub mod observation;
pub mod period;
pub mod register;
pub mod station;
pub mod station_name;
