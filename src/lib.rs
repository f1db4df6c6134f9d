mod comparison;
mod config;
mod error;
mod export;
pub mod form;
mod planilla;
mod types;
mod weather_data;

#[cfg(test)]
mod test_utils;

pub use error::{ConfigError, ExportError, PlanillaError, TemplateError, ValidationError};
pub use planilla::*;

pub use comparison::*;
pub use config::{find_config_file, ConfigSource, PlanillaConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
pub use export::{export_filename, export_form, export_form_bytes, ExportedForm};

pub use form::generator::{filled_day_count, generate, FilledForm};
pub use form::grid::TemplateGrid;
pub use form::template::{load_template, load_template_bytes};

pub use types::cell::CellValue;
pub use types::data_source::{DataSource, Variable};
pub use types::normals::{NormalsTable, ReferenceNormals};
pub use types::observation::{CloudLayer, Hour, RawObservationRow};
pub use types::period::{month_from_name, month_name, YearMonth, MONTH_NAMES};
pub use types::register::{DailyRecord, DailyRegister, MonthlyRegister, ZONES};
pub use types::station::{StationDirectory, StationMetadata};
pub use types::station_name::normalize_station_name;

pub use weather_data::cache::{CacheKey, CacheValue, CachedTable, DataCache};
pub use weather_data::data_extractor::{
    extract_daily_register, extract_normals, extract_observations, extract_station_directory,
    OBSERVATION_COLUMNS,
};
pub use weather_data::data_loader::{parse_tables, SheetSpec, WorkbookLoader};
pub use weather_data::error::FetchError;
pub use weather_data::fetch::{
    AccessTokenProvider, EnvToken, GraphDriveStore, MemoryStore, RemoteStore, StaticToken,
    DEFAULT_GRAPH_BASE_URL,
};
