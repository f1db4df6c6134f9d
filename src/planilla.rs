//! The main entry point: fetches the workbooks behind the dashboard, caches them
//! for the life of the process, and builds climatological forms and comparison
//! views from them.

use crate::comparison::{compare_zones, DailyPoint, PeriodComparison, StationSeries, ZoneComparison};
use crate::config::PlanillaConfig;
use crate::error::{PlanillaError, ValidationError};
use crate::export::{export_form, ExportedForm};
use crate::form::generator::{generate, FilledForm};
use crate::form::grid::TemplateGrid;
use crate::form::template::load_template;
use crate::types::data_source::{DataSource, Variable};
use crate::types::normals::{NormalsTable, ReferenceNormals};
use crate::types::observation::RawObservationRow;
use crate::types::period::YearMonth;
use crate::types::register::{DailyRegister, MonthlyRegister};
use crate::types::station::{StationDirectory, StationMetadata};
use crate::types::station_name::normalize_station_name;
use crate::weather_data::cache::{CacheKey, DataCache};
use crate::weather_data::data_extractor::{
    extract_daily_register, extract_normals, extract_observations, extract_station_directory,
};
use crate::weather_data::data_loader::{SheetSpec, WorkbookLoader};
use crate::weather_data::error::FetchError;
use crate::weather_data::fetch::{EnvToken, GraphDriveStore, RemoteStore};
use bon::bon;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::task;

/// Columns and rows of the daily register sheet.
fn daily_register_spec() -> SheetSpec {
    SheetSpec::new(None).columns("A,C:F").header_row(3).max_rows(42)
}

/// The METEO sheet of the monthly register: two header rows, one data row per day.
fn monthly_register_spec() -> SheetSpec {
    SheetSpec::new(Some("METEO"))
        .columns("B:FU")
        .header_row(5)
        .header_depth(2)
        .max_rows(31)
}

fn normals_spec(variable: Variable) -> SheetSpec {
    SheetSpec::new(Some(variable.code())).columns("C,D,L:W").header_row(1)
}

/// Normalizes a station selection, rejecting an empty one.
fn validate_station(station: &str) -> Result<String, ValidationError> {
    let normalized = normalize_station_name(station);
    if normalized.is_empty() {
        return Err(ValidationError::MissingStation);
    }
    Ok(normalized)
}

/// Client for the climatological workbooks of one deployment.
///
/// All remote data goes through a [`RemoteStore`] and is cached per key in a
/// [`DataCache`], so repeated requests for the same day, month or station are
/// served from memory.
///
/// # Examples
///
/// ```no_run
/// # use planilla::{Planilla, PlanillaError, PlanillaConfig};
/// # async fn run() -> Result<(), PlanillaError> {
/// let client = Planilla::from_config(PlanillaConfig::default());
/// client.init().await?;
///
/// let form = client
///     .generate_form()
///     .station("Juliaca")
///     .year(2024)
///     .month(2)
///     .call()
///     .await?;
/// println!("{} days filled", form.days_filled());
/// # Ok(())
/// # }
/// ```
pub struct Planilla<S> {
    loader: WorkbookLoader<S>,
    cache: Arc<DataCache>,
    config: PlanillaConfig,
}

impl Planilla<GraphDriveStore<EnvToken>> {
    /// A client reading from the drive API, with the token taken from the environment
    /// variable named in the configuration.
    pub fn from_config(config: PlanillaConfig) -> Self {
        let store = GraphDriveStore::with_base_url(
            config.graph_base_url.clone(),
            EnvToken::new(config.token_env.clone()),
        );
        Planilla::builder().store(store).config(config).build()
    }
}

#[bon]
impl<S: RemoteStore> Planilla<S> {
    #[builder]
    pub fn new(store: S, config: Option<PlanillaConfig>, cache: Option<Arc<DataCache>>) -> Self {
        Self {
            loader: WorkbookLoader::new(store),
            cache: cache.unwrap_or_default(),
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &PlanillaConfig {
        &self.config
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn store(&self) -> &S {
        self.loader.store()
    }

    /// Loads the reference normals into the cache. Calling it is optional: every
    /// operation loads what it needs on first use.
    pub async fn init(&self) -> Result<ReferenceNormals, PlanillaError> {
        let normals = self.normals().await?;
        info!(
            "Initialized with normals for {} stations",
            normals.tmax.stations().len()
        );
        Ok(normals)
    }

    /// Parses all three normals sheets from one download of the workbook.
    async fn load_normals(&self) -> Result<Vec<NormalsTable>, FetchError> {
        let path = &self.config.normals_path;
        let specs: Vec<SheetSpec> = Variable::ALL.iter().map(|v| normals_spec(*v)).collect();
        let frames = self.loader.fetch_tables(path, &specs).await?;
        Variable::ALL
            .iter()
            .zip(frames.iter())
            .map(|(variable, df)| extract_normals(df, *variable, &self.config.department, path))
            .collect()
    }

    /// The normals of one variable. The first load stores the other two variables'
    /// tables as well, since they come from the same workbook.
    pub async fn normal_table(&self, variable: Variable) -> Result<Arc<NormalsTable>, PlanillaError> {
        let table = self
            .cache
            .get_or_try_load(CacheKey::Normal(variable), || async {
                let mut wanted = None;
                for table in self.load_normals().await? {
                    if table.variable() == variable {
                        wanted = Some(table);
                    } else {
                        self.cache
                            .insert(CacheKey::Normal(table.variable()), table)
                            .await;
                    }
                }
                wanted.ok_or_else(|| FetchError::SheetNotFound {
                    path: self.config.normals_path.clone(),
                    sheet: variable.code().to_string(),
                })
            })
            .await?;
        Ok(table)
    }

    pub async fn normals(&self) -> Result<ReferenceNormals, PlanillaError> {
        Ok(ReferenceNormals {
            tmax: self.normal_table(Variable::Tmax).await?,
            tmin: self.normal_table(Variable::Tmin).await?,
            pp: self.normal_table(Variable::Pp).await?,
        })
    }

    /// Looks up one normal by station and month name. Unknown stations or months
    /// give `Ok(None)`.
    #[builder]
    pub async fn normal(
        &self,
        variable: Variable,
        station: &str,
        month: &str,
    ) -> Result<Option<f64>, PlanillaError> {
        let table = self.normal_table(variable).await?;
        Ok(table.lookup(station, month))
    }

    /// Station names known to the TMAX normals, in workbook order.
    pub async fn stations(&self) -> Result<Vec<String>, PlanillaError> {
        Ok(self.normal_table(Variable::Tmax).await?.stations().to_vec())
    }

    pub async fn station_directory(&self) -> Result<Arc<StationDirectory>, PlanillaError> {
        let path = &self.config.metadata_path;
        let spec = SheetSpec::new(self.config.metadata_sheet.as_deref());
        let directory = self
            .cache
            .get_or_try_load(CacheKey::Metadata, || async {
                let df = self.loader.fetch_table(path, &spec).await?;
                extract_station_directory(&df, path)
            })
            .await?;
        Ok(directory)
    }

    /// Metadata is optional input to a form: a station missing from the directory,
    /// or a directory workbook that does not exist (404), yields `None`. Any other
    /// failure to fetch the directory aborts generation.
    async fn metadata_for(&self, station: &str) -> Result<Option<StationMetadata>, PlanillaError> {
        match self.station_directory().await {
            Ok(directory) => Ok(directory.get(station).cloned()),
            Err(PlanillaError::Fetch(e)) if e.status() == Some(StatusCode::NOT_FOUND) => {
                warn!("Generating without station metadata: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn daily_register(&self, date: NaiveDate) -> Result<Arc<DailyRegister>, PlanillaError> {
        let path = DataSource::DailyRegister(date).path(&self.config.daily_folder);
        let register = self
            .cache
            .get_or_try_load(CacheKey::Daily(date), || async {
                let df = self.loader.fetch_table(&path, &daily_register_spec()).await?;
                extract_daily_register(&df, date, &path)
            })
            .await?;
        Ok(register)
    }

    pub async fn monthly_register(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Arc<MonthlyRegister>, PlanillaError> {
        let period = YearMonth::new(year, month)?;
        let path = DataSource::MonthlyRegister(period).path(&self.config.monthly_folder);
        let register = self
            .cache
            .get_or_try_load(CacheKey::Monthly(period), || async {
                let frame = self.loader.fetch_table(&path, &monthly_register_spec()).await?;
                Ok(MonthlyRegister { period, frame })
            })
            .await?;
        Ok(register)
    }

    /// The raw thrice-daily observations of one station-month.
    pub async fn load_observations(
        &self,
        station: &str,
        year: i32,
        month: u32,
    ) -> Result<Arc<Vec<RawObservationRow>>, PlanillaError> {
        let station = validate_station(station)?;
        let period = YearMonth::new(year, month)?;
        let path = DataSource::Observations {
            station: station.clone(),
            period,
        }
        .path(&self.config.planilla_folder);
        let spec = SheetSpec::new(self.config.observation_sheet.as_deref());
        let rows = self
            .cache
            .get_or_try_load(CacheKey::Observations { station, period }, || async {
                let df = self.loader.fetch_table(&path, &spec).await?;
                extract_observations(&df, &path)
            })
            .await?;
        Ok(rows)
    }

    async fn template(&self) -> Result<TemplateGrid, PlanillaError> {
        let path = self.config.template_path.clone();
        let sheet = self.config.template_sheet.clone();
        let grid = task::spawn_blocking(move || load_template(&path, sheet.as_deref()))
            .await
            .map_err(FetchError::from)??;
        Ok(grid)
    }

    /// Builds the climatological form of a station-month.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] for an empty station or a month outside 1–12, raised
    /// before anything is fetched. [`FetchError`] when the observations cannot be
    /// downloaded or lack a required column, or when the station directory exists
    /// but cannot be fetched. [`crate::TemplateError`] when the
    /// template cannot be read.
    #[builder]
    pub async fn generate_form(
        &self,
        station: &str,
        year: i32,
        month: u32,
    ) -> Result<FilledForm, PlanillaError> {
        let station = validate_station(station)?;
        let period = YearMonth::new(year, month)?;
        let rows = self.load_observations(&station, year, month).await?;
        let metadata = self.metadata_for(&station).await?;
        let template = self.template().await?;
        Ok(generate(template, &station, period, &rows, metadata.as_ref()))
    }

    /// Generates the form and writes it into a copy of the template workbook.
    #[builder]
    pub async fn export_form(
        &self,
        station: &str,
        year: i32,
        month: u32,
    ) -> Result<ExportedForm, PlanillaError> {
        let form = self
            .generate_form()
            .station(station)
            .year(year)
            .month(month)
            .call()
            .await?;
        let path = self.config.template_path.clone();
        let sheet = self.config.template_sheet.clone();
        let exported = task::spawn_blocking(move || export_form(&form, &path, sheet.as_deref()))
            .await
            .map_err(FetchError::from)??;
        Ok(exported)
    }

    /// Each zone's stations for one day, next to their normal for that month.
    #[builder]
    pub async fn compare_daily(
        &self,
        variable: Variable,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ZoneComparison>, PlanillaError> {
        let date = date.ok_or(ValidationError::MissingDate)?;
        let register = self.daily_register(date).await?;
        let normals = self.normal_table(variable).await?;
        Ok(compare_zones(&register, &normals, variable))
    }

    /// Daily TMAX/TMIN/PP of one or two stations over an inclusive date range, with
    /// their monthly normals and summary figures.
    ///
    /// Days whose register cannot be fetched, or that do not list the station, are
    /// skipped.
    #[builder]
    pub async fn compare_period(
        &self,
        station: &str,
        second_station: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PeriodComparison, PlanillaError> {
        let primary = validate_station(station)?;
        let secondary = second_station
            .map(normalize_station_name)
            .filter(|s| !s.is_empty());
        if secondary.as_deref() == Some(primary.as_str()) {
            return Err(ValidationError::SameStation(primary).into());
        }
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end }.into());
        }

        let mut primary_days = Vec::new();
        let mut secondary_days = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let register = match self.daily_register(date).await {
                Ok(register) => register,
                Err(e) => {
                    warn!("Skipping {}: {}", date, e);
                    continue;
                }
            };
            if let Some(record) = register.record(&primary) {
                primary_days.push(DailyPoint::from_record(date, record));
            }
            if let Some(record) = secondary.as_deref().and_then(|s| register.record(s)) {
                secondary_days.push(DailyPoint::from_record(date, record));
            }
        }
        if primary_days.is_empty() {
            return Err(ValidationError::NoData {
                station: primary,
                start,
                end,
            }
            .into());
        }

        let normals = self.normals().await?;
        let secondary = secondary
            .map(|name| StationSeries::new(name, secondary_days, &normals, start, end));
        Ok(PeriodComparison {
            start,
            end,
            primary: StationSeries::new(primary, primary_days, &normals, start, end),
            secondary,
        })
    }
}
