//! Deployment configuration: where the workbooks live and how to authenticate.
//!
//! Looked up in this order, first match wins:
//! 1. an explicit path
//! 2. the `PLANILLA_CONFIG` environment variable
//! 3. `planilla.toml` in the current directory
//! 4. `planilla/planilla.toml` under the user config directory
//!
//! With no file found, [`PlanillaConfig::default`] is used.

use crate::error::ConfigError;
use crate::weather_data::fetch::DEFAULT_GRAPH_BASE_URL;
use log::info;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "PLANILLA_CONFIG";
pub const CONFIG_FILE_NAME: &str = "planilla.toml";
const APP_NAME: &str = "planilla";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanillaConfig {
    pub graph_base_url: String,
    /// Environment variable holding the drive access token.
    pub token_env: String,
    pub daily_folder: String,
    pub monthly_folder: String,
    pub planilla_folder: String,
    /// Drive path of the normals workbook (sheets TMAX, TMIN, PP).
    pub normals_path: String,
    /// Drive path of the station metadata workbook.
    pub metadata_path: String,
    pub metadata_sheet: Option<String>,
    /// Stations outside this department are dropped from the normals.
    pub department: String,
    /// Local path of the form template workbook.
    pub template_path: PathBuf,
    pub template_sheet: Option<String>,
    pub observation_sheet: Option<String>,
}

impl Default for PlanillaConfig {
    fn default() -> Self {
        Self {
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            token_env: "PLANILLA_ACCESS_TOKEN".to_string(),
            daily_folder: "AndreaProyecto/REGISTRO DIARIO".to_string(),
            monthly_folder: "AndreaProyecto/REGISTRO MENSUAL".to_string(),
            planilla_folder: "AndreaProyecto/PLANILLAS".to_string(),
            normals_path: "AndreaProyecto/NORMALES/Normales_1991-2020.xlsx".to_string(),
            metadata_path: "AndreaProyecto/METADATA/Estaciones.xlsx".to_string(),
            metadata_sheet: None,
            department: "PUNO".to_string(),
            template_path: PathBuf::from("template/Planilla de datos.xlsx"),
            template_sheet: Some("Sheet1".to_string()),
            observation_sheet: None,
        }
    }
}

/// Where a configuration was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Environment(PathBuf),
    CurrentDir(PathBuf),
    UserConfig(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::Environment(p)
            | ConfigSource::CurrentDir(p)
            | ConfigSource::UserConfig(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Finds the configuration file. An explicit path is returned even if it does not
/// exist, so that loading it reports the problem instead of silently using defaults.
pub fn find_config_file(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        let p = PathBuf::from(path);
        if p.exists() {
            return ConfigSource::Environment(p);
        }
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return ConfigSource::CurrentDir(local);
    }
    if let Some(dir) = dirs::config_dir() {
        let user = dir.join(APP_NAME).join(CONFIG_FILE_NAME);
        if user.exists() {
            return ConfigSource::UserConfig(user);
        }
    }
    ConfigSource::Defaults
}

impl PlanillaConfig {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents, path)
    }

    /// Loads the configuration following the search order of [`find_config_file`].
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let source = find_config_file(explicit);
        let config = match source.path() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        info!("Using configuration from {}", source);
        Ok((config, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PlanillaConfig::from_toml_str(
            r#"
                department = "CUSCO"
                template_sheet = "Planilla"
            "#,
            Path::new("inline.toml"),
        )
        .unwrap();
        assert_eq!(config.department, "CUSCO");
        assert_eq!(config.template_sheet.as_deref(), Some("Planilla"));
        assert_eq!(config.graph_base_url, DEFAULT_GRAPH_BASE_URL);
        assert_eq!(config.token_env, "PLANILLA_ACCESS_TOKEN");
    }

    #[test]
    fn test_invalid_toml() {
        let err = PlanillaConfig::from_toml_str("department = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn test_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "normals_path = \"N/normales.xlsx\"").unwrap();
        let (config, source) = PlanillaConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.normals_path, "N/normales.xlsx");
        assert_eq!(source, ConfigSource::Explicit(file.path().to_path_buf()));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = PlanillaConfig::load(Some(Path::new("/nonexistent/planilla.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read(..)));
    }
}
