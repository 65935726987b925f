//! Driver configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use stmine::MiningConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Read a TOML config file, or fall back to defaults when it is absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Where readings come from and how their columns are laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file with a header row
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Column holding the sampling date
    #[serde(default)]
    pub date_column: usize,

    /// chrono format string of the date column
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Column holding the location name
    #[serde(default = "default_location_column")]
    pub location_column: usize,

    /// Pollutant columns turned into items
    #[serde(default = "default_pollutants")]
    pub pollutants: Vec<PollutantColumn>,

    /// Number of equal-width bands per pollutant
    #[serde(default = "default_bands")]
    pub bands: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            date_column: 0,
            date_format: default_date_format(),
            location_column: default_location_column(),
            pollutants: default_pollutants(),
            bands: default_bands(),
        }
    }
}

/// A named numeric column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollutantColumn {
    pub name: String,
    pub column: usize,
}

impl PollutantColumn {
    pub fn new(name: impl Into<String>, column: usize) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }
}

fn default_input_path() -> PathBuf { PathBuf::from("data.csv") }
fn default_date_format() -> String { "%d/%m/%Y".to_string() }
fn default_location_column() -> usize { 2 }
fn default_bands() -> u32 { 3 }

fn default_pollutants() -> Vec<PollutantColumn> {
    vec![
        PollutantColumn::new("so2", 5),
        PollutantColumn::new("no2", 6),
        PollutantColumn::new("pmt", 7),
    ]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use stmine::Algorithm;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mining.min_support, 2);
        assert_eq!(config.input.date_column, 0);
        assert_eq!(config.input.location_column, 2);
        assert_eq!(config.input.bands, 3);
        assert_eq!(config.input.pollutants[0], PollutantColumn::new("so2", 5));
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[mining]\nmin_support = 5\nalgorithm = \"apriori\"\n\n[input]\npath = \"readings.csv\"\nbands = 4\n\n[output]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.mining.min_support, 5);
        assert_eq!(config.mining.algorithm, Algorithm::Apriori);
        assert_eq!(config.input.path, PathBuf::from("readings.csv"));
        assert_eq!(config.input.bands, 4);
        assert_eq!(config.input.pollutants.len(), 3);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.mining.min_support, 2);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mining]\nmin_support = \"lots\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
