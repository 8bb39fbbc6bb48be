use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DATA_FILE: &str = "diabetes_dataset.csv";

/// Health data visualization dashboard.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// Dataset to load (.csv, .tsv, .json or .parquet).
    #[arg(env = "HEALTH_DASHBOARD_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_path_overrides_default() {
        let config = Config::try_parse_from(["health-dashboard", "records.parquet"]).unwrap();
        assert_eq!(config.data, PathBuf::from("records.parquet"));
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Config::try_parse_from(["health-dashboard", "a.csv", "b.csv"]).is_err());
    }
}
