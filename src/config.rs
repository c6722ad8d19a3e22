//! Replay configuration from environment variables
//!
//! Environment variables:
//! - `EVALFLOW_INPUT_PATH` (required) - JSONL event stream to replay
//! - `EVALFLOW_OUTPUT_PATH` (default: reports/evalflow.jsonl, or
//!   data/evalflow.db with `--backend sqlite`)
//! - `EVALFLOW_PROTOCOL` (default: prequential) - prequential, time_holdout,
//!   quantity_holdout or time_crossval
//! - `EVALFLOW_ALGORITHM` (default: classification) - classification or regression
//! - `EVALFLOW_CLASSES` (default: 0,1,2) - comma-separated class labels
//! - `EVALFLOW_N_WAIT_TO_FIT` (default: 200) - prequential warm-up
//! - `EVALFLOW_TIME_FIELD` (default: timestamp) - event field holding time
//! - `EVALFLOW_INITIAL_WINDOW_SECS` (default: 3600)
//! - `EVALFLOW_WAIT_WINDOW_SECS` (default: 600)
//! - `EVALFLOW_TEST_WINDOW_SECS` (default: 300)
//! - `EVALFLOW_FIRST_TIME_WAIT` (default: 1000)
//! - `EVALFLOW_N_WAIT_TO_TEST` (default: 500)
//! - `EVALFLOW_TEST_SIZE` (default: 100)
//! - `RUST_LOG` (default: info)

use crate::model::AlgorithmType;
use crate::trigger::{Protocol, TimeWindows, TriggerConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

impl BackendType {
    /// Read `--backend <jsonl|sqlite>` from the command line (default: JSONL)
    pub fn parse_from_args() -> BackendType {
        let args: Vec<String> = env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> BackendType {
        if let Some(idx) = args.iter().position(|x| x == "--backend") {
            match args.get(idx + 1).map(|s| s.as_str()) {
                Some("sqlite") => return BackendType::Sqlite,
                Some("jsonl") => return BackendType::Jsonl,
                other => log::warn!("Unknown backend {:?}, defaulting to JSONL", other),
            }
        }
        BackendType::Jsonl
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
    /// A time-based protocol was configured without an event-time extractor
    MissingTimeExtractor(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::MissingTimeExtractor(protocol) => {
                write!(f, "Protocol {} requires an event time extractor", protocol)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub backend: BackendType,
    pub algorithm: AlgorithmType,
    pub classes: Vec<f64>,
    pub time_field: String,
    pub trigger: TriggerConfig,
}

impl ReplayConfig {
    pub fn from_env(backend: BackendType) -> Result<Self, ConfigError> {
        Self::from_lookup(backend, |key| env::var(key).ok())
    }

    /// Build from any variable source (the process environment in production)
    pub fn from_lookup<F>(backend: BackendType, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input_path = lookup("EVALFLOW_INPUT_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingVariable("EVALFLOW_INPUT_PATH".to_string()))?;

        let output_path: PathBuf = lookup("EVALFLOW_OUTPUT_PATH")
            .unwrap_or_else(|| match backend {
                BackendType::Jsonl => "reports/evalflow.jsonl".to_string(),
                BackendType::Sqlite => "data/evalflow.db".to_string(),
            })
            .into();

        let protocol_str = lookup("EVALFLOW_PROTOCOL").unwrap_or_else(|| "prequential".to_string());
        let protocol = Protocol::from_str(&protocol_str).ok_or_else(|| {
            ConfigError::InvalidValue(format!("EVALFLOW_PROTOCOL '{}'", protocol_str))
        })?;

        let algorithm_str =
            lookup("EVALFLOW_ALGORITHM").unwrap_or_else(|| "classification".to_string());
        let algorithm = AlgorithmType::from_str(&algorithm_str).ok_or_else(|| {
            ConfigError::InvalidValue(format!("EVALFLOW_ALGORITHM '{}'", algorithm_str))
        })?;

        let classes = match lookup("EVALFLOW_CLASSES") {
            Some(s) => s
                .split(',')
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(|c| {
                    c.parse::<f64>()
                        .map_err(|_| ConfigError::InvalidValue(format!("EVALFLOW_CLASSES '{}'", c)))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![0.0, 1.0, 2.0],
        };

        let time_field = lookup("EVALFLOW_TIME_FIELD").unwrap_or_else(|| "timestamp".to_string());

        let windows = TimeWindows::new(
            parse_or(&lookup, "EVALFLOW_INITIAL_WINDOW_SECS", 3600.0)?,
            parse_or(&lookup, "EVALFLOW_WAIT_WINDOW_SECS", 600.0)?,
            parse_or(&lookup, "EVALFLOW_TEST_WINDOW_SECS", 300.0)?,
        );
        windows.validate()?;

        let trigger = TriggerConfig {
            protocol,
            n_wait_to_fit: parse_or(&lookup, "EVALFLOW_N_WAIT_TO_FIT", 200)?,
            windows,
            first_time_wait: parse_or(&lookup, "EVALFLOW_FIRST_TIME_WAIT", 1000)?,
            n_wait_to_test: parse_or(&lookup, "EVALFLOW_N_WAIT_TO_TEST", 500)?,
            test_size: parse_or(&lookup, "EVALFLOW_TEST_SIZE", 100)?,
        };

        Ok(Self {
            input_path,
            output_path,
            backend,
            algorithm,
            classes,
            time_field,
            trigger,
        })
    }
}

/// Parse an optional variable, failing on present-but-malformed values
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ReplayConfig::from_lookup(
            BackendType::Jsonl,
            lookup_from(&[("EVALFLOW_INPUT_PATH", "events.jsonl")]),
        )
        .unwrap();

        assert_eq!(config.input_path, PathBuf::from("events.jsonl"));
        assert_eq!(config.output_path, PathBuf::from("reports/evalflow.jsonl"));
        assert_eq!(config.algorithm, AlgorithmType::Classification);
        assert_eq!(config.classes, vec![0.0, 1.0, 2.0]);
        assert_eq!(config.time_field, "timestamp");
        assert_eq!(config.trigger.protocol, Protocol::Prequential);
        assert_eq!(config.trigger.n_wait_to_fit, 200);
        assert_eq!(config.trigger.windows, TimeWindows::new(3600.0, 600.0, 300.0));
        assert_eq!(config.trigger.first_time_wait, 1000);
        assert_eq!(config.trigger.n_wait_to_test, 500);
        assert_eq!(config.trigger.test_size, 100);
    }

    #[test]
    fn test_custom_config() {
        let config = ReplayConfig::from_lookup(
            BackendType::Sqlite,
            lookup_from(&[
                ("EVALFLOW_INPUT_PATH", "/tmp/in.jsonl"),
                ("EVALFLOW_PROTOCOL", "time_crossval"),
                ("EVALFLOW_ALGORITHM", "regression"),
                ("EVALFLOW_CLASSES", "0, 1"),
                ("EVALFLOW_TIME_FIELD", "ts"),
                ("EVALFLOW_INITIAL_WINDOW_SECS", "60"),
                ("EVALFLOW_TEST_WINDOW_SECS", "15.5"),
                ("EVALFLOW_TEST_SIZE", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.backend, BackendType::Sqlite);
        assert_eq!(config.output_path, PathBuf::from("data/evalflow.db"));
        assert_eq!(config.trigger.protocol, Protocol::TimeCrossval);
        assert_eq!(config.algorithm, AlgorithmType::Regression);
        assert_eq!(config.classes, vec![0.0, 1.0]);
        assert_eq!(config.time_field, "ts");
        assert_eq!(config.trigger.windows, TimeWindows::new(60.0, 600.0, 15.5));
        assert_eq!(config.trigger.test_size, 7);
    }

    #[test]
    fn test_missing_input_path() {
        let err = ReplayConfig::from_lookup(BackendType::Jsonl, lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(ref v) if v == "EVALFLOW_INPUT_PATH"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("EVALFLOW_PROTOCOL", "kfold"),
            ("EVALFLOW_ALGORITHM", "ranking"),
            ("EVALFLOW_CLASSES", "0,a"),
            ("EVALFLOW_N_WAIT_TO_FIT", "-3"),
            ("EVALFLOW_TEST_WINDOW_SECS", "-1"),
            ("EVALFLOW_INITIAL_WINDOW_SECS", "soon"),
        ] {
            let result = ReplayConfig::from_lookup(
                BackendType::Jsonl,
                lookup_from(&[("EVALFLOW_INPUT_PATH", "in.jsonl"), (key, value)]),
            );
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_backend_from_args() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(BackendType::from_args(&args(&["bin"])), BackendType::Jsonl);
        assert_eq!(
            BackendType::from_args(&args(&["bin", "--backend", "sqlite"])),
            BackendType::Sqlite
        );
        assert_eq!(
            BackendType::from_args(&args(&["bin", "--backend", "parquet"])),
            BackendType::Jsonl
        );
    }
}
