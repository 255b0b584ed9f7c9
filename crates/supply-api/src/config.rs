use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PYTHON_BIN: &str = "python3";
/// First local development account of the reference ledger.
pub const DEFAULT_LEDGER_CALLER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

const DEFAULT_RUNNER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_CONCURRENT_RUNS: usize = 2;
const DEFAULT_PENDING_DB: &str = "supply_pending.sqlite";

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar { var: &'static str, value: String },
    ScriptMissing(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(var) => write!(f, "required environment variable is not set: {var}"),
            Self::InvalidVar { var, value } => {
                write!(f, "invalid value for {var}: {value}")
            }
            Self::ScriptMissing(path) => {
                write!(f, "configured script does not exist: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration of the API tier. Dataset and script locations are
/// configuration-supplied and validated at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub demand_csv_path: PathBuf,
    pub forecast_script: PathBuf,
    pub risk_script: PathBuf,
    pub python_bin: String,
    pub runner_timeout: Duration,
    pub max_concurrent_runs: usize,
    pub pending_db_path: PathBuf,
    pub ledger_caller: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            demand_csv_path: required_path("SUPPLY_DEMAND_CSV")?,
            forecast_script: required_path("SUPPLY_FORECAST_SCRIPT")?,
            risk_script: required_path("SUPPLY_RISK_SCRIPT")?,
            python_bin: var_or("SUPPLY_PYTHON_BIN", DEFAULT_PYTHON_BIN),
            runner_timeout: Duration::from_secs(parsed_var_or(
                "SUPPLY_RUNNER_TIMEOUT_SECS",
                DEFAULT_RUNNER_TIMEOUT_SECS,
            )?),
            max_concurrent_runs: parsed_var_or(
                "SUPPLY_MAX_CONCURRENT_RUNS",
                DEFAULT_MAX_CONCURRENT_RUNS,
            )?
            .max(1),
            pending_db_path: PathBuf::from(var_or("SUPPLY_PENDING_DB", DEFAULT_PENDING_DB)),
            ledger_caller: var_or("SUPPLY_LEDGER_CALLER", DEFAULT_LEDGER_CALLER),
        })
    }

    /// A missing script is a startup failure, not a per-request 500.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for script in [&self.forecast_script, &self.risk_script] {
            if !script.is_file() {
                return Err(ConfigError::ScriptMissing(script.clone()));
            }
        }
        Ok(())
    }
}

fn var_or(var: &'static str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required_path(var: &'static str) -> Result<PathBuf, ConfigError> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingVar(var))
}

fn parsed_var_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
        _ => Ok(default),
    }
}
