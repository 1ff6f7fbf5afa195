use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// JSON document holding every job advert, keyed by URL
    /// Default: job_adverts.json (in the working directory)
    pub data_file: PathBuf,

    /// Sentinel file locked for the lifetime of a session
    /// Default: .lock (in the working directory)
    pub lock_file: PathBuf,

    /// Directory for the rolling log files
    /// Default: logs
    pub log_dir: PathBuf,
}

pub const DEFAULT_DATA_FILE: &str = "job_adverts.json";
pub const DEFAULT_LOCK_FILE: &str = ".lock";
pub const DEFAULT_LOG_DIR: &str = "logs";

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - JOB_ADVERTS_FILE: path of the JSON backing file (default: job_adverts.json)
    /// - JOB_ADVERTS_LOCK_FILE: path of the sentinel lock file (default: .lock)
    /// - LOG_DIR: directory for log files (default: logs)
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Config {
            data_file: path_or("JOB_ADVERTS_FILE", DEFAULT_DATA_FILE),
            lock_file: path_or("JOB_ADVERTS_LOCK_FILE", DEFAULT_LOCK_FILE),
            log_dir: path_or("LOG_DIR", DEFAULT_LOG_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.data_file, PathBuf::from("job_adverts.json"));
        assert_eq!(config.lock_file, PathBuf::from(".lock"));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn overrides_are_picked_up_and_blank_values_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JOB_ADVERTS_FILE", "/tmp/adverts.json"),
            ("JOB_ADVERTS_LOCK_FILE", "  "),
            ("LOG_DIR", "/var/log/adverts"),
        ]);

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_file, PathBuf::from("/tmp/adverts.json"));
        assert_eq!(config.lock_file, PathBuf::from(".lock"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/adverts"));
    }
}
