use crate::error::{Result, SessionError};
use crate::loader::DataSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATA_FILE: &str = "aws-iam-consolidated.json";

pub const ENV_BASE_PATH: &str = "IAM_BROWSER_BASE_PATH";
pub const ENV_PAGE_SIZE: &str = "IAM_BROWSER_PAGE_SIZE";
pub const ENV_DEBOUNCE_MS: &str = "IAM_BROWSER_DEBOUNCE_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    /// Directory or `http(s)://` prefix the data file is served under
    pub base_path: String,

    pub data_file: String,

    /// Initial window size and growth step
    pub page_size: usize,

    /// Quiet period before a search edit is committed
    pub debounce_ms: u64,

    /// Rows from the end of the visible window that count as "near the end"
    pub near_end_threshold: usize,

    pub request_timeout_secs: u64,

    /// Treat a `totalServices` mismatch as a load failure
    pub strict_service_count: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_path: "data".to_string(),
            data_file: DEFAULT_DATA_FILE.to_string(),
            page_size: iam_search::DEFAULT_PAGE_SIZE,
            debounce_ms: 150,
            near_end_threshold: 10,
            request_timeout_secs: 30,
            strict_service_count: false,
        }
    }
}

impl BrowserConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            SessionError::ConfigParse(inner) => {
                SessionError::Config(format!("{}: {inner}", path.display()))
            }
            other => other,
        })
    }

    /// Apply `IAM_BROWSER_*` overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(base) = lookup(ENV_BASE_PATH).filter(|v| !v.trim().is_empty()) {
            self.base_path = base;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = raw.trim().parse().map_err(|_| {
                SessionError::Config(format!("{ENV_PAGE_SIZE} must be a number, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            self.debounce_ms = raw.trim().parse().map_err(|_| {
                SessionError::Config(format!("{ENV_DEBOUNCE_MS} must be a number, got '{raw}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SessionError::Config("page_size must be at least 1".into()));
        }
        if self.data_file.trim().is_empty() {
            return Err(SessionError::Config("data_file must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SessionError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn data_source(&self) -> DataSource {
        DataSource::resolve(&self.base_path, &self.data_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BrowserConfig::from_toml_str("page_size = 25\n").unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.data_file, DEFAULT_DATA_FILE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = BrowserConfig::from_toml_str("pagesize = 25\n").unwrap_err();
        assert!(matches!(err, SessionError::ConfigParse(_)));
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let err = BrowserConfig::from_toml_str("page_size = 0\n").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_PATH, "https://example.com/iam"),
            (ENV_PAGE_SIZE, "10"),
        ]);
        let config = BrowserConfig::default()
            .with_env_from(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.base_path, "https://example.com/iam");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.debounce_ms, 150);
    }

    #[test]
    fn malformed_env_number_is_reported() {
        let err = BrowserConfig::default()
            .with_env_from(|key| (key == ENV_DEBOUNCE_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DEBOUNCE_MS));
    }
}
