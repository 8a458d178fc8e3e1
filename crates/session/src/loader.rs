use crate::config::BrowserConfig;
use crate::error::LoadError;
use iam_model::Dataset;
use iam_search::Catalog;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where the consolidated document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(String),
}

impl DataSource {
    /// `<base path>/<file>`; an `http(s)://` base is fetched over the network
    #[must_use]
    pub fn resolve(base_path: &str, file: &str) -> Self {
        let base = base_path.trim();
        let file = file.trim().trim_start_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            return DataSource::Http(format!("{}/{file}", base.trim_end_matches('/')));
        }
        if base.is_empty() {
            return DataSource::File(PathBuf::from(file));
        }
        DataSource::File(PathBuf::from(base).join(file))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Http(url) => f.write_str(url),
        }
    }
}

/// Fetches the document once and turns it into a catalog.
///
/// Nothing is handed out unless every step succeeds.
#[derive(Debug, Clone)]
pub struct Loader {
    timeout: Duration,
    strict_service_count: bool,
}

impl Loader {
    #[must_use]
    pub const fn new(timeout: Duration, strict_service_count: bool) -> Self {
        Self {
            timeout,
            strict_service_count,
        }
    }

    #[must_use]
    pub const fn from_config(config: &BrowserConfig) -> Self {
        Self::new(config.request_timeout(), config.strict_service_count)
    }

    pub async fn load(&self, source: &DataSource) -> Result<Arc<Catalog>, LoadError> {
        let started = Instant::now();
        let bytes = self.fetch(source).await?;
        let location = source.to_string();

        let dataset = Dataset::from_json_slice(&bytes).map_err(|source| LoadError::Decode {
            location: location.clone(),
            source,
        })?;

        let dataset = Arc::new(dataset);
        let catalog = if self.strict_service_count {
            Catalog::build_strict(dataset).map_err(|source| LoadError::Shape {
                location: location.clone(),
                source,
            })?
        } else {
            Catalog::build(dataset)
        };

        log::info!(
            "Loaded {} services / {} actions from {location} in {} ms",
            catalog.dataset().services.len(),
            catalog.len(),
            started.elapsed().as_millis()
        );
        Ok(Arc::new(catalog))
    }

    async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, LoadError> {
        match source {
            DataSource::File(path) => tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                location: path.display().to_string(),
                source,
            }),
            DataSource::Http(url) => self.fetch_http(url).await,
        }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let transport = |source| LoadError::Transport {
            location: url.to_string(),
            source,
        };
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(transport)?;

        log::debug!("GET {url}");
        let response = client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                location: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_http_base_paths() {
        assert_eq!(
            DataSource::resolve("https://example.com/iam/", "aws-iam-consolidated.json"),
            DataSource::Http("https://example.com/iam/aws-iam-consolidated.json".to_string())
        );
    }

    #[test]
    fn resolves_filesystem_base_paths() {
        assert_eq!(
            DataSource::resolve("public/data", "/aws-iam-consolidated.json"),
            DataSource::File(PathBuf::from("public/data/aws-iam-consolidated.json"))
        );
        assert_eq!(
            DataSource::resolve("", "aws-iam-consolidated.json"),
            DataSource::File(PathBuf::from("aws-iam-consolidated.json"))
        );
    }
}
