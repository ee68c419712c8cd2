//! HTTP access to the two upstream climate tables.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::domain::{DEFAULT_CUTOFF_YEAR, SourceKind};
use crate::error::{AppError, PipelineError};

/// NOAA PSL long Nino3.4 anomaly record (year × month grid, 1870 onward).
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://psl.noaa.gov/gcos_wgsp/Timeseries/Data/nino34.long.anom.data";
/// NOAA CPC Oceanic Niño Index (`SEAS YR TOTAL ANOM`).
pub const DEFAULT_OPERATIONAL_URL: &str = "https://www.cpc.ncep.noaa.gov/data/indices/oni.ascii.txt";
/// Upstream endpoints are third-party; never wait on them indefinitely.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("enso-dash/", env!("CARGO_PKG_VERSION"));

/// Where to fetch from, and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub archive_url: String,
    pub operational_url: String,
    pub timeout: Duration,
    pub cutoff_year: i32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            operational_url: DEFAULT_OPERATIONAL_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cutoff_year: DEFAULT_CUTOFF_YEAR,
        }
    }
}

impl SourceConfig {
    /// Load settings from the environment (and `.env`), falling back to defaults.
    ///
    /// Recognised variables: `ENSO_ARCHIVE_URL`, `ENSO_OPERATIONAL_URL`,
    /// `ENSO_FETCH_TIMEOUT_SECS`, `ENSO_CUTOFF_YEAR`.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SourceConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();
        if let Some(url) = lookup("ENSO_ARCHIVE_URL").filter(|s| !s.trim().is_empty()) {
            config.archive_url = url.trim().to_string();
        }
        if let Some(url) = lookup("ENSO_OPERATIONAL_URL").filter(|s| !s.trim().is_empty()) {
            config.operational_url = url.trim().to_string();
        }
        if let Some(raw) = lookup("ENSO_FETCH_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                AppError::new(2, format!("Invalid ENSO_FETCH_TIMEOUT_SECS '{raw}': {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("ENSO_CUTOFF_YEAR") {
            config.cutoff_year = raw
                .trim()
                .parse::<i32>()
                .map_err(|e| AppError::new(2, format!("Invalid ENSO_CUTOFF_YEAR '{raw}': {e}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout.is_zero() {
            return Err(AppError::new(2, "Fetch timeout must be > 0 seconds."));
        }
        if !(1800..=2200).contains(&self.cutoff_year) {
            return Err(AppError::new(
                2,
                format!("Cutoff year {} is outside 1800..=2200.", self.cutoff_year),
            ));
        }
        Ok(())
    }

    pub fn url(&self, feed: SourceKind) -> &str {
        match feed {
            SourceKind::Archive => &self.archive_url,
            SourceKind::Operational => &self.operational_url,
        }
    }
}

pub struct SourceClient {
    client: Client,
    config: SourceConfig,
}

impl SourceClient {
    pub fn new(config: SourceConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Download one source document as text.
    pub fn fetch(&self, feed: SourceKind) -> Result<String, PipelineError> {
        let url = self.config.url(feed);
        let fetch_error = |message: String| PipelineError::Fetch {
            feed,
            url: url.to_string(),
            message,
        };

        info!(%feed, url, "fetching source");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(fetch_error(format!("status {}", resp.status())));
        }

        let body = resp
            .text()
            .map_err(|e| fetch_error(format!("failed to read body: {e}")))?;
        debug!(%feed, bytes = body.len(), "source downloaded");
        Ok(body)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::test_server::{closed_url, serve_once};
    use super::*;

    fn client_for(archive_url: String) -> SourceClient {
        SourceClient::new(SourceConfig {
            archive_url,
            timeout: Duration::from_secs(5),
            ..SourceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn successful_fetch_returns_body() {
        let client = client_for(serve_once("200 OK", "2018 0.1 0.2"));
        assert_eq!(client.fetch(SourceKind::Archive).unwrap(), "2018 0.1 0.2");
    }

    #[test]
    fn error_status_is_a_fetch_error() {
        let url = serve_once("500 Internal Server Error", "boom");
        let client = client_for(url.clone());

        let err = client.fetch(SourceKind::Archive).unwrap_err();
        match &err {
            PipelineError::Fetch { feed, url: failed, message } => {
                assert_eq!(*feed, SourceKind::Archive);
                assert_eq!(failed, &url);
                assert!(message.contains("status 500"), "{message}");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
        assert_eq!(AppError::from(err).exit_code(), 4);
    }

    #[test]
    fn unreachable_endpoint_is_a_fetch_error() {
        let client = client_for(closed_url());
        let err = client.fetch(SourceKind::Archive).unwrap_err();
        assert!(err.is_fetch(), "{err}");
        assert!(err.to_string().contains("request failed"), "{err}");
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = SourceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SourceConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cutoff_year, 2019);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = SourceConfig::from_lookup(lookup_from(&[
            ("ENSO_ARCHIVE_URL", " http://localhost/a.data "),
            ("ENSO_FETCH_TIMEOUT_SECS", "5"),
            ("ENSO_CUTOFF_YEAR", "2010"),
        ]))
        .unwrap();
        assert_eq!(config.archive_url, "http://localhost/a.data");
        assert_eq!(config.operational_url, DEFAULT_OPERATIONAL_URL);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.cutoff_year, 2010);
        assert_eq!(config.url(SourceKind::Archive), "http://localhost/a.data");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = SourceConfig::from_lookup(lookup_from(&[("ENSO_FETCH_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = SourceConfig::from_lookup(lookup_from(&[("ENSO_FETCH_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err =
            SourceConfig::from_lookup(lookup_from(&[("ENSO_CUTOFF_YEAR", "99999")])).unwrap_err();
        assert!(err.to_string().contains("Cutoff year"));
    }
}
