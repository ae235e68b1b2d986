mod mapping;
pub mod models;

use mapping::map_track;
use reqwest::Client;
use sonar_core::catalog::{CatalogClient, CatalogError, CatalogResult};
use sonar_core::models::Track;
use sonar_core::CatalogConfig;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct DeezerConfig {
    pub base_url: String,
    pub result_limit: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl From<&CatalogConfig> for DeezerConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            result_limit: config.result_limit,
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

impl Default for DeezerConfig {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

/// Deezer public search API client.
#[derive(Debug, Clone)]
pub struct DeezerCatalog {
    client: Client,
    base_url: Url,
    result_limit: u32,
    timeout: Duration,
}

impl DeezerCatalog {
    pub fn new(config: DeezerConfig) -> CatalogResult<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| CatalogError::Other {
            message: format!("invalid base_url: {e}"),
        })?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Other {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            result_limit: config.result_limit,
            timeout: config.timeout,
        })
    }

    pub fn search_url(&self, query: &str) -> CatalogResult<Url> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| CatalogError::Other {
                message: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &self.result_limit.to_string());
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_decode() {
            CatalogError::Decode {
                message: err.to_string(),
            }
        } else {
            CatalogError::Network {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl CatalogClient for DeezerCatalog {
    fn id(&self) -> &str {
        "deezer"
    }

    async fn search(&self, query: &str) -> CatalogResult<Vec<Track>> {
        let url = self.search_url(query)?;
        tracing::debug!(%url, "searching catalog");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body: models::SearchResponse = resp.json().await.map_err(|e| self.classify(e))?;
        if let Some(error) = body.error {
            return Err(CatalogError::Api {
                message: format!(
                    "{} (type: {}, code: {})",
                    error.message.as_deref().unwrap_or("unknown error"),
                    error.kind.as_deref().unwrap_or("unknown"),
                    error.code.unwrap_or_default()
                ),
            });
        }

        let tracks: Vec<Track> = body
            .data
            .unwrap_or_default()
            .iter()
            .map(map_track)
            .collect();
        tracing::debug!(
            query,
            returned = tracks.len(),
            total = body.total.unwrap_or_default(),
            "catalog search complete"
        );
        Ok(tracks)
    }
}
