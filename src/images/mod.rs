//! Cover image lookup through the Unsplash search API

use crate::config::UnsplashConfig;
use crate::error::{ImageError, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    small_s3: Option<String>,
}

/// Unsplash photo search client
pub struct UnsplashClient {
    config: UnsplashConfig,
    http_client: Client,
}

impl UnsplashClient {
    pub fn new(config: UnsplashConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ImageError::from)?;

        Ok(Self { config, http_client })
    }

    pub fn has_credentials(&self) -> bool {
        self.config.access_key.is_some()
    }

    /// URL of the first photo matching `query`.
    ///
    /// A missing access key is a configuration error; every request failure
    /// degrades to `Ok(None)`.
    pub async fn search_image(&self, query: &str) -> std::result::Result<Option<String>, ImageError> {
        let Some(access_key) = &self.config.access_key else {
            return Err(ImageError::MissingCredentials);
        };

        match self.search_once(access_key.expose_secret(), query).await {
            Ok(url) => {
                info!("Image for {:?}: {:?}", query, url);
                Ok(url)
            }
            Err(e) => {
                error!("Error fetching Unsplash image: {}", e);
                Ok(None)
            }
        }
    }

    async fn search_once(&self, access_key: &str, query: &str) -> std::result::Result<Option<String>, ImageError> {
        let url = format!("{}/search/photos", self.config.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(url)
            .query(&[("query", query), ("per_page", "1"), ("client_id", access_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PhotoSearchResponse = response.json().await?;
        debug!("Unsplash returned {} result(s)", parsed.results.len());

        Ok(parsed.results.into_iter().next().and_then(|photo| photo.urls.small_s3))
    }
}
