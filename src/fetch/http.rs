use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::source::ForecastSource;
use crate::cities;

/// HTTP-backed [`ForecastSource`] resolving payload URLs from the city
/// table.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastSource for HttpSource {
    async fn fetch(&self, city: &str) -> Result<Value> {
        let url = cities::url_for(city)
            .with_context(|| format!("no payload URL configured for city {city}"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        Ok(payload)
    }
}
