use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{parse_status, StatusSample, StatusSource};
use crate::state::Config;

/// Polls the monitor's status endpoint.
pub struct HttpStatusSource {
    client: Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let url = cfg
            .status_url
            .clone()
            .ok_or_else(|| anyhow!("STATUS_URL not set"))?;
        Self::with_url(url, cfg.fetch_timeout_secs)
    }

    /// `timeout_secs: None` leaves requests unbounded; a hung request just
    /// never reports back.
    pub fn with_url(url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }

}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<StatusSample> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("status endpoint returned {}", status));
        }
        let text = resp.text().await?;
        parse_status(&text)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
