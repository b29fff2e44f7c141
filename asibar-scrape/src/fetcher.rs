use crate::extract::{Extractor, ParseError, compute_ratio};
use asibar_http::{HttpClient, HttpError, RequestOpts};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    /// Network failure or a non-2xx answer. Not retried.
    #[error("fetching status page failed: {0}")]
    Fetch(#[from] HttpError),
    /// The page no longer looks the way the extractor expects.
    #[error("status page could not be parsed: {0}")]
    Parse(#[from] ParseError),
}

/// Second-dose coverage as published by the ministry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResult {
    pub ratio: f64,
    pub last_updated: String,
}

pub struct StatusFetcher {
    http: HttpClient,
    extractor: Extractor,
    population: u64,
}

impl StatusFetcher {
    pub fn new(url: &str, container_selector: &str, population: u64) -> Result<Self, StatusError> {
        Ok(Self {
            http: HttpClient::new(url)?,
            extractor: Extractor::new(container_selector)?,
            population,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Download the page once and compute the coverage ratio.
    pub async fn fetch_status(&self) -> Result<StatusResult, StatusError> {
        let page = self.http.get_text("", RequestOpts::default()).await?;
        tracing::info!(
            status = %page.status,
            url = %self.http.base(),
            "Fetched vaccine status page"
        );

        let values = self.extractor.extract(&page.body)?;
        let ratio = compute_ratio(values.second_dose, self.population);
        tracing::info!(
            ratio,
            second_dose = values.second_dose,
            last_updated = %values.last_updated,
            "status.computed"
        );

        Ok(StatusResult {
            ratio,
            last_updated: values.last_updated,
        })
    }
}
