// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! HTTP upload sync target

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::info;

use super::SyncTarget;
use crate::core::{PersistenceError, SyncError};

/// POSTs the sink contents as `text/csv` to a fixed endpoint
pub struct HttpTarget {
    client: Client,
    endpoint: Url,
}

impl HttpTarget {
    pub fn new(endpoint: &str) -> Result<Self, SyncError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SyncError::Http(format!("invalid endpoint {:?}: {}", endpoint, e)))?;
        let client = Client::builder()
            .user_agent(concat!("wattlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SyncTarget for HttpTarget {
    fn name(&self) -> &str {
        "http"
    }

    async fn publish(&self, local_sink: &Path) -> Result<(), SyncError> {
        let body = tokio::fs::read(local_sink)
            .await
            .map_err(|e| PersistenceError::io(local_sink, e))?;
        let size = body.len();

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Rejected {
                status: status.as_u16(),
            });
        }

        info!("Uploaded {} bytes to {}", size, self.endpoint);
        Ok(())
    }
}
