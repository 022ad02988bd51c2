// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! HTTP fetching for remote scanners

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::error::TransportError;

/// Default per-request timeout
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Some upstream sites reject requests without a browser-like agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Fetches a document body by URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// reqwest-backed fetcher. Anything other than 200 OK is a failure.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))
    }
}

/// Canned responses keyed by URL for scanner tests
#[cfg(test)]
pub(crate) mod canned {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct CannedFetcher {
        responses: Mutex<HashMap<String, Result<String, TransportError>>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every fetch sleeps this long before answering
        pub fn slow(delay: Duration) -> Self {
            Self { delay: Some(delay), ..Self::default() }
        }

        pub fn respond(&self, url: &str, body: &str) {
            self.responses.lock().insert(url.to_string(), Ok(body.to_string()));
        }

        pub fn fail(&self, url: &str, err: TransportError) {
            self.responses.lock().insert(url.to_string(), Err(err));
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .get(url)
                .cloned()
                .unwrap_or(Err(TransportError::Status(404)))
        }
    }
}
