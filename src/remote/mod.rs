//! Remote decode race.
//!
//! The image URL is sent to every configured service concurrently. The
//! first service to return a payload wins; the race fails only when every
//! service has failed or timed out.

/// JSON decoding service
pub mod qr_api;
/// HTML decoding service
pub mod zxing_org;

pub use qr_api::QrApi;
pub use zxing_org::ZxingOrg;

use crate::config::ScanConfig;
use crate::error::RemoteError;
use crate::models::is_link;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// An HTTP service that decodes a QR code from an image URL
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Label recorded as the result method
    fn label(&self) -> &str;

    /// Ask the service to decode the image at `image_url`
    async fn decode_url(&self, image_url: &str) -> Result<String, RemoteError>;
}

/// Winning remote result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHit {
    /// Decoded text
    pub text: String,
    /// Label of the service that answered first
    pub source: String,
}

/// Resolve with the first `Ok` among `attempts`, or with every error once
/// all of them have failed.
pub async fn first_success<I, F, T, E>(attempts: I) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = attempts.into_iter().collect();
    let mut errors = Vec::new();

    while let Some(result) = pending.next().await {
        match result {
            Ok(value) => return Ok(value),
            Err(err) => errors.push(err),
        }
    }
    Err(errors)
}

/// Concurrent query of several remote services
pub struct RemoteRace {
    services: Vec<Arc<dyn RemoteService>>,
    timeout: Duration,
}

impl RemoteRace {
    /// Race `services`, bounding each request by `timeout`
    pub fn new(services: Vec<Arc<dyn RemoteService>>, timeout: Duration) -> Self {
        Self { services, timeout }
    }

    /// The two public services at the configured endpoints
    pub fn from_config(config: &ScanConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("autoqr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let services: Vec<Arc<dyn RemoteService>> = vec![
            Arc::new(ZxingOrg::new(client.clone(), &config.zxing_endpoint)),
            Arc::new(QrApi::new(client, &config.qr_api_endpoint)),
        ];
        Ok(Self::new(services, config.remote_timeout))
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True when no services are configured
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Run the race for an http(s) image URL
    pub async fn race(&self, image_url: &str) -> Result<RemoteHit, Vec<RemoteError>> {
        if !is_link(image_url) {
            return Err(vec![RemoteError::Unsupported(image_url.to_string())]);
        }

        let attempts = self.services.iter().map(|service| async move {
            let label = service.label().to_string();
            match tokio::time::timeout(self.timeout, service.decode_url(image_url)).await {
                Ok(Ok(text)) => Ok(RemoteHit {
                    text,
                    source: label,
                }),
                Ok(Err(err)) => {
                    debug!(%err, "remote participant failed");
                    Err(err)
                }
                Err(_) => Err(RemoteError::Timeout {
                    service: label,
                    after: self.timeout,
                }),
            }
        });

        let result = first_success(attempts).await;
        match &result {
            Ok(hit) => info!(source = %hit.source, "remote decode succeeded"),
            Err(errors) => info!(failures = errors.len(), "all remote decoders failed"),
        }
        result
    }
}
