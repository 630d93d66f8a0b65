use super::RemoteService;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const LABEL: &str = "2dcode.biz";

/// Body of a 2dcode.biz response
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    /// Zero on success
    pub code: i64,
    /// Decoded contents
    #[serde(default)]
    pub data: Option<ApiData>,
    /// Error description
    #[serde(default)]
    pub message: Option<String>,
}

/// `data` object of an [`ApiResponse`]
#[derive(Debug, Default, Deserialize)]
pub struct ApiData {
    /// One entry per code found
    #[serde(default)]
    pub contents: Vec<String>,
}

impl ApiResponse {
    /// First decoded payload, or the reason there is none
    pub fn into_payload(self) -> Result<String, RemoteError> {
        if self.code != 0 {
            return Err(RemoteError::Rejected {
                service: LABEL.to_string(),
                message: self
                    .message
                    .unwrap_or_else(|| format!("code {}", self.code)),
            });
        }
        self.data
            .and_then(|data| data.contents.into_iter().find(|c| !c.is_empty()))
            .ok_or_else(|| RemoteError::NoPayload {
                service: LABEL.to_string(),
            })
    }
}

/// 2dcode.biz JSON API: `GET <endpoint>?file_url=<image url>`
pub struct QrApi {
    client: Client,
    endpoint: String,
}

impl QrApi {
    /// Service at `endpoint`
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl RemoteService for QrApi {
    fn label(&self) -> &str {
        LABEL
    }

    async fn decode_url(&self, image_url: &str) -> Result<String, RemoteError> {
        let http = |source| RemoteError::Http {
            service: LABEL.to_string(),
            source,
        };
        let body: ApiResponse = self
            .client
            .get(&self.endpoint)
            .query(&[("file_url", image_url)])
            .send()
            .await
            .map_err(http)?
            .error_for_status()
            .map_err(http)?
            .json()
            .await
            .map_err(http)?;
        body.into_payload()
    }
}
