//! Seam between the interaction controller and the answering service.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Source,
    error::BackendErrorBody,
    protocol::{
        AddUrlRequest, AddUrlResponse, AnswerReply, AnswerRequest, AnswerResponse,
        UrlHistoryResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::error::BackendError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[async_trait]
pub trait AnswerBackend: Send + Sync {
    async fn get_answer(&self, request: &AnswerRequest) -> Result<AnswerReply, BackendError>;
    async fn url_history(&self) -> Result<Vec<Source>, BackendError>;
    async fn add_url(&self, request: &AddUrlRequest) -> Result<AddUrlResponse, BackendError>;
}

/// `AnswerBackend` over plain HTTP+JSON. No auth, no request ids and no
/// timeout beyond reqwest's defaults.
pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, BackendError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, BackendError> {
        let trimmed = server_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|source| BackendError::InvalidBaseUrl {
            url: server_url.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            server_url: trimmed.to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl AnswerBackend for HttpBackend {
    async fn get_answer(&self, request: &AnswerRequest) -> Result<AnswerReply, BackendError> {
        debug!(temperature = request.temperature, "requesting answer");
        let res = self
            .http
            .post(format!("{}/get_answer", self.server_url))
            .json(request)
            .send()
            .await?;
        let body: AnswerResponse = decode_success(res, "/get_answer").await?;
        Ok(body.into_reply())
    }

    async fn url_history(&self) -> Result<Vec<Source>, BackendError> {
        let res = self
            .http
            .get(format!("{}/url_history", self.server_url))
            .send()
            .await?;
        let body: UrlHistoryResponse = decode_success(res, "/url_history").await?;
        Ok(body.into_sources())
    }

    async fn add_url(&self, request: &AddUrlRequest) -> Result<AddUrlResponse, BackendError> {
        debug!(url = %request.url, "requesting source indexing");
        let res = self
            .http
            .post(format!("{}/add_url", self.server_url))
            .json(request)
            .send()
            .await?;
        decode_success(res, "/add_url").await
    }
}

/// Maps non-2xx statuses to `BackendError::Status` and decodes a 2xx body.
/// A 2xx body that does not match `T` decodes to `T::default()`: a shape
/// mismatch is not a transport failure.
async fn decode_success<T>(res: Response, endpoint: &'static str) -> Result<T, BackendError>
where
    T: DeserializeOwned + Default,
{
    let status = res.status();
    let bytes = res.bytes().await?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status,
            detail: BackendErrorBody::detail_from_bytes(&bytes),
        });
    }

    match serde_json::from_slice(&bytes) {
        Ok(body) => Ok(body),
        Err(err) => {
            debug!(endpoint, error = %err, "backend returned an unexpected body shape");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
