use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::protocol::{IngestResponse, QueryRequest, QueryResponse};
use tracing::{info, warn};

pub mod config;
pub mod error;

pub use config::{load_settings, normalize_api_base, ClientSettings};
pub use error::TransferError;

/// One document queued for `/ingest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// The two backend operations the desktop controller depends on.
#[async_trait]
pub trait QaBackend: Send + Sync {
    async fn ingest(&self, files: Vec<FileUpload>) -> Result<IngestResponse, TransferError>;
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, TransferError>;
}

/// HTTP client for the retrieval backend.
///
/// Performs exactly one round trip per call. It never retries, never applies a timeout and
/// never interprets the application payload beyond decoding it.
pub struct TransferClient {
    http: Client,
    base_url: String,
}

impl TransferClient {
    pub fn new(api_base: &str) -> Result<Self, TransferError> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_api_base(api_base)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Uploads `files` as one multipart request with a `files` part per entry, in order.
    ///
    /// An empty list is sent as-is; callers decide whether that is meaningful.
    pub async fn ingest(&self, files: Vec<FileUpload>) -> Result<IngestResponse, TransferError> {
        let endpoint = format!("{}/ingest", self.base_url);
        let file_count = files.len();
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(&file.media_type)?;
            form = form.part("files", part);
        }

        info!(files = file_count, %endpoint, "ingest: posting multipart upload");
        let response = self.http.post(&endpoint).multipart(form).send().await?;
        decode_response(&endpoint, response).await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, TransferError> {
        let endpoint = format!("{}/query", self.base_url);
        info!(
            mode = request.mode.label(),
            top_k = request.top_k,
            %endpoint,
            "query: posting request"
        );
        let response = self.http.post(&endpoint).json(request).send().await?;
        decode_response(&endpoint, response).await
    }
}

#[async_trait]
impl QaBackend for TransferClient {
    async fn ingest(&self, files: Vec<FileUpload>) -> Result<IngestResponse, TransferError> {
        TransferClient::ingest(self, files).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, TransferError> {
        TransferClient::query(self, request).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, TransferError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        warn!(status = status.as_u16(), %endpoint, "backend returned failure status");
        return Err(TransferError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| TransferError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
