use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracker_core::{StatusPayload, TaskId};
use tracker_logging::{tracker_debug, tracker_warn};
use url::Url;

use crate::{ApiError, FailureKind, MediaProbe};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Multipart field name the upload endpoint expects.
    pub upload_field: String,
    pub connect_timeout: Duration,
    /// Status requests have no timeout unless one is set here.
    pub request_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            upload_field: "video".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            poll_interval: Duration::from_millis(2000),
            max_artifact_bytes: 512 * 1024 * 1024,
        }
    }
}

/// The collaborators the controller talks to.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// `POST /upload`; returns the task id.
    async fn upload(&self, path: &Path) -> Result<TaskId, ApiError>;

    /// `GET /status/{task_id}`.
    async fn status(&self, task_id: &str) -> Result<StatusPayload, ApiError>;

    async fn probe_media(&self, url: &str) -> Result<MediaProbe, ApiError>;

    async fn fetch_json(&self, url: &str) -> Result<Value, ApiError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct UploadAccepted {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
struct UploadRejected {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Resolves artifact URLs, which may be relative to the server.
    pub fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        self.base
            .join(url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn status_url(&self, task_id: &str) -> Result<Url, ApiError> {
        let mut url = self.resolve("/status/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .push(task_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn upload(&self, path: &Path) -> Result<TaskId, ApiError> {
        let url = self.resolve("/upload")?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("video")
            .to_string();
        tracker_debug!("uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let part = Part::bytes(bytes).file_name(file_name);
        let form = Form::new().part(self.settings.upload_field.clone(), part);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(upload_rejection(status, &body));
        }

        let accepted: UploadAccepted = serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        Ok(accepted.task_id)
    }

    async fn status(&self, task_id: &str) -> Result<StatusPayload, ApiError> {
        let url = self.status_url(task_id)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| {
            tracker_warn!("status payload for {} did not decode: {}", task_id, err);
            ApiError::new(FailureKind::Decode, err.to_string())
        })
    }

    async fn probe_media(&self, url: &str) -> Result<MediaProbe, ApiError> {
        let url = self.resolve(url)?;
        let response = self.client.head(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let headers = response.headers();
        Ok(MediaProbe {
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            content_length: headers
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok()),
        })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, ApiError> {
        let bytes = self.download(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.resolve(url)?;
        let max_bytes = self.settings.max_artifact_bytes;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Server-supplied `error` text, else the HTTP status line.
fn upload_rejection(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<UploadRejected>(body)
        .ok()
        .and_then(|rejected| rejected.error)
        .unwrap_or_else(|| format!("HTTP error! Status: {}", status.as_u16()));
    ApiError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
