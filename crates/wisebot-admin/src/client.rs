//! HTTP client for the ingestion endpoints.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use wisebot_core::ids::SessionIdentity;
use wisebot_settings::{AdminSettings, WisebotSettings};

use crate::errors::{AdminError, Result};
use crate::types::{
    ChatRequest, DEFAULT_TEXT_TITLE, FileEntry, FileList, ProcessResponse, ProcessingStatus,
    ProcessingTicket, TextInput, UploadResponse,
};
use crate::validation::{check_document_size, check_text, document_mime};

/// Client for the document-ingestion HTTP surface.
#[derive(Clone, Debug)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
    settings: AdminSettings,
}

impl AdminClient {
    /// Client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>, settings: AdminSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(concat!("wisebot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            settings,
        })
    }

    /// Client configured from loaded settings.
    pub fn from_settings(settings: &WisebotSettings) -> Result<Self> {
        Self::new(settings.server.http_url.clone(), settings.admin.clone())
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Settings in effect.
    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<Value> {
        let response = self.http.get(self.url("/health")).send().await?;
        decode(response).await
    }

    /// Store a document without indexing it.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadResponse> {
        self.post_document("/upload/", path).await
    }

    /// Store and index a document synchronously.
    pub async fn process_document(&self, path: &Path) -> Result<ProcessResponse> {
        let result: ProcessResponse = self.post_document("/upload/process", path).await?;
        info!(path = %path.display(), chunks = result.chunks_created, "document processed");
        Ok(result)
    }

    /// Start background processing; poll with
    /// [`processing_status`](Self::processing_status).
    pub async fn process_document_async(&self, path: &Path) -> Result<ProcessingTicket> {
        let ticket: ProcessingTicket = self.post_document("/upload/process-async", path).await?;
        info!(path = %path.display(), id = %ticket.processing_id, "processing started");
        Ok(ticket)
    }

    /// `GET /upload/status/{id}`.
    pub async fn processing_status(&self, id: &str) -> Result<ProcessingStatus> {
        let url = self.url(&format!("/upload/status/{id}"));
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Index raw text under `title` (default "Manual Text Input").
    pub async fn process_text(&self, text: &str, title: Option<&str>) -> Result<ProcessResponse> {
        check_text(text, self.settings.max_text_bytes)?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEXT_TITLE);

        let response = self
            .http
            .post(self.url("/upload/process-text"))
            .timeout(self.settings.upload_timeout())
            .json(&TextInput { text, title })
            .send()
            .await?;
        let result: ProcessResponse = decode(response).await?;
        info!(title, chunks = result.chunks_created, "text processed");
        Ok(result)
    }

    /// Documents stored on the server.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let response = self.http.get(self.url("/upload/list")).send().await?;
        let list: FileList = decode(response).await?;
        Ok(list.files)
    }

    /// Send a chat message over HTTP instead of the realtime transport.
    pub async fn send_chat_message(&self, message: &str, user: &SessionIdentity) -> Result<Value> {
        let response = self
            .http
            .post(self.url("/chat/"))
            .json(&ChatRequest {
                message,
                user_id: user.as_str(),
            })
            .send()
            .await?;
        decode(response).await
    }

    async fn post_document<T: DeserializeOwned>(&self, endpoint: &str, path: &Path) -> Result<T> {
        let part = self.document_part(path).await?;
        let form = Form::new().part("file", part);
        debug!(endpoint, path = %path.display(), "uploading document");
        let response = self
            .http
            .post(self.url(endpoint))
            .timeout(self.settings.upload_timeout())
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn document_part(&self, path: &Path) -> Result<Part> {
        let mime = document_mime(path)?;
        let size = tokio::fs::metadata(path).await?.len();
        check_document_size(size, self.settings.max_upload_bytes)?;

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "document".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Part::bytes(bytes).file_name(name).mime_str(mime)?)
    }
}

/// Map a response to `T`, turning non-2xx statuses into [`AdminError::Status`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let detail = error_detail(&body);
        warn!(status = status.as_u16(), %detail, "request failed");
        return Err(AdminError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// FastAPI puts the reason in `detail`, as a string or a list of
/// validation errors.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_owned(),
        },
        _ => body.to_owned(),
    }
}
