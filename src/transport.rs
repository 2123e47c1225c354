//! Transport to the chat service.
//!
//! [`ChatBackend`] is the seam between the client logic and the network;
//! [`HttpBackend`] is the reqwest implementation used by the binary.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::types::{ChatRequest, ChatResponse, GraphMode, UploadResponse, VisualizeResponse};

/// Header carrying the session identity on every request.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Multipart field name for uploads.
pub const UPLOAD_FIELD: &str = "file";

/// A file read into memory, ready to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Remote operations the client depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat`.
    async fn chat(&self, session: &SessionContext, message: &str) -> Result<ChatResponse>;

    /// `POST /upload`.
    async fn upload(&self, session: &SessionContext, file: UploadFile) -> Result<UploadResponse>;

    /// `GET /visualize` or `GET /visualize/{mode}`.
    ///
    /// Implementations return whatever JSON body the service sent, error
    /// status or not; a body without `url` means there is no graph.
    async fn visualize(
        &self,
        session: &SessionContext,
        mode: Option<GraphMode>,
    ) -> Result<VisualizeResponse>;

    /// Turn a URL returned by the service into one a frame can load.
    fn resolve_url(&self, url: &str) -> String {
        url.to_string()
    }
}

/// HTTP backend for the chat service.
///
/// # Example
///
/// ```rust,no_run
/// use graphrag_chat_client::transport::HttpBackend;
///
/// let backend = HttpBackend::new("http://127.0.0.1:5000")?;
/// assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:5000/");
/// # Ok::<(), graphrag_chat_client::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the service at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_ref())?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve an endpoint below the base URL, keeping any path prefix.
    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, session: &SessionContext, message: &str) -> Result<ChatResponse> {
        let req = ChatRequest {
            message: message.to_string(),
        };
        let response = self
            .http
            .post(self.url("chat"))
            .header(USER_ID_HEADER, session.id().as_str())
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn upload(&self, session: &SessionContext, file: UploadFile) -> Result<UploadResponse> {
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.url("upload"))
            .header(USER_ID_HEADER, session.id().as_str())
            .multipart(form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn visualize(
        &self,
        session: &SessionContext,
        mode: Option<GraphMode>,
    ) -> Result<VisualizeResponse> {
        let path = match mode {
            Some(mode) => format!("visualize/{mode}"),
            None => "visualize".to_string(),
        };
        let response = self
            .http
            .get(self.url(&path))
            .header(USER_ID_HEADER, session.id().as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(name: "graph.response", status = status.as_u16(), bytes = body.len(), "Visualize response");
        Ok(serde_json::from_slice(&body)?)
    }

    fn resolve_url(&self, url: &str) -> String {
        if Url::parse(url).is_ok() {
            return url.to_string();
        }
        self.base_url
            .join(url.trim_start_matches('/'))
            .map_or_else(|_| url.to_string(), String::from)
    }
}

/// Parse a service base URL so relative joins stay under its path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_path_prefix_kept() {
        let backend = HttpBackend::new("http://host:5000/agent").unwrap();
        assert_eq!(backend.base_url().as_str(), "http://host:5000/agent/");
        assert_eq!(backend.url("chat").as_str(), "http://host:5000/agent/chat");
        assert_eq!(
            backend.url("visualize/2d").as_str(),
            "http://host:5000/agent/visualize/2d"
        );
        assert_eq!(
            backend.resolve_url("/static/graph.html"),
            "http://host:5000/agent/static/graph.html"
        );

        let backend = HttpBackend::new("http://host:5000/agent/").unwrap();
        assert_eq!(backend.url("upload").as_str(), "http://host:5000/agent/upload");
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let backend = HttpBackend::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(backend.resolve_url("http://x"), "http://x");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let backend = HttpBackend::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            backend.resolve_url("/static/graph_User_1.html"),
            "http://127.0.0.1:5000/static/graph_User_1.html"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpBackend::new("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_file_read_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"graph rag").await.unwrap();

        let file = UploadFile::read(&path).await.unwrap();
        assert_eq!(file.file_name, "notes.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.bytes, b"graph rag");
    }

    #[tokio::test]
    async fn test_upload_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadFile::read(&dir.path().join("absent.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
