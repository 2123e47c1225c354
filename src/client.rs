//! Session & messaging client.
//!
//! Mediates between user input, the chat service and a [`RenderSink`].
//! Every operation is one request/response round trip. Failures collapse
//! into fixed user-facing messages; the cause only goes to the log.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::render::RenderSink;
use crate::session::SessionContext;
use crate::transport::{ChatBackend, UploadFile};
use crate::types::{ChatMessage, GraphMode};

/// Bot message shown when a chat request fails.
pub const CHAT_FALLBACK: &str = "Error connecting to agent.";
/// Bot message shown while an upload is in flight.
pub const UPLOAD_NOTICE: &str = "Uploading and indexing...";
/// Bot message shown when an upload fails.
pub const UPLOAD_FALLBACK: &str = "Upload failed.";
/// Alert shown when upload is invoked without a file.
pub const NO_FILE_ALERT: &str = "Please select a file";
/// Alert shown when the service has no graph for this session.
pub const NO_GRAPH_ALERT: &str = "No graph data found! Upload a file first.";

/// The chat client. Cheap to clone; clones share backend and sink.
#[derive(Clone)]
pub struct MessagingClient {
    session: SessionContext,
    backend: Arc<dyn ChatBackend>,
    sink: Arc<dyn RenderSink>,
}

impl std::fmt::Debug for MessagingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl MessagingClient {
    pub fn new(
        session: SessionContext,
        backend: Arc<dyn ChatBackend>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            session,
            backend,
            sink,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Send a chat message and append the agent's answer.
    ///
    /// Empty text is ignored: nothing is shown and nothing is sent.
    pub async fn send_message(&self, text: &str) {
        if text.is_empty() {
            return;
        }

        self.sink.append(ChatMessage::user(text));
        info!(name: "chat.sent", user_id = %self.session.id(), chars = text.len(), "Chat message sent");

        match self.backend.chat(&self.session, text).await {
            Ok(resp) => {
                debug!(name: "chat.answered", tool = resp.tool.as_deref().unwrap_or("unknown"), "Agent answered");
                self.sink.append(ChatMessage::bot(resp.response));
            }
            Err(e) => {
                warn!(name: "chat.failed", error = %e, "Chat request failed");
                self.sink.append(ChatMessage::bot(CHAT_FALLBACK));
            }
        }
    }

    /// Upload a file for indexing.
    ///
    /// `None` means no file was selected: the user is alerted and nothing is
    /// sent.
    pub async fn upload_file(&self, file: Option<&Path>) {
        let Some(path) = file else {
            self.sink.alert(NO_FILE_ALERT);
            return;
        };

        self.sink.append(ChatMessage::bot(UPLOAD_NOTICE));

        let result = match UploadFile::read(path).await {
            Ok(upload) => {
                info!(
                    name: "upload.started",
                    user_id = %self.session.id(),
                    file = %upload.file_name,
                    bytes = upload.bytes.len(),
                    "Uploading file"
                );
                self.backend.upload(&self.session, upload).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(resp) => self.sink.append(ChatMessage::bot(resp.message)),
            Err(e) => {
                warn!(name: "upload.failed", path = %path.display(), error = %e, "Upload failed");
                self.sink.append(ChatMessage::bot(UPLOAD_FALLBACK));
            }
        }
    }

    /// Ask the service for a graph and open it in the modal.
    ///
    /// Transport failures are logged only.
    pub async fn show_graph(&self, mode: Option<GraphMode>) {
        match self.backend.visualize(&self.session, mode).await {
            Ok(resp) => match resp.graph_url() {
                Some(url) => {
                    let src = self.backend.resolve_url(url);
                    info!(name: "graph.opened", url = %src, "Graph opened");
                    self.sink.set_frame_source(&src);
                    self.sink.set_modal_visible(true);
                }
                None => {
                    debug!(name: "graph.missing", reason = resp.error.as_deref().unwrap_or(""), "No graph available");
                    self.sink.alert(NO_GRAPH_ALERT);
                }
            },
            Err(e) => error!(name: "graph.failed", error = %e, "Visualize request failed"),
        }
    }

    /// Hide the graph modal.
    pub fn close_graph(&self) {
        self.sink.set_modal_visible(false);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, Result};
    use crate::render::RecordingSink;
    use crate::session::SessionId;
    use crate::types::{ChatResponse, UploadResponse, VisualizeResponse};

    /// Backend returning canned results and counting calls.
    #[derive(Default)]
    struct MockBackend {
        chat: Option<String>,
        upload: Option<String>,
        visualize: Option<VisualizeResponse>,
        calls: AtomicUsize,
        uploaded: Mutex<Vec<String>>,
        modes: Mutex<Vec<Option<GraphMode>>>,
    }

    fn offline() -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn chat(&self, session: &SessionContext, _message: &str) -> Result<ChatResponse> {
            assert_eq!(session.id().as_str(), "User_1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.chat
                .clone()
                .map(|response| ChatResponse {
                    response,
                    tool: None,
                })
                .ok_or_else(offline)
        }

        async fn upload(&self, _session: &SessionContext, file: UploadFile) -> Result<UploadResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.uploaded.lock().unwrap().push(file.file_name);
            self.upload
                .clone()
                .map(|message| UploadResponse { message })
                .ok_or_else(offline)
        }

        async fn visualize(
            &self,
            _session: &SessionContext,
            mode: Option<GraphMode>,
        ) -> Result<VisualizeResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.modes.lock().unwrap().push(mode);
            self.visualize.clone().ok_or_else(offline)
        }
    }

    fn client(backend: MockBackend) -> (MessagingClient, Arc<MockBackend>, Arc<RecordingSink>) {
        let backend = Arc::new(backend);
        let sink = Arc::new(RecordingSink::new());
        let session = SessionContext::new(SessionId::from_stored("User_1"));
        let client = MessagingClient::new(
            session,
            Arc::clone(&backend) as Arc<dyn ChatBackend>,
            Arc::clone(&sink) as Arc<dyn RenderSink>,
        );
        (client, backend, sink)
    }

    #[tokio::test]
    async fn test_empty_message_is_ignored() {
        let (client, backend, sink) = client(MockBackend {
            chat: Some("hello".into()),
            ..Default::default()
        });

        client.send_message("").await;

        assert!(sink.messages().is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_message_and_answer_in_order() {
        let (client, _backend, sink) = client(MockBackend {
            chat: Some("hello".into()),
            ..Default::default()
        });

        client.send_message("hi").await;

        assert_eq!(
            sink.messages(),
            vec![ChatMessage::user("hi"), ChatMessage::bot("hello")]
        );
    }

    #[tokio::test]
    async fn test_chat_failure_shows_fallback() {
        let (client, _backend, sink) = client(MockBackend::default());

        client.send_message("hi").await;

        assert_eq!(
            sink.messages(),
            vec![ChatMessage::user("hi"), ChatMessage::bot(CHAT_FALLBACK)]
        );
    }

    #[tokio::test]
    async fn test_upload_without_file_alerts() {
        let (client, backend, sink) = client(MockBackend {
            upload: Some("ok".into()),
            ..Default::default()
        });

        client.upload_file(None).await;

        assert_eq!(sink.alerts(), vec![NO_FILE_ALERT.to_string()]);
        assert!(sink.messages().is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, "AI and graphs").unwrap();

        let (client, backend, sink) = client(MockBackend {
            upload: Some("Processed paper.txt.".into()),
            ..Default::default()
        });

        client.upload_file(Some(&path)).await;

        assert_eq!(
            sink.messages(),
            vec![
                ChatMessage::bot(UPLOAD_NOTICE),
                ChatMessage::bot("Processed paper.txt.")
            ]
        );
        assert_eq!(*backend.uploaded.lock().unwrap(), vec!["paper.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, "AI and graphs").unwrap();

        let (client, _backend, sink) = client(MockBackend::default());

        client.upload_file(Some(&path)).await;

        assert_eq!(
            sink.messages(),
            vec![ChatMessage::bot(UPLOAD_NOTICE), ChatMessage::bot(UPLOAD_FALLBACK)]
        );
    }

    #[tokio::test]
    async fn test_upload_unreadable_file_never_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        let (client, backend, sink) = client(MockBackend {
            upload: Some("ok".into()),
            ..Default::default()
        });

        client.upload_file(Some(&dir.path().join("missing.pdf"))).await;

        assert_eq!(
            sink.messages(),
            vec![ChatMessage::bot(UPLOAD_NOTICE), ChatMessage::bot(UPLOAD_FALLBACK)]
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_show_graph_opens_modal() {
        let (client, backend, sink) = client(MockBackend {
            visualize: Some(VisualizeResponse {
                url: Some("http://x".into()),
                error: None,
            }),
            ..Default::default()
        });

        client.show_graph(None).await;

        assert_eq!(sink.frame_source().as_deref(), Some("http://x"));
        assert!(sink.modal_visible());
        assert!(sink.alerts().is_empty());
        assert_eq!(*backend.modes.lock().unwrap(), vec![None]);

        client.close_graph();
        assert!(!sink.modal_visible());
    }

    #[tokio::test]
    async fn test_show_graph_without_url_alerts() {
        let (client, _backend, sink) = client(MockBackend {
            visualize: Some(VisualizeResponse::default()),
            ..Default::default()
        });

        client.show_graph(Some(GraphMode::Flat)).await;

        assert_eq!(sink.alerts(), vec![NO_GRAPH_ALERT.to_string()]);
        assert!(!sink.modal_visible());
        assert!(sink.frame_source().is_none());
    }

    #[tokio::test]
    async fn test_show_graph_failure_is_silent() {
        let (client, _backend, sink) = client(MockBackend::default());

        client.show_graph(None).await;

        assert!(sink.alerts().is_empty());
        assert!(sink.messages().is_empty());
        assert!(!sink.modal_visible());
    }
}
