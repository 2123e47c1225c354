//! Wire types for the chat service and the display-only message model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// Chat log
// =============================================================================

/// Who authored a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text typed by the local user.
    User,
    /// Text attributed to the remote service.
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Bot => f.write_str("bot"),
        }
    }
}

/// A single entry in the append-only chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }
}

// =============================================================================
// Chat API
// =============================================================================

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The agent's answer.
    pub response: String,
    /// Retrieval tool the agent picked (graph or vector search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

// =============================================================================
// Upload API
// =============================================================================

/// Response of `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

// =============================================================================
// Visualize API
// =============================================================================

/// Response of `GET /visualize`.
///
/// The service either returns a `url` or an error body without one; both
/// decode into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VisualizeResponse {
    /// The graph URL, if the service produced a usable one.
    pub fn graph_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Graph rendering flavour offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphMode {
    #[serde(rename = "2d")]
    Flat,
    #[serde(rename = "3d")]
    Spatial,
}

impl GraphMode {
    /// Path segment used in `/visualize/{mode}`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "2d",
            Self::Spatial => "3d",
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2d" => Ok(Self::Flat),
            "3d" => Ok(Self::Spatial),
            other => Err(Error::Config(format!(
                "unknown graph mode '{other}' (expected 2d or 3d)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualize_without_url() {
        let resp: VisualizeResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.graph_url().is_none());

        let resp: VisualizeResponse =
            serde_json::from_str(r#"{"error": "No graph data found. Upload a file first!"}"#)
                .unwrap();
        assert!(resp.graph_url().is_none());
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_visualize_empty_url_is_absent() {
        let resp: VisualizeResponse = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(resp.graph_url().is_none());

        let resp: VisualizeResponse = serde_json::from_str(r#"{"url": "http://x"}"#).unwrap();
        assert_eq!(resp.graph_url(), Some("http://x"));
    }

    #[test]
    fn test_chat_response_tool_is_optional() {
        let resp: ChatResponse = serde_json::from_str(r#"{"response": "hello"}"#).unwrap();
        assert_eq!(resp.response, "hello");
        assert!(resp.tool.is_none());

        let resp: ChatResponse =
            serde_json::from_str(r#"{"response": "hi", "tool": "graph"}"#).unwrap();
        assert_eq!(resp.tool.as_deref(), Some("graph"));
    }

    #[test]
    fn test_graph_mode_parse() {
        assert_eq!("2d".parse::<GraphMode>().unwrap(), GraphMode::Flat);
        assert_eq!(" 3D ".parse::<GraphMode>().unwrap(), GraphMode::Spatial);
        assert!("4d".parse::<GraphMode>().is_err());
        assert_eq!(GraphMode::Flat.to_string(), "2d");
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::bot("ok")).unwrap();
        assert_eq!(json, r#"{"text":"ok","sender":"bot"}"#);
    }
}
