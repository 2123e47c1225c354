//! GraphRAG chat client
//!
//! A small terminal client for a GraphRAG chat agent: it keeps a local
//! session identity, sends chat messages, uploads documents for indexing
//! and opens the knowledge-graph visualization the service renders.
//!
//! # Architecture
//!
//! - **Session**: A per-profile `User_<n>` identity sent as `X-User-ID`
//! - **Transport**: One request/response round trip per operation, no retry
//! - **Rendering**: All visible effects go through a [`render::RenderSink`]
//!
//! # Modules
//!
//! - [`client`]: Chat, upload and graph operations
//! - [`config`]: Layered configuration and CLI
//! - [`render`]: Rendering sinks (terminal, recording)
//! - [`repl`]: Interactive command loop
//! - [`session`]: Session identity and profile storage
//! - [`transport`]: Backend trait and HTTP implementation
//! - [`types`]: Wire types and the chat log model

pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod repl;
pub mod session;
pub mod transport;
pub mod types;

pub use client::MessagingClient;
pub use error::{Error, Result};
