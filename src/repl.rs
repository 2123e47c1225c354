//! Interactive terminal loop.
//!
//! Each input line becomes a [`Command`]. Network-bound commands run as
//! their own task so the prompt keeps accepting input while a request is in
//! flight; answers are appended whenever they arrive.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tokio::task::JoinError;
use tracing::{debug, error};

use crate::client::MessagingClient;
use crate::render::RenderSink;
use crate::types::GraphMode;

pub const HELP: &str = "\
Commands:
  <text>           send a chat message
  /upload <path>   upload a file for indexing
  /graph [2d|3d]   show the knowledge graph
  /close           hide the graph
  /help            show this help
  /quit            exit (also /exit)
Start a message with // to send a literal leading slash.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Upload(Option<PathBuf>),
    Graph(Option<GraphMode>),
    CloseGraph,
    Help,
    Quit,
    /// Unusable input, with the notice to show.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(literal) = line.strip_prefix("//") {
            return Self::Message(format!("/{literal}"));
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };

        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

        match name {
            "upload" => Self::Upload((!arg.is_empty()).then(|| PathBuf::from(arg))),
            "graph" if arg.is_empty() => Self::Graph(None),
            "graph" => match arg.parse() {
                Ok(mode) => Self::Graph(Some(mode)),
                Err(e) => Self::Invalid(e.to_string()),
            },
            "close" => Self::CloseGraph,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Invalid(format!("Unknown command: /{other} (try /help)")),
        }
    }
}

/// Terminal front end over a [`MessagingClient`].
pub struct Repl {
    client: MessagingClient,
    sink: Arc<dyn RenderSink>,
    default_mode: Option<GraphMode>,
}

impl std::fmt::Debug for Repl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repl")
            .field("client", &self.client)
            .field("default_mode", &self.default_mode)
            .finish_non_exhaustive()
    }
}

impl Repl {
    pub fn new(
        client: MessagingClient,
        sink: Arc<dyn RenderSink>,
        default_mode: Option<GraphMode>,
    ) -> Self {
        Self {
            client,
            sink,
            default_mode,
        }
    }

    /// Read commands until EOF or `/quit`, then wait for in-flight requests.
    pub async fn run<R>(&self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut tasks = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            while let Some(joined) = tasks.try_join_next() {
                log_task_failure(joined);
            }

            let command = Command::parse(&line);
            debug!(name: "repl.command", command = ?command, "Command received");

            let client = self.client.clone();
            match command {
                Command::Quit => break,
                Command::Help => self.sink.alert(HELP),
                Command::Invalid(notice) => self.sink.alert(&notice),
                Command::CloseGraph => client.close_graph(),
                Command::Message(text) => {
                    tasks.spawn(async move { client.send_message(&text).await });
                }
                Command::Upload(path) => {
                    tasks.spawn(async move { client.upload_file(path.as_deref()).await });
                }
                Command::Graph(mode) => {
                    let mode = mode.or(self.default_mode);
                    tasks.spawn(async move { client.show_graph(mode).await });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_task_failure(joined);
        }
        Ok(())
    }
}

fn log_task_failure(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(name: "repl.task_failed", error = %e, panicked = e.is_panic(), "Command task failed");
    }
}
