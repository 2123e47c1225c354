//! GraphRAG chat client
//!
//! Entry point for the interactive terminal client.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use graphrag_chat_client::config::AppConfig;
use graphrag_chat_client::render::{RenderSink, TerminalSink};
use graphrag_chat_client::repl::{HELP, Repl};
use graphrag_chat_client::session::{FileStore, get_or_create_session_id};
use graphrag_chat_client::transport::{ChatBackend, HttpBackend};
use graphrag_chat_client::MessagingClient;

fn init_tracing(json: bool) {
    // Logs go to stderr so they never interleave with the chat log.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(config.logging.json);

    let store = FileStore::in_profile(config.profile_dir());
    info!(
        name: "client.config.loaded",
        base_url = %config.server.base_url,
        store = %store.path().display(),
        "Configuration loaded"
    );

    let sink: Arc<dyn RenderSink> = Arc::new(TerminalSink::stdout());
    let session = get_or_create_session_id(&store, sink.as_ref());

    let backend: Arc<dyn ChatBackend> = Arc::new(
        HttpBackend::new(&config.server.base_url).context("invalid server URL")?,
    );
    let client = MessagingClient::new(session, backend, Arc::clone(&sink));

    sink.alert(HELP);
    let repl = Repl::new(client, sink, config.graph_mode()?);
    repl.run(BufReader::new(tokio::io::stdin())).await?;

    info!(name: "client.stopped", "Client stopped");
    Ok(())
}
