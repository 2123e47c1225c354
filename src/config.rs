use std::path::{Path, PathBuf};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::types::GraphMode;

/// Default service address (the agent's development server).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Directory name used under the platform data dir for the default profile.
const PROFILE_DIR_NAME: &str = "graphrag-chat";

/// Config file picked up from the working directory when none is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for a GraphRAG chat agent", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the chat service
    #[arg(long, env = "SERVER_URL")]
    pub server_url: Option<String>,

    /// Profile directory holding the persisted session identity
    #[arg(long, env = "PROFILE_DIR")]
    pub profile_dir: Option<PathBuf>,

    /// Graph flavour to request (2d or 3d)
    #[arg(long)]
    pub graph_mode: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProfileConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GraphConfig {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering: defaults < config file < `GRAPHRAG_*` env < CLI flags
    /// (clap also reads `SERVER_URL`, `PROFILE_DIR` and `CONFIG_FILE`).
    pub fn load_from_args<I, T>(args: I) -> std::result::Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.base_url", DEFAULT_BASE_URL)?
            .set_default("logging.json", false)?;

        match cli.config.as_deref() {
            Some(path) => {
                builder = builder.add_source(File::from(Path::new(path)).required(true));
            }
            None if Path::new(CWD_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(CWD_CONFIG_FILE)));
            }
            None => {}
        }

        // E.g. GRAPHRAG_SERVER__BASE_URL=http://agent:5000
        builder = builder.add_source(
            Environment::with_prefix("GRAPHRAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = cli.server_url {
            builder = builder.set_override("server.base_url", url)?;
        }
        if let Some(dir) = cli.profile_dir {
            builder = builder.set_override("profile.dir", dir.to_string_lossy().into_owned())?;
        }
        if let Some(mode) = cli.graph_mode {
            builder = builder.set_override("graph.mode", mode)?;
        }
        if cli.log_json {
            builder = builder.set_override("logging.json", true)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Directory holding this profile's persisted state.
    ///
    /// Falls back to the platform's local data dir, then the working dir.
    pub fn profile_dir(&self) -> PathBuf {
        self.profile.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(PROFILE_DIR_NAME)
        })
    }

    /// Configured graph flavour, if any.
    pub fn graph_mode(&self) -> Result<Option<GraphMode>> {
        self.graph
            .mode
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(str::parse::<GraphMode>)
            .transpose()
    }

    /// Check values the deserializer cannot.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.server.base_url)?;
        self.graph_mode()?;
        Ok(())
    }
}
