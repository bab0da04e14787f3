pub mod auth;
pub mod config;
pub mod users;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bankdesk_client::{ApiClient, ApiSettings};
use bankdesk_core::{DeskConfig, FetchError, FileSession, SessionContext};
use clap::ValueEnum;
use tracing::debug;

/// Resolved configuration and session shared by every command
pub struct Desk {
    pub config: DeskConfig,
    pub session: Arc<FileSession>,
}

impl Desk {
    /// Load config (defaults when missing) and open the session file.
    ///
    /// Priority for the endpoint: flag/env > config.toml > default.
    pub fn load(endpoint: Option<String>, insecure: bool) -> Result<Self> {
        let mut config = DeskConfig::load_or_default()
            .context("Failed to load config")?
            .with_endpoint_override(endpoint);
        config.api.insecure |= insecure;

        let session_path = config.session_path();
        let session = FileSession::open(&session_path)
            .with_context(|| format!("Failed to open session file {:?}", session_path))?;
        debug!(endpoint = %config.api.endpoint, session = %session_path.display(), "desk loaded");

        Ok(Self {
            config,
            session: Arc::new(session),
        })
    }

    pub fn api(&self) -> Result<ApiClient> {
        let settings = ApiSettings::from_config(&self.config);
        let session: Arc<dyn SessionContext> = self.session.clone();
        ApiClient::new(&settings, session).map_err(|e| anyhow!(e))
    }

    /// Fail early when nobody is signed in.
    pub fn require_session(&self) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(anyhow!("Not signed in.\n\nRun: bankdesk login --email <email>"))
        }
    }

    /// Turn an API failure into a command error, signing out on 401.
    pub fn api_error(&self, err: FetchError) -> anyhow::Error {
        match err {
            FetchError::Unauthenticated => {
                self.session.invalidate();
                anyhow!("Session expired.\n\nRun: bankdesk login --email <email>")
            }
            other => anyhow!(other),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
    /// Quiet mode - IDs only
    Quiet,
}

pub fn get_output_format(output: OutputFormat, json_flag: bool, quiet_flag: bool) -> OutputFormat {
    if json_flag {
        OutputFormat::Json
    } else if quiet_flag {
        OutputFormat::Quiet
    } else {
        output
    }
}
