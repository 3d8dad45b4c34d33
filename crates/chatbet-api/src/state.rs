//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API, pinned to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatbet_core::context::store::ContextStore;
use chatbet_core::data::box_client::BoxSportsDataClient;
use chatbet_core::data::service::{DataSettings, SportsDataService};
use chatbet_core::llm::box_capability::BoxModelCapability;
use chatbet_core::orchestrator::Orchestrator;
use chatbet_infra::config::{load_config, resolve_data_dir};
use chatbet_infra::llm::create_model;
use chatbet_infra::sports::ChatBetApiClient;
use chatbet_types::config::ChatBetConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub context: Arc<ContextStore>,
    pub config: Arc<ChatBetConfig>,
    pub data_dir: PathBuf,
    /// Cancels background tasks on shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Load configuration and wire the data client, model and orchestrator.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;

        let client = ChatBetApiClient::new(
            &config.data_api,
            Duration::from_millis(config.timeouts.data_timeout_ms),
        )?;
        let model = create_model(&config.model)?;

        let state = Self::from_parts(config, BoxSportsDataClient::new(client), model, data_dir);
        tracing::debug!(
            data_dir = %state.data_dir.display(),
            model = state.orchestrator.model_name(),
            "application state initialized"
        );
        Ok(state)
    }

    /// Wire state around already-built capabilities.
    pub fn from_parts(
        config: ChatBetConfig,
        client: BoxSportsDataClient,
        model: BoxModelCapability,
        data_dir: PathBuf,
    ) -> Self {
        let context = Arc::new(ContextStore::from_config(&config));
        let data = Arc::new(SportsDataService::new(client, DataSettings::from_config(&config)));
        let orchestrator = Orchestrator::from_config(&config, Arc::clone(&context), data, model);

        Self {
            orchestrator: Arc::new(orchestrator),
            context,
            config: Arc::new(config),
            data_dir,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start the idle-session pruner. It stops when `shutdown` is cancelled.
    pub fn spawn_pruner(&self) -> JoinHandle<()> {
        Arc::clone(&self.context).spawn_pruner(
            Duration::from_secs(self.config.prune_interval_secs.max(1)),
            self.shutdown.clone(),
        )
    }
}
