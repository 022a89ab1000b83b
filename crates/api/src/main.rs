use std::sync::Arc;

use api::agents::{self, AgentsError};
use api::state::open_store;
use api::{AppConfig, AppState};
use chat_storage::{spawn_reaper, SystemClock};
use orchestrator::{load_classifier_prompt, Classifier, Orchestrator, OrchestratorConfig};
use remote_agent::{ChatCompletionModel, HttpAgentConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("agent_router=info".parse()?)
                .add_directive("api=info".parse()?)
                .add_directive("orchestrator=info".parse()?),
        )
        .init();

    let app_config = AppConfig::from_env()?;
    let config = OrchestratorConfig::from_env()?;
    info!(addr = %app_config.addr, storage = ?app_config.storage, "Starting agent router");

    // Agents
    let entries = match &app_config.agents_file {
        Some(path) => agents::load_manifest(path)?,
        None => agents::energy_entries_from_env()?,
    };
    let runtime = if agents::requires_runtime(&entries) {
        Some(HttpAgentConfig::from_env().map_err(AgentsError::from)?)
    } else {
        None
    };
    let registry = agents::build_registry(entries, runtime.as_ref())?;

    // Classifier
    let model = ChatCompletionModel::from_env()?;
    let classifier = Classifier::configured(Arc::new(model), load_classifier_prompt(), &config);

    // Conversation store
    let clock = Arc::new(SystemClock);
    let store = open_store(&app_config.storage, config.retention(), clock.clone()).await?;
    if let Some(every) = app_config.reaper_interval {
        spawn_reaper(store.clone(), every);
    }

    let orchestrator = Orchestrator::new(config, Arc::new(registry), classifier, store)
        .with_clock(clock);
    let app = api::app(AppState::new(Arc::new(orchestrator)));

    info!(addr = %app_config.addr, "Agent router listening");
    let listener = tokio::net::TcpListener::bind(app_config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
