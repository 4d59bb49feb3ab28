pub mod ask;
pub mod query;
pub mod run;
pub mod status;

use std::sync::Arc;

use quarry_agent::{AgentLoop, RunConfig};
use quarry_config::AppConfig;
use quarry_providers::CortexProvider;
use quarry_tools::{ExecuteQueryTool, FinalAnswerTool};
use quarry_warehouse::WarehouseClient;

use quarry_core::tool::ToolRegistry;

/// Load config, failing with a friendly message.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Build an agent loop wired to the live warehouse and Cortex endpoint.
pub fn build_agent(
    config: &AppConfig,
) -> Result<(AgentLoop, Arc<WarehouseClient>, Arc<CortexProvider>), Box<dyn std::error::Error>> {
    config.require_warehouse()?;

    let client = Arc::new(WarehouseClient::new(&config.warehouse)?);
    let provider = Arc::new(CortexProvider::from_config(&config.warehouse)?);

    let mut tools = ToolRegistry::new();
    tools.register(Box::new(ExecuteQueryTool::new(client.clone())));
    tools.register(Box::new(FinalAnswerTool));

    let agent = AgentLoop::new(provider.clone(), Arc::new(tools)).with_config(RunConfig {
        model: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: Some(config.model.max_tokens),
        max_steps: config.agent.max_steps,
    });

    Ok((agent, client, provider))
}
