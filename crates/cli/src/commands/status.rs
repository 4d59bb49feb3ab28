//! `quarry status` — show configuration and connectivity.

use std::sync::Arc;

use quarry_config::AppConfig;
use quarry_core::warehouse::QueryExecutor;
use quarry_warehouse::WarehouseClient;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Quarry Status");
    println!("=============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Model:          {}", config.model.name);
    println!("  Temperature:    {}", config.model.temperature);
    println!("  Max steps:      {}", config.agent.max_steps);
    println!("  Semantic model: {}", config.semantic.model_path.display());
    println!(
        "  Warehouse host: {}",
        if config.warehouse.host.is_empty() {
            "(not set)"
        } else {
            &config.warehouse.host
        }
    );
    println!(
        "  Token:          {}",
        if config.warehouse.token.is_some() {
            "configured"
        } else {
            "missing"
        }
    );

    if config.require_warehouse().is_ok() {
        let client = Arc::new(WarehouseClient::new(&config.warehouse)?);
        match client.execute_query("SELECT 1").await {
            Ok(_) => println!("\n  Warehouse connection OK"),
            Err(e) => println!("\n  Warehouse connection failed: {e}"),
        }
    } else {
        println!("\n  Warehouse not configured — set SNOWFLAKE_HOST and SNOWFLAKE_TOKEN");
    }

    Ok(())
}
