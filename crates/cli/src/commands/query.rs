//! `quarry query` — raw SQL against the warehouse.

use std::sync::Arc;

use quarry_core::warehouse::QueryExecutor;
use quarry_warehouse::WarehouseClient;

use super::load_config;

pub async fn run(sql: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    config.require_warehouse()?;

    let client = Arc::new(WarehouseClient::new(&config.warehouse)?);
    let result = client.execute_query(&sql).await?;

    println!("{}", result.preview(50));
    eprintln!("({} rows, {} columns)", result.row_count(), result.column_count());

    Ok(())
}
