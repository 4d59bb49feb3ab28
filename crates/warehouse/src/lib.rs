//! Warehouse connectivity for Quarry.
//!
//! [`WarehouseClient`] is an owned, explicitly constructed handle over the
//! Snowflake SQL API v2 — it is passed into whichever tool needs it rather
//! than living in process-global state. It implements the
//! [`QueryExecutor`](quarry_core::QueryExecutor) trait defined in core so the
//! rest of the system (and tests) never depend on the concrete client.

pub mod client;

pub use client::WarehouseClient;
