//! Model gateway implementations for Quarry.
//!
//! A gateway adapts a vendor chat endpoint into the normalized
//! [`Provider`](quarry_core::Provider) shape: message sequence in, a single
//! assistant turn with optional tool calls out. Gateways never retry — retry
//! policy belongs to the caller.

pub mod cortex;

pub use cortex::CortexProvider;
