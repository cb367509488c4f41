//! Storage, dispatch and collaborator contracts.

pub mod adapters;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod interfaces;
pub mod ledger;
pub mod logging;
pub mod pool;
pub mod registry;
pub mod router;
pub mod schemas;
pub mod store;
pub mod time;
