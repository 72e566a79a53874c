#![warn(missing_docs)]

//! ScatterFS metadata plane: splits files into replicated chunks, tracks
//! storage-node health, places replicas, and drives transfer/deletion
//! against the nodes with bounded concurrency and retry.

pub mod chunk_size;
pub mod config;
pub mod delete;
pub mod deletion;
pub mod divider;
pub mod error;
pub mod health;
pub mod lookup;
pub mod monitor;
pub mod placement;
pub mod registrar;
pub mod replication;
pub mod store;
pub mod transfer;
pub mod types;
pub mod upload;

pub use error::{MetaError, Result};
