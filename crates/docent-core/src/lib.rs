//! Shared foundation for the Docent workspace.
//!
//! Holds the configuration model, the workspace-level error taxonomy,
//! and the domain types exchanged between the storage, chat, and LLM crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::DocentConfig;
pub use error::{DocentError, Result};
pub use types::*;
