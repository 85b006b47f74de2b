//! # armins-core
//!
//! Core library for armins - a chat client for an argument-mining service.
//!
//! This library provides:
//! - Domain types for chats and messages
//! - Persistence of chat history and messages (files, SQLite, or memory)
//! - The session store that owns all chat state
//! - The analysis request pipeline and model catalog
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use armins_core::{ChatSession, Config, MessageInput};
//!
//! # async fn run() -> armins_core::Result<()> {
//! let config = Config::load()?;
//! let mut session = ChatSession::open(&config)?;
//! session.fetch_models().await;
//! session
//!     .send_message(MessageInput::text("Remote work improves productivity"))
//!     .await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use catalog::{AvailableModels, ModelCatalog, ModelInfo, Provider};
pub use chat::{ChatSession, MessageInput, PendingAnalysis};
pub use config::Config;
pub use error::{Error, Result};
pub use session::SessionStore;
pub use types::*;

// Public modules
pub mod api;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod session;
pub mod storage;
pub mod types;
