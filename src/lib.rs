//! # Graph Explorer
//!
//! A terminal client for exploring a graph-backed retrieval service: connect
//! to the graph store, ingest a document or codebase, ask questions, and watch
//! supporting evidence for the answer arrive section by section.
//!
//! ## Features
//!
//! - **Two backend profiles**: document chat (`/chat`) and code RAG (`/query`)
//! - **Result aggregation**: graph overview, entity context and entity paths
//!   fetched concurrently after every answer
//! - **Stale-result discard**: every answered query opens a new generation;
//!   late results from older generations never reach the panel
//! - **Collapsible results panel** with per-section loading and error states
//!
//! ## Architecture
//!
//! ```text
//! stdin → ExplorerApp (event loop) → spawned tasks → Backend (HTTP)
//!              ↑                                        │
//!              └──────────── AppEvent channel ──────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use graph_explorer::{BackendClient, Config, ExplorerApp};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = BackendClient::new(&config.backend, config.request.clone())?;
//!     let mut app = ExplorerApp::new(config, Arc::new(client));
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     app.run(stdin, tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

/// Concurrent fan-out of supporting evidence, guarded by generation.
pub mod aggregation;
/// Event loop, commands and application state.
pub mod app;
/// HTTP client and wire types for the retrieval backend.
pub mod backend;
/// Configuration management.
pub mod config;
/// Conversation turns.
pub mod conversation;
/// Error types and result aliases.
pub mod error;
/// Text rendering of the results panel.
pub mod presentation;
/// Query submission.
pub mod query;
/// Connection, ingestion and generation state.
pub mod session;

pub use aggregation::ResultAggregator;
pub use app::{AppEvent, Command, ExplorerApp};
pub use backend::{Backend, BackendClient};
pub use config::Config;
pub use error::{AppError, AppResult, BackendError, BackendResult};
pub use session::{Entity, Generation, SessionState};
