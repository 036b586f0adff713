//! deck - Kanban Task Board Library
//!
//! This library provides the core functionality for the deck CLI tool,
//! a terminal client for a kanban-style task service.
//!
//! # Core Concepts
//!
//! - **Fractional ordering**: real-valued order keys let a card move
//!   between neighbors without rewriting the rest of the column
//! - **Cached views**: fetched pages are reconciled in place around
//!   optimistic mutations instead of being refetched on every change
//! - **Optimistic mutations**: cancel, snapshot, apply, then commit or
//!   roll back on the server's verdict
//! - **Drag resolution**: a finished drag gesture becomes a single
//!   update plus any order rebalance follow-ups
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `deck.toml`
//! - `error`: Error types and result aliases
//! - `task`: Task data model and validation
//! - `order`: Fractional order keys and rebalancing
//! - `search`: Search term normalization and matching
//! - `query`: Cache keys for column list queries
//! - `cache`: Cached column views and reconciliation
//! - `api`: REST client for the task service
//! - `mutation`: Optimistic mutation orchestration
//! - `ui`: The interactive board (ratatui)

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod mutation;
pub mod order;
pub mod output;
pub mod query;
pub mod search;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
