//! Todoist tasks republished as an RSS 2.0 feed.
//!
//! This crate provides:
//! - REST client for the Todoist task API (list by label, close)
//! - Markdown link extraction from task content
//! - Feed model, builder and RSS serializer
//! - HTTP server exposing `GET /rss.xml` with close-on-read for a known reader
//! - Process lifecycle handling for graceful shutdown

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Client and server calls can fail at the network boundary

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod link;
pub mod models;
pub mod server;

pub use client::{TaskSource, TodoistClient};
pub use config::Config;
pub use error::{AppError, CloseFailures, FeedError, TodoistError};
pub use feed::{build_feed, write_feed, Feed, FeedItem};
pub use lifecycle::Lifecycle;
pub use models::Task;
