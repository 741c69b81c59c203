//! Tweeter Common Library
//!
//! Shared types for the Tweeter client crates: post and session models,
//! the unified client error and environment-driven configuration.

pub mod config;
pub mod error;
pub mod models;

pub use config::{BackendConfig, Config, FeedConfig, RefreshPolicy, SessionConfig};
pub use error::{ClientError, Result};
pub use models::{Identity, Post, PostDraft, Session};
