//! Cogbot - Discord bot shell with compiled-in plugins
//!
//! This library provides the startup plumbing around three external services:
//! - the Discord gateway (serenity)
//! - a `MySQL` database (sqlx)
//! - the TikTok live room status API (reqwest)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Plugins                          │
//! │        template  │  live  │  ...  (PluginRegistry)    │
//! └────────────────────────┬─────────────────────────────┘
//!                          │ ServiceHandle
//! ┌────────────────────────▼─────────────────────────────┐
//! │                      Bootstrap                        │
//! │  Config │ Bundle │ Database │ Gateway │ Commands      │
//! └────────────────────────┬─────────────────────────────┘
//!                          │
//! ┌────────────────────────▼─────────────────────────────┐
//! │     Discord gateway  │  MySQL  │  GitHub archive      │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod bundle;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod gateway;
pub mod live;
pub mod plugins;
pub mod service;

pub use bootstrap::{Outcome, Stage, Stages};
pub use bundle::InstallReport;
pub use config::Config;
pub use daemon::Daemon;
pub use db::Database;
pub use error::{Error, Result};
pub use live::{LiveChecker, LiveStatusSource, TikTokStatusApi};
pub use plugins::{
    CommandRegistry, CommandSpec, LoadReport, Plugin, PluginManager, PluginRegistry,
};
pub use service::ServiceHandle;
