//! Plugin system for cogbot
//!
//! Plugins are compiled in and registered by identifier in a
//! [`PluginRegistry`]. The plugin directory holds one `<id>.json` descriptor
//! per plugin to run; the descriptor body is passed to the plugin factory as
//! settings. Loaded plugins stay resident until the process exits.

pub mod commands;
pub mod discovery;
pub mod live;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod template;

pub use commands::{CommandRegistry, CommandSpec};
pub use discovery::{DiscoveredPlugin, discover_plugins};
pub use loader::{LoadFailure, LoadReport, PluginManager};
pub use registry::{Plugin, PluginFactory, PluginRegistry};
