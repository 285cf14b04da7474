pub mod api;
pub mod config;
pub mod error;
pub mod watcher_factory;
