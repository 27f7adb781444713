//! Core functionality for argus
//!
//! This crate turns raw filesystem notifications into a uniform stream
//! of JSON-encoded change events. Callers describe what to watch with
//! [`WatchTarget`]s (plain paths, `<dir>*.<ext>` wildcards or recursive
//! directory trees) and consume the stream from a [`WatchSession`].

pub mod config;
pub mod error;
pub mod monitor;

pub use config::WatchConfig;
pub use error::{Result, WatchError};
pub use monitor::{Action, ChangeEvent, WatchSession, WatchTarget};
