#![deny(unsafe_code)] // Enforce memory safety across the entire crate

//! # Overall Example
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mobile_core::event::{Event, EventSource, EventType};
//! use mobile_core::hub::EventHub;
//! use mobile_core::services::{MemoryDataStore, Services};
//!
//! let services = Services::default().data_storing(Arc::new(MemoryDataStore::new()));
//! let hub = EventHub::new(services);
//!
//! hub.register_listener(EventType::Campaign, EventSource::ResponseContent, |event: &Event| {
//!     println!("{:?}", event.data());
//! });
//! ```

/// Host Contract
pub mod data; // Typed reads over event and shared-state maps
pub mod event; // Events dispatched through the hub
pub mod extension; // Extension, listener and host API traits
pub mod privacy; // Mobile privacy status

/// Reference Host
pub mod hub; // Event hub, listener registry and versioned shared state
pub mod logger; // slog root logger and `log` facade bridge
pub mod services; // Networking, persistence and device info

mod error;

pub use error::{Error, Result};

/// Re-exports
pub use mobile_conf as conf; // Settings
pub use mobile_macros as macros; // Derive macros
pub use mobile_utils as utils; // Common utilities

/// Name under which the configuration owner publishes its shared state
pub const CONFIGURATION_EXTENSION: &str = "com.adobe.module.configuration";

pub(crate) type DashMap<K, V> = dashmap::DashMap<K, V, ahash::RandomState>;
