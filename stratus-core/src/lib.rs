//! Core model for the stratus VPC lifecycle tool.
//!
//! The pieces fit together like this: a [`config::NetworkConfig`] describes
//! the desired network, a [`provider::NetworkProvider`] talks to the cloud,
//! and [`workflow`] walks the fixed dependency chain of guarded steps,
//! recording what it created, reused, deleted or skipped.

pub mod config;
pub mod provider;
pub mod resource;
pub mod workflow;

pub use config::{ConfigError, NetworkConfig};
pub use provider::{NetworkProvider, ProviderError, ProviderResult};
pub use resource::NetworkHandles;
