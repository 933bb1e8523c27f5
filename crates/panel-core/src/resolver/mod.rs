//! Configuration resolution for the active backend

mod config_resolver;

pub use config_resolver::{ConfigurationResolver, ProviderEndpoint};
