//! Deployment configuration: defaults, jarlift.toml, and override layering.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use schema::{
    CURRENT_LINK_NAME, ConfigFile, DEFAULT_APP, DEFAULT_KEEP, DeployConfig, SshOptions,
    SshSection, Transport,
};
pub use store::ConfigStore;
