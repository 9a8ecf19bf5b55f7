//! Jarlift Core Library
//!
//! Ships a versioned jar to a host, switches the `current.jar` pointer to it,
//! restarts the service and prunes old installed versions.

pub mod artifact;
pub mod config;
pub mod deploy;
pub mod remote;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigFile, ConfigStore, DeployConfig, SshOptions, Transport};

    // Artifacts
    pub use crate::artifact::{Artifact, convert_to_version};

    // Deploy
    pub use crate::deploy::{
        CleanReport, DeployTask, InstalledArtifact, PointerError, RunReport,
    };

    // Remote
    pub use crate::remote::{CommandOutput, LocalRemote, Privilege, Remote, SshRemote};

    // Version
    pub use crate::version::VersionOrder;
}
