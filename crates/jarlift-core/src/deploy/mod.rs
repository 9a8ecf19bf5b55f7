//! The deploy task: stage, install, restart, clean.

pub mod error;
pub mod inventory;
pub mod report;
pub mod task;

pub use error::PointerError;
pub use inventory::{sort_installed, split_for_clean};
pub use report::{CleanPlan, CleanReport, InstalledArtifact, RunReport};
pub use task::DeployTask;
