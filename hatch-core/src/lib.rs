//! Hatch core library: dispatch events, registry access, configuration, errors.
//!
//! - [`event`]: wire-shape parsing and payload validation
//! - [`types`]: newtypes and typed requests
//! - [`registry`]: opaque registry snapshots
//! - [`config`]: `~/.hatch/config.yaml`
//! - [`error`]: [`EventError`], [`RegistryError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod types;

pub use config::HatchConfig;
pub use error::{ConfigError, EventError, RegistryError};
pub use event::DispatchEvent;
pub use registry::RegistrySnapshot;
pub use types::{
    AddPackageRequest, ArtifactName, ArtifactRef, Author, EventKind, InboundEvent,
    OutboundEvent, PackageName, PrNumber, RepoSlug, RunId, RunStatus, ValidateRequest,
    ValidationOutcome, ValidationResult, WorkflowId,
};
