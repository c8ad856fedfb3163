//! # hatch-pipeline
//!
//! The package-release state machine and the registry release gate.
//!
//! - [`Dispatcher`] routes `validate-package` to the [`ValidationGate`] and
//!   `add-package` to the [`RegistryMutator`].
//! - [`Publisher::maybe_release`] cuts a dated release when the registry
//!   changed, or when forced.
//!
//! External systems sit behind the traits in [`collaborators`].

pub mod collaborators;
pub mod detect;
pub mod diff;
pub mod error;
pub mod gate;
pub mod github;
pub mod mutation;
pub mod process;
pub mod publisher;
pub mod receiver;
pub mod registry_cli;
pub mod release_store;
mod workdir;

pub use error::PipelineError;
pub use gate::{GateReport, GateState, ValidationGate};
pub use mutation::{MutationReport, RegistryMutator};
pub use publisher::{Publisher, RegistryDiff, ReleaseOutcome, ReleaseStatus, ReleaseSummary};
pub use receiver::{Collaborators, DispatchOutcome, Dispatcher};
pub use release_store::{ReleaseIndex, ReleaseRecord};
