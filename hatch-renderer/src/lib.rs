//! # hatch-renderer
//!
//! Tera-based rendering of the text this layer publishes: PR feedback
//! comments and registry release notes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hatch_renderer::{FeedbackContext, Renderer};
//! use hatch_core::types::{ValidateRequest, ValidationResult};
//!
//! fn comment(request: &ValidateRequest, result: &ValidationResult) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let ctx = FeedbackContext::from_validation(request, result, &[]);
//!     renderer.render_feedback(&ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{DiffStats, FeedbackContext, ReleaseNotesContext};
pub use engine::{Renderer, TemplateEngine, TemplateKind};
pub use error::RenderError;
