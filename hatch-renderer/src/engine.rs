//! Tera rendering engine: [`TemplateKind`] enum and [`Renderer`].
//!
//! | Kind              | Template name                    | Used for                      |
//! |-------------------|----------------------------------|-------------------------------|
//! | ValidationSuccess | `feedback/success.md.tera`       | PR comment after a pass       |
//! | ValidationFailure | `feedback/failure.md.tera`       | PR comment after a failure    |
//! | ReleaseNotes      | `release/notes.md.tera`          | body of a registry release    |
//!
//! A `.tera` file at the same relative path under the user template
//! directory replaces the embedded default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::{FeedbackContext, ReleaseNotesContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("shared/_log.tera", include_str!("templates/_partials/log.tera")),
    (
        "feedback/success.md.tera",
        include_str!("templates/validation_success.md.tera"),
    ),
    (
        "feedback/failure.md.tera",
        include_str!("templates/validation_failure.md.tera"),
    ),
    ("release/notes.md.tera", include_str!("templates/release_notes.md.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!(template = %name, path = %path.display(), "template override loaded");
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

/// Every document this layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    ValidationSuccess,
    ValidationFailure,
    ReleaseNotes,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[
            TemplateKind::ValidationSuccess,
            TemplateKind::ValidationFailure,
            TemplateKind::ReleaseNotes,
        ]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::ValidationSuccess => "feedback/success.md.tera",
            TemplateKind::ValidationFailure => "feedback/failure.md.tera",
            TemplateKind::ReleaseNotes      => "release/notes.md.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded defaults.
/// Template names are normalised to lowercase and relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render one template. Output always uses LF line endings.
    pub fn render(&self, kind: TemplateKind, ctx: &tera::Context) -> Result<String, RenderError> {
        let rendered = self.tera.render(kind.template_name(), ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders PR feedback comments and release notes.
///
/// Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_template_dir(None)
    }

    /// Embedded templates plus overrides from `dir`.
    pub fn with_template_dir(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(dir)? })
    }

    /// Success or failure comment, chosen by `ctx.passed`.
    pub fn render_feedback(&self, ctx: &FeedbackContext) -> Result<String, RenderError> {
        let kind = if ctx.passed {
            TemplateKind::ValidationSuccess
        } else {
            TemplateKind::ValidationFailure
        };
        self.engine.render(kind, &ctx.to_tera_context()?)
    }

    pub fn render_release_notes(&self, ctx: &ReleaseNotesContext) -> Result<String, RenderError> {
        self.engine
            .render(TemplateKind::ReleaseNotes, &ctx.to_tera_context()?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
