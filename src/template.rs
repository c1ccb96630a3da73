//! Template-render capability.
//!
//! The composer only needs `(identifier, data) -> bytes`. With the
//! `templates` feature, [`FileTemplateRenderer`] loads templates from disk
//! and renders them with minijinja; [`InlineTemplates`] keeps sources in
//! memory. Any closure with the right signature also works:
//!
//! ```rust
//! use courier::{MailError, TemplateRenderer};
//!
//! let renderer = |identifier: &str, data: &serde_json::Value| -> Result<Vec<u8>, MailError> {
//!     Ok(format!("{identifier}: {data}").into_bytes())
//! };
//! let body = renderer.render("greeting", &serde_json::json!("hi")).unwrap();
//! assert_eq!(body, b"greeting: \"hi\"");
//! ```

use std::sync::Arc;

use crate::error::MailError;

/// Renders a template identifier with bound data into body bytes.
///
/// Rendering is atomic: either the full body or an error. Errors are
/// passed to the caller unchanged.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, identifier: &str, data: &serde_json::Value) -> Result<Vec<u8>, MailError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &serde_json::Value) -> Result<Vec<u8>, MailError> + Send + Sync,
{
    fn render(&self, identifier: &str, data: &serde_json::Value) -> Result<Vec<u8>, MailError> {
        (self)(identifier, data)
    }
}

/// Renderer used when no template engine is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateRenderer for NoTemplates {
    fn render(&self, identifier: &str, _data: &serde_json::Value) -> Result<Vec<u8>, MailError> {
        Err(MailError::render(
            identifier,
            "no template renderer configured (enable the `templates` feature or supply one)",
        ))
    }
}

/// The renderer a new composer starts with.
pub fn default_renderer() -> Arc<dyn TemplateRenderer> {
    #[cfg(feature = "templates")]
    {
        Arc::new(FileTemplateRenderer::new())
    }
    #[cfg(not(feature = "templates"))]
    {
        Arc::new(NoTemplates)
    }
}

#[cfg(feature = "templates")]
pub use engine::{FileTemplateRenderer, InlineTemplates};

#[cfg(feature = "templates")]
mod engine {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use minijinja::{AutoEscape, Environment, UndefinedBehavior};

    use super::TemplateRenderer;
    use crate::error::MailError;

    fn render_source(
        identifier: &str,
        source: &str,
        data: &serde_json::Value,
    ) -> Result<Vec<u8>, MailError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        if is_markup(identifier) {
            env.set_auto_escape_callback(|_| AutoEscape::Html);
        }
        env.render_str(source, data)
            .map(String::into_bytes)
            .map_err(|e| MailError::render(identifier, e.to_string()))
    }

    fn is_markup(identifier: &str) -> bool {
        Path::new(identifier)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
    }

    /// Renders template files from disk.
    ///
    /// Identifiers are paths, resolved against an optional root directory.
    /// `.html`/`.htm` templates are HTML-escaped; undefined variables are
    /// errors.
    #[derive(Debug, Clone, Default)]
    pub struct FileTemplateRenderer {
        root: Option<PathBuf>,
    }

    impl FileTemplateRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Resolve relative identifiers against `root`.
        pub fn with_root(root: impl Into<PathBuf>) -> Self {
            Self {
                root: Some(root.into()),
            }
        }

        fn resolve(&self, identifier: &str) -> PathBuf {
            match &self.root {
                Some(root) => root.join(identifier),
                None => PathBuf::from(identifier),
            }
        }
    }

    impl TemplateRenderer for FileTemplateRenderer {
        fn render(
            &self,
            identifier: &str,
            data: &serde_json::Value,
        ) -> Result<Vec<u8>, MailError> {
            let path = self.resolve(identifier);
            let source = std::fs::read_to_string(&path).map_err(|e| {
                MailError::render(identifier, format!("{}: {}", path.display(), e))
            })?;
            render_source(identifier, &source, data)
        }
    }

    /// Named template sources kept in memory.
    #[derive(Debug, Clone, Default)]
    pub struct InlineTemplates {
        sources: HashMap<String, String>,
    }

    impl InlineTemplates {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a template. Names ending in `.html` are HTML-escaped.
        pub fn add(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
            self.sources.insert(name.into(), source.into());
            self
        }
    }

    impl TemplateRenderer for InlineTemplates {
        fn render(
            &self,
            identifier: &str,
            data: &serde_json::Value,
        ) -> Result<Vec<u8>, MailError> {
            let source = self
                .sources
                .get(identifier)
                .ok_or_else(|| MailError::render(identifier, "template not found"))?;
            render_source(identifier, source, data)
        }
    }

}
