//! Template engine for server-rendered pages using Jinja2 syntax.
//!
//! Templates are embedded in the binary so rendering does not depend on the
//! working directory. Template names end in `.html`, which turns on
//! minijinja's HTML auto-escaping.

use minijinja::{Environment, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static VIEW_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    (
        "layout.html",
        include_str!("../../../templates/views/layout.html"),
    ),
    (
        "error.html",
        include_str!("../../../templates/views/error.html"),
    ),
    (
        "cosmetics/_fields.html",
        include_str!("../../../templates/views/cosmetics/_fields.html"),
    ),
    (
        "cosmetics/index.html",
        include_str!("../../../templates/views/cosmetics/index.html"),
    ),
    (
        "cosmetics/details.html",
        include_str!("../../../templates/views/cosmetics/details.html"),
    ),
    (
        "cosmetics/create.html",
        include_str!("../../../templates/views/cosmetics/create.html"),
    ),
    (
        "cosmetics/edit.html",
        include_str!("../../../templates/views/cosmetics/edit.html"),
    ),
    (
        "cosmetics/delete.html",
        include_str!("../../../templates/views/cosmetics/delete.html"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        } else {
            tracing::debug!("Loaded template: {}", name);
        }
    }

    env
}

/// Get the global template environment
fn get_environment() -> &'static Environment<'static> {
    VIEW_ENV.get_or_init(init_environment)
}

/// Render a view with the given context.
///
/// # Example
/// ```ignore
/// use minijinja::context;
/// use crate::shared::views::render;
///
/// let html = render("cosmetics/index.html", context! { cosmetics => &cosmetics })?;
/// ```
pub fn render(view: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(view)
        .map_err(|_| TemplateError::NotFound(view.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_load() {
        let env = get_environment();
        for (name, _) in TEMPLATES {
            assert!(env.get_template(name).is_ok(), "{} failed to load", name);
        }
    }

    #[test]
    fn test_render_missing_view() {
        let result = render("nonexistent.html", context! {});
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_render_escapes_html() {
        let html = render(
            "error.html",
            context! {
                status => 404,
                reason => "Not Found",
                message => "<script>alert(1)</script>",
            },
        )
        .unwrap();

        assert!(html.contains("404 Not Found"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }
}
