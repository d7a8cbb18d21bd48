//! Theme engine over the bundled Tera templates.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tera::Tera;
use tracing::debug;

use crate::error::html_escape;

/// Templates compiled into the binary, by name.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    (
        "includes/paginator.html",
        include_str!("../../templates/includes/paginator.html"),
    ),
    (
        "includes/post_card.html",
        include_str!("../../templates/includes/post_card.html"),
    ),
    (
        "includes/form_errors.html",
        include_str!("../../templates/includes/form_errors.html"),
    ),
    ("blog/index.html", include_str!("../../templates/blog/index.html")),
    (
        "blog/category.html",
        include_str!("../../templates/blog/category.html"),
    ),
    (
        "blog/profile.html",
        include_str!("../../templates/blog/profile.html"),
    ),
    ("blog/detail.html", include_str!("../../templates/blog/detail.html")),
    ("blog/create.html", include_str!("../../templates/blog/create.html")),
    (
        "blog/post_delete.html",
        include_str!("../../templates/blog/post_delete.html"),
    ),
    ("blog/comment.html", include_str!("../../templates/blog/comment.html")),
    ("blog/user.html", include_str!("../../templates/blog/user.html")),
    (
        "registration/login.html",
        include_str!("../../templates/registration/login.html"),
    ),
    (
        "registration/registration_form.html",
        include_str!("../../templates/registration/registration_form.html"),
    ),
    ("pages/about.html", include_str!("../../templates/pages/about.html")),
    ("pages/rules.html", include_str!("../../templates/pages/rules.html")),
];

/// Layout for rendered timestamps.
const DISPLAY_DATETIME: &str = "%-d %B %Y, %H:%M";

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Build the engine from the bundled templates.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .context("failed to initialize Tera templates")?;

        Self::register_filters(&mut tera);
        debug!(count = TEMPLATES.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // RFC 3339 timestamps (as serialized by chrono) to display text.
        tera.register_filter(
            "datetime",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let raw = tera::try_get_value!("datetime", "value", String, value);
                let formatted = DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc).format(DISPLAY_DATETIME).to_string())
                    .unwrap_or(raw);
                Ok(tera::Value::String(formatted))
            },
        );

        // Escapes the text, then turns newlines into <br>. Use with `| safe`.
        tera.register_filter(
            "linebreaksbr",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let raw = tera::try_get_value!("linebreaksbr", "value", String, value);
                let html = html_escape(&raw)
                    .replace("\r\n", "\n")
                    .replace('\n', "<br>");
                Ok(tera::Value::String(html))
            },
        );
    }

    /// Render a template.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("failed to render template {template}"))
    }

    /// Get the underlying Tera instance.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("templates", &self.tera.get_template_names().count())
            .finish()
    }
}
