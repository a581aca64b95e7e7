/// Template renderer using Tera for Jinja2-style template rendering
use super::embedded_templates;
use crate::provisioner::BootstrapError;
use std::collections::HashMap;
use tera::{Context, Tera};

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a TemplateRenderer from embedded templates (compiled into the
    /// binary). The tool runs on hosts that have nothing installed yet, so it
    /// cannot rely on template files being present.
    pub fn from_embedded() -> Result<Self, BootstrapError> {
        tracing::debug!("[TemplateRenderer] Initializing Tera from embedded templates");

        let mut tera = Tera::default();
        let mut template_count = 0;

        for (name, content) in embedded_templates::ALL_TEMPLATES {
            if let Err(e) = tera.add_raw_template(name, content) {
                tracing::warn!(
                    "[TemplateRenderer] Failed to add embedded template {}: {}",
                    name,
                    e
                );
            } else {
                template_count += 1;
                tracing::debug!("[TemplateRenderer] Loaded embedded template: {}", name);
            }
        }

        tracing::info!(
            "[TemplateRenderer] Loaded {} embedded templates",
            template_count
        );

        Ok(Self { tera })
    }

    /// Render a template with variables using Tera context
    pub fn render(
        &self,
        template_name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, BootstrapError> {
        let mut context = Context::new();
        for (key, value) in vars {
            context.insert(key, value);
        }

        let rendered = self.tera.render(template_name, &context).map_err(|e| {
            BootstrapError::Template(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })?;

        tracing::debug!(
            "[TemplateRenderer] Rendered template {} ({} bytes)",
            template_name,
            rendered.len()
        );

        Ok(rendered)
    }

    /// List all loaded template names
    pub fn list_templates(&self) -> Vec<String> {
        self.tera.get_template_names().map(String::from).collect()
    }
}
