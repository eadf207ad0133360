//! Template renderer.
//!
//! Fills a textual template file (`.in` convention) with a flat key/value
//! context and writes the result to disk. Substitution is total: a
//! referenced key missing from the context is an error, never a blank.
//! There is no conditional logic and no loops in these templates — desktop
//! entries, RPM spec files, and DEB control files are plain substitution.

use crate::error::Result;
use crate::session::BuildSession;
use handlebars::Handlebars;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flat key/value mapping substituted into a template.
pub type TemplateContext = BTreeMap<String, String>;

/// Render `template_path` with `context` into the session output directory,
/// keeping the template's basename.
pub async fn render(
    session: &BuildSession,
    template_path: &Path,
    context: &TemplateContext,
) -> Result<PathBuf> {
    let file_name = template_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let output_path = session.output_dir.join(file_name);
    render_to(template_path, context, &output_path).await?;
    Ok(output_path)
}

/// Render `template_path` with `context` into `output_path`.
///
/// Rendering is idempotent: the same template and context always produce
/// byte-identical output.
pub async fn render_to(
    template_path: &Path,
    context: &TemplateContext,
    output_path: &Path,
) -> Result<()> {
    let template = tokio::fs::read_to_string(template_path).await?;
    let rendered = render_str(&template, context)?;
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output_path, rendered).await?;
    Ok(())
}

/// Render a template string with a strict context lookup.
pub fn render_str(template: &str, context: &TemplateContext) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    Ok(handlebars.render_template(template, context)?)
}
