//! Instruction templates for the research stages
//!
//! Templates are markdown with `{{ variable }}` placeholders. The built-in set
//! is compiled into the binary; a directory configured under `[prompts]` can
//! override any of them by file name (`planner.md`, ...).

use crate::types::{AppError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders a named template with variables.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_id: &str, vars: &HashMap<&str, String>) -> Result<String>;
}

const BUILTIN: &[(&str, &str)] = &[
    ("coordinator", include_str!("coordinator.md")),
    ("planner", include_str!("planner.md")),
    ("researcher", include_str!("researcher.md")),
    ("coder", include_str!("coder.md")),
    ("reporter", include_str!("reporter.md")),
];

/// Built-in templates with optional on-disk overrides.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplates {
    override_dir: Option<PathBuf>,
}

impl PromptTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for `<template_id>.md` in `dir` before falling back to the built-ins.
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    fn source(&self, template_id: &str) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.md", template_id));
            if path.is_file() {
                return read_template(&path);
            }
        }

        BUILTIN
            .iter()
            .find(|(id, _)| *id == template_id)
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| AppError::Template(format!("unknown template '{}'", template_id)))
    }
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Template(format!("failed to read {}: {}", path.display(), e)))
}

impl TemplateRenderer for PromptTemplates {
    fn render(&self, template_id: &str, vars: &HashMap<&str, String>) -> Result<String> {
        let source = self.source(template_id)?;
        substitute(template_id, &source, vars)
    }
}

/// Replace every `{{ name }}` in `source`. Unknown names are an error.
fn substitute(template_id: &str, source: &str, vars: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            AppError::Template(format!("unclosed placeholder in '{}'", template_id))
        })?;
        let name = after[..end].trim();
        let value = vars.get(name).ok_or_else(|| {
            AppError::Template(format!(
                "template '{}' needs variable '{}'",
                template_id, name
            ))
        })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}
