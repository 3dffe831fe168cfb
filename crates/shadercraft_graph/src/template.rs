// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader source templates with `${name}` substitution points.
//!
//! `$$` produces a literal `$`. Any other use of `$` is rejected when the
//! template is parsed, so substitution itself can only fail on names.

use std::collections::HashMap;

/// Placeholder receiving the generated node code in fragment templates
pub const GRAPH_SRC_PLACEHOLDER: &str = "graph_src";

/// Built-in vertex stage template
pub const STANDARD_VERTEX_TEMPLATE: &str = include_str!("../shaders/template_standard.vs");

/// Built-in fragment stage template
pub const STANDARD_FRAGMENT_TEMPLATE: &str = include_str!("../shaders/template_standard.ps");

/// Error while parsing or filling a template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `$` not followed by `$` or `{name}`
    #[error("Invalid placeholder at byte {0}")]
    InvalidPlaceholder(usize),

    /// `${` without a closing `}`
    #[error("Unterminated placeholder at byte {0}")]
    Unterminated(usize),

    /// No value supplied for a placeholder
    #[error("Missing value for placeholder ${{{0}}}")]
    MissingValue(String),

    /// Value supplied for a name the template does not contain
    #[error("Unknown placeholder ${{{0}}}")]
    UnknownPlaceholder(String),

    /// Template has the wrong number of occurrences of a placeholder
    #[error("Expected {expected} occurrence(s) of ${{{name}}}, found {found}")]
    PlaceholderCount {
        /// Placeholder name
        name: String,
        /// Required count
        expected: usize,
        /// Actual count
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

/// A parsed shader template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplate {
    segments: Vec<Segment>,
}

impl ShaderTemplate {
    /// Parse template source
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            text.push_str(&rest[..pos]);
            let at = offset + pos;
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                text.push('$');
                offset = at + 2;
                rest = tail;
            } else if let Some(tail) = after.strip_prefix('{') {
                let end = tail.find('}').ok_or(TemplateError::Unterminated(at))?;
                let name = &tail[..end];
                if !is_identifier(name) {
                    return Err(TemplateError::InvalidPlaceholder(at));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Placeholder(name.to_string()));
                offset = at + 2 + end + 1;
                rest = &tail[end + 1..];
            } else {
                return Err(TemplateError::InvalidPlaceholder(at));
            }
        }
        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { segments })
    }

    /// Parse a template that must contain `name` exactly `count` times
    pub fn parse_expecting(source: &str, name: &str, count: usize) -> Result<Self, TemplateError> {
        let template = Self::parse(source)?;
        let found = template.occurrences(name);
        if found != count {
            return Err(TemplateError::PlaceholderCount {
                name: name.to_string(),
                expected: count,
                found,
            });
        }
        Ok(template)
    }

    /// The built-in vertex template
    pub fn standard_vertex() -> Result<Self, TemplateError> {
        Self::parse_expecting(STANDARD_VERTEX_TEMPLATE, GRAPH_SRC_PLACEHOLDER, 0)
    }

    /// The built-in fragment template
    pub fn standard_fragment() -> Result<Self, TemplateError> {
        Self::parse_expecting(STANDARD_FRAGMENT_TEMPLATE, GRAPH_SRC_PLACEHOLDER, 1)
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Number of times `name` appears
    pub fn occurrences(&self, name: &str) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Placeholder(n) if n == name))
            .count()
    }

    /// Fill every placeholder from `values`
    ///
    /// Every placeholder needs a value and every value needs a placeholder.
    pub fn substitute(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(unknown) = values.keys().find(|k| self.occurrences(k) == 0) {
            return Err(TemplateError::UnknownPlaceholder((*unknown).to_string()));
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Render a template that has no placeholders
    pub fn render(&self) -> Result<String, TemplateError> {
        self.substitute(&HashMap::new())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Prefix every non-blank line with `prefix`, keeping line endings
pub fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}
