//! Resource URI templates
//!
//! Supports simple `{name}` placeholders, e.g. `greeting://{name}`. A
//! placeholder matches one or more characters other than `/`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

// Hardcoded regex pattern - guaranteed to be valid at compile time
#[allow(clippy::unwrap_used)]
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

#[derive(Debug, Error)]
pub enum UriTemplateError {
    #[error("Placeholder '{0}' appears more than once")]
    DuplicateVariable(String),

    #[error("Template could not be compiled: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    variables: Vec<String>,
    matcher: Regex,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, UriTemplateError> {
        let mut pattern = String::from("^");
        let mut variables: Vec<String> = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER_PATTERN.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let name = name.as_str().to_string();
            if variables.contains(&name) {
                return Err(UriTemplateError::DuplicateVariable(name));
            }

            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            pattern.push_str(&format!("(?P<{}>[^/]+)", name));
            variables.push(name);
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        Ok(Self {
            template: template.to_string(),
            variables,
            matcher: Regex::new(&pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// A template without placeholders names exactly one concrete resource
    pub fn is_concrete(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Extracts template variables from `uri`, or `None` when it does not match
    pub fn match_uri(&self, uri: &str) -> Option<Map<String, Value>> {
        let captures = self.matcher.captures(uri)?;
        let mut params = Map::new();
        for name in &self.variables {
            if let Some(value) = captures.name(name) {
                params.insert(name.clone(), Value::String(value.as_str().to_string()));
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_extracts_variables() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        let params = template.match_uri("greeting://Alice").unwrap();

        assert_eq!(Value::Object(params), json!({"name": "Alice"}));
        assert!(!template.is_concrete());
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let template = UriTemplate::parse("docs://v1.0/{page}").unwrap();

        assert!(template.match_uri("docs://v1.0/intro").is_some());
        assert!(template.match_uri("docs://v1x0/intro").is_none());
        assert!(template.match_uri("docs://v1.0/a/b").is_none());
    }

    #[test]
    fn test_concrete_template() {
        let template = UriTemplate::parse("config://status").unwrap();

        assert!(template.is_concrete());
        assert_eq!(template.match_uri("config://status"), Some(Map::new()));
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        assert!(matches!(
            UriTemplate::parse("x://{a}/{a}"),
            Err(UriTemplateError::DuplicateVariable(_))
        ));
    }
}
