//! Extracted route parameters: sanitization and shape validation.
//!
//! # Responsibilities
//! - Hold name → value pairs in the order the placeholders were declared
//! - Strip markup from extracted values before validation
//! - Enforce the `id` and `slug` shape rules

use std::sync::OnceLock;

use regex::Regex;

/// Key under which the raw request body is exposed to parametric handlers
/// for non-GET verbs.
pub const BODY_PARAM: &str = "body";

fn tag_stripper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag stripper regex"))
}

fn id_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("id regex"))
}

fn slug_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug regex"))
}

/// Name → value mapping extracted from a matched route.
///
/// Keys are unique; insertion order is the order placeholders appear in the
/// route pattern.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the same name.
    pub fn insert(&mut self, name: &str, value: String) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Remove anything that looks like an HTML tag from `input`.
///
/// Runs before validation so that reflected markup never reaches a handler,
/// and so a value that was only valid because of markup is rejected.
pub fn sanitize(input: &str) -> String {
    tag_stripper().replace_all(input, "").into_owned()
}

/// Shape-check the well-known parameter names.
///
/// Returns the client-facing message for the first violation.
pub fn validate(params: &ParameterSet) -> Result<(), String> {
    for name in params.names() {
        let value = params.get(name).unwrap_or_default();
        match name {
            "id" if !id_shape().is_match(value) => {
                return Err(format!(
                    "Invalid 'id' parameter: '{value}'. Must be a positive integer."
                ));
            }
            "slug" if !slug_shape().is_match(value) => {
                return Err(format!(
                    "Invalid 'slug' parameter: '{value}'. Must be alphanumeric."
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
