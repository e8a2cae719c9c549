//! Route template compilation.
//!
//! # Responsibilities
//! - Compile `/users/{id}` style templates to anchored matchers
//! - Capture one value per `{name}` placeholder (any run of non-`/` bytes)
//! - Record placeholder names in declaration order

use regex::Regex;

/// Error raised at registration time for a malformed template.
#[derive(Debug)]
pub enum PatternError {
    /// `{` without a matching `}`, or a nested `{`.
    UnbalancedBrace(String),
    /// `{}` with no name inside.
    EmptyPlaceholder(String),
    Regex(regex::Error),
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::UnbalancedBrace(p) => {
                write!(f, "Unbalanced braces in route pattern '{}'", p)
            }
            PatternError::EmptyPlaceholder(p) => {
                write!(f, "Empty placeholder in route pattern '{}'", p)
            }
            PatternError::Regex(e) => write!(f, "Failed to compile route pattern: {}", e),
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled path template.
///
/// Compiled once at registration; matching at dispatch time is a single
/// anchored regex match.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    matcher: Regex,
    param_names: Vec<String>,
}

impl RoutePattern {
    /// True when the template contains at least one `{name}` placeholder.
    pub fn is_dynamic(pattern: &str) -> bool {
        pattern.contains('{')
    }

    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut regex = String::from("^");
        let mut param_names = Vec::new();
        let mut placeholder: Option<String> = None;

        for c in pattern.chars() {
            match (&mut placeholder, c) {
                (None, '{') => placeholder = Some(String::new()),
                (None, '}') => return Err(PatternError::UnbalancedBrace(pattern.to_string())),
                (None, c) => regex.push_str(&regex_syntax_escape(c)),
                (Some(_), '{') => return Err(PatternError::UnbalancedBrace(pattern.to_string())),
                (Some(name), '}') => {
                    if name.is_empty() {
                        return Err(PatternError::EmptyPlaceholder(pattern.to_string()));
                    }
                    param_names.push(name.clone());
                    regex.push_str("([^/]+)");
                    placeholder = None;
                }
                (Some(name), c) => name.push(c),
            }
        }
        if placeholder.is_some() {
            return Err(PatternError::UnbalancedBrace(pattern.to_string()));
        }
        regex.push('$');

        let matcher = Regex::new(&regex).map_err(PatternError::Regex)?;
        Ok(Self {
            raw: pattern.to_string(),
            matcher,
            param_names,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// The compiled regex source; identical sources mean two templates match
    /// exactly the same set of paths.
    pub fn matcher_source(&self) -> &str {
        self.matcher.as_str()
    }

    /// Match `path` against the template. On success, returns captured values
    /// positionally paired with the placeholder names, in declaration order.
    pub fn extract(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.matcher.captures(path)?;
        let mut values = Vec::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            let value = captures.get(i + 1)?.as_str().to_string();
            values.push((name.clone(), value));
        }
        Some(values)
    }
}

fn regex_syntax_escape(c: char) -> String {
    regex::escape(&c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_template_matches_exactly() {
        let p = RoutePattern::compile("/users").unwrap();
        assert!(p.extract("/users").is_some());
        assert!(p.extract("/users/17").is_none());
        assert!(p.extract("/usersX").is_none());
    }

    #[test]
    fn single_placeholder_extraction() {
        let p = RoutePattern::compile("/users/{id}").unwrap();
        let values = p.extract("/users/17").unwrap();
        assert_eq!(values, vec![("id".to_string(), "17".to_string())]);
        assert!(p.extract("/users").is_none());
        assert!(p.extract("/users/17/posts").is_none());
    }

    #[test]
    fn placeholders_extract_in_declared_order() {
        let p = RoutePattern::compile("/users/{id}/posts/{slug}").unwrap();
        let values = p.extract("/users/3/posts/hello-world").unwrap();
        assert_eq!(
            values,
            vec![
                ("id".to_string(), "3".to_string()),
                ("slug".to_string(), "hello-world".to_string()),
            ]
        );
    }

    #[test]
    fn placeholder_does_not_cross_segments() {
        let p = RoutePattern::compile("/files/{name}").unwrap();
        assert!(p.extract("/files/a/b").is_none());
    }

    #[test]
    fn inline_placeholder_within_segment() {
        let p = RoutePattern::compile("/v{num}/status").unwrap();
        let values = p.extract("/v2/status").unwrap();
        assert_eq!(values, vec![("num".to_string(), "2".to_string())]);
    }

    #[test]
    fn literal_regex_metacharacters_are_escaped() {
        let p = RoutePattern::compile("/a.b/{id}").unwrap();
        assert!(p.extract("/a.b/1").is_some());
        assert!(p.extract("/aXb/1").is_none());
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(matches!(
            RoutePattern::compile("/users/{id"),
            Err(PatternError::UnbalancedBrace(_))
        ));
        assert!(matches!(
            RoutePattern::compile("/users/id}"),
            Err(PatternError::UnbalancedBrace(_))
        ));
        assert!(matches!(
            RoutePattern::compile("/users/{}"),
            Err(PatternError::EmptyPlaceholder(_))
        ));
        assert!(matches!(
            RoutePattern::compile("/users/{{id}}"),
            Err(PatternError::UnbalancedBrace(_))
        ));
    }

    #[test]
    fn overlapping_templates_share_matcher_source() {
        let a = RoutePattern::compile("/products/{id}").unwrap();
        let b = RoutePattern::compile("/products/{slug}").unwrap();
        assert_eq!(a.matcher_source(), b.matcher_source());
    }
}
