//! Parsed request representation.
//!
//! # Responsibilities
//! - Carry the request line, headers and body through the session
//! - Keep the raw method token so unsupported verbs can be answered with 405
//! - Provide case-insensitive header access

use std::collections::HashMap;

use crate::http::Method;

/// One fully read HTTP/1.1 request.
///
/// Owned by a single session; never shared across connections.
#[derive(Debug, Clone)]
pub struct Request {
    /// Raw method token from the request line (may be an unsupported verb).
    pub method_token: String,
    /// Request target (origin-form path, query string included as-is).
    pub target: String,
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    /// Headers with lowercased names. Later duplicates overwrite earlier ones.
    pub headers: HashMap<String, String>,
    /// Decoded body. Empty when the request carried none.
    pub body: String,
}

impl Request {
    /// The typed verb, if the token is in the supported set.
    pub fn method(&self) -> Option<Method> {
        Method::parse(&self.method_token)
    }

    /// Path component of the target, query string stripped.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
