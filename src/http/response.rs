//! Response construction and wire encoding.
//!
//! # Responsibilities
//! - Build JSON responses (success and error shapes)
//! - Encode status line, headers and body for the wire
//! - Always close the connection after one response

use serde_json::json;

/// An HTTP/1.1 response under construction.
///
/// Handlers mutate this in place; the session encodes and writes it once.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let existing = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name));
        match existing {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a JSON body with the given status.
    pub fn json(&mut self, status: u16, value: &serde_json::Value) {
        self.status = status;
        self.set_header("Content-Type", "application/json");
        self.body = value.to_string();
    }

    /// Standard error shape: `{"message": "<text>"}`.
    pub fn error(&mut self, status: u16, message: &str) {
        self.json(status, &json!({ "message": message }));
    }

    /// A ready-made 500 for faults that escape a handler.
    pub fn internal_error() -> Self {
        let mut res = Response::new();
        res.json(500, &json!({ "error": "Internal server error" }));
        res
    }

    /// A ready-made 503 for worker-pool saturation.
    pub fn at_capacity() -> Self {
        let mut res = Response::new();
        res.json(503, &json!({ "error": "Server is at capacity" }));
        res
    }

    /// Encode for the wire. `Content-Length` and `Connection: close` are
    /// computed here so handlers never have to manage them.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status,
            reason_phrase(self.status)
        );
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        out.push_str("Connection: close\r\n\r\n");
        out.push_str(&self.body);
        out.into_bytes()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// Reason phrases for the statuses the engine emits.
fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let mut res = Response::new();
        res.error(400, "Invalid JSON body.");
        assert_eq!(res.status(), 400);
        assert_eq!(res.body(), r#"{"message":"Invalid JSON body."}"#);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut res = Response::new();
        res.set_header("Content-Type", "text/plain");
        res.set_header("content-type", "application/json");
        assert_eq!(res.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn wire_encoding_carries_length_and_close() {
        let mut res = Response::new();
        res.json(200, &serde_json::json!({ "ok": true }));
        let wire = String::from_utf8(res.to_bytes()).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("Content-Length: 11\r\n"));
        assert!(wire.contains("Connection: close\r\n"));
        assert!(wire.ends_with("\r\n\r\n{\"ok\":true}"));
    }
}
