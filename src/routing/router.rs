//! Route table and dispatch.
//!
//! # Responsibilities
//! - Answer OPTIONS preflights without consulting the route table
//! - Exact-match fast path, then dynamic patterns in registration order
//! - Sanitize and validate extracted parameters before invoking handlers
//! - Gate parametric handlers on a non-empty, well-formed JSON body for
//!   non-GET verbs

use std::collections::HashMap;

use crate::http::{Method, Request, Response};
use crate::routing::params::{self, ParameterSet, BODY_PARAM};
use crate::routing::pattern::{PatternError, RoutePattern};
use crate::routing::Handler;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

struct DynamicRoute {
    method: Method,
    pattern: RoutePattern,
    handler: Handler,
}

/// The route table. Built during startup registration, read-only afterwards;
/// dispatch takes `&self` and needs no locking.
#[derive(Default)]
pub struct Router {
    exact: HashMap<(Method, String), Handler>,
    dynamic: Vec<DynamicRoute>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Templates without placeholders go to the exact
    /// table; templates with placeholders are appended to the dynamic list,
    /// preserving registration order.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), PatternError> {
        if !RoutePattern::is_dynamic(pattern) {
            tracing::debug!(method = %method, pattern, "Registered exact route");
            self.exact.insert((method, pattern.to_string()), handler);
            return Ok(());
        }

        let compiled = RoutePattern::compile(pattern)?;
        // Overlap is allowed but only the first registration is reachable;
        // surface it so a misordered table is visible at startup.
        if let Some(earlier) = self
            .dynamic
            .iter()
            .find(|r| r.method == method && r.pattern.matcher_source() == compiled.matcher_source())
        {
            tracing::warn!(
                method = %method,
                pattern,
                shadowed_by = earlier.pattern.raw(),
                "Dynamic route is shadowed by an earlier registration"
            );
        }
        tracing::debug!(method = %method, pattern, "Registered dynamic route");
        self.dynamic.push(DynamicRoute {
            method,
            pattern: compiled,
            handler,
        });
        Ok(())
    }

    pub fn route_count(&self) -> usize {
        self.exact.len() + self.dynamic.len()
    }

    /// Resolve and run the handler for `req`, producing a complete response.
    pub fn dispatch(&self, req: &Request) -> Response {
        let mut res = Response::new();
        let path = req.path();

        let method = match req.method() {
            Some(Method::Options) => {
                // CORS preflight: answered before any route lookup.
                res.set_status(204);
                res.set_header("Access-Control-Allow-Origin", "*");
                res.set_header("Access-Control-Allow-Methods", ALLOWED_METHODS);
                res.set_header("Access-Control-Allow-Headers", ALLOWED_HEADERS);
                return res;
            }
            Some(method) => method,
            None => {
                tracing::debug!(method = %req.method_token, path, "Unsupported verb");
                res.error(405, "Method Not Allowed");
                return res;
            }
        };

        if let Some(handler) = self.exact.get(&(method, path.to_string())) {
            tracing::debug!(method = %method, path, "Exact route matched");
            self.invoke(handler, method, req, ParameterSet::new(), &mut res);
            return res;
        }

        for route in self.dynamic.iter().filter(|r| r.method == method) {
            let Some(values) = route.pattern.extract(path) else {
                continue;
            };
            tracing::debug!(
                method = %method,
                path,
                pattern = route.pattern.raw(),
                "Dynamic route matched"
            );

            let mut extracted = ParameterSet::new();
            for (name, value) in values {
                extracted.insert(&name, params::sanitize(&value));
            }
            if let Err(message) = params::validate(&extracted) {
                tracing::debug!(path, %message, "Parameter validation failed");
                res.error(400, &message);
                return res;
            }

            self.invoke(&route.handler, method, req, extracted, &mut res);
            return res;
        }

        tracing::debug!(method = %method, path, "No route matched");
        res.error(404, "Route not found");
        res
    }

    fn invoke(
        &self,
        handler: &Handler,
        method: Method,
        req: &Request,
        mut extracted: ParameterSet,
        res: &mut Response,
    ) {
        match handler {
            Handler::Raw(f) => f(req, res),
            Handler::Parametric(f) => {
                if method != Method::Get {
                    if req.body.is_empty() {
                        res.error(400, "Empty request body.");
                        return;
                    }
                    if serde_json::from_str::<serde_json::Value>(&req.body).is_err() {
                        res.error(400, "Invalid JSON body.");
                        return;
                    }
                    extracted.insert(BODY_PARAM, req.body.clone());
                }
                f(&extracted, res);
            }
        }
    }
}
