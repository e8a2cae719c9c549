//! Handler shapes.
//!
//! The two capability variants are resolved at registration time as enum
//! arms, so dispatch never downcasts. Handlers communicate failure by setting
//! a status and a JSON error body; they never unwind across the dispatch
//! boundary by contract (a panic that does escape is caught at the worker
//! boundary and turned into a 500).

use std::sync::Arc;

use crate::http::{Request, Response};
use crate::routing::ParameterSet;

/// Handler that receives the complete request and parses what it needs.
pub type RawFn = dyn Fn(&Request, &mut Response) + Send + Sync;

/// Handler that receives only the validated parameters (path placeholders
/// plus, for non-GET verbs, the raw body under [`crate::routing::params::BODY_PARAM`]).
pub type ParametricFn = dyn Fn(&ParameterSet, &mut Response) + Send + Sync;

/// A registered route handler.
#[derive(Clone)]
pub enum Handler {
    Raw(Arc<RawFn>),
    Parametric(Arc<ParametricFn>),
}

impl Handler {
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        Handler::Raw(Arc::new(f))
    }

    pub fn parametric<F>(f: F) -> Self
    where
        F: Fn(&ParameterSet, &mut Response) + Send + Sync + 'static,
    {
        Handler::Parametric(Arc::new(f))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Raw(_) => f.write_str("Handler::Raw"),
            Handler::Parametric(_) => f.write_str("Handler::Parametric"),
        }
    }
}
