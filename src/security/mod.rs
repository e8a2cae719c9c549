//! Security subsystem.
//!
//! # Design Decisions
//! - The screen is a coarse heuristic filter applied before routing; it is
//!   explicitly not a security boundary
//! - Rejections are 403s with no detail leaked to the client; the tripped
//!   rule is logged server-side

pub mod screen;

pub use screen::{screen_request, ScreenRejection};
