//! Heuristic request screen.
//!
//! # Responsibilities
//! - Catch obvious script-injection markers in the request target
//! - Catch obvious SQL-injection markers in the body
//! - Enforce the screen's own body cap
//! - Reject blocklisted User-Agent signatures

use crate::config::schema::LimitsConfig;
use crate::http::Request;

/// Why the screen rejected a request. The reason is logged, never sent to
/// the client.
#[derive(Debug, PartialEq, Eq)]
pub struct ScreenRejection {
    pub rule: &'static str,
}

/// Run the screen against a fully read request.
pub fn screen_request(req: &Request, limits: &LimitsConfig) -> Result<(), ScreenRejection> {
    if req.target.contains("<script") {
        return Err(ScreenRejection {
            rule: "script marker in target",
        });
    }

    if req.body.contains("SELECT * FROM") {
        return Err(ScreenRejection {
            rule: "sql marker in body",
        });
    }

    if req.body.len() > limits.screen_max_body_bytes {
        return Err(ScreenRejection {
            rule: "body exceeds screen cap",
        });
    }

    if let Some(agent) = req.header("user-agent") {
        if limits
            .blocked_user_agents
            .iter()
            .any(|blocked| agent.contains(blocked.as_str()))
        {
            return Err(ScreenRejection {
                rule: "blocklisted user agent",
            });
        }
    }

    Ok(())
}
