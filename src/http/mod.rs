//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → parser.rs (read one request: request line, headers, body)
//!     → request.rs (typed view: method, target, headers, body)
//!     → [session hands off to the routing layer]
//!     → response.rs (status + headers + JSON body, encoded to the wire)
//!     → Send to client, close connection
//! ```
//!
//! # Design Decisions
//! - HTTP/1.1 only, one request per connection, `Connection: close` always
//! - Bodies are read to `Content-Length`; chunked encoding is not supported
//! - Header names are normalized to lowercase at parse time

pub mod method;
pub mod parser;
pub mod request;
pub mod response;

pub use method::Method;
pub use request::Request;
pub use response::Response;
