//! Wire types
//!
//! Messages exchanged with foreground windows and the request/response pair
//! handled by the fetch interceptor.

pub mod http;
pub mod messages;

pub use http::{Request, Response};
pub use messages::{ActionMessage, MessageEnvelope};
