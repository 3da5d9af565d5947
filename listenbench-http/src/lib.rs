//! HTTP plumbing for Listenbench
//!
//! - [`Agent`]: a per-session client with its own cookie jar, rooted at the
//!   target's base URL, whose requests honour a cancellation token.
//! - [`body`]: JSON request bodies encoded into pooled buffers.
//! - [`responses`]: typed response envelopes.
//! - [`actions`]: one function per target endpoint.
//! - [`User`]: a fixture user with a lazily allocated agent.

pub mod actions;
pub mod agent;
pub mod body;
pub mod config;
pub mod errors;
pub mod responses;
pub mod user;

pub use agent::{Agent, AgentResponse};
pub use body::RequestBody;
pub use config::AgentConfig;
pub use errors::AgentError;
pub use user::User;
