//! # thinkstrip-proxy
//!
//! Transparent HTTP proxy in front of Ollama that strips `<think>` reasoning
//! spans from response bodies, streamed or not.
//!
//! - [`forward`] - the dispatcher: replay upstream, pick the body path
//! - [`filtered_stream`] - the streaming pump with cancellation
//! - [`server`] - router, health probe and `serve()`

#![deny(unsafe_code)]

pub mod error;
pub mod filtered_stream;
pub mod forward;
pub mod models;
pub mod server;

pub use error::ForwardError;
pub use server::{ProxyState, create_router, serve};
