//! # thinkstrip-cli
//!
//! Composition root for the `thinkstrip` binary: argument parsing and
//! logging setup. The server itself lives in `thinkstrip-proxy`.

#![deny(unsafe_code)]

pub mod logging;
pub mod parser;

pub use parser::Cli;
