//! Translation relay.
//!
//! Accepts translation requests over HTTP, fills in the source language when
//! missing, forwards the request to a single upstream provider and reshapes
//! its answer into a small client-facing contract.

pub mod config;
pub mod detector;
pub mod handler;
pub mod interpreter;
pub mod server;
pub mod session;
pub mod upstream;
