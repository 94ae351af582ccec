//! Client code for tcache.
//!
//! This crate provides the app-startup flow (connectivity check, server
//! session, hand-off to login) and the HTTP implementation of its network
//! collaborator.

pub mod network;
pub mod startup;

pub use network::HttpNetwork;
pub use startup::{Authenticator, Network, ServerSession, StartupDispatcher, StartupOutcome};
