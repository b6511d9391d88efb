//! Session orchestration and port definitions for the Awayline gateway.
//!
//! This crate defines the "ports" (store and protocol-client traits) that the
//! infrastructure layer implements, plus everything that runs between them:
//! the session orchestrator, the per-session adapter loop, the auto-reply
//! policy engine, the broadcast bus, and the command facade. It depends only
//! on `awayline-types` -- never on `awayline-infra` or any database/IO crate.

pub mod adapter;
pub mod broadcast;
pub mod gateway;
pub mod orchestrator;
pub mod policy;
pub mod protocol;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;
