//! Shared domain types for Awayline.
//!
//! This crate contains the core domain types used across the Awayline
//! gateway: User, Session, ActivityLog, the protocol-client vocabulary,
//! broadcast events, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod activity;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod user;
