//! Infrastructure layer for Awayline.
//!
//! Contains implementations of the ports defined in `awayline-core`:
//! SQLite storage behind split read/write pools, the SVG QR pairing
//! renderer, and gateway configuration loading.

pub mod config;
pub mod qr;
pub mod sqlite;
