//! Shared types and computation core for the Depot Back-Office
//!
//! This crate contains the domain model and the pure consignment-ledger
//! computations (VAT regime normalization, price resolution, move
//! reconciliation, rollups and VAT redaction) shared between the backend
//! and other components of the system. Nothing in here performs I/O.

pub mod access;
pub mod ledger;
pub mod models;
pub mod rollup;
pub mod types;

pub use access::*;
pub use ledger::*;
pub use models::*;
pub use rollup::*;
pub use types::*;
