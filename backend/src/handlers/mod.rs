//! HTTP handlers for the Depot Back-Office

pub mod depot;
pub mod health;

pub use depot::*;
pub use health::*;
