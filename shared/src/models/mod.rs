//! Domain models for the Depot Back-Office

mod consignment;
mod depot;
mod vat;

pub use consignment::*;
pub use depot::*;
pub use vat::*;
