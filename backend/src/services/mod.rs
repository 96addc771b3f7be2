//! Business logic services for the Depot Back-Office

pub mod depot;

pub use depot::DepotService;
