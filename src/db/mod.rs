//! Persistence layer (JSON equipment store).

pub mod store;

pub use store::{EquipmentStore, LoadReport, SaveReport, STORE_VERSION};
