//! Inventory service collaborator.
//!
//! Capacity and pricing for ticketed events live in an external inventory
//! service; this crate carries the gateway contract. The gateway is the only
//! place capacity is read or mutated. There is no local cache, so a snapshot
//! read here is already stale by the time anyone acts on it.

pub mod gateway;
pub mod in_memory;

pub use gateway::{InventoryError, InventoryGateway, InventorySnapshot};
pub use in_memory::InMemoryInventoryService;
