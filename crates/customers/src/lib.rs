//! Customer directory collaborator.
//!
//! Customer records are owned by an external directory; this crate carries
//! the lookup contract and the record shape, nothing else. Records are
//! immutable from this system's perspective.

pub mod customer;
pub mod directory;

pub use customer::Customer;
pub use directory::{CustomerDirectory, DirectoryError, InMemoryCustomerDirectory};
