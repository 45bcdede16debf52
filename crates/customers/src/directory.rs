use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use ticketflow_core::CustomerId;

use crate::customer::Customer;

/// Why a directory lookup failed (infrastructure, not absence).
///
/// "Customer does not exist" is a domain answer, so it travels in the `Ok`
/// side of the contract as `None`; only the call itself failing lands here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("customer directory unavailable: {0}")]
    Unavailable(String),

    #[error("customer directory lookup timed out")]
    Timeout,
}

/// Synchronous customer lookup contract.
///
/// The directory is a remote collaborator; every call may fail or time out
/// independently of whether the customer exists.
pub trait CustomerDirectory: Send + Sync {
    fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DirectoryError>;
}

impl<D> CustomerDirectory for Arc<D>
where
    D: CustomerDirectory + ?Sized,
{
    fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DirectoryError> {
        (**self).find_by_id(id)
    }
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    inner: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory with a set of known customers.
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let directory = Self::new();
        for customer in customers {
            directory.upsert(customer);
        }
        directory
    }

    pub fn upsert(&self, customer: Customer) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(customer.id_typed().clone(), customer);
        }
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DirectoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| DirectoryError::Unavailable("directory store poisoned".into()))?;
        Ok(map.get(id).cloned())
    }
}
