//! Value object trait: equality by value, not identity.

/// Marker trait for immutable domain values compared by their attributes.
///
/// `Money { minor: 1999 }` equals any other `Money { minor: 1999 }`; there is
/// no identity to track. Value objects never mutate in place; "changing" one
/// means constructing a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
