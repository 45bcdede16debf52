//! Entity trait: identity + continuity across state changes.

/// Marker + minimal interface for objects with identity.
///
/// An order stays the same order while its reconciliation status changes;
/// identity, not attribute equality, is what ties its states together.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
