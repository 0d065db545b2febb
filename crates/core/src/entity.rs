//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Diagram elements (shapes, roots) keep their identity while commands move,
/// resize or re-parent them.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
