//! Value object trait: equality by value, not identity.
//!
//! Value objects are model objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two bounds with the same values are equal)
/// - **Entity**: Has identity (two shapes with the same id are the same shape)
///
/// Value objects are immutable; to "modify" one, build a new value. Commands rely on this
/// when they stash the previous bounds of a shape in their context for `revert`.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Axis-aligned rectangle of a shape in diagram coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ValueObject for Bounds {}

impl Bounds {
    /// Build bounds, rejecting negative dimensions.
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> DomainResult<Self> {
        let bounds = Self {
            x,
            y,
            width,
            height,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.width < 0 || self.height < 0 {
            return Err(DomainError::validation(format!(
                "bounds must have non-negative size (width: {}, height: {})",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Same size, shifted by `delta`. Fails when a coordinate leaves the `i64` range.
    pub fn translate(self, delta: Delta) -> DomainResult<Self> {
        let shift = |from: i64, by: i64| {
            from.checked_add(by)
                .ok_or_else(|| DomainError::validation(format!("moving {from} by {by} overflows")))
        };
        Ok(Self {
            x: shift(self.x, delta.x)?,
            y: shift(self.y, delta.y)?,
            ..self
        })
    }
}

/// Relative movement in diagram coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    pub x: i64,
    pub y: i64,
}

impl ValueObject for Delta {}

impl Delta {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// The movement that undoes this one.
    pub fn inverse(self) -> DomainResult<Self> {
        match (self.x.checked_neg(), self.y.checked_neg()) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(DomainError::validation(format!("delta {self:?} has no inverse"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_size_is_rejected() {
        assert!(Bounds::new(0, 0, -1, 10).is_err());
        assert!(Bounds::new(0, 0, 10, 10).is_ok());
    }

    #[test]
    fn translate_keeps_size() {
        let b = Bounds::new(50, 100, 100, 100).unwrap();
        let moved = b.translate(Delta::new(10, -20)).unwrap();
        assert_eq!(moved, Bounds::new(60, 80, 100, 100).unwrap());
        assert_eq!(moved.translate(Delta::new(10, -20).inverse().unwrap()).unwrap(), b);
    }

    #[test]
    fn out_of_range_arithmetic_is_rejected() {
        let far = Bounds::new(i64::MAX - 5, 0, 10, 10).unwrap();
        assert!(matches!(far.translate(Delta::new(6, 0)), Err(DomainError::Validation(_))));
        assert!(far.translate(Delta::new(5, 0)).is_ok());

        assert!(Delta::new(i64::MIN, 0).inverse().is_err());
        assert_eq!(Delta::new(i64::MAX, -3).inverse().unwrap(), Delta::new(-i64::MAX, 3));
    }
}
