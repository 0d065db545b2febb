//! Bounds arithmetic for resize interactions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use draftboard_core::{Bounds, Delta, DomainError, DomainResult};

/// The handle a shape is dragged by: a side or a corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::Ne,
        Direction::E,
        Direction::Se,
        Direction::S,
        Direction::Sw,
        Direction::W,
        Direction::Nw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::N => "n",
            Direction::Ne => "ne",
            Direction::E => "e",
            Direction::Se => "se",
            Direction::S => "s",
            Direction::Sw => "sw",
            Direction::W => "w",
            Direction::Nw => "nw",
        }
    }

    fn moves_north_edge(self) -> bool {
        matches!(self, Direction::N | Direction::Ne | Direction::Nw)
    }

    fn moves_south_edge(self) -> bool {
        matches!(self, Direction::S | Direction::Se | Direction::Sw)
    }

    fn moves_west_edge(self) -> bool {
        matches!(self, Direction::W | Direction::Nw | Direction::Sw)
    }

    fn moves_east_edge(self) -> bool {
        matches!(self, Direction::E | Direction::Ne | Direction::Se)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown resize direction `{s}`")))
    }
}

/// Apply a drag of `delta` on the `direction` handle to `bounds`.
///
/// The opposite side stays fixed: dragging `sw` by `(5, -15)` moves the west edge right by
/// 5 and the south edge up by 15. The result is not validated; callers decide whether a
/// collapsed or inverted rectangle is acceptable. Fails only when a value leaves the `i64`
/// range.
pub fn resize_bounds(bounds: Bounds, direction: Direction, delta: Delta) -> DomainResult<Bounds> {
    let mut out = bounds;

    if direction.moves_north_edge() {
        out.y = add(out.y, delta.y)?;
        out.height = sub(out.height, delta.y)?;
    }
    if direction.moves_south_edge() {
        out.height = add(out.height, delta.y)?;
    }
    if direction.moves_west_edge() {
        out.x = add(out.x, delta.x)?;
        out.width = sub(out.width, delta.x)?;
    }
    if direction.moves_east_edge() {
        out.width = add(out.width, delta.x)?;
    }

    Ok(out)
}

fn add(a: i64, b: i64) -> DomainResult<i64> {
    a.checked_add(b)
        .ok_or_else(|| DomainError::validation(format!("resize overflows: {a} + {b}")))
}

fn sub(a: i64, b: i64) -> DomainResult<i64> {
    a.checked_sub(b)
        .ok_or_else(|| DomainError::validation(format!("resize overflows: {a} - {b}")))
}

/// Partial new bounds for a resize; missing fields keep their current value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl BoundsUpdate {
    /// Change only the size, keeping the position.
    pub fn size(width: i64, height: i64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, current: Bounds) -> Bounds {
        Bounds {
            x: self.x.unwrap_or(current.x),
            y: self.y.unwrap_or(current.y),
            width: self.width.unwrap_or(current.width),
            height: self.height.unwrap_or(current.height),
        }
    }
}

impl From<Bounds> for BoundsUpdate {
    fn from(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn square() -> Bounds {
        Bounds::new(100, 100, 100, 100).unwrap()
    }

    #[test]
    fn shrink_from_south_west() {
        let out = resize_bounds(square(), Direction::Sw, Delta::new(5, -15)).unwrap();
        assert_eq!(out, Bounds::new(105, 100, 95, 85).unwrap());
    }

    #[test]
    fn expand_from_south_west() {
        let out = resize_bounds(square(), Direction::Sw, Delta::new(-5, 15)).unwrap();
        assert_eq!(out, Bounds::new(95, 100, 105, 115).unwrap());
    }

    #[test]
    fn sides_touch_one_axis() {
        let d = Delta::new(10, 20);
        assert_eq!(resize_bounds(square(), Direction::N, d).unwrap(), Bounds::new(100, 120, 100, 80).unwrap());
        assert_eq!(resize_bounds(square(), Direction::S, d).unwrap(), Bounds::new(100, 100, 100, 120).unwrap());
        assert_eq!(resize_bounds(square(), Direction::E, d).unwrap(), Bounds::new(100, 100, 110, 100).unwrap());
        assert_eq!(resize_bounds(square(), Direction::W, d).unwrap(), Bounds::new(110, 100, 90, 100).unwrap());
    }

    #[test]
    fn corners_touch_both_axes() {
        let d = Delta::new(10, 20);
        assert_eq!(resize_bounds(square(), Direction::Ne, d).unwrap(), Bounds::new(100, 120, 110, 80).unwrap());
        assert_eq!(resize_bounds(square(), Direction::Se, d).unwrap(), Bounds::new(100, 100, 110, 120).unwrap());
        assert_eq!(resize_bounds(square(), Direction::Nw, d).unwrap(), Bounds::new(110, 120, 90, 80).unwrap());
    }

    #[test]
    fn opposite_edge_stays_fixed() {
        for direction in Direction::ALL {
            let out = resize_bounds(square(), direction, Delta::new(7, -3)).unwrap();
            if !direction.moves_east_edge() {
                assert_eq!(out.x + out.width, 200, "{direction}");
            }
            if !direction.moves_north_edge() {
                assert_eq!(out.y, 100, "{direction}");
            }
        }
    }

    #[test]
    fn directions_parse_from_handle_names() {
        assert_eq!("sw".parse::<Direction>().unwrap(), Direction::Sw);
        assert!("up".parse::<Direction>().is_err());
        assert_eq!(serde_json::to_string(&Direction::Ne).unwrap(), "\"ne\"");
    }

    #[test]
    fn update_keeps_missing_fields() {
        let out = BoundsUpdate::size(124, 202).apply_to(square());
        assert_eq!(out, Bounds::new(100, 100, 124, 202).unwrap());
        assert_eq!(BoundsUpdate::from(square()).apply_to(Bounds::new(0, 0, 0, 0).unwrap()), square());
    }

    proptest! {
        #[test]
        fn opposite_drag_restores_bounds(
            dir in 0usize..8,
            x in -1000i64..1000,
            y in -1000i64..1000,
            dx in -500i64..500,
            dy in -500i64..500,
        ) {
            let direction = Direction::ALL[dir];
            let start = Bounds::new(x, y, 200, 300).unwrap();
            let moved = resize_bounds(start, direction, Delta::new(dx, dy)).unwrap();
            prop_assert_eq!(resize_bounds(moved, direction, Delta::new(-dx, -dy)).unwrap(), start);
        }
    }

    #[test]
    fn extreme_drags_are_rejected() {
        let err = resize_bounds(square(), Direction::Nw, Delta::new(i64::MIN, 0)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(resize_bounds(square(), Direction::Se, Delta::new(0, i64::MAX)).is_err());
        assert!(resize_bounds(square(), Direction::E, Delta::new(0, i64::MAX)).is_ok());
    }
}
