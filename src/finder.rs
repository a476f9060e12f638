//! Finder zone classification.
//!
//! A QR symbol carries exactly three 7×7 finder patterns: top-left, top-right
//! and bottom-left. The bottom-right corner never has one. Both backends ask
//! this module which modules belong to a finder zone so their output agrees
//! module for module.

/// Edge length of a finder zone, in modules.
pub const FINDER_SIZE: usize = 7;

/// One of the three corners that carry a finder pattern.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FinderCorner {
    TopLeft,
    TopRight,
    BottomLeft,
}

/// All finder corners, in painting order.
pub const FINDER_CORNERS: [FinderCorner; 3] = [
    FinderCorner::TopLeft,
    FinderCorner::TopRight,
    FinderCorner::BottomLeft,
];

impl FinderCorner {
    /// Returns the `(row, col)` of the zone's top-left module in a symbol of
    /// the given size.
    pub fn origin(self, size: usize) -> (usize, usize) {
        let far = size.saturating_sub(FINDER_SIZE);
        match self {
            FinderCorner::TopLeft => (0, 0),
            FinderCorner::TopRight => (0, far),
            FinderCorner::BottomLeft => (far, 0),
        }
    }
}

/// Returns `true` iff `(row, col)` lies inside one of the three finder zones of
/// a `size × size` symbol.
pub fn is_finder_zone(row: usize, col: usize, size: usize) -> bool {
    if row >= size || col >= size {
        return false;
    }
    let far = size.saturating_sub(FINDER_SIZE);
    let top = row < FINDER_SIZE;
    let left = col < FINDER_SIZE;
    (top && left) || (top && col >= far) || (left && row >= far)
}
