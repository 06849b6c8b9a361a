//! Geometry primitives for the placement specialization.
//!
//! Integer grid coordinates, the four-direction step primitive
//! [`adapt_xy`], and the distance metrics placement fitness is built on.

/// One of the four axis-aligned unit directions.
///
/// `Left`/`Right` move the x-coordinate, `Up`/`Down` the y-coordinate
/// (`Up` increases y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All four directions, in a fixed probe order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// The direction that undoes this one.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Moves a coordinate pair one unit in the given direction.
///
/// Pure function; stepping in a direction and then in its
/// [`opposite`](Direction::opposite) returns the original pair.
pub fn adapt_xy(x: i32, y: i32, direction: Direction) -> (i32, i32) {
    match direction {
        Direction::Left => (x - 1, y),
        Direction::Right => (x + 1, y),
        Direction::Up => (x, y + 1),
        Direction::Down => (x, y - 1),
    }
}

/// A point on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighboring point one unit in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (x, y) = adapt_xy(self.x, self.y, direction);
        Self { x, y }
    }

    /// Manhattan (L1) distance to another point.
    pub fn manhattan(self, other: Point) -> f64 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as f64
    }

    /// Euclidean (L2) distance to another point.
    pub fn euclidean(self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}
