//! Integer geometry for schematic space.
//!
//! # Overview
//!
//! - [`Point`] - A position in mils
//! - [`Transform`] - The 2×2 integer matrix carried by a component placement
//! - [`Rotation`] - A quarter-turn rotation used for labels and text
//!
//! # Coordinate System
//!
//! Schematic space matches SVG: the origin is the top-left corner of the
//! sheet and Y grows downward. Library space has Y growing upward, so the
//! default placement matrix is `1 0 0 -1`.
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     ▼
//!    +Y
//! ```

use std::ops::{Add, Mul, Neg, Sub};

/// A point in mils.
///
/// # Examples
///
/// ```
/// # use sch2svg_core::geometry::Point;
/// let p = Point::new(100, 200) + Point::new(5, -5);
/// assert_eq!(p, Point::new(105, 195));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> i32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> i32 {
        self.y
    }

    /// Mirrors the point across the X axis.
    pub fn invert_y(self) -> Self {
        Self::new(self.x, -self.y)
    }

    /// Returns the point with both coordinates swapped.
    pub fn transposed(self) -> Self {
        Self::new(self.y, self.x)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Point {
    type Output = Point;

    fn mul(self, rhs: i32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Placement matrix mapping library coordinates to schematic offsets.
///
/// The four entries are stored in file order, so `1 0 0 -1` is
/// `x' = x`, `y' = -y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(1, 0, 0, -1)
    }
}

impl Transform {
    /// Creates a transform from the four matrix entries in file order.
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Maps a library-space point to a schematic-space offset.
    pub fn apply(self, p: Point) -> Point {
        Point::new(
            self.x1 * p.x + self.y1 * p.y,
            self.x2 * p.x + self.y2 * p.y,
        )
    }

    /// Maps a field offset stored in schematic orientation.
    ///
    /// Field offsets are written relative to an unrotated placement with Y
    /// already pointing down, so they are flipped back into library space
    /// before the matrix is applied.
    pub fn apply_to_field(self, offset: Point) -> Point {
        self.apply(offset.invert_y())
    }

    /// Determinant of the matrix. Negative for the default Y flip.
    pub fn determinant(self) -> i32 {
        self.x1 * self.y2 - self.y1 * self.x2
    }

    /// Counter-clockwise on-screen angle, in degrees, of the library X axis.
    ///
    /// Always one of 0, 90, 180 or 270 for the matrices a placement can carry.
    pub fn angle(self) -> i32 {
        let unit = self.apply(Point::new(1, 0));
        let degrees = f64::from(-unit.y).atan2(f64::from(unit.x)).to_degrees();
        normalize_degrees(degrees.round() as i32)
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// A counter-clockwise quarter-turn rotation in schematic space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Returns the rotation for a label orientation code `0..=3`.
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::R0,
            1 => Self::R90,
            2 => Self::R180,
            _ => Self::R270,
        }
    }

    /// Returns the nearest rotation for an angle in degrees.
    pub fn from_degrees(degrees: i32) -> Self {
        Self::from_quarter_turns((normalize_degrees(degrees) + 45) / 90)
    }

    /// Angle in degrees, counter-clockwise on screen.
    pub fn degrees(self) -> i32 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Rotates an offset around the origin.
    ///
    /// ```
    /// # use sch2svg_core::geometry::{Point, Rotation};
    /// // Pointing right, turned a quarter counter-clockwise, points up.
    /// assert_eq!(Rotation::R90.apply(Point::new(1, 0)), Point::new(0, -1));
    /// ```
    pub fn apply(self, p: Point) -> Point {
        match self {
            Self::R0 => p,
            Self::R90 => Point::new(p.y, -p.x),
            Self::R180 => Point::new(-p.x, -p.y),
            Self::R270 => Point::new(-p.y, p.x),
        }
    }

    /// Rotates a floating-point offset around the origin.
    pub fn apply_f64(self, (x, y): (f64, f64)) -> (f64, f64) {
        match self {
            Self::R0 => (x, y),
            Self::R90 => (y, -x),
            Self::R180 => (-x, -y),
            Self::R270 => (-y, x),
        }
    }

    /// Whether text along this rotation would read upside down.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::R180 | Self::R270)
    }

    /// Folds 180 and 270 onto 0 and 90.
    pub fn readable(self) -> Self {
        match self {
            Self::R180 => Self::R0,
            Self::R270 => Self::R90,
            other => other,
        }
    }
}
