use crate::Point;

/// Moves a point by one discrete step each time it is advanced.
///
/// There is no time delta: one call is one engine tick, so the apparent
/// speed of an animation follows the display framerate.
pub trait PointAnimation: Send {
    fn advance(&mut self, point: &mut Point);
}

/// Moves a point diagonally by one pixel per tick and turns around at the
/// edges of `[0, bound]` shrunk by `padding`.
///
/// Only the direction is corrected when a bound is crossed; the point is
/// never moved back inside. A point that starts far outside drifts back at
/// one pixel per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BouncePoint {
    dir_x: i32,
    dir_y: i32,
    bound_x: i32,
    bound_y: i32,
    padding: i32,
}

impl BouncePoint {
    pub fn new(bound_x: i32, bound_y: i32, padding: i32) -> Self {
        Self {
            dir_x: 1,
            dir_y: 1,
            bound_x,
            bound_y,
            padding,
        }
    }

    pub fn direction(&self) -> (i32, i32) {
        (self.dir_x, self.dir_y)
    }

    /// Returns the direction for the next tick along one axis. The two
    /// thresholds are exclusive of each other, the axes are not.
    fn bounce(position: i32, dir: i32, bound: i32, padding: i32) -> i32 {
        let (position, padding) = (position as i64, padding as i64);
        if position + padding > bound as i64 {
            -1
        } else if position - padding < 0 {
            1
        } else {
            dir
        }
    }
}

impl PointAnimation for BouncePoint {
    fn advance(&mut self, point: &mut Point) {
        // Coordinates are unconstrained, stepping past the i32 range wraps.
        point.x = point.x.wrapping_add(self.dir_x);
        point.y = point.y.wrapping_add(self.dir_y);

        self.dir_y = Self::bounce(point.y, self.dir_y, self.bound_y, self.padding);
        self.dir_x = Self::bounce(point.x, self.dir_x, self.bound_x, self.padding);
    }
}
