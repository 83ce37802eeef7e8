use euclid::default::Point2D;

/// Integer pixel coordinate owned by an element. Values are unconstrained;
/// clipping happens when drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
    pub fn coordinates(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl From<Point> for Point2D<i32> {
    fn from(value: Point) -> Self {
        Point2D::new(value.x, value.y)
    }
}
