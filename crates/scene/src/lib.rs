pub mod animation;
pub mod element;
pub mod point;
pub mod window;

pub use animation::{BouncePoint, PointAnimation};
pub use element::{Circle, Element};
pub use point::Point;
pub use window::{Composite, Window};
