mod circle;

use std::io::{self, Write};

use graphics::DrawingContext;

use crate::PointAnimation;

pub use circle::Circle;

/// A drawable member of a window.
///
/// Each tick the window calls [`Element::render`] to advance the element's
/// state and then [`Element::draw`] to paint it, in that order.
pub trait Element: Send {
    /// Advances the element by one tick.
    fn render(&mut self);
    /// Paints the element at its current state.
    fn draw(&self, ctx: &mut dyn DrawingContext);
    /// Writes a human readable block describing the element.
    fn debug(&self, w: &mut dyn Write, label: &str) -> io::Result<()>;
    /// Replaces the current animation, `None` makes the element static.
    fn set_animation(&mut self, animation: Option<Box<dyn PointAnimation>>);
    /// Label identifying the element variant in debug output.
    fn kind(&self) -> &'static str;
}
