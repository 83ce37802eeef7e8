use std::io::{self, Write};

use color::{AlphaColor, Srgb};
use graphics::DrawingContext;

use crate::{Element, Point, PointAnimation};

pub struct Circle {
    point: Point,
    animation: Option<Box<dyn PointAnimation>>,
    radius: i32,
    color: AlphaColor<Srgb>,
}

impl Circle {
    /// No validation is done: a non-positive radius draws nothing and
    /// off-surface coordinates are clipped by the drawing context.
    pub fn new(x: i32, y: i32, radius: i32, color: AlphaColor<Srgb>) -> Self {
        Self {
            point: Point::new(x, y),
            animation: None,
            radius,
            color,
        }
    }

    pub fn with_animation(mut self, animation: impl PointAnimation + 'static) -> Self {
        self.animation = Some(Box::new(animation));
        self
    }

    pub fn point(&self) -> Point {
        self.point
    }
    pub fn radius(&self) -> i32 {
        self.radius
    }
    pub fn color(&self) -> AlphaColor<Srgb> {
        self.color
    }
    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }
}

impl Element for Circle {
    fn render(&mut self) {
        if let Some(animation) = self.animation.as_mut() {
            animation.advance(&mut self.point);
        }
    }

    fn draw(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_color(self.color);
        ctx.fill_circle(self.point.into(), self.radius);
    }

    fn debug(&self, w: &mut dyn Write, label: &str) -> io::Result<()> {
        let rgba = self.color.to_rgba8();
        writeln!(w, "###- {label} -###")?;
        writeln!(w, "x: {}", self.point.x)?;
        writeln!(w, "y: {}", self.point.y)?;
        writeln!(w, "radius: {}", self.radius)?;
        writeln!(w, "color: rgba({}, {}, {}, {})", rgba.r, rgba.g, rgba.b, rgba.a)
    }

    fn set_animation(&mut self, animation: Option<Box<dyn PointAnimation>>) {
        self.animation = animation;
    }

    fn kind(&self) -> &'static str {
        "Circle"
    }
}
