use color::palette;
use euclid::default::Size2D;
use graphics::{DrawingContext, Image, Surface};
use tracing::trace;

use crate::Element;

/// Something the display can register by name and render as a frame.
pub trait Composite: Send {
    /// Composes every element into a fresh frame.
    fn render(&mut self) -> &Image;
    fn add_element(&mut self, element: Box<dyn Element>);
    fn elements(&self) -> &[Box<dyn Element>];
}

/// An ordered list of elements plus the surface they are painted on.
///
/// Insertion order is paint order: later elements cover earlier ones.
pub struct Window {
    surface: Surface,
    elements: Vec<Box<dyn Element>>,
}

impl Window {
    pub fn new(size: Size2D<u32>) -> Self {
        Self {
            surface: Surface::new(size),
            elements: Vec::new(),
        }
    }

    pub fn size(&self) -> Size2D<u32> {
        self.surface.size()
    }
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn push(&mut self, element: impl Element + 'static) {
        self.elements.push(Box::new(element));
    }
}

impl Composite for Window {
    fn render(&mut self) -> &Image {
        self.surface.set_color(palette::css::BLACK);
        self.surface.clear();
        for element in self.elements.iter_mut() {
            element.render();
            element.draw(&mut self.surface);
        }
        trace!(elements = self.elements.len(), "window composed");
        self.surface.image()
    }

    fn add_element(&mut self, element: Box<dyn Element>) {
        self.elements.push(element);
    }

    fn elements(&self) -> &[Box<dyn Element>] {
        &self.elements
    }
}
