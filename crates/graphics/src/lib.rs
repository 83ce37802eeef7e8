pub mod surface;

use color::{AlphaColor, Rgba8, Srgb};
use euclid::default::{Box2D, Point2D, Size2D};

pub use surface::Surface;

/// A rectangular RGBA8 pixel buffer, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    size: Size2D<u32>,
    pixels: Vec<Rgba8>,
}

impl Image {
    pub fn new(size: Size2D<u32>, fill: Rgba8) -> Self {
        Self {
            size,
            pixels: vec![fill; size.area() as usize],
        }
    }
    pub fn size(&self) -> Size2D<u32> {
        self.size
    }
    pub fn width(&self) -> u32 {
        self.size.width
    }
    pub fn height(&self) -> u32 {
        self.size.height
    }
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Pixel space covered by this image, `max` is exclusive.
    pub fn bounds(&self) -> Box2D<i32> {
        Box2D::new(
            Point2D::zero(),
            Point2D::new(self.size.width as i32, self.size.height as i32),
        )
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.size.width || y as u32 >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut Rgba8> {
        self.index(x, y).map(|i| &mut self.pixels[i])
    }

    pub fn fill(&mut self, color: Rgba8) {
        self.pixels.fill(color);
    }

    /// Composites `src` over this image with its origin at (0, 0), using
    /// source-over alpha blending. Only the overlapping region is touched.
    pub fn draw_over(&mut self, src: &Image) {
        let Some(area) = self.bounds().intersection(&src.bounds()) else {
            return;
        };
        for y in area.min.y..area.max.y {
            for x in area.min.x..area.max.x {
                if let (Some(s), Some(d)) = (src.pixel(x, y), self.pixel_mut(x, y)) {
                    *d = blend_over(s, *d);
                }
            }
        }
    }
}

/// Source-over blend of two straight-alpha pixels.
pub fn blend_over(src: Rgba8, dst: Rgba8) -> Rgba8 {
    match src.a {
        255 => src,
        0 => dst,
        a => {
            let sa = a as u32;
            let inv = 255 - sa;
            let out_a = sa + (dst.a as u32 * inv + 127) / 255;
            if out_a == 0 {
                return Rgba8 { r: 0, g: 0, b: 0, a: 0 };
            }
            let channel = |s: u8, d: u8| {
                let premul = s as u32 * sa + (d as u32 * dst.a as u32 * inv + 127) / 255;
                ((premul + out_a / 2) / out_a).min(255) as u8
            };
            Rgba8 {
                r: channel(src.r, dst.r),
                g: channel(src.g, dst.g),
                b: channel(src.b, dst.b),
                a: out_a.min(255) as u8,
            }
        }
    }
}

/// The 2D context elements paint onto.
pub trait DrawingContext {
    fn size(&self) -> Size2D<u32>;
    /// Sets the colour used by subsequent `clear` and fill calls.
    fn set_color(&mut self, color: AlphaColor<Srgb>);
    /// Fills the whole context with the current colour.
    fn clear(&mut self);
    /// Fills a circle centred on `center`. Pixels outside the context are
    /// clipped; a non-positive radius paints nothing.
    fn fill_circle(&mut self, center: Point2D<i32>, radius: i32);
    fn image(&self) -> &Image;
}
