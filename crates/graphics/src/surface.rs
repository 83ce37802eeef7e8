use color::{AlphaColor, Rgba8, Srgb, palette};
use euclid::default::{Box2D, Point2D, Size2D};
use tracing::trace;

use crate::{DrawingContext, Image, blend_over};

/// CPU-backed drawing context with a fixed pixel size.
#[derive(Clone, Debug)]
pub struct Surface {
    image: Image,
    color: Rgba8,
}

impl Surface {
    pub fn new(size: Size2D<u32>) -> Self {
        let color = palette::css::BLACK.to_rgba8();
        Self {
            image: Image::new(size, color),
            color,
        }
    }
}

impl DrawingContext for Surface {
    fn size(&self) -> Size2D<u32> {
        self.image.size()
    }

    fn set_color(&mut self, color: AlphaColor<Srgb>) {
        self.color = color.to_rgba8();
    }

    fn clear(&mut self) {
        self.image.fill(self.color);
    }

    fn fill_circle(&mut self, center: Point2D<i32>, radius: i32) {
        if radius <= 0 {
            return;
        }
        // Widened so extreme centres or radii clip instead of overflowing.
        let (cx, cy, r) = (center.x as i64, center.y as i64, radius as i64);
        let covered = Box2D::new(
            Point2D::new(cx - r, cy - r),
            Point2D::new(cx + r + 1, cy + r + 1),
        );
        let Some(area) = covered.intersection(&self.image.bounds().cast::<i64>()) else {
            trace!(?center, radius, "circle entirely off surface");
            return;
        };

        let r2 = r as i128 * r as i128;
        for y in area.min.y..area.max.y {
            let dy = (y - cy) as i128;
            for x in area.min.x..area.max.x {
                let dx = (x - cx) as i128;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                // Inside the image bounds, so both fit in i32.
                let (x, y) = (x as i32, y as i32);
                if let Some(pixel) = self.image.pixel_mut(x, y) {
                    *pixel = blend_over(self.color, *pixel);
                }
            }
        }
    }

    fn image(&self) -> &Image {
        &self.image
    }
}
