use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use color::Rgba8;
use euclid::default::Size2D;
use graphics::Image;

/// The physical output a display pushes frames to, e.g. an LED matrix.
///
/// A [`Display`](crate::Display) takes ownership of its sink and is the only
/// writer for as long as it lives.
pub trait OutputSink: Send {
    /// Pixel size of the output. Windows created by the display match it.
    fn bounds(&self) -> Size2D<u32>;
    /// Composites a frame over the current contents of the output buffer.
    fn draw_over(&mut self, image: &Image);
    /// Pushes the output buffer to the physical device.
    fn render(&mut self);
}

/// Sink that keeps frames in memory instead of driving hardware.
pub struct FrameRecorder {
    canvas: Image,
    stats: FrameStats,
}

impl FrameRecorder {
    pub fn new(size: Size2D<u32>) -> Self {
        Self {
            canvas: Image::new(size, Rgba8 { r: 0, g: 0, b: 0, a: 0 }),
            stats: FrameStats::default(),
        }
    }

    /// A handle that stays valid after the recorder is moved into a display.
    pub fn stats(&self) -> FrameStats {
        self.stats.clone()
    }
}

impl OutputSink for FrameRecorder {
    fn bounds(&self) -> Size2D<u32> {
        self.canvas.size()
    }

    fn draw_over(&mut self, image: &Image) {
        self.canvas.draw_over(image);
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn render(&mut self) {
        self.stats.frames.fetch_add(1, Ordering::SeqCst);
        *self
            .stats
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.canvas.clone());
    }
}

#[derive(Clone, Default)]
pub struct FrameStats {
    writes: Arc<AtomicUsize>,
    frames: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<Image>>>,
}

impl FrameStats {
    /// Number of images composited onto the sink.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
    /// Number of refreshes pushed to the output.
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
    pub fn last_frame(&self) -> Option<Image> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_writes_and_frames() {
        let mut sink = FrameRecorder::new(Size2D::new(2, 2));
        let stats = sink.stats();
        let red = Rgba8 { r: 255, g: 0, b: 0, a: 255 };

        assert!(stats.last_frame().is_none());
        sink.draw_over(&Image::new(Size2D::new(2, 2), red));
        assert_eq!(stats.writes(), 1);
        assert_eq!(stats.frames(), 0);

        sink.render();
        assert_eq!(stats.frames(), 1);
        assert_eq!(stats.last_frame().and_then(|f| f.pixel(1, 1)), Some(red));
    }
}
