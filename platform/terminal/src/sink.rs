use std::io::{self, BufWriter, Stdout, Write};

use color::Rgba8;
use crossterm::{
    cursor, execute, queue,
    style::{self, Color},
    terminal::{self, ClearType},
};
use display::OutputSink;
use euclid::default::Size2D;
use graphics::Image;
use tracing::warn;

const BLACK: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 255 };

/// Emulates a LED matrix in a 24-bit colour terminal, two pixel rows per
/// character cell.
pub struct TerminalSink {
    canvas: Image,
    out: BufWriter<Stdout>,
}

impl TerminalSink {
    pub fn new(size: Size2D<u32>) -> io::Result<Self> {
        let mut out = BufWriter::new(io::stdout());
        execute!(out, cursor::Hide, terminal::Clear(ClearType::All))?;
        Ok(Self {
            canvas: Image::new(size, BLACK),
            out,
        })
    }
}

fn rgb(pixel: Rgba8) -> Color {
    Color::Rgb {
        r: pixel.r,
        g: pixel.g,
        b: pixel.b,
    }
}

/// Queues an image using upper half blocks: the foreground colour is the
/// even row, the background colour the odd row below it.
pub fn encode_frame(image: &Image, out: &mut impl Write) -> io::Result<()> {
    for (line, y) in (0..image.height() as i32).step_by(2).enumerate() {
        queue!(out, cursor::MoveTo(0, line as u16))?;
        for x in 0..image.width() as i32 {
            let top = image.pixel(x, y).unwrap_or(BLACK);
            let bottom = image.pixel(x, y + 1).unwrap_or(BLACK);
            queue!(
                out,
                style::SetForegroundColor(rgb(top)),
                style::SetBackgroundColor(rgb(bottom)),
                style::Print('\u{2580}')
            )?;
        }
        queue!(out, style::ResetColor)?;
    }
    out.flush()
}

impl OutputSink for TerminalSink {
    fn bounds(&self) -> Size2D<u32> {
        self.canvas.size()
    }

    fn draw_over(&mut self, image: &Image) {
        self.canvas.draw_over(image);
    }

    fn render(&mut self) {
        if let Err(err) = encode_frame(&self.canvas, &mut self.out) {
            warn!("failed to write frame to the terminal: {err}");
        }
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        _ = execute!(self.out, style::ResetColor, cursor::Show);
    }
}
