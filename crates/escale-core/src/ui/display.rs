//! Display contract and backends
//!
//! Views draw through the immediate-mode [`Display`] trait: clear the frame,
//! draw a few lines of text, flush. Only [`View::render`](super::View::render)
//! touches the display.
//!
//! Two backends are provided:
//! - [`GraphicsDisplay`] renders onto any monochrome `embedded-graphics`
//!   draw target (an SSD1306 frame buffer on the device).
//! - [`MemoryDisplay`] records flushed frames as text, for the simulator and
//!   tests. A cloned [`FrameProbe`] inspects what was shown.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::error::DisplayError;

/// Immediate-mode text surface.
pub trait Display {
    /// Start a new frame.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw `text` with its baseline starting at `at`.
    fn draw_text(&mut self, at: Point, text: &str) -> Result<(), DisplayError>;

    /// Send the frame to the panel.
    fn flush(&mut self) -> Result<(), DisplayError>;
}

// ---------------------------------------------------------------------------
// GraphicsDisplay
// ---------------------------------------------------------------------------

/// [`Display`] on top of a monochrome `embedded-graphics` draw target.
///
/// `flush` is called with the target when a frame is complete; buffered
/// drivers send their frame buffer to the panel there.
pub struct GraphicsDisplay<D, F> {
    target: D,
    flush: F,
    style: MonoTextStyle<'static, BinaryColor>,
}

impl<D, F> GraphicsDisplay<D, F>
where
    D: DrawTarget<Color = BinaryColor>,
    F: FnMut(&mut D) -> Result<(), DisplayError>,
{
    pub fn new(target: D, flush: F) -> Self {
        Self {
            target,
            flush,
            style: MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }
}

impl<D, F> Display for GraphicsDisplay<D, F>
where
    D: DrawTarget<Color = BinaryColor>,
    F: FnMut(&mut D) -> Result<(), DisplayError>,
{
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.target
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::Draw)
    }

    fn draw_text(&mut self, at: Point, text: &str) -> Result<(), DisplayError> {
        Text::new(text, at, self.style)
            .draw(&mut self.target)
            .map(|_| ())
            .map_err(|_| DisplayError::Draw)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        (self.flush)(&mut self.target)
    }
}

// ---------------------------------------------------------------------------
// MemoryDisplay
// ---------------------------------------------------------------------------

/// A line of text drawn into a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub at: Point,
    pub text: String,
}

/// Text content of one flushed frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub lines: Vec<TextLine>,
}

impl Frame {
    /// Whether any line of the frame contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text.contains(needle))
    }

    /// Text drawn at exactly `at`, if any.
    pub fn text_at(&self, at: Point) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.at == at)
            .map(|line| line.text.as_str())
    }
}

#[derive(Default)]
struct FrameLog {
    pending: Frame,
    flushed: Option<Frame>,
    flushes: u32,
    fail_next: Option<DisplayError>,
}

impl FrameLog {
    fn check(&mut self) -> Result<(), DisplayError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// [`Display`] that keeps flushed frames as text.
#[derive(Default)]
pub struct MemoryDisplay {
    log: Rc<RefCell<FrameLog>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for inspecting frames after the display has been handed off.
    pub fn probe(&self) -> FrameProbe {
        FrameProbe {
            log: self.log.clone(),
        }
    }
}

impl Display for MemoryDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut log = self.log.borrow_mut();
        log.check()?;
        log.pending = Frame::default();
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str) -> Result<(), DisplayError> {
        let mut log = self.log.borrow_mut();
        log.check()?;
        log.pending.lines.push(TextLine {
            at,
            text: String::from(text),
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let mut log = self.log.borrow_mut();
        log.check()?;
        let frame = log.pending.clone();
        log.flushed = Some(frame);
        log.flushes += 1;
        Ok(())
    }
}

/// Shared read handle onto a [`MemoryDisplay`].
#[derive(Clone)]
pub struct FrameProbe {
    log: Rc<RefCell<FrameLog>>,
}

impl FrameProbe {
    /// Number of frames flushed so far.
    pub fn flush_count(&self) -> u32 {
        self.log.borrow().flushes
    }

    /// The most recently flushed frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.log.borrow().flushed.clone()
    }

    /// Whether the most recently flushed frame contains `needle`.
    pub fn shows(&self, needle: &str) -> bool {
        self.log
            .borrow()
            .flushed
            .as_ref()
            .is_some_and(|frame| frame.contains(needle))
    }

    /// Make the next display operation fail with `err`.
    pub fn fail_next(&self, err: DisplayError) {
        self.log.borrow_mut().fail_next = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec;
    use core::convert::Infallible;

    const WIDTH: usize = 128;
    const HEIGHT: usize = 64;

    struct Canvas {
        pixels: Vec<bool>,
    }

    impl Canvas {
        fn new() -> Self {
            Self {
                pixels: vec![false; WIDTH * HEIGHT],
            }
        }

        fn lit(&self) -> usize {
            self.pixels.iter().filter(|on| **on).count()
        }
    }

    impl OriginDimensions for Canvas {
        fn size(&self) -> Size {
            Size::new(WIDTH as u32, HEIGHT as u32)
        }
    }

    impl DrawTarget for Canvas {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if (0..WIDTH as i32).contains(&point.x) && (0..HEIGHT as i32).contains(&point.y) {
                    self.pixels[point.y as usize * WIDTH + point.x as usize] = color.is_on();
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_graphics_display_draws_and_clears() {
        let mut flushed = 0;
        let mut display = GraphicsDisplay::new(Canvas::new(), |_: &mut Canvas| {
            flushed += 1;
            Ok(())
        });

        display.draw_text(Point::new(0, 10), "Taring...").unwrap();
        assert!(display.target().lit() > 0);

        display.clear().unwrap();
        assert_eq!(display.target().lit(), 0);

        display.flush().unwrap();
        drop(display);
        assert_eq!(flushed, 1);
    }

    #[test]
    fn test_memory_display_keeps_last_flushed_frame() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();

        display.clear().unwrap();
        display.draw_text(Point::new(0, 10), "w=   1.000").unwrap();
        assert!(probe.last_frame().is_none());

        display.flush().unwrap();
        assert_eq!(probe.flush_count(), 1);
        assert!(probe.shows("w="));
        assert_eq!(
            probe.last_frame().unwrap().text_at(Point::new(0, 10)),
            Some("w=   1.000")
        );

        display.clear().unwrap();
        display.flush().unwrap();
        assert!(!probe.shows("w="));
    }

    #[test]
    fn test_memory_display_failure_injection() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();

        probe.fail_next(DisplayError::Flush);
        assert_eq!(display.clear(), Err(DisplayError::Flush));
        assert_eq!(display.clear(), Ok(()));
    }
}
