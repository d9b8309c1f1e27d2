//! LED matrix display sink

/// Errors that can occur when driving the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Frame buffer allocation failed
    OutOfMemory,
    /// Panel did not respond
    NotResponding,
}

/// Pack 8-bit channels into an RGB565 pixel
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Trait for an RGB565 LED matrix
///
/// Coordinates outside the panel are ignored by implementations.
pub trait MatrixDisplay {
    /// Panel width in pixels
    fn width(&self) -> u16;

    /// Panel height in pixels
    fn height(&self) -> u16;

    /// Set one pixel
    fn draw_pixel(&mut self, x: u16, y: u16, color: u16);

    /// Set a horizontal run of pixels starting at `(x, y)`
    fn draw_run(&mut self, x: u16, y: u16, colors: &[u16]) {
        for (i, &color) in colors.iter().enumerate() {
            self.draw_pixel(x + i as u16, y, color);
        }
    }

    /// Blank the whole panel
    fn clear(&mut self);

    /// (Re)initialize the panel driver
    fn begin(&mut self) -> Result<(), DisplayError>;

    /// Set global brightness (0-255)
    fn set_brightness(&mut self, level: u8);

    /// Push the current frame to the panel, if the driver buffers
    fn flush(&mut self) {}
}

/// Helper trait for whole-panel drawing
pub trait MatrixDisplayExt: MatrixDisplay {
    /// Fill every pixel with one color
    fn fill(&mut self, color: u16) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.draw_pixel(x, y, color);
            }
        }
    }
}

impl<T: MatrixDisplay + ?Sized> MatrixDisplayExt for T {}
