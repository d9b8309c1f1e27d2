//! Software framebuffer standing in for the LED panel
//!
//! Pixels are kept as RGB565. On every flush the frame can be written out
//! as a PNG, scaled by the current brightness, for inspection.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use log::{debug, warn};
use pixelreel_core::traits::{DisplayError, MatrixDisplay};

/// In-memory RGB565 panel
pub struct FrameBufferDisplay {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
    brightness: u8,
    snapshot: Option<PathBuf>,
    frames: u64,
}

fn expand(color: u16) -> [u8; 3] {
    let r = ((color >> 11) & 0x1F) as u8;
    let g = ((color >> 5) & 0x3F) as u8;
    let b = (color & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn scale(channel: u8, brightness: u8) -> u8 {
    ((u16::from(channel) * u16::from(brightness)) / 255) as u8
}

impl FrameBufferDisplay {
    pub fn new(width: u16, height: u16, snapshot: Option<PathBuf>) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; usize::from(width) * usize::from(height)],
            brightness: u8::MAX,
            snapshot,
            frames: 0,
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    /// Frames flushed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The frame as brightness-scaled RGB888
    pub fn to_rgb888(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&p| expand(p).map(|c| scale(c, self.brightness)))
            .collect()
    }

    fn write_snapshot(&self, path: &PathBuf) -> Result<(), png::EncodingError> {
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(
            BufWriter::new(file),
            u32::from(self.width),
            u32::from(self.height),
        );
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgb888())?;
        Ok(())
    }
}

impl MatrixDisplay for FrameBufferDisplay {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn draw_pixel(&mut self, x: u16, y: u16, color: u16) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.pixels[idx] = color;
    }

    fn draw_run(&mut self, x: u16, y: u16, colors: &[u16]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let n = colors.len().min(usize::from(self.width - x));
        let start = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.pixels[start..start + n].copy_from_slice(&colors[..n]);
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn begin(&mut self) -> Result<(), DisplayError> {
        if self.pixels.len() != usize::from(self.width) * usize::from(self.height) {
            return Err(DisplayError::OutOfMemory);
        }
        debug!("Framebuffer {}x{} ready", self.width, self.height);
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    fn flush(&mut self) {
        self.frames += 1;
        if let Some(path) = &self.snapshot {
            if let Err(e) = self.write_snapshot(path) {
                warn!("Cannot write snapshot {}: {}", path.display(), e);
            }
        }
    }
}
