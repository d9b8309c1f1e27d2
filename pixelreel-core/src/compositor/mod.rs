//! Frame compositor
//!
//! Converts decoded, palette-indexed rows into RGB565 panel pixels.
//!
//! Rows are written in maximal runs: opaque runs are palette-mapped into a
//! scratch buffer and sent to the display with a single `draw_run`, while
//! transparent runs are skipped so the previous frame shows through. Runs
//! wider than the scratch buffer go out in several `draw_run` calls.

use crate::traits::{MatrixDisplay, RowSink};

/// Widest run mapped into the scratch buffer in one go
pub const MAX_ROW_WIDTH: usize = 256;

/// How the previous frame is treated before the next one is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposal {
    /// No disposal specified
    #[default]
    Unspecified,
    /// Leave the frame in place
    Keep,
    /// Restore the frame area to the background color
    RestoreBackground,
    /// Restore what was there before the frame
    RestorePrevious,
}

/// One decoded row of an animation frame
///
/// Owned by a single decode pass and discarded once the row is drawn.
#[derive(Debug)]
pub struct FrameRow<'a> {
    /// Palette indices, left to right
    pub pixels: &'a mut [u8],
    /// RGB565 color table
    pub palette: &'a [u16],
    /// Panel column of the first pixel
    pub x: u16,
    /// Panel row
    pub y: u16,
    /// Number of valid pixels
    pub width: u16,
    /// Disposal instruction of the previous frame
    pub disposal: Disposal,
    /// Palette index treated as transparent
    pub transparent_index: u8,
    /// Whether `transparent_index` applies
    pub has_transparency: bool,
    /// Palette index of the background color
    pub background_index: u8,
}

/// Row renderer bound to a panel size
#[derive(Debug, Clone)]
pub struct Compositor {
    panel_width: u16,
    panel_height: u16,
    scratch: [u16; MAX_ROW_WIDTH],
}

impl Compositor {
    pub fn new(panel_width: u16, panel_height: u16) -> Self {
        Self {
            panel_width,
            panel_height,
            scratch: [0; MAX_ROW_WIDTH],
        }
    }

    /// Draw one decoded row onto `display`
    ///
    /// Pixels beyond the panel edge are dropped. `row.pixels` may be
    /// rewritten in place when the row restores to background.
    pub fn draw_row<D: MatrixDisplay + ?Sized>(&mut self, row: &mut FrameRow<'_>, display: &mut D) {
        if row.y >= self.panel_height || row.x >= self.panel_width {
            return;
        }

        let width = usize::from(row.width)
            .min(usize::from(self.panel_width - row.x))
            .min(row.pixels.len());
        let pixels = &mut row.pixels[..width];
        let palette = row.palette;

        let mut transparent = row.has_transparency;
        if row.disposal == Disposal::RestoreBackground {
            if transparent {
                for p in pixels.iter_mut() {
                    if *p == row.transparent_index {
                        *p = row.background_index;
                    }
                }
            }
            transparent = false;
        }

        if !transparent {
            self.draw_span(display, palette, pixels, row.x, row.y);
            return;
        }

        let t = row.transparent_index;
        let mut x = 0;
        while x < width {
            if pixels[x] == t {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && pixels[x] != t {
                x += 1;
            }
            self.draw_span(display, palette, &pixels[start..x], row.x + start as u16, row.y);
        }
    }

    /// Map and draw an opaque span, one scratch buffer at a time
    fn draw_span<D: MatrixDisplay + ?Sized>(
        &mut self,
        display: &mut D,
        palette: &[u16],
        pixels: &[u8],
        x: u16,
        y: u16,
    ) {
        for (i, chunk) in pixels.chunks(MAX_ROW_WIDTH).enumerate() {
            for (dst, &src) in self.scratch.iter_mut().zip(chunk) {
                *dst = lookup(palette, src);
            }
            let offset = (i * MAX_ROW_WIDTH) as u16;
            display.draw_run(x + offset, y, &self.scratch[..chunk.len()]);
        }
    }
}

#[inline]
fn lookup(palette: &[u16], index: u8) -> u16 {
    palette.get(usize::from(index)).copied().unwrap_or(0)
}

/// Row sink that draws through a compositor onto a display
pub struct RenderTarget<'a, D: MatrixDisplay + ?Sized> {
    pub compositor: &'a mut Compositor,
    pub display: &'a mut D,
}

impl<D: MatrixDisplay + ?Sized> RowSink for RenderTarget<'_, D> {
    fn draw_row(&mut self, row: &mut FrameRow<'_>) {
        self.compositor.draw_row(row, self.display);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDisplay;
    use proptest::prelude::*;

    const SENTINEL: u16 = 0xFFFF;

    fn palette() -> std::vec::Vec<u16> {
        (0..16u16).map(|i| i * 0x0101).collect()
    }

    fn row<'a>(pixels: &'a mut [u8], palette: &'a [u16], y: u16) -> FrameRow<'a> {
        let width = pixels.len() as u16;
        FrameRow {
            pixels,
            palette,
            x: 0,
            y,
            width,
            disposal: Disposal::Keep,
            transparent_index: 0,
            has_transparency: false,
            background_index: 0,
        }
    }

    #[test]
    fn test_opaque_row_is_one_run() {
        let pal = palette();
        let mut px = [1u8, 2, 3, 4];
        let mut display = RecordingDisplay::new(8, 8);
        let mut compositor = Compositor::new(8, 8);

        compositor.draw_row(&mut row(&mut px, &pal, 2), &mut display);

        assert_eq!(display.runs, [(0, 2, 4)]);
        assert_eq!(display.pixel(0, 2), 0x0101);
        assert_eq!(display.pixel(3, 2), 0x0404);
    }

    #[test]
    fn test_transparent_runs_are_skipped() {
        let pal = palette();
        let mut px = [5u8, 5, 0, 0, 7, 0, 9];
        let mut display = RecordingDisplay::filled(8, 8, SENTINEL);
        let mut compositor = Compositor::new(8, 8);

        let mut r = row(&mut px, &pal, 0);
        r.has_transparency = true;
        compositor.draw_row(&mut r, &mut display);

        assert_eq!(display.runs, [(0, 0, 2), (4, 0, 1), (6, 0, 1)]);
        assert_eq!(display.pixel(2, 0), SENTINEL);
        assert_eq!(display.pixel(3, 0), SENTINEL);
        assert_eq!(display.pixel(5, 0), SENTINEL);
        assert_eq!(display.pixel(4, 0), 0x0707);
    }

    #[test]
    fn test_restore_background_makes_row_opaque() {
        let pal = palette();
        let mut px = [3u8, 0, 0, 3];
        let mut display = RecordingDisplay::filled(8, 8, SENTINEL);
        let mut compositor = Compositor::new(8, 8);

        let mut r = row(&mut px, &pal, 1);
        r.has_transparency = true;
        r.disposal = Disposal::RestoreBackground;
        r.background_index = 6;
        compositor.draw_row(&mut r, &mut display);

        assert_eq!(display.runs, [(0, 1, 4)]);
        assert_eq!(display.pixel(1, 1), 0x0606);
        assert_eq!(display.pixel(2, 1), 0x0606);
        assert_eq!(px, [3, 6, 6, 3]);
    }

    #[test]
    fn test_width_is_clamped_to_panel() {
        let pal = palette();
        let mut px = [1u8; 12];
        let mut display = RecordingDisplay::new(8, 8);
        let mut compositor = Compositor::new(8, 8);

        compositor.draw_row(&mut row(&mut px, &pal, 0), &mut display);
        assert_eq!(display.runs, [(0, 0, 8)]);
        assert_eq!(display.out_of_bounds, 0);
    }

    #[test]
    fn test_offset_row_is_clamped_to_panel() {
        let pal = palette();
        let mut px = [1u8; 6];
        let mut display = RecordingDisplay::new(8, 8);
        let mut compositor = Compositor::new(8, 8);

        let mut r = row(&mut px, &pal, 0);
        r.x = 5;
        compositor.draw_row(&mut r, &mut display);
        assert_eq!(display.runs, [(5, 0, 3)]);
        assert_eq!(display.out_of_bounds, 0);
    }

    #[test]
    fn test_wide_panel_row_is_drawn_in_full() {
        let pal = [0u16, 0x1234];
        let mut px = [1u8; 320];
        let mut display = RecordingDisplay::new(320, 1);
        let mut compositor = Compositor::new(320, 1);

        compositor.draw_row(&mut row(&mut px, &pal, 0), &mut display);
        assert_eq!(display.runs, [(0, 0, MAX_ROW_WIDTH), (256, 0, 64)]);
        assert_eq!(display.pixel(300, 0), 0x1234);
        assert_eq!(display.pixel(319, 0), 0x1234);
    }

    #[test]
    fn test_wide_transparent_run_is_split() {
        let pal = [0u16, 0x1234];
        let mut px = [1u8; 300];
        px[0] = 0;
        let mut display = RecordingDisplay::filled(300, 1, SENTINEL);
        let mut compositor = Compositor::new(300, 1);

        let mut r = row(&mut px, &pal, 0);
        r.has_transparency = true;
        compositor.draw_row(&mut r, &mut display);
        assert_eq!(display.runs, [(1, 0, MAX_ROW_WIDTH), (257, 0, 43)]);
        assert_eq!(display.pixel(0, 0), SENTINEL);
        assert_eq!(display.pixel(299, 0), 0x1234);
    }

    #[test]
    fn test_declared_width_shorter_than_buffer() {
        let pal = palette();
        let mut px = [1u8; 6];
        let mut display = RecordingDisplay::new(8, 8);
        let mut compositor = Compositor::new(8, 8);

        let mut r = row(&mut px, &pal, 0);
        r.width = 2;
        compositor.draw_row(&mut r, &mut display);
        assert_eq!(display.runs, [(0, 0, 2)]);
    }

    #[test]
    fn test_rows_below_panel_are_dropped() {
        let pal = palette();
        let mut px = [1u8; 4];
        let mut display = RecordingDisplay::new(8, 8);
        let mut compositor = Compositor::new(8, 8);

        compositor.draw_row(&mut row(&mut px, &pal, 8), &mut display);
        assert!(display.runs.is_empty());
    }

    #[test]
    fn test_index_past_palette_maps_to_black() {
        let pal = [0x1234u16, 0x5678];
        let mut px = [1u8, 200];
        let mut display = RecordingDisplay::filled(4, 4, SENTINEL);
        let mut compositor = Compositor::new(4, 4);

        compositor.draw_row(&mut row(&mut px, &pal, 0), &mut display);
        assert_eq!(display.pixel(0, 0), 0x5678);
        assert_eq!(display.pixel(1, 0), 0);
    }

    #[test]
    fn test_render_target_forwards_rows() {
        let pal = palette();
        let mut px = [2u8, 2];
        let mut display = RecordingDisplay::new(4, 4);
        let mut compositor = Compositor::new(4, 4);

        let mut target = RenderTarget {
            compositor: &mut compositor,
            display: &mut display,
        };
        target.draw_row(&mut row(&mut px, &pal, 3));
        assert_eq!(display.pixel(1, 3), 0x0202);
    }

    proptest! {
        #[test]
        fn test_transparency_differs_only_at_transparent_pixels(
            pixels in proptest::collection::vec(0u8..8, 1..64),
            t in 0u8..8,
        ) {
            let pal = palette();
            let mut compositor = Compositor::new(64, 1);

            let mut with_t = pixels.clone();
            let mut skipping = RecordingDisplay::filled(64, 1, SENTINEL);
            let mut r = row(&mut with_t, &pal, 0);
            r.has_transparency = true;
            r.transparent_index = t;
            compositor.draw_row(&mut r, &mut skipping);

            let mut opaque_px = pixels.clone();
            let mut opaque = RecordingDisplay::filled(64, 1, SENTINEL);
            compositor.draw_row(&mut row(&mut opaque_px, &pal, 0), &mut opaque);

            for (x, &p) in pixels.iter().enumerate() {
                let x = x as u16;
                if p == t {
                    prop_assert_eq!(skipping.pixel(x, 0), SENTINEL);
                    prop_assert_ne!(opaque.pixel(x, 0), SENTINEL);
                } else {
                    prop_assert_eq!(skipping.pixel(x, 0), opaque.pixel(x, 0));
                }
            }
        }

        #[test]
        fn test_restore_background_never_skips(
            pixels in proptest::collection::vec(0u8..8, 1..64),
            t in 0u8..8,
            bg in 0u8..8,
        ) {
            let pal = palette();
            let mut compositor = Compositor::new(64, 1);
            let mut display = RecordingDisplay::filled(64, 1, SENTINEL);

            let mut px = pixels.clone();
            let mut r = row(&mut px, &pal, 0);
            r.has_transparency = true;
            r.transparent_index = t;
            r.background_index = bg;
            r.disposal = Disposal::RestoreBackground;
            compositor.draw_row(&mut r, &mut display);

            for (x, &p) in pixels.iter().enumerate() {
                let expected = if p == t { bg } else { p };
                prop_assert_eq!(display.pixel(x as u16, 0), pal[usize::from(expected)]);
            }
        }
    }
}
