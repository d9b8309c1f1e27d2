//! GIF decoding with the `gif` crate
//!
//! Frames are decoded in indexed mode so the compositor sees palette
//! indices, transparency and disposal exactly as stored in the file.

use std::io::Cursor;

use gif::{ColorOutput, DecodeOptions, DecodingError, DisposalMethod};
use log::{debug, warn};
use pixelreel_core::compositor::{Disposal, FrameRow};
use pixelreel_core::traits::{
    rgb565, AnimationFile, CanvasInfo, DecodeError, FrameStatus, GifDecoder, RowSink,
};

/// Delay used for frames that declare none
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

fn to_rgb565(palette: &[u8]) -> Vec<u16> {
    palette
        .chunks_exact(3)
        .map(|c| rgb565(c[0], c[1], c[2]))
        .collect()
}

fn disposal(method: DisposalMethod) -> Disposal {
    match method {
        DisposalMethod::Keep => Disposal::Keep,
        DisposalMethod::Background => Disposal::RestoreBackground,
        DisposalMethod::Previous => Disposal::RestorePrevious,
        _ => Disposal::Unspecified,
    }
}

fn decode_error(e: DecodingError) -> DecodeError {
    match e {
        DecodingError::Io(_) => DecodeError::Storage(pixelreel_core::traits::StorageError::Io),
        _ => DecodeError::Corrupt,
    }
}

/// [`GifDecoder`] on top of the `gif` crate
///
/// The whole file is read on open; the decoder then works from memory.
pub struct GifCrateDecoder {
    decoder: Option<gif::Decoder<Cursor<Vec<u8>>>>,
    global_palette: Vec<u16>,
    local_palette: Vec<u16>,
    background_index: u8,
    previous_disposal: Disposal,
    row: Vec<u8>,
    max_file_size: u32,
}

impl GifCrateDecoder {
    pub fn new(max_file_size: u32) -> Self {
        Self {
            decoder: None,
            global_palette: Vec::new(),
            local_palette: Vec::new(),
            background_index: 0,
            previous_disposal: Disposal::Unspecified,
            row: Vec::new(),
            max_file_size,
        }
    }

    fn read_all<F: AnimationFile>(&self, file: &mut F) -> Result<Vec<u8>, DecodeError> {
        let size = file.size();
        if size > self.max_file_size {
            warn!("Animation of {} bytes exceeds {} byte limit", size, self.max_file_size);
            return Err(DecodeError::TooLarge);
        }

        file.seek(0)?;
        let mut data = vec![0u8; size as usize];
        let mut filled = 0;
        while filled < data.len() {
            match file.read(&mut data[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        data.truncate(filled);
        Ok(data)
    }
}

impl GifDecoder for GifCrateDecoder {
    fn open<F: AnimationFile>(&mut self, file: &mut F) -> Result<CanvasInfo, DecodeError> {
        self.close();
        let data = self.read_all(file)?;

        let mut options = DecodeOptions::new();
        options.set_color_output(ColorOutput::Indexed);
        let decoder = options.read_info(Cursor::new(data)).map_err(|e| {
            debug!("Not a GIF: {}", e);
            DecodeError::InvalidFormat
        })?;

        self.global_palette = decoder.global_palette().map(to_rgb565).unwrap_or_default();
        self.background_index = decoder
            .bg_color()
            .and_then(|i| u8::try_from(i).ok())
            .unwrap_or(0);
        self.previous_disposal = Disposal::Unspecified;

        let canvas = CanvasInfo {
            width: decoder.width(),
            height: decoder.height(),
        };
        self.decoder = Some(decoder);
        Ok(canvas)
    }

    fn play_frame<F: AnimationFile>(
        &mut self,
        _file: &mut F,
        sink: &mut dyn RowSink,
    ) -> Result<FrameStatus, DecodeError> {
        let decoder = self.decoder.as_mut().ok_or(DecodeError::NotOpen)?;
        let frame = match decoder.read_next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(FrameStatus::Finished),
            Err(e) => return Err(decode_error(e)),
        };

        let palette: &[u16] = match &frame.palette {
            Some(local) => {
                self.local_palette = to_rgb565(local);
                &self.local_palette
            }
            None => &self.global_palette,
        };

        let width = usize::from(frame.width).max(1);
        for (y, line) in frame
            .buffer
            .chunks_exact(width)
            .take(usize::from(frame.height))
            .enumerate()
        {
            self.row.clear();
            self.row.extend_from_slice(line);
            let mut row = FrameRow {
                pixels: &mut self.row,
                palette,
                x: frame.left,
                y: frame.top.saturating_add(y as u16),
                width: frame.width,
                disposal: self.previous_disposal,
                transparent_index: frame.transparent.unwrap_or(0),
                has_transparency: frame.transparent.is_some(),
                background_index: self.background_index,
            };
            sink.draw_row(&mut row);
        }

        self.previous_disposal = disposal(frame.dispose);
        let delay_ms = match frame.delay {
            0 => DEFAULT_FRAME_DELAY_MS,
            centis => u32::from(centis) * 10,
        };
        Ok(FrameStatus::Drawn { delay_ms })
    }

    fn close(&mut self) {
        self.decoder = None;
    }
}
