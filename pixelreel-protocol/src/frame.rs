//! Control protocol framing
//!
//! ```text
//! 0xAA | len_lo len_hi | type | payload[len] | xor
//! ```
//!
//! `len` is at most [`MAX_PAYLOAD_SIZE`]. The trailing byte is the XOR of
//! everything between the start byte and itself.

use heapless::Vec;

/// Marks the beginning of a frame
pub const FRAME_START: u8 = 0xAA;

/// Largest payload a frame can carry
pub const MAX_PAYLOAD_SIZE: usize = 2048;

/// Start, length, type and checksum bytes
pub const FRAME_OVERHEAD: usize = 5;

/// Largest encoded frame
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Framing and payload errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Declared or supplied payload is over [`MAX_PAYLOAD_SIZE`]
    PayloadTooLarge,
    /// Trailing XOR byte does not match
    InvalidChecksum,
    /// Unknown message type or wrong payload shape
    InvalidFrame,
    /// postcard could not encode or decode the payload
    InvalidPayload,
    /// Output buffer shorter than the encoded frame
    BufferTooSmall,
}

/// One message: a type byte and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

fn xor_all(seed: u8, bytes: &[u8]) -> u8 {
    bytes.iter().fold(seed, |acc, b| acc ^ b)
}

impl Frame {
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|()| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    fn header(&self) -> [u8; 3] {
        let [lo, hi] = (self.payload.len() as u16).to_le_bytes();
        [lo, hi, self.msg_type]
    }

    /// XOR of length, type and payload
    pub fn checksum(&self) -> u8 {
        xor_all(xor_all(0, &self.header()), &self.payload)
    }

    pub fn encoded_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Write the frame to the front of `buffer`, returning its length
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.encoded_len();
        let out = buffer.get_mut(..len).ok_or(FrameError::BufferTooSmall)?;

        let (start, rest) = out.split_at_mut(1);
        let (header, rest) = rest.split_at_mut(3);
        let (body, tail) = rest.split_at_mut(self.payload.len());
        start[0] = FRAME_START;
        header.copy_from_slice(&self.header());
        body.copy_from_slice(&self.payload);
        tail[0] = self.checksum();

        Ok(len)
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let header = self.header();
        let parts: [&[u8]; 4] = [&[FRAME_START], &header, &self.payload, &[self.checksum()]];

        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(part)
                .map_err(|()| FrameError::BufferTooSmall)?;
        }
        Ok(out)
    }
}

/// Where the parser is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Skipping bytes until a start byte
    Hunt,
    /// Collecting the length and type bytes
    Header { got: usize },
    /// Collecting `len` payload bytes
    Body { len: usize },
    /// Expecting the checksum
    Check,
}

/// Incremental frame decoder
///
/// Bytes may arrive in any split. After an error the parser drops the
/// partial frame and hunts for the next start byte.
#[derive(Debug, Clone)]
pub struct FrameParser {
    stage: Stage,
    header: [u8; 3],
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            stage: Stage::Hunt,
            header: [0; 3],
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.stage = Stage::Hunt;
        self.payload.clear();
    }

    fn fail(&mut self, error: FrameError) -> Result<Option<Frame>, FrameError> {
        self.reset();
        Err(error)
    }

    /// Consume one byte; yields a frame when its checksum byte arrives
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.stage {
            Stage::Hunt => {
                if byte == FRAME_START {
                    self.payload.clear();
                    self.stage = Stage::Header { got: 0 };
                }
            }
            Stage::Header { got } => {
                self.header[got] = byte;
                if got < 2 {
                    self.stage = Stage::Header { got: got + 1 };
                } else {
                    let len = usize::from(u16::from_le_bytes([self.header[0], self.header[1]]));
                    if len > MAX_PAYLOAD_SIZE {
                        return self.fail(FrameError::PayloadTooLarge);
                    }
                    self.stage = if len == 0 {
                        Stage::Check
                    } else {
                        Stage::Body { len }
                    };
                }
            }
            Stage::Body { len } => {
                // len was bounded by the header check
                let _ = self.payload.push(byte);
                if self.payload.len() == len {
                    self.stage = Stage::Check;
                }
            }
            Stage::Check => {
                let expected = xor_all(xor_all(0, &self.header), &self.payload);
                if byte != expected {
                    return self.fail(FrameError::InvalidChecksum);
                }
                let frame = Frame {
                    msg_type: self.header[2],
                    payload: core::mem::take(&mut self.payload),
                };
                self.stage = Stage::Hunt;
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Consume bytes up to and including the first complete frame
    ///
    /// Bytes after that frame are left unread.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
