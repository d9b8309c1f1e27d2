//! Error codes carried by error replies

/// Reason a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// Frame type unknown or payload undecodable
    Malformed,
    /// Category or file does not exist
    NotFound,
    /// Name is empty, too long, or contains a path separator
    InvalidName,
    /// Upload exceeds the size limit
    TooLarge,
    /// Upload is not a GIF at the panel resolution
    InvalidImage,
    /// Storage failed while reading or writing
    Io,
    /// Chunk or commit without an upload in progress
    NoUpload,
    /// Catalog has no room for another category or file
    Full,
}

// Wire format values
const CODE_MALFORMED: u8 = 0x01;
const CODE_NOT_FOUND: u8 = 0x02;
const CODE_INVALID_NAME: u8 = 0x03;
const CODE_TOO_LARGE: u8 = 0x04;
const CODE_INVALID_IMAGE: u8 = 0x05;
const CODE_IO: u8 = 0x06;
const CODE_NO_UPLOAD: u8 = 0x07;
const CODE_FULL: u8 = 0x08;

impl ErrorCode {
    /// Parse a code from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CODE_MALFORMED => Some(ErrorCode::Malformed),
            CODE_NOT_FOUND => Some(ErrorCode::NotFound),
            CODE_INVALID_NAME => Some(ErrorCode::InvalidName),
            CODE_TOO_LARGE => Some(ErrorCode::TooLarge),
            CODE_INVALID_IMAGE => Some(ErrorCode::InvalidImage),
            CODE_IO => Some(ErrorCode::Io),
            CODE_NO_UPLOAD => Some(ErrorCode::NoUpload),
            CODE_FULL => Some(ErrorCode::Full),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            ErrorCode::Malformed => CODE_MALFORMED,
            ErrorCode::NotFound => CODE_NOT_FOUND,
            ErrorCode::InvalidName => CODE_INVALID_NAME,
            ErrorCode::TooLarge => CODE_TOO_LARGE,
            ErrorCode::InvalidImage => CODE_INVALID_IMAGE,
            ErrorCode::Io => CODE_IO,
            ErrorCode::NoUpload => CODE_NO_UPLOAD,
            ErrorCode::Full => CODE_FULL,
        }
    }

    /// Returns true if retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::Io)
    }
}
