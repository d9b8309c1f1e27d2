//! Message types for the control protocol
//!
//! Message types are divided into two categories:
//! - Controller → Player: requests (0x01..0x3F)
//! - Player → Controller: replies (0x40..0x7F)
//!
//! Single flags and levels travel as raw bytes; anything with names in it is
//! postcard-encoded.

use heapless::{String, Vec};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::codes::ErrorCode;
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

// Message type IDs: Controller → Player
pub const MSG_STATUS: u8 = 0x01;
pub const MSG_LIST_CATEGORIES: u8 = 0x02;
pub const MSG_CATEGORY_INFO: u8 = 0x03;
pub const MSG_SELECT_CATEGORY: u8 = 0x04;
pub const MSG_NEXT: u8 = 0x05;
pub const MSG_PREVIOUS: u8 = 0x06;
pub const MSG_SET_CATEGORY_PLAYBACK: u8 = 0x07;
pub const MSG_SET_POWER: u8 = 0x08;
pub const MSG_GET_BRIGHTNESS: u8 = 0x09;
pub const MSG_SET_BRIGHTNESS: u8 = 0x0A;
pub const MSG_RESCAN: u8 = 0x0B;
pub const MSG_UPLOAD_BEGIN: u8 = 0x10;
pub const MSG_UPLOAD_CHUNK: u8 = 0x11;
pub const MSG_UPLOAD_COMMIT: u8 = 0x12;
pub const MSG_DELETE_FILE: u8 = 0x13;
pub const MSG_TEST_PATTERN: u8 = 0x14;

// Message type IDs: Player → Controller
pub const MSG_REPLY_ACK: u8 = 0x40;
pub const MSG_REPLY_ERROR: u8 = 0x41;
pub const MSG_REPLY_SELECTED: u8 = 0x42;
pub const MSG_REPLY_FILE: u8 = 0x43;
pub const MSG_REPLY_STATUS: u8 = 0x44;
pub const MSG_REPLY_CATEGORIES: u8 = 0x45;
pub const MSG_REPLY_CATEGORY_INFO: u8 = 0x46;
pub const MSG_REPLY_BRIGHTNESS: u8 = 0x47;

/// Longest category or file name on the wire
pub const MAX_NAME_LEN: usize = 32;
/// Most categories reported in one reply
pub const MAX_CATEGORIES: usize = 16;
/// Most files reported for one category
pub const MAX_FILES: usize = 32;
/// Recommended upload chunk size
pub const MAX_CHUNK_SIZE: usize = 1024;

/// Category or file name as carried in replies
pub type WireName = String<MAX_NAME_LEN>;

/// Where an upload is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadTarget<'a> {
    /// Replace the default animation
    Current,
    /// Add a file to a category, creating the category if needed
    Category { name: &'a str, filename: &'a str },
}

/// Header of an upload transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadBegin<'a> {
    #[serde(borrow)]
    pub target: UploadTarget<'a>,
    /// Total number of bytes that will follow in chunk frames
    pub size: u32,
}

/// Requests from a controller to the player
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRequest<'a> {
    Status,
    ListCategories,
    CategoryInfo { name: &'a str },
    SelectCategory { name: &'a str },
    Next,
    Previous,
    SetCategoryPlayback(bool),
    SetPower(bool),
    GetBrightness,
    SetBrightness(u8),
    Rescan,
    UploadBegin(UploadBegin<'a>),
    UploadChunk(&'a [u8]),
    UploadCommit,
    DeleteFile { category: &'a str, filename: &'a str },
    TestPattern,
}

fn encode<T: Serialize>(msg_type: u8, value: &T) -> Result<Frame, FrameError> {
    let mut buf = [0u8; MAX_PAYLOAD_SIZE];
    let used = postcard::to_slice(value, &mut buf).map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::new(msg_type, used)
}

fn decode_borrowed<'a, T: Deserialize<'a>>(frame: &'a Frame) -> Result<T, FrameError> {
    postcard::from_bytes(&frame.payload).map_err(|_| FrameError::InvalidPayload)
}

fn decode_owned<T: DeserializeOwned>(frame: &Frame) -> Result<T, FrameError> {
    postcard::from_bytes(&frame.payload).map_err(|_| FrameError::InvalidPayload)
}

fn single_byte(frame: &Frame) -> Result<u8, FrameError> {
    match frame.payload.as_slice() {
        [byte] => Ok(*byte),
        _ => Err(FrameError::InvalidFrame),
    }
}

fn flag(frame: &Frame) -> Result<bool, FrameError> {
    match single_byte(frame)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(FrameError::InvalidFrame),
    }
}

impl<'a> ControlRequest<'a> {
    /// Parse a request from a frame; borrowed names point into the frame
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_STATUS => Ok(ControlRequest::Status),
            MSG_LIST_CATEGORIES => Ok(ControlRequest::ListCategories),
            MSG_CATEGORY_INFO => Ok(ControlRequest::CategoryInfo {
                name: decode_borrowed(frame)?,
            }),
            MSG_SELECT_CATEGORY => Ok(ControlRequest::SelectCategory {
                name: decode_borrowed(frame)?,
            }),
            MSG_NEXT => Ok(ControlRequest::Next),
            MSG_PREVIOUS => Ok(ControlRequest::Previous),
            MSG_SET_CATEGORY_PLAYBACK => Ok(ControlRequest::SetCategoryPlayback(flag(frame)?)),
            MSG_SET_POWER => Ok(ControlRequest::SetPower(flag(frame)?)),
            MSG_GET_BRIGHTNESS => Ok(ControlRequest::GetBrightness),
            MSG_SET_BRIGHTNESS => Ok(ControlRequest::SetBrightness(single_byte(frame)?)),
            MSG_RESCAN => Ok(ControlRequest::Rescan),
            MSG_UPLOAD_BEGIN => Ok(ControlRequest::UploadBegin(decode_borrowed(frame)?)),
            MSG_UPLOAD_CHUNK => Ok(ControlRequest::UploadChunk(&frame.payload)),
            MSG_UPLOAD_COMMIT => Ok(ControlRequest::UploadCommit),
            MSG_DELETE_FILE => {
                let (category, filename): (&str, &str) = decode_borrowed(frame)?;
                Ok(ControlRequest::DeleteFile { category, filename })
            }
            MSG_TEST_PATTERN => Ok(ControlRequest::TestPattern),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this request into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ControlRequest::Status => Ok(Frame::empty(MSG_STATUS)),
            ControlRequest::ListCategories => Ok(Frame::empty(MSG_LIST_CATEGORIES)),
            ControlRequest::CategoryInfo { name } => encode(MSG_CATEGORY_INFO, name),
            ControlRequest::SelectCategory { name } => encode(MSG_SELECT_CATEGORY, name),
            ControlRequest::Next => Ok(Frame::empty(MSG_NEXT)),
            ControlRequest::Previous => Ok(Frame::empty(MSG_PREVIOUS)),
            ControlRequest::SetCategoryPlayback(enabled) => {
                Frame::new(MSG_SET_CATEGORY_PLAYBACK, &[u8::from(*enabled)])
            }
            ControlRequest::SetPower(on) => Frame::new(MSG_SET_POWER, &[u8::from(*on)]),
            ControlRequest::GetBrightness => Ok(Frame::empty(MSG_GET_BRIGHTNESS)),
            ControlRequest::SetBrightness(level) => Frame::new(MSG_SET_BRIGHTNESS, &[*level]),
            ControlRequest::Rescan => Ok(Frame::empty(MSG_RESCAN)),
            ControlRequest::UploadBegin(begin) => encode(MSG_UPLOAD_BEGIN, begin),
            ControlRequest::UploadChunk(data) => Frame::new(MSG_UPLOAD_CHUNK, data),
            ControlRequest::UploadCommit => Ok(Frame::empty(MSG_UPLOAD_COMMIT)),
            ControlRequest::DeleteFile { category, filename } => {
                encode(MSG_DELETE_FILE, &(category, filename))
            }
            ControlRequest::TestPattern => Ok(Frame::empty(MSG_TEST_PATTERN)),
        }
    }
}

/// Per-category line of a status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CategorySummary {
    pub name: WireName,
    pub file_count: u16,
}

/// Player status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub category: Option<WireName>,
    pub file: WireName,
    pub category_playback: bool,
    pub power_on: bool,
    pub brightness: u8,
    pub categories: Vec<CategorySummary, MAX_CATEGORIES>,
}

impl StatusReport {
    /// Number of categories in the catalog
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

/// Full file list of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CategoryListing {
    pub name: WireName,
    pub files: Vec<WireName, MAX_FILES>,
}

impl CategoryListing {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Replies from the player to a controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlReply {
    /// Request applied
    Ack,
    /// Request refused
    Error(ErrorCode),
    /// Outcome of a category selection
    Selected(bool),
    /// File made current by a navigation request (empty when nothing is selected)
    File(WireName),
    Status(StatusReport),
    Categories(Vec<WireName, MAX_CATEGORIES>),
    /// `None` when the category does not exist
    CategoryInfo(Option<CategoryListing>),
    Brightness(u8),
}

impl ControlReply {
    /// Parse a reply from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_REPLY_ACK => Ok(ControlReply::Ack),
            MSG_REPLY_ERROR => ErrorCode::from_byte(single_byte(frame)?)
                .map(ControlReply::Error)
                .ok_or(FrameError::InvalidFrame),
            MSG_REPLY_SELECTED => Ok(ControlReply::Selected(flag(frame)?)),
            MSG_REPLY_FILE => Ok(ControlReply::File(decode_owned(frame)?)),
            MSG_REPLY_STATUS => Ok(ControlReply::Status(decode_owned(frame)?)),
            MSG_REPLY_CATEGORIES => Ok(ControlReply::Categories(decode_owned(frame)?)),
            MSG_REPLY_CATEGORY_INFO => Ok(ControlReply::CategoryInfo(decode_owned(frame)?)),
            MSG_REPLY_BRIGHTNESS => Ok(ControlReply::Brightness(single_byte(frame)?)),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this reply into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ControlReply::Ack => Ok(Frame::empty(MSG_REPLY_ACK)),
            ControlReply::Error(code) => Frame::new(MSG_REPLY_ERROR, &[code.to_byte()]),
            ControlReply::Selected(ok) => Frame::new(MSG_REPLY_SELECTED, &[u8::from(*ok)]),
            ControlReply::File(name) => encode(MSG_REPLY_FILE, name),
            ControlReply::Status(report) => encode(MSG_REPLY_STATUS, report),
            ControlReply::Categories(names) => encode(MSG_REPLY_CATEGORIES, names),
            ControlReply::CategoryInfo(info) => encode(MSG_REPLY_CATEGORY_INFO, info),
            ControlReply::Brightness(level) => Frame::new(MSG_REPLY_BRIGHTNESS, &[*level]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> WireName {
        let mut n = WireName::new();
        n.push_str(s).unwrap();
        n
    }

    #[test]
    fn test_select_category_payload_borrows_name() {
        let frame = ControlRequest::SelectCategory { name: "nature" }
            .to_frame()
            .unwrap();
        assert_eq!(frame.msg_type, MSG_SELECT_CATEGORY);

        let parsed = ControlRequest::from_frame(&frame).unwrap();
        assert_eq!(parsed, ControlRequest::SelectCategory { name: "nature" });
    }

    #[test]
    fn test_set_power_is_single_byte() {
        let frame = ControlRequest::SetPower(false).to_frame().unwrap();
        assert_eq!(frame.msg_type, MSG_SET_POWER);
        assert_eq!(frame.payload.as_slice(), &[0]);
    }

    #[test]
    fn test_flag_rejects_other_values() {
        let frame = Frame::new(MSG_SET_CATEGORY_PLAYBACK, &[2]).unwrap();
        assert_eq!(
            ControlRequest::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );

        let frame = Frame::empty(MSG_SET_POWER);
        assert_eq!(
            ControlRequest::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_upload_begin_to_category() {
        let begin = UploadBegin {
            target: UploadTarget::Category {
                name: "space",
                filename: "rocket.gif",
            },
            size: 4096,
        };
        let frame = ControlRequest::UploadBegin(begin).to_frame().unwrap();
        let parsed = ControlRequest::from_frame(&frame).unwrap();
        assert_eq!(parsed, ControlRequest::UploadBegin(begin));
    }

    #[test]
    fn test_upload_chunk_is_raw() {
        let data = [0x47, 0x49, 0x46, 0x38, 0x39, 0x61];
        let frame = ControlRequest::UploadChunk(&data).to_frame().unwrap();
        assert_eq!(frame.payload.as_slice(), &data);
        assert_eq!(
            ControlRequest::from_frame(&frame).unwrap(),
            ControlRequest::UploadChunk(&data)
        );
    }

    #[test]
    fn test_delete_file_names() {
        let frame = ControlRequest::DeleteFile {
            category: "nature",
            filename: "a.gif",
        }
        .to_frame()
        .unwrap();
        match ControlRequest::from_frame(&frame).unwrap() {
            ControlRequest::DeleteFile { category, filename } => {
                assert_eq!(category, "nature");
                assert_eq!(filename, "a.gif");
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_request_type() {
        let frame = Frame::empty(0x3F);
        assert_eq!(
            ControlRequest::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_truncated_name_payload() {
        // Length prefix says 10 bytes, only 2 follow
        let frame = Frame::new(MSG_CATEGORY_INFO, &[10, b'a', b'b']).unwrap();
        assert_eq!(
            ControlRequest::from_frame(&frame),
            Err(FrameError::InvalidPayload)
        );
    }

    #[test]
    fn test_status_reply() {
        let mut categories = Vec::new();
        categories
            .push(CategorySummary {
                name: name("nature"),
                file_count: 2,
            })
            .unwrap();
        categories
            .push(CategorySummary {
                name: name("space"),
                file_count: 1,
            })
            .unwrap();
        let report = StatusReport {
            category: Some(name("nature")),
            file: name("b.gif"),
            category_playback: true,
            power_on: true,
            brightness: 10,
            categories,
        };

        let frame = ControlReply::Status(report.clone()).to_frame().unwrap();
        assert_eq!(frame.msg_type, MSG_REPLY_STATUS);
        match ControlReply::from_frame(&frame).unwrap() {
            ControlReply::Status(parsed) => {
                assert_eq!(parsed.category_count(), 2);
                assert_eq!(parsed, report);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_full_category_listing_fits_in_one_frame() {
        let mut files = Vec::new();
        for i in 0..MAX_FILES {
            let mut file = WireName::new();
            for _ in 0..MAX_NAME_LEN - 4 {
                file.push('x').unwrap();
            }
            let _ = core::fmt::write(&mut file, format_args!("{:02}", i));
            files.push(file).unwrap();
        }
        let mut long_name = WireName::new();
        for _ in 0..MAX_NAME_LEN {
            long_name.push('c').unwrap();
        }
        let listing = CategoryListing {
            name: long_name,
            files,
        };

        let frame = ControlReply::CategoryInfo(Some(listing.clone()))
            .to_frame()
            .unwrap();
        assert_eq!(
            ControlReply::from_frame(&frame).unwrap(),
            ControlReply::CategoryInfo(Some(listing))
        );
    }

    #[test]
    fn test_missing_category_info_reply() {
        let frame = ControlReply::CategoryInfo(None).to_frame().unwrap();
        assert_eq!(
            ControlReply::from_frame(&frame).unwrap(),
            ControlReply::CategoryInfo(None)
        );
    }

    #[test]
    fn test_error_reply() {
        let frame = ControlReply::Error(ErrorCode::InvalidImage)
            .to_frame()
            .unwrap();
        assert_eq!(frame.payload.as_slice(), &[ErrorCode::InvalidImage.to_byte()]);
        assert_eq!(
            ControlReply::from_frame(&frame).unwrap(),
            ControlReply::Error(ErrorCode::InvalidImage)
        );
    }
}
