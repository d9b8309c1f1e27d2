//! Control request handling
//!
//! Maps decoded [`ControlRequest`]s onto the player, brightness and upload
//! operations and builds the reply. Uploads arrive as a begin frame,
//! chunk frames and a commit frame; the bytes are buffered here until
//! commit.

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, info, warn};
use pixelreel_core::brightness::Brightness;
use pixelreel_core::catalog::{Direction, ScanError};
use pixelreel_core::config::{to_name, Name};
use pixelreel_core::playback::Player;
use pixelreel_core::traits::{KeyValueStore, Storage};
use pixelreel_core::upload::{validate_category_name, validate_filename, UploadError};
use pixelreel_protocol::{
    CategoryListing, CategorySummary, ControlReply, ControlRequest, ErrorCode, Frame,
    StatusReport, UploadBegin, UploadTarget,
};

/// Map an upload or delete failure onto its wire code
pub fn error_code(e: UploadError) -> ErrorCode {
    match e {
        UploadError::InvalidName => ErrorCode::InvalidName,
        UploadError::TooLarge => ErrorCode::TooLarge,
        UploadError::InvalidImage => ErrorCode::InvalidImage,
        UploadError::NotFound => ErrorCode::NotFound,
        UploadError::Full => ErrorCode::Full,
        UploadError::Io(_) => ErrorCode::Io,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Current,
    Category { name: Name, filename: Name },
}

#[derive(Debug)]
struct UploadSession {
    destination: Destination,
    expected: usize,
    data: Vec<u8>,
}

/// Serves control requests for one player
pub struct ControlHandler<'a, M: RawMutex, K: KeyValueStore, S: Storage> {
    player: &'a Player<'a, M, K>,
    brightness: &'a Brightness<'a, M, K>,
    storage: S,
    upload: Option<UploadSession>,
}

impl<'a, M: RawMutex, K: KeyValueStore, S: Storage> ControlHandler<'a, M, K, S> {
    pub fn new(player: &'a Player<'a, M, K>, brightness: &'a Brightness<'a, M, K>, storage: S) -> Self {
        Self {
            player,
            brightness,
            storage,
            upload: None,
        }
    }

    /// Whether an upload has begun and not yet been committed
    pub fn upload_in_progress(&self) -> bool {
        self.upload.is_some()
    }

    /// Drop any partial upload
    pub fn abort_upload(&mut self) {
        if let Some(session) = self.upload.take() {
            info!(
                "Upload aborted after {} of {} bytes",
                session.data.len(),
                session.expected
            );
        }
    }

    /// Decode a request frame and handle it
    pub fn handle_frame(&mut self, frame: &Frame) -> ControlReply {
        match ControlRequest::from_frame(frame) {
            Ok(request) => self.handle(request),
            Err(e) => {
                debug!("Undecodable request 0x{:02x}: {:?}", frame.msg_type, e);
                ControlReply::Error(ErrorCode::Malformed)
            }
        }
    }

    pub fn handle(&mut self, request: ControlRequest<'_>) -> ControlReply {
        match request {
            ControlRequest::Status => ControlReply::Status(self.status()),
            ControlRequest::ListCategories => {
                ControlReply::Categories(self.player.list_categories())
            }
            ControlRequest::CategoryInfo { name } => ControlReply::CategoryInfo(
                self.player
                    .category_info(name)
                    .map(|info| CategoryListing {
                        name: info.name,
                        files: info.files,
                    }),
            ),
            ControlRequest::SelectCategory { name } => {
                ControlReply::Selected(self.player.select_category(name))
            }
            ControlRequest::Next => ControlReply::File(self.player.advance(Direction::Forward)),
            ControlRequest::Previous => {
                ControlReply::File(self.player.advance(Direction::Backward))
            }
            ControlRequest::SetCategoryPlayback(enabled) => {
                self.player.set_category_playback(enabled);
                ControlReply::Ack
            }
            ControlRequest::SetPower(on) => {
                self.player.set_power_on(on);
                ControlReply::Ack
            }
            ControlRequest::GetBrightness => ControlReply::Brightness(self.brightness.get()),
            ControlRequest::SetBrightness(level) => {
                // The level is in effect even if it could not be stored
                let _ = self.brightness.set(level);
                ControlReply::Ack
            }
            ControlRequest::Rescan => match self.player.rescan(&mut self.storage) {
                Ok(count) => {
                    info!("Rescan found {} categories", count);
                    ControlReply::Ack
                }
                Err(ScanError::RootUnavailable) => ControlReply::Error(ErrorCode::NotFound),
            },
            ControlRequest::UploadBegin(begin) => self.begin_upload(begin),
            ControlRequest::UploadChunk(data) => self.upload_chunk(data),
            ControlRequest::UploadCommit => self.commit_upload(),
            ControlRequest::DeleteFile { category, filename } => {
                match self
                    .player
                    .delete_uploaded_file(&mut self.storage, category, filename)
                {
                    Ok(()) => ControlReply::Ack,
                    Err(e) => ControlReply::Error(error_code(e)),
                }
            }
            ControlRequest::TestPattern => {
                self.player.test_pattern();
                ControlReply::Ack
            }
        }
    }

    fn status(&self) -> StatusReport {
        let snapshot = self.player.status();
        let categories = snapshot
            .categories
            .into_iter()
            .map(|c| CategorySummary {
                name: c.name,
                file_count: u16::try_from(c.file_count).unwrap_or(u16::MAX),
            })
            .collect();

        StatusReport {
            category: snapshot.category,
            file: snapshot.file,
            category_playback: snapshot.category_playback,
            power_on: snapshot.power_on,
            brightness: self.brightness.get(),
            categories,
        }
    }

    fn begin_upload(&mut self, begin: UploadBegin<'_>) -> ControlReply {
        self.abort_upload();

        if begin.size > self.player.settings().max_upload_size {
            warn!("Refusing {} byte upload", begin.size);
            return ControlReply::Error(ErrorCode::TooLarge);
        }

        let destination = match begin.target {
            UploadTarget::Current => Destination::Current,
            UploadTarget::Category { name, filename } => {
                let checked = validate_category_name(name).and(validate_filename(filename));
                match (checked, to_name(name), to_name(filename)) {
                    (Ok(()), Some(name), Some(filename)) => Destination::Category { name, filename },
                    _ => return ControlReply::Error(ErrorCode::InvalidName),
                }
            }
        };

        debug!("Upload of {} bytes started", begin.size);
        self.upload = Some(UploadSession {
            destination,
            expected: begin.size as usize,
            data: Vec::with_capacity(begin.size as usize),
        });
        ControlReply::Ack
    }

    fn upload_chunk(&mut self, data: &[u8]) -> ControlReply {
        let Some(session) = self.upload.as_mut() else {
            return ControlReply::Error(ErrorCode::NoUpload);
        };
        if session.data.len() + data.len() > session.expected {
            warn!("Upload overran its declared {} bytes", session.expected);
            self.upload = None;
            return ControlReply::Error(ErrorCode::TooLarge);
        }
        session.data.extend_from_slice(data);
        ControlReply::Ack
    }

    fn commit_upload(&mut self) -> ControlReply {
        let Some(session) = self.upload.take() else {
            return ControlReply::Error(ErrorCode::NoUpload);
        };
        if session.data.len() != session.expected {
            warn!(
                "Upload incomplete: {} of {} bytes",
                session.data.len(),
                session.expected
            );
            return ControlReply::Error(ErrorCode::Malformed);
        }

        let result = match &session.destination {
            Destination::Current => self
                .player
                .save_default_animation(&mut self.storage, &session.data),
            Destination::Category { name, filename } => {
                self.player
                    .save_uploaded_file(&mut self.storage, name, filename, &session.data)
            }
        };
        match result {
            Ok(()) => ControlReply::Ack,
            Err(e) => ControlReply::Error(error_code(e)),
        }
    }
}
