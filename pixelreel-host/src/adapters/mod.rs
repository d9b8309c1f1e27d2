//! Host implementations of the core traits

pub mod clock;
pub mod file_store;
pub mod framebuffer;
pub mod fs_storage;
pub mod gif_decoder;

pub use clock::EmbassyClock;
pub use file_store::FileStore;
pub use framebuffer::FrameBufferDisplay;
pub use fs_storage::FsStorage;
pub use gif_decoder::GifCrateDecoder;
