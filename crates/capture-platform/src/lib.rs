// Platform-neutral screen capture contract shared by every OS backend

pub mod error;
pub mod screen;

pub use error::CaptureError;
pub use screen::{CapturedScreenArea, ScreenAreaCapture, ScreenRegion};
