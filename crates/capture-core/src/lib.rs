pub mod config;
pub mod plugin;
pub mod protocol;

pub use plugin::ScreenCapturePlugin;
