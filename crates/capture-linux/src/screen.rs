//! Screen capture backend selection for Linux.

use capture_platform::{CaptureError, ScreenAreaCapture};

pub use crate::screen_x11::X11ScreenCapture;

/// Detect the display server and return the matching capture backend.
pub fn create_screen_capture() -> Result<Box<dyn ScreenAreaCapture>, CaptureError> {
    // DISPLAY covers both X11 and XWayland
    if std::env::var_os("DISPLAY").is_some() {
        tracing::info!("detected X11 display, using xcb screen capture");
        return Ok(Box::new(X11ScreenCapture::new()));
    }

    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        return Err(CaptureError::failed(
            "backend selection",
            "Wayland without XWayland is not supported; set DISPLAY",
        ));
    }

    Err(CaptureError::failed(
        "backend selection",
        "no display server detected, set DISPLAY for X11",
    ))
}
