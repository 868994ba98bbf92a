//! Method-channel handler: turns `captureScreenArea` calls into captures.

use tracing::{debug, info, warn};

use capture_platform::{CaptureError, CapturedScreenArea, ScreenAreaCapture, ScreenRegion};

use crate::config::PluginConfig;
use crate::protocol::{self, CaptureScreenAreaRequest, MethodCall, MethodResponse};

pub struct ScreenCapturePlugin {
    capturer: Box<dyn ScreenAreaCapture>,
    channel_name: String,
    max_capture_pixels: u64,
}

impl ScreenCapturePlugin {
    pub fn new(capturer: Box<dyn ScreenAreaCapture>, config: &PluginConfig) -> Self {
        Self {
            capturer,
            channel_name: config.channel_name.clone(),
            max_capture_pixels: config.max_capture_pixels,
        }
    }

    /// Build the plugin around this platform's capture backend
    pub fn from_platform(config: &PluginConfig) -> Result<Self, CaptureError> {
        let capturer = create_platform_screen()?;
        info!(
            "screen capture plugin ready on channel {} (backend={})",
            config.channel_name,
            capturer.backend_name()
        );
        Ok(Self::new(capturer, config))
    }

    pub fn backend_name(&self) -> &'static str {
        self.capturer.backend_name()
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Dispatch one call. Unknown methods, and calls addressed to another
    /// channel, get `NotImplemented`.
    pub fn handle_method_call(&self, call: &MethodCall) -> MethodResponse {
        if let Some(channel) = call.channel.as_deref() {
            if channel != self.channel_name {
                debug!("no handler for channel {}", channel);
                return MethodResponse::NotImplemented;
            }
        }

        match call.method.as_str() {
            protocol::CAPTURE_SCREEN_AREA => {
                let request = match CaptureScreenAreaRequest::from_arguments(&call.arguments) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("rejected {} call: {}", call.method, e);
                        return e.into();
                    }
                };
                let region = match request.region() {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("rejected {} call: {}", call.method, e);
                        return e.into();
                    }
                };
                match self.capture_region(&region) {
                    Ok(area) => MethodResponse::captured(&area),
                    Err(e) => e.into(),
                }
            }
            other => {
                debug!("method {} not implemented", other);
                MethodResponse::NotImplemented
            }
        }
    }

    /// Capture `width` x `height` pixels at (`x`, `y`)
    pub fn capture_screen_area(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<CapturedScreenArea, CaptureError> {
        let region = ScreenRegion::new(x, y, width, height).inspect_err(|e| {
            warn!("rejected capture request: {}", e);
        })?;
        self.capture_region(&region)
    }

    pub fn capture_region(&self, region: &ScreenRegion) -> Result<CapturedScreenArea, CaptureError> {
        if region.pixel_count() > self.max_capture_pixels {
            let err = CaptureError::invalid(format!(
                "{}x{} exceeds the {} pixel capture limit",
                region.width, region.height, self.max_capture_pixels
            ));
            warn!("rejected capture request: {}", err);
            return Err(err);
        }

        debug!(
            "capturing {}x{} at ({}, {}) via {}",
            region.width,
            region.height,
            region.x,
            region.y,
            self.capturer.backend_name()
        );

        self.capturer.capture(region).inspect_err(|e| {
            warn!("screen capture failed: {}", e);
        })
    }
}

#[cfg(target_os = "linux")]
fn create_platform_screen() -> Result<Box<dyn ScreenAreaCapture>, CaptureError> {
    capture_linux::screen::create_screen_capture()
}

#[cfg(target_os = "windows")]
fn create_platform_screen() -> Result<Box<dyn ScreenAreaCapture>, CaptureError> {
    capture_windows::screen::create_screen_capture()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn create_platform_screen() -> Result<Box<dyn ScreenAreaCapture>, CaptureError> {
    Err(CaptureError::failed(
        "backend selection",
        "screen capture not yet implemented for this platform",
    ))
}
