use capture_core::config::PluginConfig;
use capture_core::ScreenCapturePlugin;
use capture_platform::{CaptureError, CapturedScreenArea, ScreenAreaCapture, ScreenRegion};

/// Fills every pixel with its row index in the blue byte
pub struct RowMarkerScreen;

impl ScreenAreaCapture for RowMarkerScreen {
    fn capture(&self, region: &ScreenRegion) -> Result<CapturedScreenArea, CaptureError> {
        let mut buffer = Vec::with_capacity(region.byte_len());
        for row in 0..region.height {
            for _ in 0..region.width {
                buffer.extend_from_slice(&[row as u8, 0, 0, 0]);
            }
        }
        CapturedScreenArea::from_buffer(region, buffer)
    }

    fn backend_name(&self) -> &'static str {
        "row-marker"
    }
}

pub fn plugin() -> ScreenCapturePlugin {
    ScreenCapturePlugin::new(Box::new(RowMarkerScreen), &PluginConfig::default())
}
