use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use capture_core::ScreenCapturePlugin;

/// What the `capture` command prints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    pub backend: &'static str,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub bytes_per_pixel: u32,
    pub buffer_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Capture one region, optionally dumping the raw buffer to `output`
pub fn run_capture(
    plugin: &ScreenCapturePlugin,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    output: Option<&Path>,
) -> Result<CaptureSummary> {
    let area = plugin
        .capture_screen_area(x, y, width, height)
        .context("screen capture failed")?;

    if let Some(path) = output {
        std::fs::write(path, area.buffer())
            .with_context(|| format!("failed to write buffer to {}", path.display()))?;
        info!("wrote {} bytes to {}", area.buffer().len(), path.display());
    }

    Ok(CaptureSummary {
        backend: plugin.backend_name(),
        x,
        y,
        width: area.width(),
        height: area.height(),
        bits_per_pixel: area.bits_per_pixel(),
        bytes_per_pixel: area.bytes_per_pixel(),
        buffer_len: area.buffer().len(),
        output: output.map(|p| p.display().to_string()),
    })
}
