//! X11 screen capture using xcb GetImage on the root window.
//!
//! The root window spans the whole virtual desktop with its origin at (0, 0).
//! Only the part of the requested rectangle that overlaps the root window is
//! fetched; the rest of the buffer stays zero, which is what GDI returns for
//! pixels outside the Windows virtual screen.

use capture_platform::{CaptureError, CapturedScreenArea, ScreenAreaCapture, ScreenRegion};
use tracing::debug;

/// Overlap between a requested region and the root window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootClip {
    /// Top-left of the overlap in root coordinates
    pub src_x: u16,
    pub src_y: u16,
    /// Top-left of the overlap inside the output buffer
    pub dst_col: u32,
    pub dst_row: u32,
    pub width: u16,
    pub height: u16,
}

/// Intersect `region` with a root window of `root_width` x `root_height`.
/// Returns None when they do not overlap.
pub fn clip_to_root(region: &ScreenRegion, root_width: u16, root_height: u16) -> Option<RootClip> {
    let left = (region.x as i64).max(0);
    let top = (region.y as i64).max(0);
    let right = region.right().min(root_width as i64);
    let bottom = region.bottom().min(root_height as i64);

    if left >= right || top >= bottom {
        return None;
    }

    Some(RootClip {
        src_x: left as u16,
        src_y: top as u16,
        dst_col: (left - region.x as i64) as u32,
        dst_row: (top - region.y as i64) as u32,
        width: (right - left) as u16,
        height: (bottom - top) as u16,
    })
}

/// How the server lays out Z-pixmap data for the root depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixmapLayout {
    pub bits_per_pixel: u8,
    pub scanline_pad: u8,
    /// Server image byte order is MSB first
    pub msb_first: bool,
}

impl PixmapLayout {
    /// Layout for a root window of `depth`. Only 8-bit channels (depth 24 or
    /// 32) map onto BGRX.
    pub fn for_depth(
        depth: u8,
        bits_per_pixel: u8,
        scanline_pad: u8,
        msb_first: bool,
    ) -> Result<Self, CaptureError> {
        if depth != 24 && depth != 32 {
            return Err(CaptureError::failed(
                "pixmap format",
                format!("unsupported root depth {}", depth),
            ));
        }
        Ok(Self {
            bits_per_pixel,
            scanline_pad,
            msb_first,
        })
    }

    /// Bytes per source scanline for `width` pixels
    pub fn source_stride(&self, width: u16) -> usize {
        let bits = width as usize * self.bits_per_pixel as usize;
        let pad = (self.scanline_pad as usize).max(8);
        ((bits + pad - 1) / pad) * pad / 8
    }
}

/// Copy a GetImage reply covering `clip` into `out`, a top-down 32-bit BGRX
/// buffer with `out_width` pixels per row.
pub fn pack_bgrx(
    data: &[u8],
    layout: PixmapLayout,
    clip: &RootClip,
    out: &mut [u8],
    out_width: u32,
) -> Result<(), CaptureError> {
    if layout.bits_per_pixel != 32 && layout.bits_per_pixel != 24 {
        return Err(CaptureError::failed(
            "pixel conversion",
            format!("unsupported {} bits per pixel", layout.bits_per_pixel),
        ));
    }

    let src_stride = layout.source_stride(clip.width);
    let needed = src_stride * clip.height as usize;
    if data.len() < needed {
        return Err(CaptureError::failed(
            "pixel conversion",
            format!("image reply has {} bytes, need {}", data.len(), needed),
        ));
    }

    let src_bpp = layout.bits_per_pixel as usize / 8;
    let out_stride = out_width as usize * 4;

    for row in 0..clip.height as usize {
        let src_row = &data[row * src_stride..row * src_stride + clip.width as usize * src_bpp];
        let dst_start = (clip.dst_row as usize + row) * out_stride + clip.dst_col as usize * 4;
        let dst_row = &mut out[dst_start..dst_start + clip.width as usize * 4];

        for (src, dst) in src_row.chunks_exact(src_bpp).zip(dst_row.chunks_exact_mut(4)) {
            match (src_bpp, layout.msb_first) {
                (4, false) => dst.copy_from_slice(src),
                (4, true) => {
                    dst[0] = src[3];
                    dst[1] = src[2];
                    dst[2] = src[1];
                    dst[3] = src[0];
                }
                (3, false) => {
                    dst[..3].copy_from_slice(src);
                    dst[3] = 0;
                }
                _ => {
                    dst[0] = src[2];
                    dst[1] = src[1];
                    dst[2] = src[0];
                    dst[3] = 0;
                }
            }
        }
    }

    Ok(())
}

/// X11 screen capture on $DISPLAY. Opens its own connection per call.
#[derive(Debug, Default)]
pub struct X11ScreenCapture;

impl X11ScreenCapture {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenAreaCapture for X11ScreenCapture {
    fn capture(&self, region: &ScreenRegion) -> Result<CapturedScreenArea, CaptureError> {
        let (conn, screen_num) = xcb::Connection::connect(None)
            .map_err(|e| CaptureError::failed("connect to X11 display", e))?;

        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num as usize)
            .ok_or_else(|| CaptureError::failed("root window", "no X11 screen found"))?;

        let depth = screen.root_depth();
        let format = setup
            .pixmap_formats()
            .iter()
            .find(|f| f.depth() == depth)
            .ok_or_else(|| {
                CaptureError::failed("pixmap format", format!("no format for depth {}", depth))
            })?;
        let layout = PixmapLayout::for_depth(
            depth,
            format.bits_per_pixel(),
            format.scanline_pad(),
            matches!(setup.image_byte_order(), xcb::x::ImageOrder::MsbFirst),
        )?;

        let mut buffer = vec![0u8; region.byte_len()];

        match clip_to_root(region, screen.width_in_pixels(), screen.height_in_pixels()) {
            Some(clip) => {
                let cookie = conn.send_request(&xcb::x::GetImage {
                    format: xcb::x::ImageFormat::ZPixmap,
                    drawable: xcb::x::Drawable::Window(screen.root()),
                    x: clip.src_x as i16,
                    y: clip.src_y as i16,
                    width: clip.width,
                    height: clip.height,
                    plane_mask: u32::MAX,
                });
                let reply = conn
                    .wait_for_reply(cookie)
                    .map_err(|e| CaptureError::failed("GetImage", e))?;

                pack_bgrx(reply.data(), layout, &clip, &mut buffer, region.width)?;
            }
            None => {
                debug!(
                    "region {}x{} at ({}, {}) lies outside the root window",
                    region.width, region.height, region.x, region.y
                );
            }
        }

        debug!(
            "captured {}x{} at ({}, {}) via X11 (depth {}, {} bpp)",
            region.width, region.height, region.x, region.y, depth, layout.bits_per_pixel
        );

        CapturedScreenArea::from_buffer(region, buffer)
    }

    fn backend_name(&self) -> &'static str {
        "x11"
    }
}
