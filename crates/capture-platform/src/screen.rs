use serde::Serialize;

use crate::error::CaptureError;

/// Bits per pixel of every captured buffer
pub const BITS_PER_PIXEL: u32 = 32;

/// Bytes per pixel of every captured buffer
pub const BYTES_PER_PIXEL: u32 = 4;

/// A validated capture rectangle in virtual-screen coordinates.
///
/// `x`/`y` may be negative when a monitor sits left of or above the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    /// Validate host-supplied integers. Width and height must be positive and
    /// the resulting buffer must be addressable.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, CaptureError> {
        if width <= 0 {
            return Err(CaptureError::invalid(format!(
                "width must be positive, got {}",
                width
            )));
        }
        if height <= 0 {
            return Err(CaptureError::invalid(format!(
                "height must be positive, got {}",
                height
            )));
        }

        let region = Self {
            x,
            y,
            width: width as u32,
            height: height as u32,
        };

        if region.checked_byte_len().is_none() {
            return Err(CaptureError::invalid(format!(
                "{}x{} capture does not fit in memory",
                width, height
            )));
        }

        Ok(region)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Size of the buffer a capture of this region produces
    pub fn byte_len(&self) -> usize {
        // new() already rejected regions where this overflows
        self.checked_byte_len().unwrap_or(usize::MAX)
    }

    fn checked_byte_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(BYTES_PER_PIXEL as usize)
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

/// A captured screen rectangle: top-down rows of 32-bit B, G, R, X pixels.
///
/// The fourth byte of each pixel carries no meaning. The buffer length always
/// equals `width * height * bytes_per_pixel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedScreenArea {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    bytes_per_pixel: u32,
}

impl CapturedScreenArea {
    /// Wrap a pixel buffer read for `region`. Fails when the backend produced
    /// the wrong number of bytes.
    pub fn from_buffer(region: &ScreenRegion, buffer: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = region.byte_len();
        if buffer.len() != expected {
            return Err(CaptureError::failed(
                "pixel extraction",
                format!(
                    "expected {} bytes for {}x{}, got {}",
                    expected,
                    region.width,
                    region.height,
                    buffer.len()
                ),
            ));
        }

        Ok(Self {
            buffer,
            width: region.width,
            height: region.height,
            bits_per_pixel: BITS_PER_PIXEL,
            bytes_per_pixel: BYTES_PER_PIXEL,
        })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }

    /// The 4 bytes of the pixel at column `col`, row `row` (row 0 is the top)
    pub fn pixel(&self, col: u32, row: u32) -> Option<[u8; 4]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let offset = row as usize * self.stride() + col as usize * 4;
        let px = &self.buffer[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// One still capture of a screen rectangle.
///
/// Implementations acquire and release their own OS resources inside every
/// call, so a single instance may be shared across threads.
pub trait ScreenAreaCapture: Send + Sync {
    /// Capture the current contents of `region`
    fn capture(&self, region: &ScreenRegion) -> Result<CapturedScreenArea, CaptureError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
