//! Windows screen capture using GDI.
//! Blits the requested rectangle of the virtual screen into a memory bitmap
//! and reads it back as top-down 32-bit BGRX rows.

use capture_platform::{CaptureError, CapturedScreenArea, ScreenAreaCapture, ScreenRegion};
use tracing::{debug, info};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};

/// Device context of the whole virtual screen, released on drop
struct ScreenDc(HDC);

impl ScreenDc {
    fn acquire() -> Result<Self, CaptureError> {
        let hdc = unsafe { GetDC(HWND::default()) };
        if hdc.is_invalid() {
            return Err(CaptureError::failed("GetDC", "no screen device context"));
        }
        Ok(Self(hdc))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe {
            let _ = ReleaseDC(HWND::default(), self.0);
        }
    }
}

/// Off-screen DC compatible with the screen, deleted on drop
struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible_with(screen: &ScreenDc) -> Result<Self, CaptureError> {
        let hdc = unsafe { CreateCompatibleDC(screen.0) };
        if hdc.is_invalid() {
            return Err(CaptureError::failed("CreateCompatibleDC", "returned null"));
        }
        Ok(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteDC(self.0);
        }
    }
}

/// Screen-compatible bitmap, deleted on drop
struct Bitmap(HBITMAP);

impl Bitmap {
    fn compatible_with(screen: &ScreenDc, width: i32, height: i32) -> Result<Self, CaptureError> {
        let bitmap = unsafe { CreateCompatibleBitmap(screen.0, width, height) };
        if bitmap.is_invalid() {
            return Err(CaptureError::failed(
                "CreateCompatibleBitmap",
                format!("could not allocate {}x{} bitmap", width, height),
            ));
        }
        Ok(Self(bitmap))
    }

    fn as_gdi_object(&self) -> HGDIOBJ {
        HGDIOBJ(self.0 .0)
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteObject(self.as_gdi_object());
        }
    }
}

/// Keeps a bitmap selected into a memory DC. Restores the previous object on
/// drop, so the bitmap is no longer selected when it gets deleted.
struct Selection<'a> {
    dc: &'a MemoryDc,
    previous: HGDIOBJ,
}

impl<'a> Selection<'a> {
    fn select(dc: &'a MemoryDc, bitmap: &Bitmap) -> Result<Self, CaptureError> {
        let previous = unsafe { SelectObject(dc.0, bitmap.as_gdi_object()) };
        // SelectObject reports failure as NULL or HGDI_ERROR
        if previous.is_invalid() || previous.0 as isize == -1 {
            return Err(CaptureError::failed("SelectObject", "could not select bitmap"));
        }
        Ok(Self { dc, previous })
    }
}

impl Drop for Selection<'_> {
    fn drop(&mut self) {
        unsafe {
            let _ = SelectObject(self.dc.0, self.previous);
        }
    }
}

/// Format descriptor for GetDIBits: 32 bpp, uncompressed, negative height for
/// top-down rows.
fn top_down_bitmap_info(region: &ScreenRegion) -> Result<BITMAPINFO, CaptureError> {
    let size_image = u32::try_from(region.byte_len()).map_err(|_| {
        CaptureError::failed(
            "bitmap format",
            format!(
                "{}x{} image exceeds the 4 GiB DIB size limit",
                region.width, region.height
            ),
        )
    })?;

    Ok(BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: region.width as i32,
            biHeight: -(region.height as i32),
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            biSizeImage: size_image,
            biXPelsPerMeter: 0,
            biYPelsPerMeter: 0,
            biClrUsed: 0,
            biClrImportant: 0,
        },
        ..Default::default()
    })
}

/// GDI screen capture. Stateless; every call owns its handles.
#[derive(Debug, Default)]
pub struct GdiScreenCapture;

impl GdiScreenCapture {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenAreaCapture for GdiScreenCapture {
    fn capture(&self, region: &ScreenRegion) -> Result<CapturedScreenArea, CaptureError> {
        let width = region.width as i32;
        let height = region.height as i32;
        let mut info = top_down_bitmap_info(region)?;

        // Declaration order matters: drops run selection, bitmap, memory DC,
        // then the screen DC.
        let screen = ScreenDc::acquire()?;
        let memory = MemoryDc::compatible_with(&screen)?;
        let bitmap = Bitmap::compatible_with(&screen, width, height)?;
        let selection = Selection::select(&memory, &bitmap)?;

        unsafe {
            BitBlt(
                memory.0,
                0,
                0,
                width,
                height,
                screen.0,
                region.x,
                region.y,
                SRCCOPY,
            )
        }
        .map_err(|e| CaptureError::failed("BitBlt", e))?;

        // GetDIBits requires the bitmap not be selected into a DC
        drop(selection);

        let mut buffer = vec![0u8; region.byte_len()];

        let lines = unsafe {
            GetDIBits(
                memory.0,
                bitmap.0,
                0,
                region.height,
                Some(buffer.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if lines != height {
            return Err(CaptureError::failed(
                "GetDIBits",
                format!("copied {} of {} scan lines", lines, height),
            ));
        }

        debug!(
            "captured {}x{} at ({}, {}) via GDI",
            region.width, region.height, region.x, region.y
        );

        CapturedScreenArea::from_buffer(region, buffer)
    }

    fn backend_name(&self) -> &'static str {
        "gdi"
    }
}

/// Factory function for creating screen capture on Windows
pub fn create_screen_capture() -> Result<Box<dyn ScreenAreaCapture>, CaptureError> {
    info!("using GDI BitBlt for screen capture");
    Ok(Box::new(GdiScreenCapture::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_info_is_top_down_32bpp() {
        let region = ScreenRegion::new(0, 0, 640, 480).unwrap();
        let info = top_down_bitmap_info(&region).unwrap();
        assert_eq!(info.bmiHeader.biWidth, 640);
        assert_eq!(info.bmiHeader.biHeight, -480);
        assert_eq!(info.bmiHeader.biBitCount, 32);
        assert_eq!(info.bmiHeader.biPlanes, 1);
        assert_eq!(info.bmiHeader.biCompression, BI_RGB.0);
        assert_eq!(info.bmiHeader.biSizeImage, 640 * 480 * 4);
        assert_eq!(info.bmiHeader.biClrUsed, 0);
    }

    #[test]
    fn test_bitmap_info_rejects_oversized_image() {
        // 65536 * 16385 * 4 bytes does not fit biSizeImage
        let region = ScreenRegion::new(0, 0, 65536, 16385).unwrap();
        let err = top_down_bitmap_info(&region).unwrap_err();
        assert!(matches!(err, CaptureError::CaptureFailed { stage: "bitmap format", .. }));
    }

    #[test]
    fn test_single_pixel_capture() {
        let capture = GdiScreenCapture::new();
        let region = ScreenRegion::new(0, 0, 1, 1).unwrap();
        let area = capture.capture(&region).unwrap();
        assert_eq!(area.buffer().len(), 4);
        assert_eq!(area.bits_per_pixel(), 32);
        assert_eq!(area.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_repeated_captures_keep_format() {
        let capture = GdiScreenCapture::new();
        let region = ScreenRegion::new(10, 20, 33, 17).unwrap();
        for _ in 0..5 {
            let area = capture.capture(&region).unwrap();
            assert_eq!(area.width(), 33);
            assert_eq!(area.height(), 17);
            assert_eq!(area.buffer().len(), 33 * 17 * 4);
        }
    }

    fn gdi_object_count() -> u32 {
        use windows::Win32::System::Threading::{GetCurrentProcess, GetGuiResources, GR_GDIOBJECTS};
        unsafe { GetGuiResources(GetCurrentProcess(), GR_GDIOBJECTS) }
    }

    #[test]
    fn test_many_captures_do_not_leak_handles() {
        let capture = GdiScreenCapture::new();
        let region = ScreenRegion::new(0, 0, 16, 16).unwrap();

        // first call may allocate per-process GDI state
        capture.capture(&region).unwrap();
        let before = gdi_object_count();

        for i in 0..1000 {
            let area = capture
                .capture(&region)
                .unwrap_or_else(|e| panic!("capture {} failed: {}", i, e));
            assert_eq!(area.buffer().len(), 16 * 16 * 4);
        }

        let after = gdi_object_count();
        // a leak of even one object per call would add ~1000
        assert!(
            after <= before + 16,
            "GDI objects grew from {} to {} over 1000 captures",
            before,
            after
        );
    }

    #[test]
    fn test_negative_origin_returns_requested_size() {
        let capture = GdiScreenCapture::new();
        let region = ScreenRegion::new(-50, -50, 100, 100).unwrap();
        let area = capture.capture(&region).unwrap();
        assert_eq!(area.buffer().len(), 100 * 100 * 4);
    }
}
