//! Backing pixel surfaces
//!
//! A [`PixelSurface`] owns the memory every viewport draws into. Software
//! surfaces keep a linear `Vec<u8>` that is always addressable. Hardware
//! surfaces wrap a [`NativeSurface`] whose memory is only reachable between
//! `lock()` and `unlock()`, and may move between locks.

use crate::config::RenderConfig;
use crate::error::{GfxError, Result};
use crate::geometry::Rect;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared owner of a surface. Viewports only ever hold the weak side.
pub type SurfaceHandle = Rc<RefCell<PixelSurface>>;

// ============================================================================
// Native (hardware) backend
// ============================================================================

/// Where a hardware blit reads from
pub enum BltSource<'a> {
    /// Source rectangle lives on the destination surface itself
    SameSurface,
    /// Source rectangle lives on another native surface
    Surface(&'a dyn NativeSurface),
}

/// Hardware blitter / video memory surface supplied by the platform layer
pub trait NativeSurface {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    /// Bytes per row beyond `width`
    fn pitch(&self) -> i32;

    fn lock(&mut self) -> bool;
    fn unlock(&mut self) -> bool;

    /// Index of pixel (0, 0) inside `pixels()`. Only valid while locked and
    /// free to change from one lock to the next.
    fn base_offset(&self) -> usize;
    fn pixels(&self) -> &[u8];
    fn pixels_mut(&mut self) -> &mut [u8];

    /// Copy `src_rect` of `source` to `dest_rect` of this surface, skipping
    /// index 0 when `color_key` is set.
    fn blt(&mut self, dest_rect: Rect, source: BltSource<'_>, src_rect: Rect, color_key: bool)
        -> bool;
    fn fill_rect(&mut self, rect: Rect, color: u8) -> bool;
    fn is_ready_to_blit(&self) -> bool;

    /// Lets a backend recognise its own surfaces in `BltSource::Surface`
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// PixelSurface
// ============================================================================

/// Capability tag selecting the code path for every operation
pub enum Backing {
    SoftwareLinear(Vec<u8>),
    HardwareAccelerated(Box<dyn NativeSurface>),
}

pub struct PixelSurface {
    width: i32,
    height: i32,
    pitch: i32,
    offset: Option<usize>,
    lock_count: u32,
    backing: Backing,
    config: RenderConfig,
}

impl PixelSurface {
    /// Create a zeroed system-memory surface
    pub fn software(width: i32, height: i32, pitch: i32) -> Result<SurfaceHandle> {
        let len = check_dimensions(width, height, pitch)?;
        log::debug!("software surface {}x{} pitch {}", width, height, pitch);
        Ok(Rc::new(RefCell::new(Self {
            width,
            height,
            pitch,
            offset: Some(0),
            lock_count: 0,
            backing: Backing::SoftwareLinear(vec![0; len]),
            config: RenderConfig::default(),
        })))
    }

    /// Wrap a native surface. Geometry is taken from the backend.
    pub fn hardware(native: Box<dyn NativeSurface>) -> Result<SurfaceHandle> {
        let (width, height, pitch) = (native.width(), native.height(), native.pitch());
        check_dimensions(width, height, pitch)?;
        log::debug!("hardware surface {}x{} pitch {}", width, height, pitch);
        Ok(Rc::new(RefCell::new(Self {
            width,
            height,
            pitch,
            offset: None,
            lock_count: 0,
            backing: Backing::HardwareAccelerated(native),
            config: RenderConfig::default(),
        })))
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    /// Start of pixel data, `None` while a hardware surface is unlocked
    #[inline]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    #[inline]
    pub fn is_hardware(&self) -> bool {
        matches!(self.backing, Backing::HardwareAccelerated(_))
    }

    #[inline]
    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    /// Take a lock. Only the outermost lock reaches the native backend.
    pub fn lock(&mut self) -> bool {
        if let Backing::HardwareAccelerated(native) = &mut self.backing {
            if self.lock_count == 0 {
                if !native.lock() {
                    log::debug!("native surface refused lock");
                    return false;
                }
                self.offset = Some(native.base_offset());
            }
        }
        self.lock_count += 1;
        true
    }

    /// Release a lock. The outermost unlock of a hardware surface gives the
    /// memory back and invalidates the base offset.
    pub fn unlock(&mut self) -> bool {
        if self.lock_count == 0 {
            log::warn!("unbalanced surface unlock");
            return false;
        }
        self.lock_count -= 1;
        if self.lock_count == 0 {
            if let Backing::HardwareAccelerated(native) = &mut self.backing {
                if !native.unlock() {
                    log::warn!("native surface unlock failed");
                }
                self.offset = None;
            }
        }
        true
    }

    /// Raw bytes, if currently addressable
    pub fn data(&self) -> Option<&[u8]> {
        match &self.backing {
            Backing::SoftwareLinear(pixels) => Some(pixels),
            Backing::HardwareAccelerated(native) if self.lock_count > 0 => Some(native.pixels()),
            Backing::HardwareAccelerated(_) => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.backing {
            Backing::SoftwareLinear(pixels) => Some(pixels),
            Backing::HardwareAccelerated(native) if self.lock_count > 0 => {
                Some(native.pixels_mut())
            },
            Backing::HardwareAccelerated(_) => None,
        }
    }

    pub fn native(&self) -> Option<&dyn NativeSurface> {
        match &self.backing {
            Backing::HardwareAccelerated(native) => Some(native.as_ref()),
            Backing::SoftwareLinear(_) => None,
        }
    }

    pub fn native_mut(&mut self) -> Option<&mut (dyn NativeSurface + 'static)> {
        match &mut self.backing {
            Backing::HardwareAccelerated(native) => Some(native.as_mut()),
            Backing::SoftwareLinear(_) => None,
        }
    }

}

/// Validate a surface geometry and return its length in bytes. The row
/// stride `width + pitch` must fit in an `i32`.
fn check_dimensions(width: i32, height: i32, pitch: i32) -> Result<usize> {
    let invalid = GfxError::InvalidDimensions {
        width,
        height,
        pitch,
    };
    if width <= 0 || height <= 0 || pitch < 0 {
        return Err(invalid);
    }
    width
        .checked_add(pitch)
        .and_then(|stride| (stride as usize).checked_mul(height as usize))
        .ok_or(invalid)
}
