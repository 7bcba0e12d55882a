//! `NativeSurface` on an SDL2 `Index8` surface
//!
//! Blits and fills go through SDL's blitter. Colour keying and fills take a
//! raw palette index, so those two calls use `sdl2::sys` directly instead of
//! the `Color`-based wrappers (which would map RGB to the nearest index).

use crate::error::Result;
use crate::geometry::Rect;
use crate::surface::{BltSource, NativeSurface};
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect as SdlRect;
use sdl2::surface::{Surface, SurfaceRef};
use std::any::Any;

/// Every surface keeps SDL's default palette, so index-to-index blits
/// between them are 1:1 and never remapped.
pub struct SdlSurface {
    surface: Surface<'static>,
}

impl SdlSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let surface = Surface::new(width, height, PixelFormatEnum::Index8)?;
        Ok(Self { surface })
    }

    pub fn surface(&self) -> &SurfaceRef {
        &self.surface
    }
}

fn to_sdl(rect: Rect) -> Option<SdlRect> {
    if rect.is_empty() {
        return None;
    }
    Some(SdlRect::new(rect.x, rect.y, rect.width as u32, rect.height as u32))
}

fn set_color_key(surface: &SurfaceRef, enabled: bool) -> bool {
    // Key is palette index 0
    unsafe { sdl2::sys::SDL_SetColorKey(surface.raw(), i32::from(enabled), 0) == 0 }
}

impl NativeSurface for SdlSurface {
    fn width(&self) -> i32 {
        self.surface.width() as i32
    }

    fn height(&self) -> i32 {
        self.surface.height() as i32
    }

    fn pitch(&self) -> i32 {
        self.surface.pitch() as i32 - self.width()
    }

    fn lock(&mut self) -> bool {
        unsafe { sdl2::sys::SDL_LockSurface(self.surface.raw()) == 0 }
    }

    fn unlock(&mut self) -> bool {
        unsafe { sdl2::sys::SDL_UnlockSurface(self.surface.raw()) };
        true
    }

    fn base_offset(&self) -> usize {
        0
    }

    fn pixels(&self) -> &[u8] {
        self.surface.without_lock().unwrap_or(&[])
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        self.surface.without_lock_mut().unwrap_or(&mut [])
    }

    fn blt(&mut self, dest_rect: Rect, source: BltSource<'_>, src_rect: Rect, color_key: bool) -> bool {
        let (Some(dst), Some(src)) = (to_sdl(dest_rect), to_sdl(src_rect)) else {
            return true;
        };

        let result = match source {
            BltSource::Surface(other) => {
                let Some(other) = other.as_any().downcast_ref::<SdlSurface>() else {
                    log::warn!("blit source is not an SDL surface");
                    return false;
                };
                set_color_key(&other.surface, color_key);
                other.surface.blit(src, &mut self.surface, dst)
            },
            BltSource::SameSurface => {
                // Stage through a scratch surface; SDL does not blit a
                // surface onto itself.
                let mut scratch = match Surface::new(src.width(), src.height(), PixelFormatEnum::Index8) {
                    Ok(s) => s,
                    Err(e) => {
                        log::warn!("scratch surface: {}", e);
                        return false;
                    },
                };
                set_color_key(&self.surface, false);
                if let Err(e) = self.surface.blit(src, &mut scratch, None) {
                    log::warn!("staging blit: {}", e);
                    return false;
                }
                set_color_key(&scratch, color_key);
                scratch.blit(None, &mut self.surface, dst)
            },
        };

        match result {
            Ok(_) => true,
            Err(e) => {
                log::warn!("SDL blit failed: {}", e);
                false
            },
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: u8) -> bool {
        let Some(rect) = to_sdl(rect) else {
            return true;
        };
        unsafe { sdl2::sys::SDL_FillRect(self.surface.raw(), rect.raw(), u32::from(color)) == 0 }
    }

    fn is_ready_to_blit(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
