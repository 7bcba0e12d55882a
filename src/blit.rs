//! Viewport to viewport blits
//!
//! Software path: a linear copy between two locked viewports that picks its
//! scan direction so a source and destination on the same surface can
//! overlap without smearing. Colour key 0 marks "no pixel".
//!
//! Hardware path: when both ends are hardware surfaces the native blitter
//! gets the translated rectangles and no software lock is taken.

use crate::geometry::Rect;
use crate::planes::{Planes, Shared, Split};
use crate::surface::BltSource;
use crate::viewport::{ViewGeometry, Viewport};
use std::rc::Rc;

/// Palette index skipped by keyed blits and transparent scales
pub const COLOR_KEY: u8 = 0;

// ============================================================================
// Blit plan
// ============================================================================

/// Clipped, resolved parameters of one software blit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlitPlan {
    src_start: usize,
    dst_start: usize,
    src_stride: usize,
    dst_stride: usize,
    width: usize,
    height: usize,
    /// Walk rows bottom-up (and keyed pixels right-to-left)
    reverse: bool,
}

impl BlitPlan {
    /// Clip a blit request. `None` means there is nothing to draw.
    pub(crate) fn new(
        src: &ViewGeometry,
        dst: &ViewGeometry,
        mut src_x: i32,
        mut src_y: i32,
        mut dst_x: i32,
        mut dst_y: i32,
        mut w: i32,
        mut h: i32,
    ) -> Option<Self> {
        if src_x >= src.width
            || src_y >= src.height
            || dst_x >= dst.width
            || dst_y >= dst.height
            || h < 0
            || w < 1
        {
            return None;
        }

        // Negative positions are pulled back to the edge, not rejected
        src_x = src_x.max(0);
        src_y = src_y.max(0);
        dst_x = dst_x.max(0);
        dst_y = dst_y.max(0);

        // Overflowing the destination trims one pixel more than needed.
        // Existing content is laid out against this, keep it.
        if dst_y.saturating_add(h) > dst.height {
            h = dst.height - 1 - dst_y;
        }
        if dst_x.saturating_add(w) > dst.width {
            w = dst.width - 1 - dst_x;
        }
        if h <= 0 || w <= 0 {
            return None;
        }

        let src_start = src.offset + src_x as usize + src_y as usize * src.stride;
        let dst_start = dst.offset + dst_x as usize + dst_y as usize * dst.stride;

        Some(Self {
            src_start,
            dst_start,
            src_stride: src.stride,
            dst_stride: dst.stride,
            width: w as usize,
            height: h as usize,
            reverse: src_start < dst_start,
        })
    }

    pub(crate) fn run(&self, planes: &mut impl Planes, use_key: bool) {
        let w = self.width;
        for n in 0..self.height {
            let row = if self.reverse { self.height - 1 - n } else { n };
            let src = self.src_start + row * self.src_stride;
            let dst = self.dst_start + row * self.dst_stride;

            if !use_key {
                planes.copy_row(src, dst, w);
                continue;
            }

            // Every pixel has to be tested against the key
            if self.reverse {
                for i in (0..w).rev() {
                    copy_keyed(planes, src + i, dst + i);
                }
            } else {
                for i in 0..w {
                    copy_keyed(planes, src + i, dst + i);
                }
            }
        }
    }
}

#[inline]
fn copy_keyed(planes: &mut impl Planes, src: usize, dst: usize) {
    if let Some(value) = planes.read(src) {
        if value != COLOR_KEY {
            planes.write(dst, value);
        }
    }
}

// ============================================================================
// Viewport blits
// ============================================================================

impl Viewport {
    /// Copy a `w` x `h` block from (x, y) here to (dx, dy) in `dest`
    pub fn blit(
        &mut self,
        dest: &mut Viewport,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        w: i32,
        h: i32,
        trans: bool,
    ) {
        let src_rect = Rect::new(self.x_pos() + x, self.y_pos() + y, w, h);
        let dst_rect = Rect::new(dest.x_pos() + dx, dest.y_pos() + dy, w, h);
        if self.wants_hardware_blit(dest, &src_rect, &dst_rect) {
            self.hardware_blit(dest, src_rect, dst_rect, trans);
        } else {
            self.software_blit(dest, x, y, dx, dy, w, h, trans);
        }
    }

    /// Copy this whole viewport to (dx, dy) in `dest`
    pub fn blit_at(&mut self, dest: &mut Viewport, dx: i32, dy: i32, trans: bool) {
        let src_rect = Rect::new(self.x_pos(), self.y_pos(), self.width(), self.height());
        let dst_rect = Rect::new(
            dest.x_pos() + dx,
            dest.y_pos() + dy,
            self.width(),
            self.height(),
        );
        if self.wants_hardware_blit(dest, &src_rect, &dst_rect) {
            self.hardware_blit(dest, src_rect, dst_rect, trans);
        } else {
            let (w, h) = (self.width(), self.height());
            self.software_blit(dest, 0, 0, dx, dy, w, h, trans);
        }
    }

    /// Copy this whole viewport onto the whole of `dest`.
    ///
    /// The hardware blitter is given the larger of the two sizes while the
    /// software copy uses this viewport's own size.
    pub fn blit_full(&mut self, dest: &mut Viewport, trans: bool) {
        let w = self.width().max(dest.width());
        let h = self.height().max(dest.height());
        let src_rect = Rect::new(self.x_pos(), self.y_pos(), w, h);
        let dst_rect = Rect::new(dest.x_pos(), dest.y_pos(), w, h);
        if self.wants_hardware_blit(dest, &src_rect, &dst_rect) {
            self.hardware_blit(dest, src_rect, dst_rect, trans);
        } else {
            let (w, h) = (self.width(), self.height());
            self.software_blit(dest, 0, 0, 0, 0, w, h, trans);
        }
    }

    fn wants_hardware_blit(&self, dest: &Viewport, src_rect: &Rect, dst_rect: &Rect) -> bool {
        if !(self.is_hardware() && dest.is_hardware()) {
            return false;
        }
        let (Some(src), Some(dst)) = (self.surface(), dest.surface()) else {
            return false;
        };
        if Rc::ptr_eq(&src, &dst)
            && !dst.borrow().config().overlapped_video_blits
            && src_rect.overlaps(dst_rect)
        {
            log::trace!("overlapping video blit routed to software");
            return false;
        }
        true
    }

    /// One native blit of absolute rectangles; no software lock involved
    fn hardware_blit(&self, dest: &Viewport, src_rect: Rect, dst_rect: Rect, trans: bool) -> bool {
        let (Some(src), Some(dst)) = (self.surface(), dest.surface()) else {
            return false;
        };
        log::trace!("hardware blit {:?} -> {:?} key={}", src_rect, dst_rect, trans);

        let ok = if Rc::ptr_eq(&src, &dst) {
            let mut surface = dst.borrow_mut();
            surface
                .native_mut()
                .is_some_and(|native| native.blt(dst_rect, BltSource::SameSurface, src_rect, trans))
        } else {
            let source = src.borrow();
            let mut target = dst.borrow_mut();
            match (source.native(), target.native_mut()) {
                (Some(from), Some(to)) => to.blt(dst_rect, BltSource::Surface(from), src_rect, trans),
                _ => false,
            }
        };
        if !ok {
            log::warn!("native blit failed");
        }
        ok
    }

    fn software_blit(
        &mut self,
        dest: &mut Viewport,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        w: i32,
        h: i32,
        trans: bool,
    ) {
        if self.lock() {
            if dest.lock() {
                self.linear_blit_to_linear(dest, x, y, dx, dy, w, h, trans);
                dest.unlock();
            }
            self.unlock();
        }
    }

    /// Software blit between two already locked viewports
    pub(crate) fn linear_blit_to_linear(
        &self,
        dest: &Viewport,
        src_x: i32,
        src_y: i32,
        dst_x: i32,
        dst_y: i32,
        w: i32,
        h: i32,
        use_key: bool,
    ) {
        let (Some(src_geo), Some(dst_geo)) = (self.geometry(), dest.geometry()) else {
            return;
        };
        let Some(plan) = BlitPlan::new(&src_geo, &dst_geo, src_x, src_y, dst_x, dst_y, w, h) else {
            return;
        };
        let (Some(src), Some(dst)) = (self.surface(), dest.surface()) else {
            return;
        };

        if Rc::ptr_eq(&src, &dst) {
            let mut surface = dst.borrow_mut();
            if let Some(data) = surface.data_mut() {
                plan.run(&mut Shared(data), use_key);
            }
        } else {
            let source = src.borrow();
            let mut target = dst.borrow_mut();
            if let (Some(from), Some(to)) = (source.data(), target.data_mut()) {
                plan.run(&mut Split { src: from, dst: to }, use_key);
            }
        }
    }
}
