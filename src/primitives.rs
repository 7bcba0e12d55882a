//! Pixel, rectangle and buffer primitives on a viewport
//!
//! Every call takes its own lock and draws nothing when the lock fails.
//! Coordinates are viewport-relative and clipped to the viewport.

use crate::geometry::Rect;
use crate::palette::RemapTable;
use crate::viewport::{LockedView, Viewport};

impl Viewport {
    // ========================================================================
    // Single pixels
    // ========================================================================

    /// Write one pixel. False when clipped or the lock failed.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: u8) -> bool {
        self.with_lock(|view| view.put(x, y, color)).unwrap_or(false)
    }

    /// Read one pixel. 0 when clipped or the lock failed.
    pub fn get_pixel(&mut self, x: i32, y: i32) -> u8 {
        self.with_lock(|view| view.get(x, y)).flatten().unwrap_or(0)
    }

    /// Draw a `size` x `size` block with its top-left corner at (x, y)
    pub fn fat_put_pixel(&mut self, x: i32, y: i32, color: u8, size: u32) {
        if size == 0 || x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return;
        }
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        let (x2, y2) = (x.saturating_add(size - 1), y.saturating_add(size - 1));
        self.with_lock(|view| fill_block(view, x, y, x2, y2, color));
    }

    // ========================================================================
    // Rectangles
    // ========================================================================

    /// Fill the whole viewport
    pub fn clear(&mut self, color: u8) {
        self.with_lock(|view| {
            let (w, h) = (view.width(), view.height());
            fill_block(view, 0, 0, w - 1, h - 1, color);
        });
    }

    /// Fill from corner (sx, sy) to corner (dx, dy), both inclusive.
    ///
    /// Large fills on a hardware surface go straight to the native blitter
    /// (without a software lock) when the config allows it.
    pub fn fill_rect(&mut self, sx: i32, sy: i32, dx: i32, dy: i32, color: u8) {
        if self.try_hardware_fill(sx, sy, dx, dy, color) {
            return;
        }
        self.with_lock(|view| fill_block(view, sx, sy, dx, dy, color));
    }

    fn try_hardware_fill(&self, sx: i32, sy: i32, dx: i32, dy: i32, color: u8) -> bool {
        if !self.is_hardware() {
            return false;
        }
        let Some(surface) = self.surface() else {
            return false;
        };
        let mut s = surface.borrow_mut();
        let config = *s.config();
        let area = (dx as i64 - sx as i64) * (dy as i64 - sy as i64);
        if !config.allow_hardware_fills || area < config.hardware_fill_min_area as i64 {
            return false;
        }
        let Some(native) = s.native_mut() else {
            return false;
        };
        if !native.is_ready_to_blit() {
            return false;
        }

        let dest = Rect::new(
            sx.saturating_add(self.x_pos()),
            sy.saturating_add(self.y_pos()),
            dx.saturating_sub(sx),
            dy.saturating_sub(sy),
        );
        let own = Rect::new(self.x_pos(), self.y_pos(), self.width(), self.height());
        let rect = dest.intersect(&own);
        log::trace!("hardware fill {:?} color {}", rect, color);
        if !rect.is_empty() && !native.fill_rect(rect, color) {
            log::warn!("native fill failed");
        }
        true
    }

    // ========================================================================
    // Remapping
    // ========================================================================

    /// Pass every pixel of a `w` x `h` region through `table`
    pub fn remap_region(&mut self, x: i32, y: i32, w: i32, h: i32, table: &RemapTable) {
        self.with_lock(|view| {
            let Some(clip) = clip_to_view(view, x, y, w, h) else {
                return;
            };
            for row in clip.y..clip.bottom() {
                if let Some(span) = view.span_mut(clip.x, row, clip.width) {
                    for p in span {
                        *p = table[*p as usize];
                    }
                }
            }
        });
    }

    /// Remap the whole viewport
    pub fn remap(&mut self, table: &RemapTable) {
        let (w, h) = (self.width(), self.height());
        self.remap_region(0, 0, w, h, table);
    }

    // ========================================================================
    // Flat buffers
    // ========================================================================

    /// Copy a `w` x `h` region into `buffer`, rows packed at the clipped
    /// width. Only whole rows that fit are copied. Returns bytes copied.
    pub fn to_buffer(&mut self, x: i32, y: i32, w: i32, h: i32, buffer: &mut [u8]) -> usize {
        self.with_lock(|view| {
            let Some(clip) = clip_to_view(view, x, y, w, h) else {
                return 0;
            };
            let row_len = clip.width as usize;
            let mut copied = 0;
            for row in clip.y..clip.bottom() {
                let Some(dst) = buffer.get_mut(copied..copied + row_len) else {
                    break;
                };
                match view.span(clip.x, row, clip.width) {
                    Some(src) if src.len() == row_len => dst.copy_from_slice(src),
                    _ => break,
                }
                copied += row_len;
            }
            copied
        })
        .unwrap_or(0)
    }

    /// Copy the whole viewport into `buffer`
    pub fn to_buffer_all(&mut self, buffer: &mut [u8]) -> usize {
        let (w, h) = (self.width(), self.height());
        self.to_buffer(0, 0, w, h, buffer)
    }

    /// Copy a `w` x `h` image (rows of `w` bytes) from `buffer` to (x, y).
    /// Clipped to the viewport and to the buffer. Returns bytes copied.
    pub fn blit_from_buffer(&mut self, buffer: &[u8], x: i32, y: i32, w: i32, h: i32) -> usize {
        self.with_lock(|view| {
            let Some(clip) = clip_to_view(view, x, y, w, h) else {
                return 0;
            };
            let pitch = w as usize;
            let skip = (clip.x - x) as usize;
            let row_len = clip.width as usize;
            let mut copied = 0;
            for row in clip.y..clip.bottom() {
                let start = (row - y) as usize * pitch + skip;
                let Some(src) = buffer.get(start..start + row_len) else {
                    break;
                };
                match view.span_mut(clip.x, row, clip.width) {
                    Some(dst) if dst.len() == row_len => dst.copy_from_slice(src),
                    _ => break,
                }
                copied += row_len;
            }
            copied
        })
        .unwrap_or(0)
    }
}

/// Inclusive fill between two corners in any order, clipped to the view
pub(crate) fn fill_block(view: &mut LockedView<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
    let (top, bottom) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
    let top = top.max(0);
    let bottom = bottom.min(view.height() - 1);
    for y in top..=bottom {
        view.hline(x1, x2, y, color);
    }
}

fn clip_to_view(view: &LockedView<'_>, x: i32, y: i32, w: i32, h: i32) -> Option<Rect> {
    if w <= 0 || h <= 0 {
        return None;
    }
    let rect = Rect::new(x, y, w, h).intersect(&Rect::new(0, 0, view.width(), view.height()));
    (!rect.is_empty()).then_some(rect)
}
