//! Viewports: rectangular windows onto a pixel surface
//!
//! A viewport never owns pixels. It keeps a weak reference to its surface and
//! a snapshot of derived geometry (absolute start offset, row skip, pitch)
//! that is recomputed on attach, on resize and on every successful lock,
//! because a hardware lock may hand back memory at a different place.

use crate::surface::{PixelSurface, SurfaceHandle};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// ============================================================================
// Geometry snapshot
// ============================================================================

/// Resolved addressing for a locked viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewGeometry {
    /// Index of the viewport's top-left pixel in the surface memory
    pub offset: usize,
    pub width: i32,
    pub height: i32,
    /// Bytes from one viewport row to the next: pitch + x_add + width
    pub stride: usize,
}

impl ViewGeometry {
    /// Memory index of (x, y) relative to the viewport, without clipping
    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> i64 {
        self.offset as i64 + y as i64 * self.stride as i64 + x as i64
    }
}

// ============================================================================
// Viewport
// ============================================================================

#[derive(Debug, Clone)]
pub struct Viewport {
    surface: Weak<RefCell<PixelSurface>>,
    surface_view: bool,
    x_pos: i32,
    y_pos: i32,
    width: i32,
    height: i32,
    x_add: i32,
    pitch: i32,
    offset: Option<usize>,
    is_hardware: bool,
}

impl Viewport {
    /// Attach a new viewport to `surface`; the rectangle is clamped to fit
    pub fn new(surface: &SurfaceHandle, x: i32, y: i32, w: i32, h: i32) -> Self {
        let mut viewport = Self {
            surface: Weak::new(),
            surface_view: false,
            x_pos: 0,
            y_pos: 0,
            width: 0,
            height: 0,
            x_add: 0,
            pitch: 0,
            offset: None,
            is_hardware: false,
        };
        viewport.attach(surface, x, y, w, h);
        viewport
    }

    /// The surface's own full-size view. It can never be moved or resized.
    pub fn surface_view(surface: &SurfaceHandle) -> Self {
        let s = surface.borrow();
        Self {
            surface: Rc::downgrade(surface),
            surface_view: true,
            x_pos: 0,
            y_pos: 0,
            width: s.width(),
            height: s.height(),
            x_add: 0,
            pitch: s.pitch(),
            offset: s.offset(),
            is_hardware: s.is_hardware(),
        }
    }

    /// Re-point this viewport at (a rectangle of) `surface`.
    /// Silently ignored for a surface's own view.
    pub fn attach(&mut self, surface: &SurfaceHandle, x: i32, y: i32, w: i32, h: i32) {
        if self.surface_view {
            log::debug!("attach ignored on surface view");
            return;
        }
        self.attach_geometry(&surface.borrow(), x, y, w, h);
        self.surface = Rc::downgrade(surface);
    }

    /// Move/resize within the current surface. False for a surface view or
    /// when the surface is gone.
    pub fn change(&mut self, x: i32, y: i32, w: i32, h: i32) -> bool {
        if self.surface_view {
            log::debug!("change refused on surface view");
            return false;
        }
        let Some(surface) = self.surface.upgrade() else {
            return false;
        };
        self.attach_geometry(&surface.borrow(), x, y, w, h);
        true
    }

    fn attach_geometry(&mut self, surface: &PixelSurface, mut x: i32, mut y: i32, mut w: i32, mut h: i32) {
        let sw = surface.width();
        let sh = surface.height();

        // Left/top edge has to land on the surface
        if x < 0 {
            x = 0;
        }
        if x >= sw {
            x = sw - 1;
        }
        if y < 0 {
            y = 0;
        }
        if y >= sh {
            y = sh - 1;
        }

        w = w.max(0);
        h = h.max(0);
        if x.saturating_add(w) > sw {
            w = sw - x;
        }
        if y.saturating_add(h) > sh {
            h = sh - y;
        }

        let row = (sw + surface.pitch()) as usize;
        self.offset = surface
            .offset()
            .map(|base| base + row * y as usize + x as usize);
        self.x_pos = x;
        self.y_pos = y;
        self.x_add = sw - w;
        self.width = w;
        self.height = h;
        self.pitch = surface.pitch();
        self.is_hardware = surface.is_hardware();
    }

    // ========================================================================
    // Lock discipline
    // ========================================================================

    /// Lock the backing surface and refresh the start offset
    pub fn lock(&mut self) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            log::debug!("lock on a viewport whose surface is gone");
            return false;
        };
        let locked = surface.borrow_mut().lock();
        if !locked {
            return false;
        }

        let s = surface.borrow();
        if self.surface_view {
            self.offset = s.offset();
        } else {
            self.attach_geometry(&s, self.x_pos, self.y_pos, self.width, self.height);
        }
        true
    }

    /// Release the backing surface. Once a hardware surface is fully
    /// unlocked the cached offset is no longer usable.
    pub fn unlock(&mut self) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            return false;
        };
        let mut s = surface.borrow_mut();
        if !s.unlock() {
            return false;
        }
        if self.surface_view {
            self.offset = s.offset();
        } else if self.is_hardware && s.lock_count() == 0 {
            self.offset = None;
        }
        true
    }

    /// Run `f` against the locked pixels. Returns `None` (and draws nothing)
    /// when the lock could not be taken.
    pub fn with_lock<R>(&mut self, f: impl FnOnce(&mut LockedView<'_>) -> R) -> Option<R> {
        if !self.lock() {
            return None;
        }
        let result = self.with_locked_view(f);
        self.unlock();
        result
    }

    /// Same as `with_lock` but assumes the caller already holds the lock
    pub(crate) fn with_locked_view<R>(&self, f: impl FnOnce(&mut LockedView<'_>) -> R) -> Option<R> {
        let surface = self.surface.upgrade()?;
        let geometry = self.geometry()?;
        let mut s = surface.borrow_mut();
        let data = s.data_mut()?;
        Some(f(&mut LockedView::new(data, geometry)))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Resolved geometry, `None` while the offset is invalid
    pub fn geometry(&self) -> Option<ViewGeometry> {
        self.offset.map(|offset| ViewGeometry {
            offset,
            width: self.width,
            height: self.height,
            stride: (self.pitch + self.x_add + self.width) as usize,
        })
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface.upgrade()
    }

    #[inline]
    pub fn is_surface_view(&self) -> bool {
        self.surface_view
    }

    #[inline]
    pub fn x_pos(&self) -> i32 {
        self.x_pos
    }

    #[inline]
    pub fn y_pos(&self) -> i32 {
        self.y_pos
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
    pub fn x_add(&self) -> i32 {
        self.x_add
    }

    #[inline]
    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    /// Row-to-row distance in bytes (pitch + x_add + width)
    #[inline]
    pub fn full_pitch(&self) -> i32 {
        self.pitch + self.x_add + self.width
    }

    #[inline]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    #[inline]
    pub fn is_hardware(&self) -> bool {
        self.is_hardware
    }
}

// ============================================================================
// LockedView
// ============================================================================

/// Borrowed pixels of a locked viewport with viewport-relative addressing.
/// Every accessor is clipped to the viewport and to the surface memory.
pub struct LockedView<'a> {
    data: &'a mut [u8],
    geometry: ViewGeometry,
}

impl<'a> LockedView<'a> {
    pub fn new(data: &'a mut [u8], geometry: ViewGeometry) -> Self {
        Self { data, geometry }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.geometry.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.geometry.height
    }

    #[inline]
    pub fn geometry(&self) -> ViewGeometry {
        self.geometry
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.geometry.width && y >= 0 && y < self.geometry.height
    }

    /// Memory index of (x, y), or `None` outside the viewport
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let idx = usize::try_from(self.geometry.index_of(x, y)).ok()?;
        (idx < self.data.len()).then_some(idx)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.data[i])
    }

    /// Write one pixel; false when clipped
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: u8) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = color;
                true
            },
            None => false,
        }
    }

    /// Viewport row `y` from column `x` for up to `len` pixels, clipped
    pub fn span_mut(&mut self, x: i32, y: i32, len: i32) -> Option<&mut [u8]> {
        if y < 0 || y >= self.geometry.height || len <= 0 {
            return None;
        }
        let start = x.max(0);
        let end = (x.saturating_add(len)).min(self.geometry.width);
        if start >= end {
            return None;
        }
        let first = usize::try_from(self.geometry.index_of(start, y)).ok()?;
        let last = (first + (end - start) as usize).min(self.data.len());
        if first < last {
            Some(&mut self.data[first..last])
        } else {
            None
        }
    }

    /// Read-only counterpart of `span_mut`
    pub fn span(&self, x: i32, y: i32, len: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.geometry.height || len <= 0 {
            return None;
        }
        let start = x.max(0);
        let end = (x.saturating_add(len)).min(self.geometry.width);
        if start >= end {
            return None;
        }
        let first = usize::try_from(self.geometry.index_of(start, y)).ok()?;
        let last = (first + (end - start) as usize).min(self.data.len());
        if first < last {
            Some(&self.data[first..last])
        } else {
            None
        }
    }

    /// Fill columns x1..=x2 of row y (either order), clipped
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, color: u8) {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (x1, x2) = (x1.max(0), x2.min(self.geometry.width - 1));
        if x1 > x2 {
            return;
        }
        if let Some(span) = self.span_mut(x1, y, x2 - x1 + 1) {
            span.fill(color);
        }
    }
}
