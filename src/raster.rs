//! Lines, outlines, text and stamps
//!
//! The viewport owns the lock; the actual pixel pushing is delegated to a
//! rasterizer trait so callers can plug in their own font or tile engine.
//! A clipped Bresenham line and a packed icon-set stamp renderer are built in.

use crate::geometry::Rect;
use crate::palette::RemapTable;
use crate::viewport::{LockedView, Viewport};

/// Stamp clip window: (x, y, width, height) in viewport coordinates
pub type ClipWindow = Rect;

// ============================================================================
// Collaborator traits
// ============================================================================

pub trait LineRasterizer {
    /// Draw from (x1, y1) to (x2, y2) inclusive, clipped to the view
    fn draw_line(&self, view: &mut LockedView<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: u8);
}

pub trait TextRasterizer {
    /// Render `text` with its top-left at (x, y). Returns bytes written.
    fn print(&self, view: &mut LockedView<'_>, text: &str, x: i32, y: i32, fg: u8, bg: u8) -> u32;
}

pub trait StampRenderer {
    /// Draw icon number `icon` out of `icon_data` at (x, y) relative to
    /// `clip`, never touching pixels outside it.
    fn draw_stamp_clipped(
        &self,
        view: &mut LockedView<'_>,
        icon_data: &[u8],
        icon: usize,
        x: i32,
        y: i32,
        remap: Option<&RemapTable>,
        clip: ClipWindow,
    );
}

// ============================================================================
// Bresenham
// ============================================================================

/// Integer Bresenham with Cohen-Sutherland clipping
#[derive(Debug, Clone, Copy, Default)]
pub struct Bresenham;

impl LineRasterizer for Bresenham {
    fn draw_line(&self, view: &mut LockedView<'_>, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        let Some((x0, y0, x1, y1)) = clip_line(view.width(), view.height(), x1, y1, x2, y2) else {
            return;
        };

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            view.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Clip a segment to a `w` x `h` box. `None` when nothing is visible.
fn clip_line(w: i32, h: i32, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<(i32, i32, i32, i32)> {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const BOTTOM: u8 = 4;
    const TOP: u8 = 8;
    // Converges in four passes for any real segment
    const MAX_PASSES: u32 = 8;

    if w <= 0 || h <= 0 {
        return None;
    }
    let (w, h) = (w as i64, h as i64);
    let outcode = |x: i64, y: i64| {
        let mut code = 0;
        if x < 0 {
            code |= LEFT;
        } else if x >= w {
            code |= RIGHT;
        }
        if y < 0 {
            code |= TOP;
        } else if y >= h {
            code |= BOTTOM;
        }
        code
    };

    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let mut code0 = outcode(x0, y0);
    let mut code1 = outcode(x1, y1);

    for _ in 0..MAX_PASSES {
        if code0 | code1 == 0 {
            return Some((x0 as i32, y0 as i32, x1 as i32, y1 as i32));
        }
        if code0 & code1 != 0 {
            return None;
        }

        let out = if code0 != 0 { code0 } else { code1 };
        let dx = x1 - x0;
        let dy = y1 - y0;
        let (x, y) = if out & BOTTOM != 0 {
            (step(x0, dx, h - 1 - y0, dy), h - 1)
        } else if out & TOP != 0 {
            (step(x0, dx, -y0, dy), 0)
        } else if out & RIGHT != 0 {
            (w - 1, step(y0, dy, w - 1 - x0, dx))
        } else {
            (0, step(y0, dy, -x0, dx))
        };

        if out == code0 {
            (x0, y0) = (x, y);
            code0 = outcode(x0, y0);
        } else {
            (x1, y1) = (x, y);
            code1 = outcode(x1, y1);
        }
    }
    None
}

/// `a + d * num / den` without overflowing on far-off endpoints
#[inline]
fn step(a: i64, d: i64, num: i64, den: i64) -> i64 {
    (a as i128 + d as i128 * num as i128 / den as i128) as i64
}

// ============================================================================
// Icon-set stamps
// ============================================================================

/// Icons of one fixed size packed back to back, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSet {
    pub icon_width: i32,
    pub icon_height: i32,
    /// Skip index 0 instead of drawing it
    pub transparent: bool,
}

impl IconSet {
    pub fn new(icon_width: i32, icon_height: i32, transparent: bool) -> Self {
        Self {
            icon_width,
            icon_height,
            transparent,
        }
    }

    fn icon_len(&self) -> usize {
        (self.icon_width.max(0) as usize) * (self.icon_height.max(0) as usize)
    }

    /// Number of whole icons in `icon_data`
    pub fn count(&self, icon_data: &[u8]) -> usize {
        match self.icon_len() {
            0 => 0,
            len => icon_data.len() / len,
        }
    }
}

impl StampRenderer for IconSet {
    fn draw_stamp_clipped(
        &self,
        view: &mut LockedView<'_>,
        icon_data: &[u8],
        icon: usize,
        x: i32,
        y: i32,
        remap: Option<&RemapTable>,
        clip: ClipWindow,
    ) {
        let len = self.icon_len();
        let Some(pixels) = icon
            .checked_mul(len)
            .and_then(|start| icon_data.get(start..start + len))
        else {
            return;
        };
        if len == 0 {
            return;
        }

        let left = clip.x.saturating_add(x);
        let top = clip.y.saturating_add(y);
        for (row, line) in pixels.chunks_exact(self.icon_width as usize).enumerate() {
            let py = top.saturating_add(row as i32);
            for (col, &value) in line.iter().enumerate() {
                let px = left.saturating_add(col as i32);
                if !clip.contains(px, py) || (self.transparent && value == 0) {
                    continue;
                }
                let value = remap.map_or(value, |table| table[value as usize]);
                view.put(px, py, value);
            }
        }
    }
}

// ============================================================================
// Viewport entry points
// ============================================================================

impl Viewport {
    pub fn draw_line(&mut self, sx: i32, sy: i32, dx: i32, dy: i32, color: u8) {
        self.draw_line_with(&Bresenham, sx, sy, dx, dy, color);
    }

    pub fn draw_line_with<R: LineRasterizer + ?Sized>(
        &mut self,
        rasterizer: &R,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        color: u8,
    ) {
        self.with_lock(|view| rasterizer.draw_line(view, sx, sy, dx, dy, color));
    }

    /// Rectangle outline through corners (x1, y1) and (x2, y2)
    pub fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        self.draw_rect_with(&Bresenham, x1, y1, x2, y2, color);
    }

    /// Outline as four lines under a single lock
    pub fn draw_rect_with<R: LineRasterizer + ?Sized>(
        &mut self,
        rasterizer: &R,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: u8,
    ) {
        self.with_lock(|view| {
            rasterizer.draw_line(view, x1, y1, x2, y1, color);
            rasterizer.draw_line(view, x1, y2, x2, y2, color);
            rasterizer.draw_line(view, x1, y1, x1, y2, color);
            rasterizer.draw_line(view, x2, y1, x2, y2, color);
        });
    }

    /// Print through `text`. Returns the rasterizer's byte count, 0 when
    /// the lock failed.
    pub fn print<T: TextRasterizer + ?Sized>(
        &mut self,
        text: &T,
        s: &str,
        x: i32,
        y: i32,
        fg: u8,
        bg: u8,
    ) -> u32 {
        self.with_lock(|view| text.print(view, s, x, y, fg, bg)).unwrap_or(0)
    }

    /// Print a number in decimal
    pub fn print_number<T: TextRasterizer + ?Sized>(
        &mut self,
        text: &T,
        n: i64,
        x: i32,
        y: i32,
        fg: u8,
        bg: u8,
    ) -> u32 {
        self.print(text, &n.to_string(), x, y, fg, bg)
    }

    /// Draw one stamp clipped to `windows[clip_window]`. Unknown window ids
    /// draw nothing.
    pub fn draw_stamp<S: StampRenderer + ?Sized>(
        &mut self,
        renderer: &S,
        icon_data: &[u8],
        icon: usize,
        x: i32,
        y: i32,
        remap: Option<&RemapTable>,
        clip_window: usize,
        windows: &[ClipWindow],
    ) {
        let Some(&clip) = windows.get(clip_window) else {
            log::debug!("draw_stamp: no clip window {}", clip_window);
            return;
        };
        self.with_lock(|view| renderer.draw_stamp_clipped(view, icon_data, icon, x, y, remap, clip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::identity_remap;
    use crate::surface::{PixelSurface, SurfaceHandle};
    use crate::testing::MockNative;
    use std::cell::RefCell;

    fn lit(surface: &SurfaceHandle, color: u8) -> Vec<(usize, usize)> {
        let s = surface.borrow();
        let w = s.width() as usize;
        s.data()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == color)
            .map(|(i, _)| (i % w, i / w))
            .collect()
    }

    #[test]
    fn test_horizontal_and_diagonal_lines() {
        let surface = PixelSurface::software(8, 8, 0).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        vp.draw_line(1, 1, 4, 1, 2);
        assert_eq!(lit(&surface, 2), vec![(1, 1), (2, 1), (3, 1), (4, 1)]);

        vp.draw_line(0, 0, 7, 7, 3);
        let diag = lit(&surface, 3);
        assert_eq!(diag.len(), 8);
        assert!(diag.iter().all(|&(x, y)| x == y));
    }

    #[test]
    fn test_line_is_clipped_to_viewport() {
        let surface = PixelSurface::software(10, 10, 0).unwrap();
        let mut vp = Viewport::new(&surface, 2, 2, 4, 4);
        vp.draw_line(-20, 1, 30, 1, 5);
        assert_eq!(lit(&surface, 5), vec![(2, 3), (3, 3), (4, 3), (5, 3)]);

        vp.draw_line(-5, -5, -1, -1, 6);
        assert!(lit(&surface, 6).is_empty());
    }

    #[test]
    fn test_clip_line_handles_far_endpoints() {
        assert_eq!(
            clip_line(16, 16, i32::MIN, 8, i32::MAX, 8),
            Some((0, 8, 15, 8))
        );
        assert_eq!(clip_line(0, 16, 0, 0, 4, 4), None);
    }

    #[test]
    fn test_draw_rect_outline() {
        let surface = PixelSurface::software(8, 8, 0).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        vp.draw_rect(1, 1, 4, 3, 7);

        let pixels = lit(&surface, 7);
        // Perimeter of a 4 x 3 box
        assert_eq!(pixels.len(), 10);
        assert!(pixels.contains(&(1, 1)));
        assert!(pixels.contains(&(4, 3)));
        assert!(!pixels.contains(&(2, 2)));
    }

    #[test]
    fn test_draw_rect_takes_one_lock() {
        let (native, journal) = MockNative::new(8, 8, 0);
        let surface = PixelSurface::hardware(Box::new(native)).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        vp.draw_rect(0, 0, 5, 5, 1);
        assert_eq!(journal.borrow().locks, 1);
        assert_eq!(journal.borrow().unlocks, 1);
    }

    /// Records what it was asked to print and writes one pixel per char
    struct Recorder(RefCell<Vec<String>>);

    impl TextRasterizer for Recorder {
        fn print(&self, view: &mut LockedView<'_>, text: &str, x: i32, y: i32, fg: u8, _bg: u8) -> u32 {
            self.0.borrow_mut().push(text.to_string());
            let mut written = 0;
            for i in 0..text.len() as i32 {
                if view.put(x + i, y, fg) {
                    written += 1;
                }
            }
            written
        }
    }

    #[test]
    fn test_print_and_print_number() {
        let surface = PixelSurface::software(8, 2, 0).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        let text = Recorder(RefCell::new(Vec::new()));

        assert_eq!(vp.print(&text, "hi", 0, 0, 4, 0), 2);
        assert_eq!(vp.print_number(&text, -42, 5, 1, 4, 0), 3);
        assert_eq!(*text.0.borrow(), vec!["hi".to_string(), "-42".to_string()]);
    }

    #[test]
    fn test_print_on_failed_lock_returns_zero() {
        let (native, journal) = MockNative::new(8, 8, 0);
        journal.borrow_mut().fail_lock = true;
        let surface = PixelSurface::hardware(Box::new(native)).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        let text = Recorder(RefCell::new(Vec::new()));
        assert_eq!(vp.print(&text, "hi", 0, 0, 4, 0), 0);
        assert!(text.0.borrow().is_empty());
    }

    fn icons() -> Vec<u8> {
        // Two 2x2 icons
        vec![1, 0, 0, 2, 3, 3, 3, 3]
    }

    #[test]
    fn test_stamp_transparency_and_remap() {
        let surface = PixelSurface::software(4, 4, 0).unwrap();
        surface.borrow_mut().data_mut().unwrap().fill(9);
        let mut vp = Viewport::surface_view(&surface);
        let windows = [Rect::new(0, 0, 4, 4)];
        let mut table = identity_remap();
        table[2] = 20;

        vp.draw_stamp(&IconSet::new(2, 2, true), &icons(), 0, 1, 1, Some(&table), 0, &windows);
        let s = surface.borrow();
        let data = s.data().unwrap();
        assert_eq!(&data[4..8], &[9, 1, 9, 9]);
        assert_eq!(&data[8..12], &[9, 9, 20, 9]);
    }

    #[test]
    fn test_stamp_clip_window() {
        let surface = PixelSurface::software(6, 6, 0).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        let windows = [Rect::new(0, 0, 6, 6), Rect::new(2, 2, 3, 3)];

        // Window-relative (2, 2) lands at (4, 4); only that one pixel is inside
        vp.draw_stamp(&IconSet::new(2, 2, false), &icons(), 1, 2, 2, None, 1, &windows);
        assert_eq!(lit(&surface, 3), vec![(4, 4)]);

        vp.draw_stamp(&IconSet::new(2, 2, false), &icons(), 1, 0, 0, None, 7, &windows);
        vp.draw_stamp(&IconSet::new(2, 2, false), &icons(), 5, 0, 0, None, 0, &windows);
        assert_eq!(lit(&surface, 3).len(), 1);
    }

    #[test]
    fn test_stamp_lock_failure_skips_unlock() {
        let (native, journal) = MockNative::new(8, 8, 0);
        journal.borrow_mut().fail_lock = true;
        let surface = PixelSurface::hardware(Box::new(native)).unwrap();
        let mut vp = Viewport::surface_view(&surface);
        let windows = [Rect::new(0, 0, 8, 8)];

        vp.draw_stamp(&IconSet::new(2, 2, false), &icons(), 0, 0, 0, None, 0, &windows);
        assert_eq!(journal.borrow().unlocks, 0);
        assert_eq!(surface.borrow().lock_count(), 0);
    }

    #[test]
    fn test_icon_count() {
        assert_eq!(IconSet::new(2, 2, false).count(&icons()), 2);
        assert_eq!(IconSet::new(0, 2, false).count(&icons()), 0);
    }
}
