//! Nearest-neighbour scaling between viewports
//!
//! 16.16 fixed-point stepping. The clip rules trim the destination window
//! against both viewports but keep the ratio of the unclipped request, so a
//! clipped scale is an approximation of the full one.

use crate::blit::COLOR_KEY;
use crate::palette::RemapTable;
use crate::planes::{to_index, Planes, Shared, Split};
use crate::viewport::{ViewGeometry, Viewport};
use std::rc::Rc;

/// One in 16.16 fixed point
const FIXED_ONE_SHIFT: u32 = 16;

/// Clipped, resolved parameters of one scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScalePlan {
    src_start: i64,
    dst_start: i64,
    src_stride: i64,
    dst_stride: i64,
    span_x: i64,
    span_y: i64,
    x_ratio: i64,
    y_ratio: i64,
}

impl ScalePlan {
    pub(crate) fn new(
        src: &ViewGeometry,
        dst: &ViewGeometry,
        src_x: i32,
        src_y: i32,
        dst_x: i32,
        dst_y: i32,
        src_w: i32,
        src_h: i32,
        dst_w: i32,
        dst_h: i32,
    ) -> Option<Self> {
        if src_w <= 0 || src_h <= 0 || dst_w <= 0 || dst_h <= 0 {
            return None;
        }
        let (sx, sy, dx, dy) = (src_x as i64, src_y as i64, dst_x as i64, dst_y as i64);
        let (sw, sh, dw, dh) = (src_w as i64, src_h as i64, dst_w as i64, dst_h as i64);

        let mut src_x0 = sx;
        let mut src_y0 = sy;
        let mut dst_x0 = dx;
        let mut dst_y0 = dy;
        let mut dst_x1 = dw + dx;
        let mut dst_y1 = dh + dy;

        // Source hanging off the top/left: start later in the destination
        if sx < 0 {
            src_x0 = 0;
            dst_x0 = dx + (dw * -sx) / sw;
        }
        if sy < 0 {
            src_y0 = 0;
            dst_y0 = dy + (dh * -sy) / sh;
        }

        // Source running past the right/bottom: stop earlier
        let (src_vw, src_vh) = (src.width as i64, src.height as i64);
        if sx + sw > src_vw + 1 {
            dst_x1 = dx + (dw * (src_vw - sx)) / sw;
        }
        if sy + sh > src_vh + 1 {
            dst_y1 = dy + (dh * (src_vh - sy)) / sh;
        }

        // Destination off the top/left: skip into the source
        if dst_x0 < 0 {
            dst_x0 = 0;
            src_x0 = sx + (sw * -dx) / dw;
        }
        if dst_y0 < 0 {
            dst_y0 = 0;
            src_y0 = sy + (sh * -dy) / dh;
        }

        let (dst_vw, dst_vh) = (dst.width as i64, dst.height as i64);
        if dst_x1 > dst_vw + 1 {
            dst_x1 = dst_vw;
        }
        if dst_y1 > dst_vh + 1 {
            dst_y1 = dst_vh;
        }

        if dst_y0 > dst_y1 || dst_x0 > dst_x1 {
            return None;
        }
        let span_x = dst_x1 - dst_x0;
        let span_y = dst_y1 - dst_y0;
        if span_x == 0 || span_y == 0 {
            return None;
        }

        let src_stride = src.stride as i64;
        let dst_stride = dst.stride as i64;
        Some(Self {
            src_start: src.offset as i64 + src_y0 * src_stride + src_x0,
            dst_start: dst.offset as i64 + dst_y0 * dst_stride + dst_x0,
            src_stride,
            dst_stride,
            span_x,
            span_y,
            x_ratio: (sw << FIXED_ONE_SHIFT) / span_x + 1,
            y_ratio: (sh << FIXED_ONE_SHIFT) / span_y + 1,
        })
    }

    pub(crate) fn run(&self, planes: &mut impl Planes, transparent: bool, remap: Option<&RemapTable>) {
        for i in 0..self.span_y {
            let dst_row = self.dst_start + i * self.dst_stride;
            let src_row = self.src_start + ((i * self.y_ratio) >> FIXED_ONE_SHIFT) * self.src_stride;
            let mut x_acc = 0i64;
            for j in 0..self.span_x {
                let sample = to_index(src_row + (x_acc >> FIXED_ONE_SHIFT)).and_then(|s| planes.read(s));
                x_acc += self.x_ratio;

                let Some(sample) = sample else { continue };
                if transparent && sample == COLOR_KEY {
                    continue;
                }
                let value = remap.map_or(sample, |table| table[sample as usize]);
                if let Some(d) = to_index(dst_row + j) {
                    planes.write(d, value);
                }
            }
        }
    }
}

impl Viewport {
    /// Scale a `src_w` x `src_h` block at (src_x, src_y) onto a
    /// `dst_w` x `dst_h` block at (dst_x, dst_y) in `dest`.
    ///
    /// With `trans` set, source index 0 leaves the destination alone. With a
    /// remap table every written pixel goes through it.
    pub fn scale(
        &mut self,
        dest: &mut Viewport,
        src_x: i32,
        src_y: i32,
        dst_x: i32,
        dst_y: i32,
        src_w: i32,
        src_h: i32,
        dst_w: i32,
        dst_h: i32,
        trans: bool,
        remap: Option<&RemapTable>,
    ) {
        if self.lock() {
            if dest.lock() {
                self.linear_scale_to_linear(
                    dest, src_x, src_y, dst_x, dst_y, src_w, src_h, dst_w, dst_h, trans, remap,
                );
                dest.unlock();
            }
            self.unlock();
        }
    }

    /// Stretch this whole viewport over the whole of `dest`
    pub fn scale_to(&mut self, dest: &mut Viewport, trans: bool, remap: Option<&RemapTable>) {
        let (sw, sh) = (self.width(), self.height());
        let (dw, dh) = (dest.width(), dest.height());
        self.scale(dest, 0, 0, 0, 0, sw, sh, dw, dh, trans, remap);
    }

    pub(crate) fn linear_scale_to_linear(
        &self,
        dest: &Viewport,
        src_x: i32,
        src_y: i32,
        dst_x: i32,
        dst_y: i32,
        src_w: i32,
        src_h: i32,
        dst_w: i32,
        dst_h: i32,
        trans: bool,
        remap: Option<&RemapTable>,
    ) {
        let (Some(src_geo), Some(dst_geo)) = (self.geometry(), dest.geometry()) else {
            return;
        };
        let Some(plan) = ScalePlan::new(
            &src_geo, &dst_geo, src_x, src_y, dst_x, dst_y, src_w, src_h, dst_w, dst_h,
        ) else {
            log::debug!("scale window empty after clipping");
            return;
        };
        let (Some(src), Some(dst)) = (self.surface(), dest.surface()) else {
            return;
        };

        if Rc::ptr_eq(&src, &dst) {
            let mut surface = dst.borrow_mut();
            if let Some(data) = surface.data_mut() {
                plan.run(&mut Shared(data), trans, remap);
            }
        } else {
            let source = src.borrow();
            let mut target = dst.borrow_mut();
            if let (Some(from), Some(to)) = (source.data(), target.data_mut()) {
                plan.run(&mut Split { src: from, dst: to }, trans, remap);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::identity_remap;
    use crate::surface::{PixelSurface, SurfaceHandle};
    use crate::testing::MockNative;

    fn surface_with(width: i32, height: i32, pixels: &[u8]) -> SurfaceHandle {
        let surface = PixelSurface::software(width, height, 0).unwrap();
        surface.borrow_mut().data_mut().unwrap().copy_from_slice(pixels);
        surface
    }

    #[test]
    fn test_same_size_scale_is_identity() {
        let pixels: Vec<u8> = (1..=16).collect();
        let src = surface_with(4, 4, &pixels);
        let dst = PixelSurface::software(4, 4, 0).unwrap();

        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);
        from.scale_to(&mut to, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &pixels[..]);
    }

    #[test]
    fn test_upscale_with_remap() {
        let src = surface_with(2, 2, &[1, 2, 3, 4]);
        let dst = PixelSurface::software(4, 4, 0).unwrap();
        let mut table = identity_remap();
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (i as u8).wrapping_add(10);
        }

        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, 0, 0, 0, 0, 2, 2, 4, 4, false, Some(&table));

        let expected = [
            11, 11, 12, 12, //
            11, 11, 12, 12, //
            13, 13, 14, 14, //
            13, 13, 14, 14,
        ];
        assert_eq!(dst.borrow().data().unwrap(), &expected[..]);
    }

    #[test]
    fn test_transparency_checks_raw_sample() {
        let src = surface_with(2, 1, &[0, 5]);
        let dst = surface_with(2, 1, &[9, 9]);
        // Index 0 would remap to something visible; it must still be skipped
        let mut table = identity_remap();
        table[0] = 33;

        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, 0, 0, 0, 0, 2, 1, 2, 1, true, Some(&table));
        assert_eq!(dst.borrow().data().unwrap(), &[9, 5]);

        from.scale(&mut to, 0, 0, 0, 0, 2, 1, 2, 1, false, Some(&table));
        assert_eq!(dst.borrow().data().unwrap(), &[33, 5]);
    }

    #[test]
    fn test_transparency_without_remap() {
        let src = surface_with(2, 1, &[0, 5]);
        let dst = surface_with(2, 1, &[9, 9]);
        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);

        from.scale(&mut to, 0, 0, 0, 0, 2, 1, 2, 1, true, None);
        assert_eq!(dst.borrow().data().unwrap(), &[9, 5]);

        from.scale(&mut to, 0, 0, 0, 0, 2, 1, 2, 1, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[0, 5]);
    }

    #[test]
    fn test_source_off_top_left_starts_later_in_destination() {
        // The step keeps the ratio of the full request against the clipped span
        let row = surface_with(4, 1, &[1, 2, 3, 4]);
        let dst = PixelSurface::software(4, 1, 0).unwrap();
        let mut from = Viewport::surface_view(&row);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, -2, 0, 0, 0, 4, 1, 4, 1, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[0, 0, 1, 3]);

        let column = surface_with(1, 4, &[1, 2, 3, 4]);
        let dst = PixelSurface::software(1, 4, 0).unwrap();
        let mut from = Viewport::surface_view(&column);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, 0, -2, 0, 0, 1, 4, 1, 4, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[0, 0, 1, 3]);
    }

    #[test]
    fn test_destination_off_top_left_skips_into_source() {
        let pixels: Vec<u8> = (1..=8).collect();

        let row = surface_with(8, 1, &pixels);
        let dst = PixelSurface::software(4, 1, 0).unwrap();
        let mut from = Viewport::surface_view(&row);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, 0, 0, -2, 0, 4, 1, 4, 1, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[3, 5, 0, 0]);

        let column = surface_with(1, 8, &pixels);
        let dst = PixelSurface::software(1, 4, 0).unwrap();
        let mut from = Viewport::surface_view(&column);
        let mut to = Viewport::surface_view(&dst);
        from.scale(&mut to, 0, 0, 0, -2, 1, 4, 1, 4, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[3, 5, 0, 0]);
    }

    #[test]
    fn test_bottom_edge_clip_keeps_top_rows() {
        let pixels: Vec<u8> = (1..=16).collect();
        let src = surface_with(4, 4, &pixels);
        let dst = PixelSurface::software(4, 4, 0).unwrap();
        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);

        from.scale(&mut to, 0, 0, 0, 2, 4, 4, 4, 4, false, None);
        let expected = [
            0, 0, 0, 0, //
            0, 0, 0, 0, //
            1, 2, 3, 4, //
            9, 10, 11, 12,
        ];
        assert_eq!(dst.borrow().data().unwrap(), &expected[..]);
    }

    #[test]
    fn test_lock_failure_scales_nothing() {
        let src = surface_with(2, 2, &[1, 2, 3, 4]);
        let (native, journal) = MockNative::new(2, 2, 0);
        journal.borrow_mut().fail_lock = true;
        let hw = PixelSurface::hardware(Box::new(native)).unwrap();

        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&hw);
        from.scale_to(&mut to, false, None);
        assert_eq!(src.borrow().lock_count(), 0);
        assert_eq!(journal.borrow().locks, 0);

        // Failing source: the software destination stays untouched
        let dst = PixelSurface::software(2, 2, 0).unwrap();
        let mut sink = Viewport::surface_view(&dst);
        to.scale_to(&mut sink, false, None);
        assert!(dst.borrow().data().unwrap().iter().all(|&p| p == 0));
        assert_eq!(dst.borrow().lock_count(), 0);

        journal.borrow_mut().fail_lock = false;
        let untouched = to.with_lock(|view| view.get(0, 0)).unwrap();
        assert_eq!(untouched, Some(0));
    }

    #[test]
    fn test_zero_size_is_a_no_op() {
        let src = surface_with(2, 2, &[1, 2, 3, 4]);
        let dst = PixelSurface::software(2, 2, 0).unwrap();
        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);

        from.scale(&mut to, 0, 0, 0, 0, 0, 2, 2, 2, false, None);
        from.scale(&mut to, 0, 0, 0, 0, 2, 2, 2, -1, false, None);
        assert!(dst.borrow().data().unwrap().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_downscale_halves() {
        let pixels: Vec<u8> = (1..=16).collect();
        let src = surface_with(4, 4, &pixels);
        let dst = PixelSurface::software(2, 2, 0).unwrap();
        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);

        from.scale_to(&mut to, false, None);
        assert_eq!(dst.borrow().data().unwrap(), &[1, 3, 9, 11]);
    }

    #[test]
    fn test_right_edge_clip_keeps_left_columns() {
        let pixels: Vec<u8> = (1..=16).collect();
        let src = surface_with(4, 4, &pixels);
        let dst = PixelSurface::software(4, 4, 0).unwrap();
        let mut from = Viewport::surface_view(&src);
        let mut to = Viewport::surface_view(&dst);

        from.scale(&mut to, 0, 0, 2, 0, 4, 4, 4, 4, false, None);
        let d = dst.borrow();
        let data = d.data().unwrap();
        for y in 0..4 {
            assert_eq!(data[y * 4], 0);
            assert_eq!(data[y * 4 + 1], 0);
            assert_ne!(data[y * 4 + 2], 0);
        }
        // First written column samples the source's first column
        assert_eq!(data[2], 1);
    }

    #[test]
    fn test_scale_within_one_surface() {
        let surface = PixelSurface::software(8, 4, 0).unwrap();
        let mut left = Viewport::new(&surface, 0, 0, 2, 2);
        let mut right = Viewport::new(&surface, 4, 0, 4, 4);
        left.with_lock(|view| {
            view.put(0, 0, 1);
            view.put(1, 0, 2);
            view.put(0, 1, 3);
            view.put(1, 1, 4);
        })
        .unwrap();

        left.scale_to(&mut right, false, None);
        right
            .with_lock(|view| {
                assert_eq!(view.get(0, 0), Some(1));
                assert_eq!(view.get(3, 0), Some(2));
                assert_eq!(view.get(0, 3), Some(3));
                assert_eq!(view.get(3, 3), Some(4));
            })
            .unwrap();
    }
}
