//! Source/destination memory for the blit and scale engines
//!
//! When both viewports sit on one surface the engines get a single mutable
//! slice and must cope with aliasing; otherwise they get one slice per side.
//! Every access is bounds checked and out-of-range pixels are skipped.

pub(crate) trait Planes {
    fn read(&self, idx: usize) -> Option<u8>;
    fn write(&mut self, idx: usize, value: u8);
    /// Move `len` bytes like `memmove`; skipped if either range is out of bounds
    fn copy_row(&mut self, src: usize, dst: usize, len: usize);
}

/// Separate source and destination surfaces
pub(crate) struct Split<'a> {
    pub src: &'a [u8],
    pub dst: &'a mut [u8],
}

/// Source and destination share one surface
pub(crate) struct Shared<'a>(pub &'a mut [u8]);

#[inline]
fn fits(start: usize, len: usize, total: usize) -> bool {
    start.checked_add(len).is_some_and(|end| end <= total)
}

impl Planes for Split<'_> {
    #[inline]
    fn read(&self, idx: usize) -> Option<u8> {
        self.src.get(idx).copied()
    }

    #[inline]
    fn write(&mut self, idx: usize, value: u8) {
        if let Some(p) = self.dst.get_mut(idx) {
            *p = value;
        }
    }

    fn copy_row(&mut self, src: usize, dst: usize, len: usize) {
        if fits(src, len, self.src.len()) && fits(dst, len, self.dst.len()) {
            self.dst[dst..dst + len].copy_from_slice(&self.src[src..src + len]);
        }
    }
}

impl Planes for Shared<'_> {
    #[inline]
    fn read(&self, idx: usize) -> Option<u8> {
        self.0.get(idx).copied()
    }

    #[inline]
    fn write(&mut self, idx: usize, value: u8) {
        if let Some(p) = self.0.get_mut(idx) {
            *p = value;
        }
    }

    fn copy_row(&mut self, src: usize, dst: usize, len: usize) {
        let total = self.0.len();
        if fits(src, len, total) && fits(dst, len, total) {
            self.0.copy_within(src..src + len, dst);
        }
    }
}

/// Signed index to slice index; negative positions read/write nothing
#[inline]
pub(crate) fn to_index(idx: i64) -> Option<usize> {
    usize::try_from(idx).ok()
}
