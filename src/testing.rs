//! Scriptable native surface for unit tests

use crate::geometry::Rect;
use crate::surface::{BltSource, NativeSurface};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Slack in front of the pixels so tests can move the base offset around
const SLACK: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BltCall {
    pub dest: Rect,
    pub src: Rect,
    pub same_surface: bool,
    pub color_key: bool,
}

/// Shared view of what the backend was asked to do
#[derive(Debug)]
pub struct Journal {
    pub fail_lock: bool,
    pub ready: bool,
    pub base_offset: usize,
    pub locks: u32,
    pub unlocks: u32,
    pub blits: Vec<BltCall>,
    pub fills: Vec<(Rect, u8)>,
}

pub struct MockNative {
    width: i32,
    height: i32,
    pitch: i32,
    pixels: Vec<u8>,
    journal: Rc<RefCell<Journal>>,
}

impl MockNative {
    pub fn new(width: i32, height: i32, pitch: i32) -> (Self, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal {
            fail_lock: false,
            ready: true,
            base_offset: 0,
            locks: 0,
            unlocks: 0,
            blits: Vec::new(),
            fills: Vec::new(),
        }));
        let len = SLACK + width.saturating_add(pitch).max(0) as usize * height.max(0) as usize;
        (
            Self {
                width,
                height,
                pitch,
                pixels: vec![0; len],
                journal: Rc::clone(&journal),
            },
            journal,
        )
    }

    /// Report a different geometry than the pixels were allocated for
    pub fn reporting(mut self, width: i32, height: i32, pitch: i32) -> Self {
        self.width = width;
        self.height = height;
        self.pitch = pitch;
        self
    }

    fn stride(&self) -> usize {
        (self.width + self.pitch) as usize
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.journal.borrow().base_offset + y as usize * self.stride() + x as usize)
    }

    fn read(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }
}

impl NativeSurface for MockNative {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn pitch(&self) -> i32 {
        self.pitch
    }

    fn lock(&mut self) -> bool {
        let mut journal = self.journal.borrow_mut();
        if journal.fail_lock {
            return false;
        }
        journal.locks += 1;
        true
    }

    fn unlock(&mut self) -> bool {
        self.journal.borrow_mut().unlocks += 1;
        true
    }

    fn base_offset(&self) -> usize {
        self.journal.borrow().base_offset
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn blt(&mut self, dest_rect: Rect, source: BltSource<'_>, src_rect: Rect, color_key: bool) -> bool {
        let same_surface = matches!(source, BltSource::SameSurface);
        // Gather first so same-surface copies behave like a real blitter
        let mut staged = Vec::with_capacity(src_rect.area() as usize);
        for y in 0..src_rect.height {
            for x in 0..src_rect.width {
                let value = match &source {
                    BltSource::SameSurface => self.read(src_rect.x + x, src_rect.y + y),
                    BltSource::Surface(other) => other
                        .as_any()
                        .downcast_ref::<MockNative>()
                        .and_then(|m| m.read(src_rect.x + x, src_rect.y + y)),
                };
                staged.push((x, y, value));
            }
        }
        for (x, y, value) in staged {
            let Some(value) = value else { continue };
            if color_key && value == 0 {
                continue;
            }
            if let Some(i) = self.index(dest_rect.x + x, dest_rect.y + y) {
                self.pixels[i] = value;
            }
        }
        self.journal.borrow_mut().blits.push(BltCall {
            dest: dest_rect,
            src: src_rect,
            same_surface,
            color_key,
        });
        true
    }

    fn fill_rect(&mut self, rect: Rect, color: u8) -> bool {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = color;
                }
            }
        }
        self.journal.borrow_mut().fills.push((rect, color));
        true
    }

    fn is_ready_to_blit(&self) -> bool {
        self.journal.borrow().ready
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
