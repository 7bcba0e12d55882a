//! 256-colour palette, remap tables and timed fades
//!
//! The palette is plain data. Fades advance on `tick()`, which the caller
//! drives from whatever timer it owns (the demo ticks once per frame).

use std::fmt;

pub const RGB_BYTES: usize = 3;
pub const PALETTE_SIZE: usize = 256;
pub const PALETTE_BYTES: usize = RGB_BYTES * PALETTE_SIZE;

/// Index translation applied by remapping scales and `Viewport::remap`
pub type RemapTable = [u8; PALETTE_SIZE];

/// Table that maps every index to itself
pub fn identity_remap() -> RemapTable {
    let mut table = [0u8; PALETTE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = i as u8;
    }
    table
}

// ============================================================================
// Palette
// ============================================================================

/// 256 RGB triplets, 768 bytes
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    bytes: [u8; PALETTE_BYTES],
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Palette({:?}..)", &self.bytes[..RGB_BYTES * 4])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::black()
    }
}

impl Palette {
    pub fn black() -> Self {
        Self {
            bytes: [0; PALETTE_BYTES],
        }
    }

    /// Build from raw bytes. `None` unless exactly 768 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; PALETTE_BYTES] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Linear grey ramp from index 0 (black) to 255 (white)
    pub fn grayscale() -> Self {
        let mut palette = Self::black();
        for i in 0..PALETTE_SIZE {
            let v = i as u8;
            palette.set(i as u8, v, v, v);
        }
        palette
    }

    #[inline]
    pub fn get(&self, index: u8) -> (u8, u8, u8) {
        let i = index as usize * RGB_BYTES;
        (self.bytes[i], self.bytes[i + 1], self.bytes[i + 2])
    }

    #[inline]
    pub fn set(&mut self, index: u8, r: u8, g: u8, b: u8) {
        let i = index as usize * RGB_BYTES;
        self.bytes[i] = r;
        self.bytes[i + 1] = g;
        self.bytes[i + 2] = b;
    }

    /// Channel-wise blend: `step` of `steps` of the way from `self` to `to`
    pub fn lerp(&self, to: &Palette, step: u32, steps: u32) -> Palette {
        if steps == 0 || step >= steps {
            return to.clone();
        }
        let mut out = Palette::black();
        for (o, (&a, &b)) in out.bytes.iter_mut().zip(self.bytes.iter().zip(to.bytes.iter())) {
            let delta = (b as i64 - a as i64) * step as i64 / steps as i64;
            *o = (a as i64 + delta) as u8;
        }
        out
    }

    /// Expand indexed pixels to RGBA8888 for a streaming texture.
    /// Stops at whichever of `indices` / `out` runs out first.
    pub fn expand_to_rgba(&self, indices: &[u8], out: &mut [u8]) {
        for (&index, dest) in indices.iter().zip(out.chunks_exact_mut(4)) {
            let (r, g, b) = self.get(index);
            // ABGR in memory: SDL's RGBA8888 on little-endian
            dest[0] = 255;
            dest[1] = b;
            dest[2] = g;
            dest[3] = r;
        }
    }
}

// ============================================================================
// Fades
// ============================================================================

/// Called once when a fade reaches its target
pub type FadeCallback = Box<dyn FnOnce()>;

struct Fade {
    from: Palette,
    target: Palette,
    delay: u32,
    elapsed: u32,
    callback: Option<FadeCallback>,
}

/// Live palette plus at most one fade in flight
#[derive(Default)]
pub struct PaletteState {
    current: Palette,
    fade: Option<Fade>,
}

impl fmt::Debug for PaletteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteState")
            .field("current", &self.current)
            .field("fading", &self.is_fading())
            .finish()
    }
}

impl PaletteState {
    pub fn new(palette: Palette) -> Self {
        Self {
            current: palette,
            fade: None,
        }
    }

    pub fn current(&self) -> &Palette {
        &self.current
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Replace the palette now. A pending fade is dropped and its callback
    /// never runs.
    pub fn set_palette(&mut self, palette: &Palette) {
        if self.fade.take().is_some() {
            log::debug!("set_palette cancelled a running fade");
        }
        self.current = palette.clone();
    }

    /// Start fading towards `target` over `delay` ticks. A delay of 0
    /// switches immediately and runs the callback straight away. Starting a
    /// fade replaces any pending one without running its callback.
    pub fn fade_palette_to(&mut self, target: &Palette, delay: u32, callback: Option<FadeCallback>) {
        if self.fade.take().is_some() {
            log::debug!("fade replaced before completion");
        }
        if delay == 0 {
            self.current = target.clone();
            if let Some(done) = callback {
                done();
            }
            return;
        }
        self.fade = Some(Fade {
            from: self.current.clone(),
            target: target.clone(),
            delay,
            elapsed: 0,
            callback,
        });
    }

    /// Advance the running fade by one tick. Returns true while a fade is
    /// still in progress afterwards.
    pub fn tick(&mut self) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        fade.elapsed += 1;
        if fade.elapsed < fade.delay {
            self.current = fade.from.lerp(&fade.target, fade.elapsed, fade.delay);
            return true;
        }

        if let Some(mut finished) = self.fade.take() {
            self.current = finished.target;
            if let Some(done) = finished.callback.take() {
                done();
            }
        }
        false
    }
}
