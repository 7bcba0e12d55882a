//! gbuffer: 8-bit indexed surfaces and the viewports that draw into them
//!
//! A [`PixelSurface`] owns pixel memory, either a plain byte buffer or a
//! platform [`NativeSurface`] that must be locked before it can be touched.
//! A [`Viewport`] is a clipped window onto a surface; every drawing
//! operation (blits, scaling, fills, lines, stamps) is a method on it and
//! takes care of locking on its own.

mod blit;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logic_page;
pub mod palette;
mod planes;
mod primitives;
pub mod raster;
mod scale;
pub mod surface;
pub mod viewport;

#[cfg(feature = "sdl")]
pub mod display;

#[cfg(test)]
mod testing;

pub use blit::COLOR_KEY;
pub use config::RenderConfig;
pub use error::{GfxError, Result};
pub use geometry::Rect;
pub use logic_page::{logic_page, set_logic_page, take_logic_page, with_logic_page};
pub use palette::{identity_remap, FadeCallback, Palette, PaletteState, RemapTable};
pub use raster::{Bresenham, ClipWindow, IconSet, LineRasterizer, StampRenderer, TextRasterizer};
pub use surface::{Backing, BltSource, NativeSurface, PixelSurface, SurfaceHandle};
pub use viewport::{LockedView, ViewGeometry, Viewport};
