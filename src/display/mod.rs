//! SDL2 window output (`sdl` feature)
//!
//! Indexed viewports are expanded through a palette into an RGBA8888
//! streaming texture and presented once per frame.

mod sdl_surface;

pub use sdl_surface::SdlSurface;

use crate::error::Result;
use crate::palette::Palette;
use crate::viewport::Viewport;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 200;

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

/// Streaming texture plus the RGBA scratch it is filled from
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Create a window of `width` x `height`; the canvas scales the frame to it
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>)> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Expand `view` through `palette` and show it
    pub fn present(
        &mut self,
        target: &mut RenderTarget,
        view: &mut Viewport,
        palette: &Palette,
    ) -> Result<()> {
        let row_bytes = target.width as usize * 4;
        let rows = target.height as i32;
        let cols = target.width as i32;
        let rgba = &mut target.rgba;
        view.with_lock(|locked| {
            for y in 0..rows.min(locked.height()) {
                if let Some(src) = locked.span(0, y, cols) {
                    let start = y as usize * row_bytes;
                    palette.expand_to_rgba(src, &mut rgba[start..start + row_bytes]);
                }
            }
        });

        target
            .texture
            .update(None, &target.rgba, row_bytes)
            .map_err(|e| e.to_string())?;
        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {},
            }
        }
        events
    }
}

impl<'a> RenderTarget<'a> {
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            rgba: vec![0; width as usize * height as usize * 4],
            width,
            height,
        })
    }
}
