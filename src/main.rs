use gbuffer::{
    identity_remap, logic_page, set_logic_page, with_logic_page, GfxError, IconSet, Palette,
    PaletteState, PixelSurface, Rect, RenderConfig, SurfaceHandle, Viewport,
};
use std::cell::Cell;
use std::rc::Rc;

#[cfg(feature = "sdl")]
use gbuffer::display::{Display, InputEvent, RenderTarget, SdlSurface, DEFAULT_HEIGHT, DEFAULT_WIDTH};
#[cfg(feature = "sdl")]
use sdl2::keyboard::Keycode;

#[cfg(not(feature = "sdl"))]
const DEFAULT_WIDTH: u32 = 320;
#[cfg(not(feature = "sdl"))]
const DEFAULT_HEIGHT: u32 = 200;

/// Frames rendered when there is no window to show them in
#[cfg(not(feature = "sdl"))]
const HEADLESS_FRAMES: u32 = 120;

/// Ticks for the start-up fade from black
const FADE_TICKS: u32 = 60;

struct Options {
    width: u32,
    height: u32,
    vsync: bool,
    config: Option<String>,
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        config: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => options.vsync = false,
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        options.width = w;
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        options.height = h;
                    }
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    // WxH, e.g. 640x400
                    if let Some((w, h)) = args[i + 1].split_once('x') {
                        if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                            options.width = w;
                            options.height = h;
                        }
                    }
                    i += 1;
                }
            },
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: gbuffer-demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --width W, -w W           Set frame width (default: {})", DEFAULT_WIDTH);
                println!("  --height H, -h H          Set frame height (default: {})", DEFAULT_HEIGHT);
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 640x400)");
                println!("  --config PATH, -c PATH    Load render config JSON");
                println!("  --no-vsync                Disable VSync for uncapped framerate");
                println!("  --help                    Show this help message");
                std::process::exit(0);
            },
            other => log::warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    options
}

// ============================================================================
// Scene
// ============================================================================

/// Rainbow ramp over indices 1..=255, index 0 black
fn rainbow_palette() -> Palette {
    let mut palette = Palette::black();
    for i in 1..=255u8 {
        let h = f32::from(i) / 255.0 * 6.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        palette.set(i, (r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8);
    }
    palette
}

/// 16x16 ring sprite; the corners are index 0 and drop out of keyed blits
fn build_sprite() -> Result<SurfaceHandle, GfxError> {
    let sprite = PixelSurface::software(16, 16, 0)?;
    let mut view = Viewport::surface_view(&sprite);
    view.with_lock(|locked| {
        for y in 0..16 {
            for x in 0..16 {
                let (dx, dy) = (x - 8, y - 8);
                let d2 = dx * dx + dy * dy;
                if d2 < 64 {
                    locked.put(x, y, (40 + d2 * 3) as u8);
                }
            }
        }
    });
    Ok(sprite)
}

/// Two 4x4 icons: a hollow box and a diamond
fn icon_data() -> Vec<u8> {
    let c = 200;
    vec![
        c, c, c, c, //
        c, 0, 0, c, //
        c, 0, 0, c, //
        c, c, c, c, //
        0, c, c, 0, //
        c, 0, 0, c, //
        c, 0, 0, c, //
        0, c, c, 0,
    ]
}

struct Scene {
    sprite: Viewport,
    icons: Vec<u8>,
    icon_set: IconSet,
    windows: Vec<Rect>,
    shift: [u8; 256],
    frame: i32,
}

impl Scene {
    fn new(sprite: &SurfaceHandle, page: &Viewport) -> Self {
        let mut shift = identity_remap();
        for (i, entry) in shift.iter_mut().enumerate().skip(1) {
            *entry = (i as u8).wrapping_add(96).max(1);
        }
        Self {
            sprite: Viewport::surface_view(sprite),
            icons: icon_data(),
            icon_set: IconSet::new(4, 4, true),
            windows: vec![
                Rect::new(0, 0, page.width(), page.height()),
                Rect::new(8, 8, page.width() / 2, page.height() / 2),
            ],
            shift,
            frame: 0,
        }
    }

    /// Draw one frame onto the logic page
    fn render(&mut self) {
        self.frame += 1;
        let frame = self.frame;
        let sprite = &mut self.sprite;
        let (icons, icon_set, windows, shift) = (&self.icons, &self.icon_set, &self.windows, &self.shift);

        with_logic_page(|page| {
            let (w, h) = (page.width(), page.height());
            page.clear(1);

            // Checkerboard; the big squares take the hardware fill path when available
            let cell = 40;
            for cy in 0..(h / cell + 1) {
                for cx in 0..(w / cell + 1) {
                    if (cx + cy) % 2 == 0 {
                        let (x, y) = (cx * cell, cy * cell);
                        page.fill_rect(x, y, x + cell - 1, y + cell - 1, 16);
                    }
                }
            }

            page.draw_rect(0, 0, w - 1, h - 1, 255);
            page.draw_line(0, 0, w - 1, h - 1, 128);
            page.draw_line(w - 1, 0, 0, h - 1, 128);

            // Bouncing keyed sprite and a scaled, remapped copy
            let bx = (frame * 2) % (w - 16).max(1);
            let by = (frame * 3) % (h - 16).max(1);
            sprite.blit_at(page, bx, by, true);
            sprite.scale(page, 0, 0, w - 72, 8, 16, 16, 64, 64, true, Some(shift));

            for i in 0..8 {
                page.draw_stamp(icon_set, icons, (i % 2) as usize, i * 12, 4, None, 1, windows);
            }
            page.fat_put_pixel(w / 2, h / 2, (frame % 255 + 1) as u8, 4);

            // Scroll a strip of the page onto itself; the blit copes with the overlap
            let mut band = page.clone();
            band.blit(page, 0, h - 20, 2, h - 20, w - 4, 16, false);
        });
    }
}

// ============================================================================
// Entry point
// ============================================================================

fn load_config(path: Option<&str>) -> RenderConfig {
    let Some(path) = path else {
        return RenderConfig::default();
    };
    match RenderConfig::load(path) {
        Ok(config) => {
            log::info!("loaded render config from {}", path);
            config
        },
        Err(e) => {
            log::warn!("could not load {}: {}, using defaults", path, e);
            RenderConfig::default()
        },
    }
}

fn start_fade(palette: &mut PaletteState) -> Rc<Cell<bool>> {
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    palette.fade_palette_to(
        &rainbow_palette(),
        FADE_TICKS,
        Some(Box::new(move || {
            log::info!("palette fade complete");
            flag.set(true);
        })),
    );
    done
}

#[cfg(not(feature = "sdl"))]
fn main() -> Result<(), GfxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();
    let config = load_config(options.config.as_deref());

    let page_surface = PixelSurface::software(options.width as i32, options.height as i32, 0)?;
    page_surface.borrow_mut().set_config(config);
    let sprite = build_sprite()?;

    set_logic_page(Viewport::surface_view(&page_surface));
    let page = logic_page().ok_or_else(|| GfxError::Backend("no logic page".into()))?;
    let mut scene = Scene::new(&sprite, &page);
    let mut palette = PaletteState::new(Palette::black());
    let fade_done = start_fade(&mut palette);

    log::info!("rendering {} headless frames at {}x{}", HEADLESS_FRAMES, options.width, options.height);
    for _ in 0..HEADLESS_FRAMES {
        scene.render();
        palette.tick();
    }

    let mut view = Viewport::surface_view(&page_surface);
    let mut frame = vec![0u8; options.width as usize * options.height as usize];
    let copied = view.to_buffer_all(&mut frame);
    let checksum = frame.iter().fold(0u32, |acc, &p| acc.wrapping_mul(31).wrapping_add(u32::from(p)));
    log::info!(
        "final frame: {} bytes, checksum {:08x}, fade done: {}",
        copied,
        checksum,
        fade_done.get()
    );
    Ok(())
}

#[cfg(feature = "sdl")]
fn main() -> Result<(), GfxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();
    let config = load_config(options.config.as_deref());

    let (mut display, texture_creator) =
        Display::with_options("gbuffer", options.width, options.height, options.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, options.width, options.height)?;

    // Back buffer on an SDL surface so blits and big fills use SDL's blitter
    let native = SdlSurface::new(options.width, options.height)?;
    let page_surface = PixelSurface::hardware(Box::new(native))?;
    page_surface.borrow_mut().set_config(config);
    let sprite = build_sprite()?;

    set_logic_page(Viewport::surface_view(&page_surface));
    let page = logic_page().ok_or_else(|| GfxError::Backend("no logic page".into()))?;
    let mut scene = Scene::new(&sprite, &page);
    let mut palette = PaletteState::new(Palette::black());
    let _fade_done = start_fade(&mut palette);

    log::info!("gbuffer demo {}x{}, vsync {}", options.width, options.height, options.vsync);
    log::info!("Space - restart palette fade, Escape - quit");

    let mut view = Viewport::surface_view(&page_surface);
    'main: loop {
        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::Space) => {
                    palette.set_palette(&Palette::black());
                    start_fade(&mut palette);
                },
                InputEvent::KeyDown(_) => {},
            }
        }

        scene.render();
        palette.tick();
        display.present(&mut target, &mut view, palette.current())?;
    }

    Ok(())
}
