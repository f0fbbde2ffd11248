use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use tessera_engine::coords::{ColorRgba, Rect, Vec2, Viewport};
use tessera_engine::core::{App, AppControl, FrameCtx};
use tessera_engine::device::GpuInit;
use tessera_engine::logging::{init_logging, LoggingConfig};
use tessera_engine::render::sprite::{
    AtlasRegion, AtlasSampling, CameraUniform, Sprite, SpriteAtlas, SpriteBatch, SpriteRenderer,
};
use tessera_engine::window::{Runtime, RuntimeConfig};

const SPRITE_COUNT: usize = 5_000;

const CELL: u32 = 16;
const GRID: u32 = 2;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Tessera Studio".to_string(),
        ..Default::default()
    };

    log::info!("drawing {SPRITE_COUNT} sprites, press Escape to quit");
    Runtime::run(config, GpuInit::default(), Studio::new(SPRITE_COUNT))
}

/// One bouncing sprite.
struct Mover {
    pos: Vec2,
    vel: Vec2,
    size: f32,
    cell: AtlasRegion,
    tint: ColorRgba,
}

struct Studio {
    renderer: SpriteRenderer,
    atlas: Option<SpriteAtlas>,
    batch: SpriteBatch,
    movers: Vec<Mover>,
    rng: StdRng,
    seeded: bool,
}

impl Studio {
    fn new(count: usize) -> Self {
        Self {
            renderer: SpriteRenderer::new(),
            atlas: None,
            batch: SpriteBatch::new(count),
            movers: Vec::with_capacity(count),
            rng: StdRng::seed_from_u64(0x7e55_e2a),
            seeded: false,
        }
    }

    fn seed(&mut self, count: usize, viewport: Viewport) {
        let rng = &mut self.rng;
        for _ in 0..count {
            let size: f32 = rng.random_range(8.0..32.0);
            let speed: f32 = rng.random_range(40.0..200.0);
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let cell = rng.random_range(0..GRID * GRID);

            let pos = Vec2::new(
                rng.random_range(0.0..=(viewport.width - size).max(0.0)),
                rng.random_range(0.0..=(viewport.height - size).max(0.0)),
            );
            let tint = ColorRgba::new(
                rng.random_range(0.4..=1.0),
                rng.random_range(0.4..=1.0),
                rng.random_range(0.4..=1.0),
                rng.random_range(0.6..=1.0),
            );

            self.movers.push(Mover {
                pos,
                vel: Vec2::new(angle.cos() * speed, angle.sin() * speed),
                size,
                cell: AtlasRegion::grid_cell(cell % GRID, cell / GRID, GRID, GRID),
                tint,
            });
        }
        self.seeded = true;
    }

    fn step(&mut self, dt: f32, viewport: Viewport) {
        for m in &mut self.movers {
            m.pos = m.pos + m.vel * dt;

            let max_x = (viewport.width - m.size).max(0.0);
            let max_y = (viewport.height - m.size).max(0.0);
            if m.pos.x < 0.0 || m.pos.x > max_x {
                m.vel.x = -m.vel.x;
                m.pos.x = m.pos.x.clamp(0.0, max_x);
            }
            if m.pos.y < 0.0 || m.pos.y > max_y {
                m.vel.y = -m.vel.y;
                m.pos.y = m.pos.y.clamp(0.0, max_y);
            }
        }

        self.batch.clear();
        self.batch.extend(self.movers.iter().map(|m| {
            Sprite::new(Rect::new(m.pos.x, m.pos.y, m.size, m.size))
                .region(m.cell)
                .tint(m.tint)
        }));
    }
}

impl App for Studio {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.logical_key == Key::Named(NamedKey::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let viewport = ctx.window.viewport();
        if !viewport.is_valid() {
            return AppControl::Continue;
        }

        if self.atlas.is_none() {
            let pixels = atlas_pixels();
            let size = CELL * GRID;
            match SpriteAtlas::from_rgba8(
                ctx.gpu.device(),
                ctx.gpu.queue(),
                size,
                size,
                &pixels,
                AtlasSampling::PIXEL_ART,
                "studio atlas",
            ) {
                Ok(atlas) => self.atlas = Some(atlas),
                Err(e) => {
                    log::error!("failed to create atlas: {e:#}");
                    return AppControl::Exit;
                }
            }
        }

        if !self.seeded {
            self.seed(SPRITE_COUNT, viewport);
        }
        self.step(ctx.time.dt, viewport);

        let Self { renderer, atlas, batch, .. } = self;
        let Some(atlas) = atlas.as_ref() else { return AppControl::Continue };

        let clear = ColorRgba::new(0.02, 0.02, 0.04, 1.0);
        ctx.render(clear, |rctx, target| {
            let camera = CameraUniform::orthographic(rctx.viewport);
            renderer.render(rctx, target, batch, atlas, &camera);
        })
    }
}

/// White shapes on transparency, one per cell: disc, ring, diamond, box.
fn atlas_pixels() -> Vec<u8> {
    let size = CELL * GRID;
    let mut px = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let (col, row) = (x / CELL, y / CELL);
            // cell-local coords centered on the cell, in [-1, 1]
            let lx = ((x % CELL) as f32 + 0.5) / CELL as f32 * 2.0 - 1.0;
            let ly = ((y % CELL) as f32 + 0.5) / CELL as f32 * 2.0 - 1.0;
            let r = (lx * lx + ly * ly).sqrt();

            let inside = match (col, row) {
                (0, 0) => r <= 0.9,
                (1, 0) => (0.55..=0.9).contains(&r),
                (0, 1) => lx.abs() + ly.abs() <= 0.9,
                _ => lx.abs().max(ly.abs()) <= 0.85,
            };

            if inside {
                let i = ((y * size + x) * 4) as usize;
                px[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
    }
    px
}
