//! Layers — spinning primitives in a game layer, frame stats in an overlay.
//!
//! ```text
//! cargo run --example layers                     # window
//! cargo run --example layers --features egui     # window + egui stats panel
//! cargo run --example layers -- --headless 120   # 120 frames, no GPU
//! cargo run --example layers -- --config app.json
//! ```

use std::time::Duration;

use anyhow::Context as _;
use strata::logging;
use strata::prelude::*;

/// Rotation speed of the front row, in degrees per second.
const SPIN_SPEED: f32 = 90.0;

// ── Game layer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Spin {
    axis: Vec3,
    speed: f32,
}

struct GameLayer {
    scene: Scene,
}

impl GameLayer {
    fn new() -> Self {
        Self {
            scene: Scene::new("showcase"),
        }
    }
}

impl Layer for GameLayer {
    fn on_attach(&mut self, ctx: &mut AttachContext<'_>) -> anyhow::Result<()> {
        let meshes = &mut ctx.assets.meshes;
        let cube = meshes.add_primitive(PrimitiveShape::Cube { size: 1.5 });
        let sphere = meshes.add_primitive(PrimitiveShape::UNIT_SPHERE);
        let cylinder = meshes.add_primitive(PrimitiveShape::Cylinder {
            radius: 0.6,
            height: 2.5,
            slices: 24,
        });
        let ground = meshes.add_primitive(PrimitiveShape::Plane {
            width: 20.0,
            length: 20.0,
        });

        let materials = &mut ctx.assets.materials;
        let red = materials.add(Material::new(Color::rgb(0.85, 0.2, 0.2)));
        let cyan = materials.add(Material::new(Color::rgb(0.1, 0.8, 0.8)));
        let gold = materials.add(Material::new(Color::rgb(1.0, 0.766, 0.336)));
        let slate = materials.add(Material::new(Color::rgb(0.25, 0.25, 0.28)));

        self.scene
            .spawn("ground")
            .insert(MeshRenderer::new(ground, slate))?;

        let row = [
            ("cube", cube, red, Vec3::new(-3.0, 0.76, 0.0), Vec3::Y),
            ("cylinder", cylinder, cyan, Vec3::new(0.0, 1.26, 0.0), Vec3::X),
            ("sphere", sphere, gold, Vec3::new(3.0, 0.6, 0.0), Vec3::new(1.0, 1.0, 0.0)),
        ];
        for (name, mesh, material, position, axis) in row {
            let mut entity = self
                .scene
                .spawn(name)
                .insert(MeshRenderer::new(mesh, material))?
                .insert(Spin {
                    axis: axis.normalize(),
                    speed: SPIN_SPEED,
                })?;
            entity.transform_mut()?.set_position(position);
        }

        ctx.logs.app.info(format_args!(
            "scene `{}` ready with {} entities",
            self.scene.name(),
            self.scene.entity_count()
        ));
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let dt = ctx.time.delta_secs();
        let spinning: Vec<(Entity, Spin)> = self.scene.iter::<Spin>().map(|(e, s)| (e, *s)).collect();
        for (entity, spin) in spinning {
            self.scene
                .transform_mut(entity)?
                .rotate_axis_angle(spin.speed * dt, spin.axis);
        }
        self.scene.render(ctx);
        Ok(())
    }

    fn on_detach(&mut self) {
        self.scene.clear();
    }
}

// ── Stats overlay ────────────────────────────────────────────────────────

/// Shows frame stats in an egui panel when available, and logs them once a
/// second either way.
#[derive(Default)]
struct StatsOverlay {
    last_report: Duration,
}

impl Layer for StatsOverlay {
    fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_ui(&mut self, ctx: &mut UiContext<'_>) -> anyhow::Result<()> {
        let stats = *ctx.stats;
        let fps = ctx.time.smoothed_fps();

        #[cfg(feature = "egui")]
        if let Some(overlay) = ctx.backend::<EguiOverlay>() {
            egui::Window::new("stats").show(overlay.context(), |ui| {
                ui.label(format!("frame {}", stats.frame));
                ui.label(format!("{fps:.0} fps"));
                ui.label(format!("{} draw calls", stats.draw_calls));
            });
        }

        if ctx.time.elapsed() - self.last_report >= Duration::from_secs(1) {
            self.last_report = ctx.time.elapsed();
            ctx.logs.app.info(format_args!(
                "frame {:>5}  {fps:>6.1} fps  {} draws",
                stats.frame, stats.draw_calls
            ));
        }
        Ok(())
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

struct Args {
    headless: Option<u64>,
    config: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        headless: None,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--headless" => {
                let frames = match iter.next() {
                    Some(n) => n.parse().context("--headless takes a frame count")?,
                    None => 300,
                };
                args.headless = Some(frames);
            }
            "--config" => {
                args.config = Some(iter.next().context("--config takes a path")?);
            }
            other => anyhow::bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default().with_title("strata: layers"),
    };
    let logs = logging::init(&config.log)?;

    let mut app = Application::new(config).with_logs(logs);
    app.push_layer(GameLayer::new())?;
    app.push_overlay(StatsOverlay::default())?;

    match args.headless {
        Some(frames) => {
            let (w, h) = (app.config().width, app.config().height);
            let mut window = HeadlessWindow::new(w, h).close_after(frames);
            app.run(&mut window)?;
            logs.app.info(format_args!(
                "headless run finished after {} frames",
                window.presented_frames()
            ));
        }
        None => run_windowed(&mut app)?,
    }
    Ok(())
}

#[cfg(feature = "window")]
fn run_windowed(app: &mut Application) -> anyhow::Result<()> {
    let mut window = WinitWindow::new(app.config())?;
    app.run(&mut window)?;
    Ok(())
}

#[cfg(not(feature = "window"))]
fn run_windowed(_app: &mut Application) -> anyhow::Result<()> {
    anyhow::bail!("built without the `window` feature; pass --headless")
}
