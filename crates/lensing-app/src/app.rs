use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::UVec2;
use lensing_core::{
    Control, ControlHandle, FrameDriver, FrameOutcome, ParamUpdate, ParameterStore,
};
use lensing_gpu::GpuContext;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::backend::{OverlayFrame, SurfaceBackend};
use crate::config::Cli;
use crate::input::{self, InputAction};
use crate::panel::{self, Readout};

// ---------------------------------------------------------------------------
// Simple FPS counter: logs to console once per second
// ---------------------------------------------------------------------------

struct FpsCounter {
    frames: u32,
    last_report: Instant,
    last_fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            last_report: Instant::now(),
            last_fps: 0.0,
        }
    }

    /// Increment the frame count.  Returns the FPS value if a full second has
    /// elapsed since the last report (so the caller can log it).
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.last_fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.last_report = Instant::now();
            Some(self.last_fps)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    window: Arc<Window>,
    backend: SurfaceBackend,
    driver: FrameDriver,
    controls: ControlHandle,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    show_panel: bool,

    fps: FpsCounter,
}

impl App {
    /// Initialise wgpu for a given window. Any failure here is fatal: the
    /// caller reports it and stops the event loop.
    pub fn new(window: Arc<Window>, cli: &Cli) -> Result<Self> {
        let size = window.inner_size();
        let drawable = UVec2::new(size.width.max(1), size.height.max(1));

        let (gpu, surface) = pollster::block_on(GpuContext::with_surface(Arc::clone(&window)))
            .context("failed to initialise GPU")?;

        let capability = gpu.kernel_capability(cli.tile_width);
        let driver = FrameDriver::new(ParameterStore::new(), capability, drawable);
        let tile = driver.planner().tile();
        log::info!(
            "Kernel capability: width {} × max {} items → tile {}×{}",
            capability.preferred_width,
            capability.max_items_per_group,
            tile.x,
            tile.y
        );

        let max_texture_side = gpu.device.limits().max_texture_dimension_2d as usize;
        let backend = SurfaceBackend::new(gpu, surface, drawable, tile, cli.present_mode.into())
            .context("failed to build render pipelines")?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side),
        );

        let controls = driver.control_handle();
        Ok(Self {
            window,
            backend,
            driver,
            controls,
            egui_ctx,
            egui_state,
            show_panel: !cli.hide_controls,
            fps: FpsCounter::new(),
        })
    }

    /// True once the device is gone and the app should exit.
    pub fn is_lost(&self) -> bool {
        self.backend.is_lost()
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let size = UVec2::new(width, height);
        self.backend.resize(size);
        self.driver.resize(size);
    }

    /// Apply an action to the app state.
    ///
    /// Returns `true` if the app should exit (i.e. action was `Quit`).
    pub fn handle_action(&mut self, action: InputAction) -> bool {
        // Relative updates resolve when drained, so presses that land before
        // the next frame all count.
        match action {
            InputAction::ToggleAutoRotation => {
                log::info!("Toggle auto rotation");
                self.controls.send(ParamUpdate::ToggleAutoRotation);
            }
            InputAction::ZoomIn | InputAction::ZoomOut => {
                let delta = input::zoom_delta(action).unwrap_or_default();
                log::debug!("camera distance {delta:+}");
                self.controls.send(ParamUpdate::Nudge(Control::CameraDistance, delta));
            }
            InputAction::ResetDefaults => {
                log::info!("Reset to defaults");
                self.controls.send(ParamUpdate::ResetDefaults);
            }
            InputAction::TogglePanel => self.show_panel = !self.show_panel,
            InputAction::Quit => return true,
        }
        false
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    /// Run one full frame: build the overlay, then let the driver advance,
    /// dispatch and present.
    pub fn render(&mut self) -> FrameOutcome {
        self.run_overlay();
        let outcome = self.driver.frame(&mut self.backend);

        if let Some(fps) = self.fps.tick() {
            let stats = self.driver.stats();
            let sim = self.driver.simulation();
            log::debug!(
                "FPS: {:.1}  t: {:.2}s  presented: {}  dropped: {}",
                fps,
                sim.elapsed_time,
                stats.presented,
                stats.dropped,
            );
        }
        outcome
    }

    fn run_overlay(&mut self) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let params = *self.driver.parameters();
        let readout = Readout {
            fps: self.fps.last_fps,
            stats: self.driver.stats(),
        };
        let show_panel = self.show_panel;
        let controls = &self.controls;

        let output = self.egui_ctx.run(raw_input, |ctx| {
            if show_panel {
                panel::draw(ctx, &params, controls, &readout);
            }
        });
        self.egui_state
            .handle_platform_output(&self.window, output.platform_output);

        let paint_jobs = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        self.backend.set_overlay(OverlayFrame {
            paint_jobs,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        });
    }
}
