use glam::UVec2;
use lensing_core::{DispatchShape, FrameBackend, SkipReason, UniformSnapshot};
use lensing_gpu::{FramePresenter, FrameTarget, GpuContext, GpuError, LensingKernel};

// ---------------------------------------------------------------------------
// Overlay: egui output waiting to be drawn on top of the next frame
// ---------------------------------------------------------------------------

pub struct OverlayFrame {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

pub struct Drawable {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

pub struct Submission {
    encoder: wgpu::CommandEncoder,
    extra: Vec<wgpu::CommandBuffer>,
    free: Vec<egui::TextureId>,
}

// ---------------------------------------------------------------------------
// SurfaceBackend
// ---------------------------------------------------------------------------

/// [`FrameBackend`] over a window surface: the kernel writes the frame
/// target, then one render pass copies it onto the surface texture and draws
/// the egui overlay.
pub struct SurfaceBackend {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,

    kernel: LensingKernel,
    presenter: FramePresenter,
    target: FrameTarget,
    kernel_bg: wgpu::BindGroup,
    present_bg: wgpu::BindGroup,

    egui_renderer: egui_wgpu::Renderer,
    overlay: Option<OverlayFrame>,

    /// Set once the device ran out of memory; no later frame can succeed.
    lost: bool,
}

impl SurfaceBackend {
    pub fn new(
        gpu: GpuContext,
        surface: wgpu::Surface<'static>,
        size: UVec2,
        tile: UVec2,
        present_mode: wgpu::PresentMode,
    ) -> Result<Self, GpuError> {
        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| GpuError::UnsupportedSurface(gpu.adapter.get_info().name))?;

        let present_mode = if caps.present_modes.contains(&present_mode) {
            present_mode
        } else {
            log::warn!("{present_mode:?} unsupported, falling back to Fifo");
            wgpu::PresentMode::Fifo
        };

        let size = size.max(UVec2::ONE);
        let alpha_mode = caps.alpha_modes.first().copied().unwrap_or_default();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.x,
            height: size.y,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        log::info!(
            "Surface configured: {}×{} {:?} {:?}",
            config.width,
            config.height,
            format,
            present_mode
        );

        let kernel = LensingKernel::new(&gpu.device, tile)?;
        let presenter = FramePresenter::new(&gpu.device, format)?;
        let target = FrameTarget::new(&gpu.device, size);
        let kernel_bg = kernel.bind(&gpu.device, &target);
        let present_bg = presenter.bind(&gpu.device, &target);
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, format, None, 1, false);

        Ok(Self {
            gpu,
            surface,
            config,
            kernel,
            presenter,
            target,
            kernel_bg,
            present_bg,
            egui_renderer,
            overlay: None,
            lost: false,
        })
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.config.width, self.config.height)
    }

    /// Reconfigure the surface and rebuild the size-dependent frame target.
    pub fn resize(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 || size == self.size() {
            return;
        }
        self.config.width = size.x;
        self.config.height = size.y;
        self.surface.configure(&self.gpu.device, &self.config);

        self.target = FrameTarget::new(&self.gpu.device, size);
        self.kernel_bg = self.kernel.bind(&self.gpu.device, &self.target);
        self.present_bg = self.presenter.bind(&self.gpu.device, &self.target);

        log::debug!("Surface resized to {}×{}", size.x, size.y);
    }

    /// Overlay to draw with the next frame. Replaces one that never made it
    /// to the screen.
    pub fn set_overlay(&mut self, overlay: OverlayFrame) {
        if let Some(stale) = self.overlay.take() {
            // Texture uploads must not be lost even if the frame was dropped.
            for (id, delta) in &stale.textures_delta.set {
                self.egui_renderer
                    .update_texture(&self.gpu.device, &self.gpu.queue, *id, delta);
            }
            for id in &stale.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }
        self.overlay = Some(overlay);
    }

    /// Upload the pending overlay's textures and buffers. Returns what the
    /// render pass needs to draw it.
    fn encode_overlay(
        &mut self,
        submission: &mut Submission,
    ) -> Option<(Vec<egui::ClippedPrimitive>, egui_wgpu::ScreenDescriptor)> {
        let overlay = self.overlay.take()?;
        for (id, delta) in &overlay.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: overlay.pixels_per_point,
        };
        let extra = self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut submission.encoder,
            &overlay.paint_jobs,
            &screen,
        );
        submission.extra.extend(extra);
        submission.free.extend(overlay.textures_delta.free);
        Some((overlay.paint_jobs, screen))
    }
}

impl FrameBackend for SurfaceBackend {
    type Drawable = Drawable;
    type Submission = Submission;

    fn acquire_drawable(&mut self) -> Result<Drawable, SkipReason> {
        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Timeout) => return Err(SkipReason::Drawable),
            // Surface lost / outdated: reconfigure and pick up on the next tick.
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.config);
                return Err(SkipReason::Drawable);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                self.lost = true;
                return Err(SkipReason::Drawable);
            }
            #[allow(unreachable_patterns)]
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return Err(SkipReason::Drawable);
            }
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Drawable { texture, view })
    }

    fn begin_submission(&mut self) -> Result<Submission, SkipReason> {
        let desc = wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        };
        let encoder = self.gpu.device.create_command_encoder(&desc);
        Ok(Submission {
            encoder,
            extra: Vec::new(),
            free: Vec::new(),
        })
    }

    fn encode(
        &mut self,
        submission: &mut Submission,
        drawable: &Drawable,
        snapshot: &UniformSnapshot,
        shape: &DispatchShape,
    ) -> Result<(), SkipReason> {
        if shape.drawable != self.target.size {
            log::debug!(
                "dispatch for {}x{} but target is {}x{}",
                shape.drawable.x,
                shape.drawable.y,
                self.target.size.x,
                self.target.size.y
            );
            return Err(SkipReason::Encoder);
        }

        // --- 1. Lensing compute pass ----------------------------------------
        self.kernel.encode(
            &self.gpu.queue,
            &mut submission.encoder,
            &self.kernel_bg,
            snapshot,
            shape,
        );

        // --- 2. Copy to surface + overlay ----------------------------------
        let overlay = self.encode_overlay(submission);
        let desc = wgpu::RenderPassDescriptor {
            label: Some("present-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &drawable.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        };
        let encoder = &mut submission.encoder;
        let mut pass = encoder.begin_render_pass(&desc).forget_lifetime();
        self.presenter.draw(&mut pass, &self.present_bg);
        if let Some((paint_jobs, screen)) = &overlay {
            self.egui_renderer.render(&mut pass, paint_jobs, screen);
        }
        Ok(())
    }

    fn submit(&mut self, submission: Submission) {
        let Submission {
            encoder,
            extra,
            free,
        } = submission;
        let buffers = extra.into_iter().chain(std::iter::once(encoder.finish()));
        self.gpu.queue.submit(buffers);
        for id in &free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn present(&mut self, drawable: Drawable) {
        drawable.texture.present();
    }
}
