use lensing_core::KernelCapability;
use wgpu::{Adapter, Device, Instance, Queue, Surface};

use crate::error::GpuError;

pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Create a headless GPU context (no surface), for compute-only work.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::default();
        let adapter = request_adapter(&instance, None).await?;
        Self::open(instance, adapter).await
    }

    /// Create a context whose adapter can present to `target`, returning
    /// the surface alongside it.
    pub async fn with_surface(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
    ) -> Result<(Self, Surface<'static>), GpuError> {
        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;
        let adapter = request_adapter(&instance, Some(&surface)).await?;
        let ctx = Self::open(instance, adapter).await?;
        Ok((ctx, surface))
    }

    async fn open(instance: Instance, adapter: Adapter) -> Result<Self, GpuError> {
        log::info!("GPU adapter: {}", adapter.get_info().name);

        // Ask for what the adapter offers so larger workgroups are allowed.
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lensing device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn kernel_capability(&self, preferred_width: u32) -> KernelCapability {
        kernel_capability(&self.device.limits(), preferred_width)
    }
}

async fn request_adapter(
    instance: &Instance,
    surface: Option<&Surface<'_>>,
) -> Result<Adapter, GpuError> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)
}

/// Translate device limits into the kernel capability the dispatch planner
/// works from.
///
/// wgpu reports no per-pipeline execution width, so the preferred width comes
/// from configuration; it is clamped to the x limit, and the item budget is
/// reduced so the derived tile height stays within the y limit.
pub fn kernel_capability(limits: &wgpu::Limits, preferred_width: u32) -> KernelCapability {
    let invocations = limits.max_compute_invocations_per_workgroup.max(1);
    let max_x = limits.max_compute_workgroup_size_x.min(invocations).max(1);
    let max_y = limits.max_compute_workgroup_size_y.max(1);
    let width = preferred_width.clamp(1, max_x);
    let max_items = invocations.min(width.saturating_mul(max_y));
    KernelCapability {
        preferred_width: width,
        max_items_per_group: max_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;

    #[test]
    fn default_limits_give_32_by_8_tiles() {
        let cap = kernel_capability(&wgpu::Limits::default(), 32);
        assert_eq!(cap.preferred_width, 32);
        assert_eq!(cap.max_items_per_group, 256);
        assert_eq!(cap.tile(), UVec2::new(32, 8));
    }

    #[test]
    fn large_budget_allows_square_tiles() {
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_compute_workgroup_size_x: 1024,
            max_compute_workgroup_size_y: 1024,
            ..wgpu::Limits::default()
        };
        assert_eq!(kernel_capability(&limits, 32).tile(), UVec2::new(32, 32));
    }

    #[test]
    fn preferred_width_clamped_to_x_limit() {
        let cap = kernel_capability(&wgpu::Limits::default(), 4096);
        assert_eq!(cap.preferred_width, 256);
        assert_eq!(cap.tile(), UVec2::new(256, 1));
    }

    #[test]
    fn tile_height_respects_y_limit() {
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_compute_workgroup_size_x: 1024,
            max_compute_workgroup_size_y: 16,
            ..wgpu::Limits::default()
        };
        let tile = kernel_capability(&limits, 8).tile();
        assert_eq!(tile, UVec2::new(8, 16));
        assert!(tile.x * tile.y <= 1024);
    }
}
