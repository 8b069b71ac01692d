use std::mem::size_of;

use glam::UVec2;
use lensing_core::{DispatchShape, UniformSnapshot};
use wgpu::{
    BindGroup, BindGroupLayout, Buffer, ComputePipeline, Device, Queue, Texture, TextureView,
};

use crate::error::GpuError;

pub const KERNEL_WGSL: &str = include_str!("../shaders/lensing.wgsl");

/// Format of the storage texture the kernel writes.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Workgroup attribute as written in `lensing.wgsl`; replaced with the
/// planned tile when the pipeline is built.
const WORKGROUP_ATTR: &str = "@workgroup_size(8, 8, 1)";

/// Uniform buffers are sized in 16-byte rows.
const UNIFORM_BUFFER_SIZE: u64 = (size_of::<UniformSnapshot>() as u64).next_multiple_of(16);

/// Kernel source with its workgroup size set to `tile`.
pub fn kernel_source(tile: UVec2) -> String {
    KERNEL_WGSL.replace(
        WORKGROUP_ATTR,
        &format!("@workgroup_size({}, {}, 1)", tile.x, tile.y),
    )
}

// ---------------------------------------------------------------------------
// FrameTarget: drawable-sized image the kernel writes into
// ---------------------------------------------------------------------------

pub struct FrameTarget {
    pub texture: Texture,
    pub view: TextureView,
    pub size: UVec2,
}

impl FrameTarget {
    pub fn new(device: &Device, size: UVec2) -> Self {
        let size = size.max(UVec2::ONE);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lensing_target"),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self { texture, view, size }
    }
}

// ---------------------------------------------------------------------------
// LensingKernel
// ---------------------------------------------------------------------------

/// The compute pipeline plus the uniform buffer its snapshot lives in.
pub struct LensingKernel {
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
    uniform_buf: Buffer,
    tile: UVec2,
}

impl LensingKernel {
    pub fn new(device: &Device, tile: UVec2) -> Result<Self, GpuError> {
        // binding 0 : UniformSnapshot uniform buffer
        // binding 1 : rgba8unorm storage texture (write-only)
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lensing_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: TARGET_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lensing_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lensing_uniforms"),
            size: UNIFORM_BUFFER_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lensing"),
            source: wgpu::ShaderSource::Wgsl(kernel_source(tile).into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("lensing"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: "main",
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Pipeline {
                label: "lensing",
                message: err.to_string(),
            });
        }

        log::info!("Lensing kernel built with {}x{} workgroups", tile.x, tile.y);

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buf,
            tile,
        })
    }

    /// Bind group pairing the uniform buffer with `target`. Rebuild it
    /// whenever the target is recreated.
    pub fn bind(&self, device: &Device, target: &FrameTarget) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lensing_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
            ],
        })
    }

    /// Upload `snapshot` and record the compute pass into `encoder`.
    ///
    /// The buffer write is queued ahead of this frame's submit, so the
    /// dispatch always sees its own frame's snapshot.
    pub fn encode(
        &self,
        queue: &Queue,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &BindGroup,
        snapshot: &UniformSnapshot,
        shape: &DispatchShape,
    ) {
        debug_assert_eq!(shape.tile, self.tile, "dispatch planned for another tile");
        queue.write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(snapshot));

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("lensing_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(shape.groups.x, shape.groups.y, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GpuContext;
    use lensing_core::dispatch::plan;
    use lensing_core::snapshot::build;
    use lensing_core::{KernelCapability, ParameterSet, SimulationClock};

    fn parse(src: &str) -> naga::Module {
        naga::front::wgsl::parse_str(src).unwrap_or_else(|e| panic!("{}", e.emit_to_string(src)))
    }

    fn validate(module: &naga::Module) {
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(module)
        .unwrap_or_else(|e| panic!("validation failed: {e:?}"));
    }

    #[test]
    fn kernel_parses_and_validates() {
        let module = parse(KERNEL_WGSL);
        validate(&module);
    }

    #[test]
    fn kernel_uniforms_match_snapshot_layout() {
        let module = parse(KERNEL_WGSL);
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Uniforms"))
            .expect("Uniforms struct missing");
        let naga::TypeInner::Struct { ref members, span } = ty.inner else {
            panic!("Uniforms is not a struct");
        };
        assert_eq!(members.len(), lensing_core::snapshot::SNAPSHOT_FIELDS);
        assert_eq!(span as usize, std::mem::size_of::<UniformSnapshot>());
        assert_eq!(members[0].name.as_deref(), Some("elapsed_time"));
        assert_eq!(members[13].name.as_deref(), Some("resolved_rotation"));
        assert_eq!(members[14].name.as_deref(), Some("auto_rotation_flag"));
        for (i, m) in members.iter().enumerate() {
            assert_eq!(m.offset as usize, i * 4, "member {:?}", m.name);
        }
    }

    #[test]
    fn workgroup_attribute_is_present_once() {
        assert_eq!(KERNEL_WGSL.matches(WORKGROUP_ATTR).count(), 1);
    }

    #[test]
    fn kernel_source_substitutes_tile() {
        let src = kernel_source(UVec2::new(32, 8));
        assert!(src.contains("@workgroup_size(32, 8, 1)"));
        assert!(!src.contains(WORKGROUP_ATTR));

        let module = parse(&src);
        validate(&module);
        assert_eq!(module.entry_points[0].workgroup_size, [32, 8, 1]);
    }

    #[test]
    fn uniform_buffer_rounds_to_rows() {
        assert_eq!(UNIFORM_BUFFER_SIZE, 64);
    }

    // --- Edge tiles -------------------------------------------------------------

    fn is_early_return(statement: &naga::Statement) -> bool {
        let naga::Statement::If { accept, .. } = statement else {
            return false;
        };
        let accept: Vec<_> = accept.iter().collect();
        matches!(accept[..], [naga::Statement::Return { value: None }])
    }

    #[test]
    fn bounds_guard_runs_before_any_write() {
        let module = parse(KERNEL_WGSL);
        let body: Vec<_> = module.entry_points[0].function.body.iter().collect();
        let guard = body
            .iter()
            .position(|s| is_early_return(s))
            .expect("no early-return bounds check");

        let store = |s: &&naga::Statement| matches!(s, naga::Statement::ImageStore { .. });
        assert!(
            !body[..guard].iter().any(store),
            "image store before bounds check"
        );
        assert!(
            body[guard..].iter().any(store),
            "no image store after bounds check"
        );
    }

    #[test]
    fn partial_tiles_cover_odd_sized_target() {
        const ROW_BYTES: u32 = 256;

        let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) else {
            eprintln!("no GPU adapter, skipping");
            return;
        };
        let device = &gpu.device;

        // 33x9 with 32x8 tiles: the second column and row of groups are
        // almost entirely outside the target.
        let capability = KernelCapability {
            preferred_width: 32,
            max_items_per_group: 256,
        };
        let size = UVec2::new(33, 9);
        let shape = plan(capability, size);
        assert_eq!(shape.groups, UVec2::new(2, 2));

        let kernel = LensingKernel::new(device, shape.tile).expect("kernel build");
        let target = FrameTarget::new(device, size);
        let bind_group = kernel.bind(device, &target);

        let mut clock = SimulationClock::new();
        clock.advance();
        let snapshot = build(&ParameterSet::default(), &clock.state());

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: u64::from(ROW_BYTES * size.y),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&Default::default());
        kernel.encode(&gpu.queue, &mut encoder, &bind_group, &snapshot, &shape);
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_BYTES),
                    rows_per_image: Some(size.y),
                },
            },
            wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(Some(encoder.finish()));
        let error = pollster::block_on(device.pop_error_scope());
        assert!(error.is_none(), "got {error:?}");

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| tx.send(r).unwrap());
        device.poll(wgpu::Maintain::Wait);
        rx.recv().unwrap().expect("map readback");

        // Every pixel inside the target was written with opaque alpha.
        let data = slice.get_mapped_range();
        for y in 0..size.y {
            for x in 0..size.x {
                let alpha = data[(y * ROW_BYTES + x * 4 + 3) as usize];
                assert_eq!(alpha, 255, "pixel {x},{y}: got {alpha}");
            }
        }
    }
}
