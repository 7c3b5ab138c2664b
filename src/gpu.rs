//! GPU plumbing: device acquisition, the ping-pong state texture pair, the
//! immutable per-slot data textures, and the compute pass that advances the
//! simulation one frame.
//!
//! Everything here is headless. Rendering belongs to the caller: they take
//! [`StateTexturePair::current_view`] and sample it from their own vertex
//! shader, using [`crate::buffers::SlotGrid::uv`] for the per-slot texel.

use std::sync::mpsc;

use crate::buffers::SlotGrid;
use crate::error::GpuError;
use crate::uniforms::SimUniforms;

/// Workgroup side length of the simulation pass; must match the generated
/// shader's `@workgroup_size`.
const WORKGROUP_SIZE: u32 = 8;

/// Shared device and queue. Cheap to clone; clones refer to the same device.
#[derive(Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire a headless device, blocking on adapter negotiation.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    /// Acquire a headless device.
    pub async fn new_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fbosim device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self { device, queue })
    }

    /// Wrap an existing device/queue, for embedding in a renderer that owns
    /// its own context.
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

/// Upload a `4 * side * side` float buffer as an immutable rgba32float
/// texture (spawn records, random records, direction seeds).
pub(crate) fn create_data_texture(
    gpu: &GpuContext,
    label: &str,
    grid: SlotGrid,
    data: &[f32],
) -> wgpu::Texture {
    debug_assert_eq!(data.len() as u32, grid.slot_count() * 4);
    let size = wgpu::Extent3d {
        width: grid.side(),
        height: grid.side(),
        depth_or_array_layers: 1,
    };
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(data),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(grid.side() * 16),
            rows_per_image: Some(grid.side()),
        },
        size,
    );
    texture
}

/// The double-buffered particle state.
///
/// One texture holds the latest state (read side of the next pass, and what
/// the renderer samples); the other is the write target. Roles swap after
/// every dispatch. The same texture is never bound both ways in one pass.
pub struct StateTexturePair {
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    /// Index of the texture holding the latest state.
    current: usize,
}

impl StateTexturePair {
    /// Create both textures, each initialized to `initial_state` (every slot
    /// dormant at its spawn position).
    pub(crate) fn new(gpu: &GpuContext, grid: SlotGrid, initial_state: &[f32]) -> Self {
        let size = wgpu::Extent3d {
            width: grid.side(),
            height: grid.side(),
            depth_or_array_layers: 1,
        };
        let make = |label: &str| {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(initial_state),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(grid.side() * 16),
                    rows_per_image: Some(grid.side()),
                },
                size,
            );
            texture
        };

        let textures = [make("state texture 0"), make("state texture 1")];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        Self {
            textures,
            views,
            current: 0,
        }
    }

    /// Texture holding the latest simulation results.
    pub fn current_texture(&self) -> &wgpu::Texture {
        &self.textures[self.current]
    }

    /// View of the latest results, for the renderer to sample.
    pub fn current_view(&self) -> &wgpu::TextureView {
        &self.views[self.current]
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

/// The compiled simulation pass for one program variant.
///
/// Holds two bind groups, one per ping-pong orientation, so a dispatch never
/// rebuilds bind state.
pub struct SimulationPass {
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    /// `bind_groups[i]` reads state texture `i` and writes the other.
    bind_groups: [wgpu::BindGroup; 2],
    grid: SlotGrid,
}

impl SimulationPass {
    pub(crate) fn new(
        gpu: &GpuContext,
        grid: SlotGrid,
        shader_source: &str,
        state: &StateTexturePair,
        spawn_view: &wgpu::TextureView,
        rand_view: &wgpu::TextureView,
        seed_view: &wgpu::TextureView,
    ) -> Self {
        let module = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simulation shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let sampled = wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        };
        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("simulation bind group layout"),
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
                        ty: sampled,
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba32Float,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: sampled,
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 4,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: sampled,
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 5,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: sampled,
                        count: None,
                    },
                ],
            });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("simulation pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("simulation pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("simulation uniforms"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let make_bind_group = |read: usize| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("simulation bind group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&state.views[read]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&state.views[1 - read]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(spawn_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(rand_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(seed_view),
                    },
                ],
            })
        };
        let bind_groups = [make_bind_group(0), make_bind_group(1)];

        Self {
            pipeline,
            uniform_buffer,
            bind_groups,
            grid,
        }
    }

    /// Run one simulation pass: upload the uniforms, dispatch over the grid,
    /// and swap the state pair so `current` is the freshly written texture.
    pub(crate) fn dispatch(
        &self,
        gpu: &GpuContext,
        state: &mut StateTexturePair,
        uniforms: &SimUniforms,
    ) {
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("simulation encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("simulation pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[state.current], &[]);
            let groups = self.grid.side().div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, groups, 1);
        }
        gpu.queue.submit(Some(encoder.finish()));
        state.swap();
    }
}

/// Copy rows must be aligned to `COPY_BYTES_PER_ROW_ALIGNMENT` (256).
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 16;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Read a state texture back to the CPU as `4 * slot_count` floats in slot
/// order. Blocks until the copy completes; debug and test path, not meant
/// for per-frame use.
pub(crate) fn read_state_texture(
    gpu: &GpuContext,
    texture: &wgpu::Texture,
    grid: SlotGrid,
) -> Result<Vec<f32>, GpuError> {
    let side = grid.side();
    let padded = padded_bytes_per_row(side);

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("state readback"),
        size: (padded * side) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(side),
            },
        },
        wgpu::Extent3d {
            width: side,
            height: side,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    gpu.device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| GpuError::BufferMapping("map callback never ran".to_string()))?
        .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

    let data = slice.get_mapped_range();
    let mut out = Vec::with_capacity((grid.slot_count() * 4) as usize);
    for row in 0..side {
        let start = (row * padded) as usize;
        let end = start + (side * 16) as usize;
        out.extend_from_slice(bytemuck::cast_slice(&data[start..end]));
    }
    drop(data);
    buffer.unmap();

    Ok(out)
}
