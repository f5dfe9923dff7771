mod camera;
mod lines;
pub mod shaders;
pub mod sprite;
mod upscale;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use winit::dpi::PhysicalSize;
use winit::window::Window;

pub use camera::Camera;
pub use lines::LineBatch;
use shaders::POINT_SHADER;
use sprite::{radial_sprite, SpriteTexture, SPRITE_SIZE};
use upscale::Upscale;

use crate::connections::LineVertex;
use crate::error::GpuError;
use crate::options::BackgroundOptions;
use crate::topology::ParticleCloud;

/// Global opacity of the particle sprites.
pub const POINT_OPACITY: f32 = 0.8;
/// Global opacity of the connection lines.
pub const LINE_OPACITY: f32 = 0.4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    params: [f32; 4],
}

/// Per-particle instance data.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

/// Pack the cloud into instance data.
pub fn pack_particles(cloud: &ParticleCloud, out: &mut Vec<GpuParticle>) {
    out.clear();
    out.extend(
        cloud
            .positions
            .iter()
            .zip(&cloud.sizes)
            .zip(&cloud.colors)
            .map(|((position, size), color)| GpuParticle {
                position: position.to_array(),
                size: *size,
                color: color.to_array(),
                _pad: 0.0,
            }),
    );
}

/// Three.js-style additive blending: `src * src_alpha + dst`.
pub(crate) fn additive_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

pub(crate) fn multisample_state(sample_count: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: sample_count,
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

/// Size to render the scene at for a window of `physical` pixels.
///
/// Displays denser than `max_ratio` device pixels per logical pixel get
/// `logical * max_ratio`; everything else renders at full size.
pub fn render_size(physical: PhysicalSize<u32>, scale_factor: f64, max_ratio: f64) -> PhysicalSize<u32> {
    if scale_factor <= max_ratio {
        return physical;
    }
    let shrink = max_ratio / scale_factor;
    PhysicalSize::new(
        ((physical.width as f64 * shrink).round() as u32).max(1),
        ((physical.height as f64 * shrink).round() as u32).max(1),
    )
}

/// Whether any GPU adapter is available for rendering.
pub fn check_gpu_support() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).is_some()
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,
    scale_factor: f64,
    max_pixel_ratio: f64,
    /// Present when the scene renders below surface resolution.
    upscale: Option<Upscale>,
    point_pipeline: wgpu::RenderPipeline,
    particle_buffer: wgpu::Buffer,
    particle_capacity: usize,
    num_particles: u32,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    sprite_bind_group: wgpu::BindGroup,
    lines: Option<LineBatch>,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        options: &BackgroundOptions,
        particle_count: usize,
        line_vertices: &[LineVertex],
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let max_pixel_ratio = options.max_pixel_ratio();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        // Prefer a compositing mode that lets the desktop show through
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .unwrap_or(surface_caps.alpha_modes[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let wanted_samples = options.sample_count();
        let sample_count = if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(wanted_samples)
        {
            wanted_samples
        } else {
            1
        };
        let scene_size = render_size(
            PhysicalSize::new(config.width, config.height),
            scale_factor,
            max_pixel_ratio,
        );
        let msaa_view = create_msaa_view(&device, scene_size, config.format, sample_count);
        let upscale = create_upscale(&device, &config, scene_size);

        let camera = Camera::new(config.width as f32 / config.height as f32);

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let sprite = SpriteTexture::upload(&device, &queue, &radial_sprite(SPRITE_SIZE));

        let sprite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sprite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &sprite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sprite.sampler),
                },
            ],
        });

        let particle_capacity = particle_count.max(1);
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: (particle_capacity * std::mem::size_of::<GpuParticle>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });

        let point_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Point Pipeline Layout"),
                bind_group_layouts: &[&globals_layout, &sprite_layout],
                push_constant_ranges: &[],
            });

        let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Pipeline"),
            layout: Some(&point_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &point_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GpuParticle>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3, // position
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32, // size
                        },
                        wgpu::VertexAttribute {
                            offset: 16,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x3, // color
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &point_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(additive_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: multisample_state(sample_count),
            multiview: None,
            cache: None,
        });

        let lines = LineBatch::new(
            &device,
            &globals_layout,
            line_vertices,
            config.format,
            sample_count,
        );

        tracing::info!(
            adapter = %adapter.get_info().name,
            format = ?surface_format,
            samples = sample_count,
            scene_width = scene_size.width,
            scene_height = scene_size.height,
            segments = lines.as_ref().map_or(0, |l| l.segment_count()),
            "renderer ready"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            sample_count,
            msaa_view,
            scale_factor,
            max_pixel_ratio,
            upscale,
            point_pipeline,
            particle_buffer,
            particle_capacity,
            num_particles: 0,
            globals_buffer,
            globals_bind_group,
            sprite_bind_group,
            lines,
            camera,
        })
    }

    /// Resize the surface. `scale_factor` is the window's current one.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.scale_factor = scale_factor;
            self.surface.configure(&self.device, &self.config);

            let scene_size = render_size(new_size, scale_factor, self.max_pixel_ratio);
            self.msaa_view =
                create_msaa_view(&self.device, scene_size, self.config.format, self.sample_count);
            if scene_size == new_size {
                self.upscale = None;
            } else if let Some(upscale) = &mut self.upscale {
                upscale.resize(&self.device, scene_size.width, scene_size.height);
            } else {
                self.upscale = create_upscale(&self.device, &self.config, scene_size);
            }
            self.camera.set_viewport(new_size.width, new_size.height);
        }
    }

    /// Reconfigure the surface at its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(
            PhysicalSize::new(self.config.width, self.config.height),
            self.scale_factor,
        );
    }

    /// Upload this frame's particle data. Extra particles past the buffer
    /// capacity are dropped.
    pub fn upload_particles(&mut self, particles: &[GpuParticle]) {
        let count = particles.len().min(self.particle_capacity);
        self.num_particles = count as u32;
        if count > 0 {
            self.queue.write_buffer(
                &self.particle_buffer,
                0,
                bytemuck::cast_slice(&particles[..count]),
            );
        }
    }

    fn update_globals(&mut self, model: Mat4) {
        let scale = self.camera.projection_scale();
        let globals = Globals {
            view_proj: self.camera.view_proj().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            params: [scale.x, scale.y, POINT_OPACITY, LINE_OPACITY],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }

    /// Draw one frame. `model` rotates the particle cloud; lines are drawn unrotated.
    pub fn render(&mut self, model: Mat4) -> Result<(), wgpu::SurfaceError> {
        self.update_globals(model);

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let view = match &self.upscale {
            Some(upscale) => &upscale.view,
            None => &surface_view,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let (target, resolve_target, store) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(view), wgpu::StoreOp::Discard),
                None => (view, None, wgpu::StoreOp::Store),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(lines) = &self.lines {
                lines.draw(&mut render_pass, &self.globals_bind_group);
            }

            if self.num_particles > 0 {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                render_pass.set_bind_group(1, &self.sprite_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.particle_buffer.slice(..));
                render_pass.draw(0..6, 0..self.num_particles);
            }
        }

        if let Some(upscale) = &self.upscale {
            upscale.draw(&mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_upscale(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    scene_size: PhysicalSize<u32>,
) -> Option<Upscale> {
    if scene_size.width == config.width && scene_size.height == config.height {
        return None;
    }
    Some(Upscale::new(device, scene_size.width, scene_size.height, config.format))
}

fn create_msaa_view(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Color Texture"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::SpawnContext;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 32);
        assert_eq!(std::mem::size_of::<Globals>(), 144);
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
    }

    #[test]
    fn test_render_size_within_cap_is_full() {
        let window = PhysicalSize::new(2560, 1440);
        assert_eq!(render_size(window, 1.0, 2.0), window);
        assert_eq!(render_size(window, 2.0, 2.0), window);
        assert_eq!(render_size(window, 1.0, 1.0), window);
    }

    #[test]
    fn test_render_size_caps_dense_displays() {
        // 390x844 logical phone at 3x, mobile cap 1
        let phone = PhysicalSize::new(1170, 2532);
        let mobile = BackgroundOptions::mobile().max_pixel_ratio();
        assert_eq!(render_size(phone, 3.0, mobile), PhysicalSize::new(390, 844));

        // Same display on the desktop profile renders at 2x
        let desktop = BackgroundOptions::default().max_pixel_ratio();
        assert_eq!(render_size(phone, 3.0, desktop), PhysicalSize::new(780, 1688));
    }

    #[test]
    fn test_render_size_never_zero() {
        let tiny = PhysicalSize::new(1, 1);
        assert_eq!(render_size(tiny, 4.0, 1.0), PhysicalSize::new(1, 1));
    }

    #[test]
    fn test_pack_particles_matches_cloud() {
        let opts = BackgroundOptions {
            particle_count: 10,
            ..Default::default()
        };
        let cloud = ParticleCloud::generate(&opts, &mut SpawnContext::seeded(4));
        let mut packed = vec![GpuParticle::zeroed(); 3];
        pack_particles(&cloud, &mut packed);

        assert_eq!(packed.len(), 10);
        assert_eq!(packed[7].position, cloud.positions[7].to_array());
        assert_eq!(packed[7].size, cloud.sizes[7]);
        assert_eq!(packed[7].color, cloud.colors[7].to_array());
    }
}
