//! Procedural particle sprite.
//!
//! A soft white disc: a radial alpha gradient generated on the CPU with the
//! `image` crate and uploaded once as a texture.

use image::{Rgba, RgbaImage};

/// Sprite edge length in pixels.
pub const SPRITE_SIZE: u32 = 64;

/// `(distance from center / radius, alpha)` gradient stops.
const STOPS: [(f32, f32); 4] = [(0.0, 1.0), (0.2, 0.8), (0.6, 0.4), (1.0, 0.0)];

/// Alpha at normalized radius `t`, linear between stops, 0 past the edge.
pub fn gradient_alpha(t: f32) -> f32 {
    if t <= 0.0 {
        return STOPS[0].1;
    }
    for pair in STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            return a0 + (a1 - a0) * (t - t0) / (t1 - t0);
        }
    }
    0.0
}

/// Render the gradient into a `size`×`size` RGBA image.
pub fn radial_sprite(size: u32) -> RgbaImage {
    let radius = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        let t = (dx * dx + dy * dy).sqrt() / radius;
        let alpha = (gradient_alpha(t) * 255.0).round() as u8;
        Rgba([255, 255, 255, alpha])
    })
}

/// Sprite texture and its sampler.
pub struct SpriteTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl SpriteTexture {
    /// Upload `image` to a new texture.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { view, sampler }
    }
}
