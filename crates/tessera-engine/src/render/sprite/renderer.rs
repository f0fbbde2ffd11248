use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};

use super::atlas::SpriteAtlas;
use super::batch::SpriteBatch;
use super::layout::{
    bind_group_layout_entries, CameraUniform, SpriteInstance, SpriteVertex, ATLAS_SAMPLER_BINDING,
    ATLAS_TEXTURE_BINDING, CAMERA_BINDING, QUAD_INDICES, QUAD_VERTICES, SPRITE_SHADER_WGSL,
};

/// Draws a `SpriteBatch` with one instanced call.
///
/// GPU objects are created lazily on first use. The pipeline is rebuilt when
/// the surface format changes, the bind group when a different atlas is bound.
/// Output is straight-alpha blended over the existing target contents.
#[derive(Default)]
pub struct SpriteRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    // bindings (rebuilt when the atlas changes)
    bind_group: Option<wgpu::BindGroup>,
    bound_atlas: Option<u64>,
    camera_ubo: Option<wgpu::Buffer>,

    // geometry
    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one render pass drawing every instance in `batch`.
    ///
    /// An empty batch records nothing.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batch: &SpriteBatch,
        atlas: &SpriteAtlas,
        camera: &CameraUniform,
    ) {
        if batch.is_empty() {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx, atlas);
        self.ensure_instance_capacity(ctx, batch.len());

        let Some(camera_ubo) = self.camera_ubo.as_ref() else { return };
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        // Encoder-ordered uploads: each pass reads the camera and instances of its own call.
        let instance_bytes: &[u8] = bytemuck::cast_slice(batch.instances());
        stage_upload(ctx, target.encoder, "camera", bytemuck::bytes_of(camera), camera_ubo);
        stage_upload(ctx, target.encoder, "instances", instance_bytes, instance_vbo);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..instance_bytes.len() as u64));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..batch.len() as u32);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessera sprite shader"),
            source: wgpu::ShaderSource::Wgsl(SPRITE_SHADER_WGSL.into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera sprite bgl"),
            entries: &bind_group_layout_entries(),
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera sprite pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessera sprite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[SpriteVertex::layout(), SpriteInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Negative sizes mirror the quad; keep both windings.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("SpriteRenderer: pipeline built for {:?}", ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);

        // Bind groups reference the old layout.
        self.bind_group = None;
        self.bound_atlas = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, atlas: &SpriteAtlas) {
        if self.bound_atlas == Some(atlas.id()) && self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = self.camera_ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera sprite camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera sprite bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: CAMERA_BINDING,
                    resource: camera_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: ATLAS_TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(atlas.view()),
                },
                wgpu::BindGroupEntry {
                    binding: ATLAS_SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(atlas.sampler()),
                },
            ],
        });

        log::debug!("SpriteRenderer: bound atlas #{}", atlas.id());
        self.bind_group = Some(bind_group);
        self.bound_atlas = Some(atlas.id());
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }
        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessera sprite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessera sprite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = grown_capacity(required);
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera sprite instance vbo"),
            size: (new_cap * std::mem::size_of::<SpriteInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        log::debug!("SpriteRenderer: instance buffer grown to {new_cap}");
        self.instance_capacity = new_cap;
    }
}

/// Copies `bytes` into the start of `dst` via a one-shot staging buffer.
fn stage_upload(
    ctx: &RenderCtx<'_>,
    encoder: &mut wgpu::CommandEncoder,
    what: &str,
    bytes: &[u8],
    dst: &wgpu::Buffer,
) {
    let staging = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("tessera sprite {what} staging")),
        contents: bytes,
        usage: wgpu::BufferUsages::COPY_SRC,
    });
    encoder.copy_buffer_to_buffer(&staging, 0, dst, 0, bytes.len() as u64);
}

/// Instance buffers grow in powers of two, starting at 64.
fn grown_capacity(required: usize) -> usize {
    required.next_power_of_two().max(64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ColorRgba, Rect, Vec2, Viewport};
    use crate::render::sprite::{AtlasSampling, Camera2d, Sprite};

    const W: u32 = 64;
    const H: u32 = 4;
    // 64 px * 4 bytes is already a multiple of COPY_BYTES_PER_ROW_ALIGNMENT.
    const ROW_BYTES: u32 = W * 4;

    /// Any adapter will do, including a software one. `None` when the machine has none.
    fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok()?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
    }

    fn read_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mut encoder: wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) -> Vec<u8> {
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: (ROW_BYTES * H) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_BYTES),
                    rows_per_image: Some(H),
                },
            },
            wgpu::Extent3d { width: W, height: H, depth_or_array_layers: 1 },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        device
            .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
            .unwrap();
        rx.recv().unwrap().unwrap();
        slice.get_mapped_range().to_vec()
    }

    fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = (y * ROW_BYTES + x * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    #[test]
    fn two_renders_in_one_encoder_keep_their_own_data() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no wgpu adapter available; skipping");
            return;
        };

        let format = wgpu::TextureFormat::Rgba8Unorm;
        let target_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("target"),
            size: wgpu::Extent3d { width: W, height: H, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target_tex.create_view(&wgpu::TextureViewDescriptor::default());

        let atlas = SpriteAtlas::from_rgba8(
            &device,
            &queue,
            1,
            1,
            &[255; 4],
            AtlasSampling::PIXEL_ART,
            "white",
        )
        .unwrap();

        let viewport = Viewport::new(W as f32, H as f32);
        let ctx = RenderCtx::new(&device, &queue, format, viewport);

        // Same world rect for both; only the camera moves the second one right.
        let rect = Rect::new(0.0, 0.0, 32.0, H as f32);
        let mut red = SpriteBatch::new(4);
        red.push(Sprite::new(rect).tint(ColorRgba::new(1.0, 0.0, 0.0, 1.0)));
        let mut green = SpriteBatch::new(4);
        green.push(Sprite::new(rect).tint(ColorRgba::new(0.0, 1.0, 0.0, 1.0)));

        let left_cam = CameraUniform::orthographic(viewport);
        let right_cam = Camera2d::new(Vec2::new(-32.0, 0.0), 1.0).uniform(viewport);

        let mut renderer = SpriteRenderer::new();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("two batches"),
        });
        {
            let mut target = RenderTarget::new(&mut encoder, &view);
            renderer.render(&ctx, &mut target, &red, &atlas, &left_cam);
            renderer.render(&ctx, &mut target, &green, &atlas, &right_cam);
        }

        let pixels = read_pixels(&device, &queue, encoder, &target_tex);
        assert_eq!(pixel(&pixels, 16, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(&pixels, 48, 2), [0, 255, 0, 255]);
    }

    #[test]
    fn empty_batch_records_nothing() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no wgpu adapter available; skipping");
            return;
        };
        let atlas = SpriteAtlas::from_rgba8(
            &device,
            &queue,
            1,
            1,
            &[255; 4],
            AtlasSampling::PIXEL_ART,
            "white",
        )
        .unwrap();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("target"),
            size: wgpu::Extent3d { width: W, height: H, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let viewport = Viewport::new(W as f32, H as f32);
        let ctx = RenderCtx::new(&device, &queue, wgpu::TextureFormat::Rgba8Unorm, viewport);

        let mut renderer = SpriteRenderer::new();
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let mut target = RenderTarget::new(&mut encoder, &view);
        let camera = CameraUniform::orthographic(viewport);
        renderer.render(&ctx, &mut target, &SpriteBatch::new(4), &atlas, &camera);

        assert!(renderer.pipeline.is_none());
        assert!(renderer.instance_vbo.is_none());
    }

    #[test]
    fn capacity_grows_to_power_of_two() {
        assert_eq!(grown_capacity(1), 64);
        assert_eq!(grown_capacity(64), 64);
        assert_eq!(grown_capacity(65), 128);
        assert_eq!(grown_capacity(1000), 1024);
    }
}
