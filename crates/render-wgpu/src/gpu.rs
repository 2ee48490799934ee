use arcane_gfx::{
    DrawParams, FRAGMENT_ENTRY, GfxError, GraphicsBackend, IdAllocator, ImageData, MeshData,
    MeshId, ProgramId, ResourceKind, ShaderSource, TextureId, VERTEX_ENTRY, Vertex,
};
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MAX_DRAWS_PER_FRAME: u32 = 4_096;

/// Per-draw data fed through the instance buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    mvp_0: [f32; 4],
    mvp_1: [f32; 4],
    mvp_2: [f32; 4],
    mvp_3: [f32; 4],
    /// x: 1.0 when the bound texture is sampled.
    params: [f32; 4],
}

impl InstanceData {
    pub(crate) fn from_params(params: &DrawParams) -> Self {
        let cols = params.transform.to_cols_array_2d();
        Self {
            mvp_0: cols[0],
            mvp_1: cols[1],
            mvp_2: cols[2],
            mvp_3: cols[3],
            params: [if params.textured { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

pub(crate) fn clear_color(c: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(c.x),
        g: f64::from(c.y),
        b: f64::from(c.z),
        a: f64::from(c.w),
    }
}

pub(crate) fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct Draw {
    mesh: MeshId,
    program: ProgramId,
    texture: Option<TextureId>,
    instance: InstanceData,
}

struct Frame {
    clear: Vec4,
    draws: Vec<Draw>,
}

/// [`GraphicsBackend`] drawing into a wgpu surface.
///
/// Draws are recorded between `begin_frame` and `end_frame`, then encoded
/// into a single render pass in submission order.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth: wgpu::TextureView,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    instance_buffer: wgpu::Buffer,
    ids: IdAllocator,
    meshes: HashMap<MeshId, GpuMesh>,
    textures: HashMap<TextureId, GpuTexture>,
    programs: HashMap<ProgramId, wgpu::RenderPipeline>,
    bound_program: Option<ProgramId>,
    bound_textures: HashMap<u32, TextureId>,
    frame: Option<Frame>,
}

impl WgpuBackend {
    /// Pick an adapter for `surface`, open a device and configure the surface.
    pub fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self, GfxError> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| GfxError::Surface("no compatible graphics adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("arcane_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| GfxError::Surface(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| GfxError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: u64::from(MAX_DRAWS_PER_FRAME) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth = create_depth_texture(&device, config.width, config.height);
        let white_image = ImageData::solid(1, 1, [255; 4])?;
        let white = upload_texture(&device, &queue, &texture_layout, &sampler, &white_image);

        tracing::info!(
            backend = ?adapter.get_info().backend,
            ?format,
            width = config.width,
            height = config.height,
            vsync,
            "GPU initialized"
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
            depth,
            texture_layout,
            pipeline_layout,
            sampler,
            white,
            instance_buffer,
            ids: IdAllocator::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            bound_program: None,
            bound_textures: HashMap::new(),
            frame: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth = create_depth_texture(&self.device, self.config.width, self.config.height);
        tracing::debug!(width = self.config.width, height = self.config.height, "surface resized");
    }

    fn build_pipeline(&self, source: &ShaderSource) -> wgpu::RenderPipeline {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.name.as_str()),
                source: wgpu::ShaderSource::Wgsl(source.code.as_str().into()),
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(source.name.as_str()),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                                2 => Float32x2,
                            ],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<InstanceData>() as u64,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &wgpu::vertex_attr_array![
                                3 => Float32x4,
                                4 => Float32x4,
                                5 => Float32x4,
                                6 => Float32x4,
                                7 => Float32x4,
                            ],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    }

    fn encode(&self, frame: &Frame, view: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let count = frame.draws.len().min(MAX_DRAWS_PER_FRAME as usize);
        if count < frame.draws.len() {
            tracing::warn!(
                draws = frame.draws.len(),
                max = MAX_DRAWS_PER_FRAME,
                "too many draws this frame, extra draws skipped"
            );
        }
        let instances: Vec<InstanceData> =
            frame.draws[..count].iter().map(|d| d.instance).collect();
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(frame.clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (i, draw) in frame.draws[..count].iter().enumerate() {
                // Resources may have been released after the draw was recorded.
                let (Some(mesh), Some(pipeline)) =
                    (self.meshes.get(&draw.mesh), self.programs.get(&draw.program))
                else {
                    tracing::warn!(mesh = draw.mesh.get(), "skipping draw of released resource");
                    continue;
                };
                let texture = draw
                    .texture
                    .and_then(|id| self.textures.get(&id))
                    .unwrap_or(&self.white);
                let instance = i as u32;

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &texture.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        }
        encoder.finish()
    }

    fn unknown(kind: ResourceKind, id: u32) -> GfxError {
        GfxError::UnknownResource { kind, id }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, GfxError> {
        data.validate()?;
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = MeshId(self.ids.next());
        self.meshes.insert(
            id,
            GpuMesh {
                vertices,
                indices,
                index_count: data.index_count(),
            },
        );
        Ok(id)
    }

    fn delete_mesh(&mut self, id: MeshId) {
        match self.meshes.remove(&id) {
            Some(mesh) => {
                mesh.vertices.destroy();
                mesh.indices.destroy();
            }
            None => tracing::error!(id = id.get(), "delete of unknown mesh"),
        }
    }

    fn create_texture(&mut self, image: &ImageData) -> Result<TextureId, GfxError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if image.width > limit || image.height > limit {
            return Err(GfxError::InvalidImage(format!(
                "{}x{} exceeds the device limit of {limit}",
                image.width, image.height
            )));
        }
        let texture = upload_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            image,
        );
        let id = TextureId(self.ids.next());
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id) {
            Some(texture) => {
                texture.texture.destroy();
                self.bound_textures.retain(|_, bound| *bound != id);
            }
            None => tracing::error!(id = id.get(), "delete of unknown texture"),
        }
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramId, GfxError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.build_pipeline(source);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GfxError::ShaderCompile {
                name: source.name.clone(),
                message: err.to_string(),
            });
        }
        let id = ProgramId(self.ids.next());
        self.programs.insert(id, pipeline);
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id).is_none() {
            tracing::error!(id = id.get(), "delete of unknown program");
        } else if self.bound_program == Some(id) {
            self.bound_program = None;
        }
    }

    fn bind_program(&mut self, id: ProgramId) -> Result<(), GfxError> {
        if !self.programs.contains_key(&id) {
            return Err(Self::unknown(ResourceKind::Program, id.get()));
        }
        self.bound_program = Some(id);
        Ok(())
    }

    fn bind_texture(&mut self, id: TextureId, slot: u32) -> Result<(), GfxError> {
        if !self.textures.contains_key(&id) {
            return Err(Self::unknown(ResourceKind::Texture, id.get()));
        }
        self.bound_textures.insert(slot, id);
        Ok(())
    }

    fn draw_mesh(&mut self, id: MeshId, params: &DrawParams) -> Result<(), GfxError> {
        let program = self
            .bound_program
            .ok_or(GfxError::NothingBound(ResourceKind::Program))?;
        if !self.meshes.contains_key(&id) {
            return Err(Self::unknown(ResourceKind::Mesh, id.get()));
        }
        let texture = if params.textured {
            Some(
                self.bound_textures
                    .get(&0)
                    .copied()
                    .ok_or(GfxError::NothingBound(ResourceKind::Texture))?,
            )
        } else {
            None
        };
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| GfxError::Surface("draw outside of a frame".into()))?;
        frame.draws.push(Draw {
            mesh: id,
            program,
            texture,
            instance: InstanceData::from_params(params),
        });
        Ok(())
    }

    fn begin_frame(&mut self, clear: Vec4) -> Result<(), GfxError> {
        if self.frame.is_some() {
            tracing::warn!("begin_frame while a frame is open, previous draws discarded");
        }
        self.frame = Some(Frame {
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GfxError> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| GfxError::Surface("end_frame without begin_frame".into()))?;

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out, frame skipped");
                return Ok(());
            }
            Err(e) => return Err(GfxError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let commands = self.encode(&frame, &view);
        self.queue.submit(std::iter::once(commands));
        output.present();
        Ok(())
    }

    fn viewport(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &ImageData,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        texture,
        bind_group,
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn instance_layout_matches_shader_locations() {
        // five vec4 attributes at locations 3..=7
        assert_eq!(std::mem::size_of::<InstanceData>(), 5 * 16);
    }

    #[test]
    fn instance_packs_columns_and_flag() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let inst = InstanceData::from_params(&DrawParams {
            transform,
            textured: true,
        });
        assert_eq!(inst.mvp_3, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(inst.params[0], 1.0);

        let inst = InstanceData::from_params(&DrawParams {
            transform,
            textured: false,
        });
        assert_eq!(inst.params[0], 0.0);
    }

    #[test]
    fn clear_color_converts_channels() {
        let c = clear_color(Vec4::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!((c.r, c.g, c.b, c.a), (0.25, 0.5, 0.75, 1.0));
    }

    #[test]
    fn vsync_selects_present_mode() {
        assert_eq!(present_mode(true), wgpu::PresentMode::AutoVsync);
        assert_eq!(present_mode(false), wgpu::PresentMode::AutoNoVsync);
    }
}
