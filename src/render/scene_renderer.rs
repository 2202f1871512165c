//! GPU mirror of the globe scene
//!
//! `SceneRenderer` uploads every mesh, texture and the star instances once,
//! then per frame writes uniforms from the CPU scene and records:
//!
//! 1. The environment sky at the far plane, when the scene has one
//! 2. Opaque meshes in group order
//! 3. Transparent meshes, farthest first
//! 4. Star sprites, blended without depth writes
//!
//! It can also redraw a subset of meshes into the selection mask used by
//! the outline pass, testing them against the scene depth without writing it.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::target::{DEPTH_FORMAT, HDR_FORMAT, MASK_FORMAT};
use crate::color::Rgb;
use crate::scene::{
    CameraState, EarthScene, Environment, MeshNode, MeshVertex, NodeId, Shading, Side,
    StarInstance, TextureId,
};
use crate::shaders;

/// Camera and light block, group 0
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CameraUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    /// Clip space to world direction for the sky
    sky: [[f32; 4]; 4],
    eye: [f32; 4],
    light_direction: [f32; 4],
    /// rgb * intensity, ambient in w
    light_color: [f32; 4],
    /// Environment ambient cube, +X -X +Y -Y +Z -Z
    ambient: [[f32; 4]; 6],
}

/// Per-node block, group 1; also used for the star field
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct NodeUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    /// lit, textured, opacity, unused
    params: [f32; 4],
}

/// Render state that needs its own pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    side: Side,
    transparent: bool,
    depth_write: bool,
}

impl PipelineKey {
    fn for_node(node: &MeshNode) -> Self {
        Self {
            side: node.material.side,
            transparent: node.material.transparent,
            depth_write: node.material.depth_write,
        }
    }
}

struct GpuMesh {
    id: NodeId,
    name: String,
    key: PipelineKey,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    textured: bool,
}

struct GpuSky {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

struct GpuStars {
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Uploaded scene plus the pipelines that draw it
pub struct SceneRenderer {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    star_pipeline: wgpu::RenderPipeline,
    /// Selected coverage regardless of depth
    mask_cover_pipeline: wgpu::RenderPipeline,
    /// Selected fragments that pass the scene depth test
    mask_visible_pipeline: wgpu::RenderPipeline,
    sky: Option<GpuSky>,
    ambient: [[f32; 4]; 6],
    meshes: Vec<GpuMesh>,
    stars: GpuStars,
    /// Indices into `meshes` for the current frame
    draw_order: Vec<usize>,
    clear_color: wgpu::Color,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &EarthScene,
        background: Rgb,
    ) -> Self {
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE.into()),
        });
        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Star Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::STARS.into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Bind Group Layout"),
            entries: &[
                // Node uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Color map
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Maps wrap around the globe horizontally
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Scene Map Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let textures: HashMap<TextureId, wgpu::TextureView> = scene
            .textures
            .iter()
            .map(|(id, image)| (id, upload_texture(device, queue, &format!("{:?}", id), image)))
            .collect();
        let white = upload_texture(
            device,
            queue,
            "White Texture",
            &RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
        );

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &node_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        let mut meshes = Vec::with_capacity(scene.earth_group.children().len());
        for node in scene.earth_group.children() {
            let key = PipelineKey::for_node(node);
            pipelines
                .entry(key)
                .or_insert_with(|| mesh_pipeline(device, &scene_shader, &mesh_pipeline_layout, key));

            let map = node.material.map.and_then(|id| {
                let view = textures.get(&id);
                if view.is_none() {
                    tracing::warn!("{} refers to missing texture {:?}", node.name, id);
                }
                view
            });
            let textured = map.is_some();

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&node.name),
                contents: bytemuck::cast_slice(&node.mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&node.name),
                contents: bytemuck::cast_slice(&node.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&node.name),
                size: std::mem::size_of::<NodeUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = node_bind_group(
                device,
                &node_layout,
                &node.name,
                &uniform_buffer,
                map.unwrap_or(&white),
                &sampler,
            );

            meshes.push(GpuMesh {
                id: node.id,
                name: node.name.clone(),
                key,
                vertex_buffer,
                index_buffer,
                index_count: node.mesh.indices.len() as u32,
                uniform_buffer,
                bind_group,
                textured,
            });
        }

        let instances: Vec<StarInstance> = scene
            .stars
            .positions
            .iter()
            .map(|p| StarInstance {
                position: p.to_array(),
            })
            .collect();
        let star_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let star_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Star Uniform Buffer"),
            size: std::mem::size_of::<NodeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sprite = scene
            .stars
            .map
            .and_then(|id| textures.get(&id))
            .unwrap_or(&white);
        let star_bind_group = node_bind_group(
            device,
            &node_layout,
            "Star Bind Group",
            &star_uniform,
            sprite,
            &sampler,
        );

        let star_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Star Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &node_layout],
            push_constant_ranges: &[],
        });
        let star_pipeline = star_pipeline(device, &star_shader, &star_pipeline_layout);

        let mask_cover_pipeline = mask_pipeline(
            device,
            &scene_shader,
            &mesh_pipeline_layout,
            "fs_mask_cover",
            wgpu::CompareFunction::Always,
        );
        let mask_visible_pipeline = mask_pipeline(
            device,
            &scene_shader,
            &mesh_pipeline_layout,
            "fs_mask_visible",
            wgpu::CompareFunction::LessEqual,
        );

        let sky = scene
            .environment
            .as_ref()
            .and_then(|environment| upload_sky(device, queue, &camera_layout, environment));
        let ambient = scene
            .environment
            .as_ref()
            .map_or([[0.0; 4]; 6], |environment| {
                environment.ambient_cube().map(|[r, g, b]| [r, g, b, 0.0])
            });

        let [r, g, b] = background.to_linear();
        tracing::debug!(
            meshes = meshes.len(),
            pipelines = pipelines.len(),
            stars = instances.len(),
            sky = sky.is_some(),
            "Uploaded scene"
        );

        Self {
            camera_buffer,
            camera_bind_group,
            pipelines,
            star_pipeline,
            mask_cover_pipeline,
            mask_visible_pipeline,
            sky,
            ambient,
            meshes,
            stars: GpuStars {
                instance_buffer: star_buffer,
                instance_count: instances.len() as u32,
                uniform_buffer: star_uniform,
                bind_group: star_bind_group,
            },
            draw_order: Vec::new(),
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        }
    }

    /// Write this frame's uniforms and work out the draw order
    ///
    /// Meshes whose node has been removed from the group since upload are
    /// skipped.
    pub fn prepare(&mut self, queue: &wgpu::Queue, scene: &EarthScene, camera: &CameraState) {
        let light = &scene.light;
        let [lr, lg, lb] = light.color.to_linear();
        let mut rotation = camera.view;
        rotation.w_axis = glam::Vec4::W;
        let camera_uniform = CameraUniform {
            view: camera.view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            sky: (camera.projection * rotation).inverse().to_cols_array_2d(),
            eye: camera.eye.extend(1.0).to_array(),
            light_direction: light.direction().extend(0.0).to_array(),
            light_color: [
                lr * light.intensity,
                lg * light.intensity,
                lb * light.intensity,
                light.ambient,
            ],
            ambient: self.ambient,
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));

        let group = &scene.earth_group;
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (index, mesh) in self.meshes.iter().enumerate() {
            let Some(node) = group.children().iter().find(|n| n.id == mesh.id) else {
                continue;
            };
            let world = group.world_matrix(node);
            let material = &node.material;
            let uniform = NodeUniform {
                model: world.to_cols_array_2d(),
                color: material.color.to_linear_rgba(1.0),
                params: [
                    if material.shading == Shading::Lit { 1.0 } else { 0.0 },
                    if mesh.textured { 1.0 } else { 0.0 },
                    if material.transparent { material.opacity } else { 1.0 },
                    0.0,
                ],
            };
            queue.write_buffer(&mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

            if mesh.key.transparent {
                let view_z = (camera.view * world).w_axis.z;
                transparent.push((index, view_z));
            } else {
                opaque.push(index);
            }
        }

        // View space looks down -Z: most negative is farthest
        transparent.sort_by(|a, b| a.1.total_cmp(&b.1));
        self.draw_order = opaque;
        self.draw_order.extend(transparent.into_iter().map(|(index, _)| index));

        let stars = &scene.stars;
        let star_uniform = NodeUniform {
            model: stars.transform.matrix().to_cols_array_2d(),
            color: stars.color.to_linear_rgba(1.0),
            params: [stars.size, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.stars.uniform_buffer, 0, bytemuck::bytes_of(&star_uniform));
    }

    /// Draw the prepared frame into a color and depth target
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if let Some(sky) = &self.sky {
            render_pass.set_pipeline(&sky.pipeline);
            render_pass.set_bind_group(1, &sky.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        for &index in &self.draw_order {
            let mesh = &self.meshes[index];
            let Some(pipeline) = self.pipelines.get(&mesh.key) else {
                continue;
            };
            if mesh.index_count == 0 {
                continue;
            }
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &mesh.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        if self.stars.instance_count > 0 {
            render_pass.set_pipeline(&self.star_pipeline);
            render_pass.set_bind_group(1, &self.stars.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.stars.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..self.stars.instance_count);
        }
    }

    /// Draw the selected meshes into the outline mask
    ///
    /// r marks coverage, g marks coverage by a fragment not hidden behind
    /// the depth left by `draw`. The scene depth is attached read-only.
    pub fn draw_selection_mask(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        mask_view: &wgpu::TextureView,
        scene_depth: &wgpu::TextureView,
        selection: &[NodeId],
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Selection Mask Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: mask_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: scene_depth,
                depth_ops: None,
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for pipeline in [&self.mask_cover_pipeline, &self.mask_visible_pipeline] {
            render_pass.set_pipeline(pipeline);
            for &index in &self.draw_order {
                let mesh = &self.meshes[index];
                if mesh.index_count == 0 || !selection.contains(&mesh.id) {
                    continue;
                }
                render_pass.set_bind_group(1, &mesh.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }

    /// Whether the environment sky is drawn behind the scene
    pub fn has_skybox(&self) -> bool {
        self.sky.is_some()
    }

    /// Names of the meshes drawn this frame, in draw order
    pub fn draw_order(&self) -> Vec<&str> {
        self.draw_order
            .iter()
            .map(|&i| self.meshes[i].name.as_str())
            .collect()
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &RgbaImage,
) -> wgpu::TextureView {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        // Images are sRGB encoded; sampling returns linear values
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
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Upload the environment faces as a cube texture and build its pipeline
///
/// Returns `None`, with a warning, when the faces do not form a cube.
fn upload_sky(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_layout: &wgpu::BindGroupLayout,
    environment: &Environment,
) -> Option<GpuSky> {
    let Some(face) = environment.face_size() else {
        tracing::warn!("Environment faces are not equal squares, skipping the sky");
        return None;
    };
    let size = wgpu::Extent3d {
        width: face,
        height: face,
        depth_or_array_layers: 6,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Cube"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let texels: Vec<u8> = environment
        .faces
        .iter()
        .flat_map(|image| image.as_raw().iter().copied())
        .collect();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * face),
            rows_per_image: Some(face),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Environment Cube View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Environment Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Sky Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::Cube,
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
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sky Bind Group"),
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[camera_layout, &layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Sky Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Sits on the cleared far plane and never occludes anything
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    tracing::debug!(face, "Uploaded environment cube");
    Some(GpuSky {
        pipeline,
        bind_group,
    })
}

fn node_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    uniform: &wgpu::Buffer,
    map: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(map),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn mesh_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let blend = if key.transparent {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Scene Mesh Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.side.cull_mode(),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn star_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Star Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[StarInstance::buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn mask_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    entry_point: &str,
    depth_compare: wgpu::CompareFunction,
) -> wgpu::RenderPipeline {
    // Max keeps coverage and visibility from any overlapping selected mesh
    let max = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Max,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Selection Mask Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format: MASK_FORMAT,
                blend: Some(wgpu::BlendState {
                    color: max,
                    alpha: max,
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Read-only: the mask pass attaches the scene depth without storing it
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 336);
        assert_eq!(std::mem::size_of::<NodeUniform>(), 96);
    }
}
