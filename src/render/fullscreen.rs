//! Fullscreen-triangle passes
//!
//! `FullscreenPass` is the building block of every post-processing stage:
//! a pipeline over a fragment shader, a per-pass uniform buffer and a
//! sampler. Bind group layout:
//!
//! - binding 0: `PassParams` uniform
//! - binding 1: filtering sampler
//! - binding 2..: input textures, in the order given to `draw`

use crate::shaders;

use super::FrameTime;

/// Uniform block shared by every fullscreen shader
///
/// Layout: time, delta_time, width, height, then 12 per-pass values that
/// shaders read as `p0`, `p1`, `p2`. Total: 16 floats = 64 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassParams {
    pub time: f32,
    pub delta_time: f32,
    pub width: f32,
    pub height: f32,
    pub values: [f32; 12],
}

impl PassParams {
    pub fn new(time: FrameTime, size: (u32, u32)) -> Self {
        Self {
            time: time.elapsed,
            delta_time: time.delta,
            width: size.0 as f32,
            height: size.1 as f32,
            values: [0.0; 12],
        }
    }

    /// Fill the per-pass values from the front
    pub fn with_values(mut self, values: &[f32]) -> Self {
        let n = values.len().min(self.values.len());
        self.values[..n].copy_from_slice(&values[..n]);
        self
    }
}

/// One fragment shader drawn over the whole target
pub struct FullscreenPass {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    input_count: usize,
}

impl FullscreenPass {
    /// Compile `fragment` against the shared vertex stage
    ///
    /// `targets` lists one format per color output of the fragment shader.
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        fragment: &str,
        input_count: usize,
        targets: &[wgpu::TextureFormat],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shaders::fullscreen(fragment).into()),
        });

        let mut entries = vec![
            // Parameters uniform
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        // Input textures
        entries.extend((0..input_count).map(|i| wgpu::BindGroupLayoutEntry {
            binding: 2 + i as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = targets
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
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
                targets: &color_targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<PassParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            label,
            pipeline,
            bind_group_layout,
            params_buffer,
            sampler,
            input_count,
        }
    }

    /// Record one draw reading `inputs` and writing `outputs`
    ///
    /// The parameter buffer is written immediately, so a pass drawn twice in
    /// one submission sees only the last parameters. Passes that need two
    /// parameter sets (e.g. the two blur directions) use two instances.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        inputs: &[&wgpu::TextureView],
        outputs: &[&wgpu::TextureView],
        params: &PassParams,
    ) {
        debug_assert_eq!(inputs.len(), self.input_count, "{} input count", self.label);

        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: self.params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        entries.extend(inputs.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: 2 + i as u32,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        });

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = outputs
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<PassParams>(), 64);
    }

    #[test]
    fn test_with_values_fills_prefix() {
        let params = PassParams::new(FrameTime::new(2.0, 0.5), (640, 480)).with_values(&[1.0, 2.0]);
        assert_eq!(params.time, 2.0);
        assert_eq!(params.width, 640.0);
        assert_eq!(&params.values[..3], &[1.0, 2.0, 0.0]);
    }
}
