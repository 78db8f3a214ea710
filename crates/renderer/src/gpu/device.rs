use std::ops::Range;

use crate::backend::{
    ColorAttachment, CommandEncoder, GraphicsDevice, PrimitiveTopology, RenderPassRecorder,
    RenderPipelineDesc, ShaderStages,
};
use crate::error::RenderError;

use super::context::WgpuDevice;
use super::shader::WgpuShader;

fn shader_stages(stages: ShaderStages) -> wgpu::ShaderStages {
    let mut mapped = wgpu::ShaderStages::NONE;
    if stages.contains(ShaderStages::VERTEX) {
        mapped |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        mapped |= wgpu::ShaderStages::FRAGMENT;
    }
    mapped
}

fn topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

impl GraphicsDevice for WgpuDevice {
    type Format = wgpu::TextureFormat;
    type Shader = WgpuShader;
    type Buffer = wgpu::Buffer;
    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type PipelineLayout = wgpu::PipelineLayout;
    type RenderPipeline = wgpu::RenderPipeline;
    type TextureView = wgpu::TextureView;
    type CommandBuffer = wgpu::CommandBuffer;
    type Encoder = WgpuEncoder;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_uniform_layout(&self, label: &str, visibility: ShaderStages) -> wgpu::BindGroupLayout {
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: shader_stages(visibility),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
    }

    fn create_pipeline_layout(
        &self,
        label: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> wgpu::PipelineLayout {
        self.device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts,
                push_constant_ranges: &[],
            })
    }

    fn create_render_pipeline(
        &self,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<wgpu::RenderPipeline, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(desc.layout),
                vertex: wgpu::VertexState {
                    module: desc.shader.module(),
                    entry_point: Some(desc.vertex_entry),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: topology(desc.topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: desc.shader.module(),
                    entry_point: Some(desc.fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::PipelineCompilation(err.to_string())),
            None => Ok(pipeline),
        }
    }

    fn create_uniform_bind_group(
        &self,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_command_encoder(&self, label: &str) -> WgpuEncoder {
        WgpuEncoder(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) }),
        )
    }

    fn submit(&self, commands: wgpu::CommandBuffer) {
        self.queue.submit(std::iter::once(commands));
    }

    fn ensure_alive(&self) -> Result<(), RenderError> {
        self.health.check()
    }
}

pub struct WgpuEncoder(wgpu::CommandEncoder);

impl CommandEncoder<WgpuDevice> for WgpuEncoder {
    fn record_pass(
        &mut self,
        label: &str,
        attachment: ColorAttachment<'_, wgpu::TextureView>,
        record: &mut dyn FnMut(&mut dyn RenderPassRecorder<WgpuDevice>),
    ) {
        let clear = attachment.clear;
        let pass = self.0.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.r,
                        g: clear.g,
                        b: clear.b,
                        a: clear.a,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        let mut recorder = WgpuPass(pass);
        record(&mut recorder);
    }

    fn finish(self) -> wgpu::CommandBuffer {
        self.0.finish()
    }
}

struct WgpuPass<'a>(wgpu::RenderPass<'a>);

impl RenderPassRecorder<WgpuDevice> for WgpuPass<'_> {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        self.0.set_pipeline(pipeline);
    }

    fn set_bind_group(&mut self, index: u32, group: &wgpu::BindGroup) {
        self.0.set_bind_group(index, group, &[]);
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.0.draw(vertices, instances);
    }
}
