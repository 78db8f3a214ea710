use tracing::debug;

use crate::backend::{
    GraphicsDevice, PrimitiveTopology, RenderPipelineDesc, ShaderStage, ShaderStages, ShaderUnit,
};
use crate::error::RenderError;

/// Entry point the vertex stage runs.
pub const VERTEX_ENTRY: &str = "vertexMain";
/// Entry point the fragment stage runs.
pub const FRAGMENT_ENTRY: &str = "fragmentMain";
/// The uniform block holds a single `u32` frame number.
pub const UNIFORM_BUFFER_SIZE: u64 = std::mem::size_of::<u32>() as u64;
/// A triangle strip of four vertices covers the whole target.
pub const QUAD_VERTEX_COUNT: u32 = 4;

/// Immutable GPU objects needed to draw the full-screen quad.
pub struct PipelineState<D: GraphicsDevice> {
    pub(crate) uniform_layout: D::BindGroupLayout,
    /// Owned so the layout lives exactly as long as the pipeline built from it.
    _pipeline_layout: D::PipelineLayout,
    pub(crate) pipeline: D::RenderPipeline,
    pub(crate) uniform_buffer: D::Buffer,
    pub(crate) uniform_bind_group: D::BindGroup,
}

impl<D: GraphicsDevice> PipelineState<D> {
    pub fn uniform_layout(&self) -> &D::BindGroupLayout {
        &self.uniform_layout
    }

    pub fn pipeline(&self) -> &D::RenderPipeline {
        &self.pipeline
    }

    pub fn uniform_buffer(&self) -> &D::Buffer {
        &self.uniform_buffer
    }

    pub fn uniform_bind_group(&self) -> &D::BindGroup {
        &self.uniform_bind_group
    }
}

/// Builds the uniform layout, uniform buffer, pipeline layout, and render
/// pipeline for `shader`, targeting `format`.
///
/// Entry points are validated before anything is allocated on the device, so
/// a shader missing `vertexMain` or `fragmentMain` leaves no resources behind.
pub fn build_pipeline<D: GraphicsDevice>(
    device: &D,
    shader: &D::Shader,
    format: D::Format,
) -> Result<PipelineState<D>, RenderError> {
    require_entry_point(shader, VERTEX_ENTRY, ShaderStage::Vertex)?;
    require_entry_point(shader, FRAGMENT_ENTRY, ShaderStage::Fragment)?;

    let uniform_layout = device.create_uniform_layout("frame uniform layout", ShaderStages::VERTEX_FRAGMENT);
    let pipeline_layout = device.create_pipeline_layout("quad pipeline layout", &[&uniform_layout]);
    let pipeline = device.create_render_pipeline(&RenderPipelineDesc {
        label: "quad pipeline",
        layout: &pipeline_layout,
        shader,
        vertex_entry: VERTEX_ENTRY,
        fragment_entry: FRAGMENT_ENTRY,
        target_format: format,
        topology: PrimitiveTopology::TriangleStrip,
    })?;

    let uniform_buffer = device.create_uniform_buffer("frame uniform buffer", UNIFORM_BUFFER_SIZE);
    let uniform_bind_group =
        device.create_uniform_bind_group("frame uniform bind group", &uniform_layout, &uniform_buffer);

    debug!(?format, "built quad pipeline");

    Ok(PipelineState {
        uniform_layout,
        _pipeline_layout: pipeline_layout,
        pipeline,
        uniform_buffer,
        uniform_bind_group,
    })
}

fn require_entry_point<S: ShaderUnit + ?Sized>(
    shader: &S,
    name: &str,
    stage: ShaderStage,
) -> Result<(), RenderError> {
    match shader.entry_point(name) {
        Some(found) if found == stage => Ok(()),
        Some(found) => Err(RenderError::PipelineCompilation(format!(
            "entry point `{name}` is a {found} entry point, expected {stage}"
        ))),
        None => Err(RenderError::PipelineCompilation(format!(
            "shader does not expose {stage} entry point `{name}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeDevice, FakeFormat, FakeShader};

    #[test]
    fn builds_strip_pipeline_with_four_byte_uniform() {
        let device = FakeDevice::new();
        let shader = FakeShader::quad();
        let state = build_pipeline(&device, &shader, FakeFormat::Unorm).unwrap();

        assert_eq!(state.uniform_buffer().size, UNIFORM_BUFFER_SIZE);
        assert_eq!(UNIFORM_BUFFER_SIZE, 4);

        let pipeline = state.pipeline();
        assert_eq!(pipeline.topology, PrimitiveTopology::TriangleStrip);
        assert_eq!(pipeline.vertex_entry, VERTEX_ENTRY);
        assert_eq!(pipeline.fragment_entry, FRAGMENT_ENTRY);
        assert_eq!(pipeline.format, FakeFormat::Unorm);

        assert_eq!(state.uniform_layout().visibility, ShaderStages::VERTEX_FRAGMENT);
        assert_eq!(state.uniform_bind_group().buffer_id, state.uniform_buffer().id);
    }

    #[test]
    fn missing_fragment_entry_fails_without_allocating() {
        let device = FakeDevice::new();
        let shader = FakeShader::new().with_entry(VERTEX_ENTRY, ShaderStage::Vertex);
        let err = build_pipeline(&device, &shader, FakeFormat::Unorm).err().unwrap();

        match err {
            RenderError::PipelineCompilation(message) => assert!(message.contains(FRAGMENT_ENTRY)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(device.calls().is_empty());
    }

    #[test]
    fn entry_point_with_wrong_stage_is_rejected() {
        let device = FakeDevice::new();
        let shader = FakeShader::new()
            .with_entry(VERTEX_ENTRY, ShaderStage::Fragment)
            .with_entry(FRAGMENT_ENTRY, ShaderStage::Fragment);
        let err = build_pipeline(&device, &shader, FakeFormat::Unorm).err().unwrap();
        assert!(matches!(err, RenderError::PipelineCompilation(_)));
    }

    #[test]
    fn backend_rejection_surfaces_as_compilation_error() {
        let device = FakeDevice::new().rejecting_pipelines("bad target format");
        let err = build_pipeline(&device, &FakeShader::quad(), FakeFormat::Unorm)
            .err()
            .unwrap();
        assert_eq!(
            err,
            RenderError::PipelineCompilation("bad target format".to_string())
        );
        assert!(!device
            .calls()
            .iter()
            .any(|call| matches!(call, Call::CreateBuffer { .. })));
    }
}
