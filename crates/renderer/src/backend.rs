//! Narrow capability traits the core renders through.
//!
//! The surface configurator, pipeline builder, and frame executor only ever
//! talk to a [`GraphicsDevice`] and a [`Surface`]; the `wgpu` adapter in
//! [`crate::gpu`] implements them for real hardware and the test fakes record
//! every call so ordering can be asserted without a GPU.

use std::fmt;
use std::ops::Range;

use crate::error::RenderError;

bitflags::bitflags! {
    /// Texture usages the surface configurator may request.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TextureUsages: u8 {
        const COPY_SRC          = 1 << 0;
        const COPY_DST          = 1 << 1;
        const RENDER_ATTACHMENT = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u8 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

/// Pipeline stage an entry point belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Compute => f.write_str("compute"),
        }
    }
}

/// Primitive assembly used by the render pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleStrip,
}

/// Linear RGBA clear color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
}

/// Presentation configuration applied to a surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceConfig<F> {
    pub format: F,
    pub usage: TextureUsages,
    pub width: u32,
    pub height: u32,
}

/// A compiled, link-resolved shader program.
pub trait ShaderUnit {
    /// Looks up a named entry point and reports which stage it targets.
    fn entry_point(&self, name: &str) -> Option<ShaderStage>;
}

/// Everything the pipeline builder needs to describe one render pipeline.
pub struct RenderPipelineDesc<'a, D: GraphicsDevice + ?Sized> {
    pub label: &'a str,
    pub layout: &'a D::PipelineLayout,
    pub shader: &'a D::Shader,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub target_format: D::Format,
    pub topology: PrimitiveTopology,
}

/// The single color attachment of a render pass.
pub struct ColorAttachment<'a, V> {
    pub view: &'a V,
    pub clear: ClearColor,
}

/// Device plus queue capabilities used by the core.
pub trait GraphicsDevice {
    type Format: Copy + fmt::Debug + PartialEq;
    type Shader: ShaderUnit;
    type Buffer;
    type BindGroupLayout;
    type BindGroup;
    type PipelineLayout;
    type RenderPipeline;
    type TextureView;
    type CommandBuffer;
    type Encoder: CommandEncoder<Self>;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> Self::Buffer;

    fn create_uniform_layout(&self, label: &str, visibility: ShaderStages)
        -> Self::BindGroupLayout;

    fn create_pipeline_layout(
        &self,
        label: &str,
        bind_group_layouts: &[&Self::BindGroupLayout],
    ) -> Self::PipelineLayout;

    /// Fails with [`RenderError::PipelineCompilation`] when the backend
    /// rejects the description.
    fn create_render_pipeline(
        &self,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<Self::RenderPipeline, RenderError>;

    fn create_uniform_bind_group(
        &self,
        label: &str,
        layout: &Self::BindGroupLayout,
        buffer: &Self::Buffer,
    ) -> Self::BindGroup;

    /// Enqueues a buffer upload on the device queue.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn create_command_encoder(&self, label: &str) -> Self::Encoder;

    /// Hands a finished command buffer to the queue. Returns immediately.
    fn submit(&self, commands: Self::CommandBuffer);

    /// Reports [`RenderError::DeviceLost`] once the backend invalidated the device.
    fn ensure_alive(&self) -> Result<(), RenderError>;
}

/// Records the commands of one render pass. Dropping the recorder ends the pass.
pub trait RenderPassRecorder<D: GraphicsDevice + ?Sized> {
    fn set_pipeline(&mut self, pipeline: &D::RenderPipeline);
    fn set_bind_group(&mut self, index: u32, group: &D::BindGroup);
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

pub trait CommandEncoder<D: GraphicsDevice + ?Sized> {
    /// Begins a pass on `attachment`, lets `record` fill it, then ends it.
    fn record_pass(
        &mut self,
        label: &str,
        attachment: ColorAttachment<'_, D::TextureView>,
        record: &mut dyn FnMut(&mut dyn RenderPassRecorder<D>),
    );

    fn finish(self) -> D::CommandBuffer;
}

/// A presentable texture acquired from a surface for a single frame.
pub trait PresentableFrame {
    type View;

    fn view(&self) -> &Self::View;

    /// Schedules the frame for presentation. Must follow the submit that
    /// rendered into it.
    fn present(self);
}

/// What a surface handed back when asked for its next frame.
pub enum Acquired<F> {
    Frame(F),
    /// The swapchain no longer matches the target (resized, lost, or
    /// otherwise stale) and must be reconfigured before the next attempt.
    Outdated,
}

/// A drawing target that can be configured for a device and yields one
/// presentable frame per draw.
pub trait Surface<D: GraphicsDevice> {
    type Frame: PresentableFrame<View = D::TextureView>;

    /// Current size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Formats the surface can present with `device`, most preferred first.
    fn supported_formats(&self, device: &D) -> Vec<D::Format>;

    /// True when the format stores sRGB-encoded values.
    fn is_srgb(&self, format: D::Format) -> bool;

    /// Usages the surface can be configured with on `device`.
    fn supported_usages(&self, device: &D) -> TextureUsages;

    fn configure(&mut self, device: &D, config: &SurfaceConfig<D::Format>)
        -> Result<(), RenderError>;

    /// Fetches the next frame without retrying. Stale swapchains come back as
    /// [`Acquired::Outdated`]; the caller decides whether to reconfigure.
    fn acquire(&mut self, device: &D) -> Result<Acquired<Self::Frame>, RenderError>;
}

/// The host facility that invokes a callback on the next display refresh.
///
/// Implementations only request the callback; the host later calls
/// [`crate::Loopable::tick`].
pub trait FrameScheduler {
    fn request_frame(&mut self);
}
